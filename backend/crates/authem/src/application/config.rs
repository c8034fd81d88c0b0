//! Application Configuration

/// Registry-wide configuration.
///
/// Set once when the registry is constructed and read-only thereafter;
/// tests build isolated registries instead of mutating shared state.
#[derive(Debug, Clone, Default)]
pub struct AuthemConfig {
    /// Global switch for the client-token check. Both this and a role's
    /// `verify_client_auth_token` option must be on before lookups for
    /// that role require the client token header (two-level opt-in,
    /// default off).
    pub verify_client_auth_token: bool,
}
