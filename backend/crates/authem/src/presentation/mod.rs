//! Presentation Layer
//!
//! Host-facing HTTP adapters.

pub mod http_env;

pub use http_env::{EnvResponse, HttpEnvConfig, HttpRequestEnv};
