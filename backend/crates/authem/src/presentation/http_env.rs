//! HTTP Request Environment
//!
//! A [`RequestEnv`] implementation over plain HTTP types. The client-side
//! channel is HMAC-signed cookies; the server-side channel is a signed,
//! JSON-encoded cookie store (scoped to the browser session, so it lives
//! exactly one request/response round trip from the core's perspective).

use std::collections::HashMap;

use axum::http::HeaderMap;
use chrono::Utc;

use platform::cookie::{CookieConfig, extract_cookie};
use platform::crypto::{from_base64url, sign_value, to_base64url, verify_value};

use crate::domain::env::{ClientCookie, RequestEnv};

/// Host-side configuration for [`HttpRequestEnv`]
#[derive(Debug, Clone)]
pub struct HttpEnvConfig {
    /// HMAC secret for signed cookies and the session channel (32 bytes)
    pub secret: [u8; 32],
    /// Name of the cookie carrying the server-side session map
    pub session_cookie_name: String,
    /// Attributes applied to every cookie written by this host
    pub cookie: CookieConfig,
}

impl Default for HttpEnvConfig {
    fn default() -> Self {
        Self {
            secret: [0u8; 32],
            session_cookie_name: "_authem_session".to_string(),
            cookie: CookieConfig::default(),
        }
    }
}

impl HttpEnvConfig {
    /// Config with a random secret; sessions will not survive restarts
    pub fn with_random_secret() -> Self {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&platform::crypto::random_bytes(32));

        Self {
            secret,
            ..Self::default()
        }
    }
}

/// Pending response state produced by [`HttpRequestEnv::finish`]
#[derive(Debug, Default)]
pub struct EnvResponse {
    /// `Set-Cookie` header values to append to the response
    pub set_cookies: Vec<String>,
    /// Redirect target requested through the environment, if any
    pub redirect: Option<String>,
}

/// Request environment backed by HTTP headers and signed cookies
pub struct HttpRequestEnv {
    config: HttpEnvConfig,
    headers: HeaderMap,
    url: String,
    session: HashMap<String, String>,
    session_dirty: bool,
    /// Cookie writes made during this request, visible to later reads;
    /// `None` marks a deletion
    cookie_overlay: HashMap<String, Option<String>>,
    set_cookies: Vec<String>,
    redirect: Option<String>,
}

impl HttpRequestEnv {
    /// Build the environment from request headers and the request URL
    pub fn from_request(config: HttpEnvConfig, headers: &HeaderMap, url: impl Into<String>) -> Self {
        let session = extract_cookie(headers, &config.session_cookie_name)
            .and_then(|raw| decode_session(&config.secret, &raw))
            .unwrap_or_default();

        Self {
            config,
            headers: headers.clone(),
            url: url.into(),
            session,
            session_dirty: false,
            cookie_overlay: HashMap::new(),
            set_cookies: Vec::new(),
            redirect: None,
        }
    }

    /// Flush pending writes into response parts
    pub fn finish(mut self) -> EnvResponse {
        if self.session_dirty {
            let signed = encode_session(&self.config.secret, &self.session);
            // The session channel lives for the browser session only
            self.set_cookies.push(self.config.cookie.build_set_cookie(
                &self.config.session_cookie_name,
                &signed,
                None,
            ));
        }

        EnvResponse {
            set_cookies: self.set_cookies,
            redirect: self.redirect,
        }
    }

    fn raw_cookie(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.cookie_overlay.get(key) {
            return entry.clone();
        }
        extract_cookie(&self.headers, key)
    }
}

impl RequestEnv for HttpRequestEnv {
    fn session_get(&self, key: &str) -> Option<String> {
        self.session.get(key).cloned()
    }

    fn session_set(&mut self, key: &str, value: &str) {
        self.session.insert(key.to_string(), value.to_string());
        self.session_dirty = true;
    }

    fn session_delete(&mut self, key: &str) {
        if self.session.remove(key).is_some() {
            self.session_dirty = true;
        }
    }

    fn cookie_get(&self, key: &str) -> Option<String> {
        self.raw_cookie(key)
            .and_then(|raw| verify_value(&self.config.secret, &raw))
    }

    fn cookie_set(&mut self, key: &str, cookie: ClientCookie) {
        let signed = sign_value(&self.config.secret, &cookie.value);
        let max_age = (cookie.expires_at - Utc::now()).num_seconds().max(0);

        self.set_cookies
            .push(self.config.cookie.build_set_cookie(key, &signed, Some(max_age)));
        self.cookie_overlay.insert(key.to_string(), Some(signed));
    }

    fn cookie_delete(&mut self, key: &str) {
        self.set_cookies
            .push(self.config.cookie.build_delete_cookie(key));
        self.cookie_overlay.insert(key.to_string(), None);
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    fn request_url(&self) -> String {
        self.url.clone()
    }

    fn is_xhr(&self) -> bool {
        self.header("x-requested-with")
            .is_some_and(|value| value.eq_ignore_ascii_case("xmlhttprequest"))
    }

    fn redirect_to(&mut self, target: &str) {
        self.redirect = Some(target.to_string());
    }
}

fn encode_session(secret: &[u8], session: &HashMap<String, String>) -> String {
    let json = serde_json::to_string(session).unwrap_or_else(|_| "{}".to_string());
    sign_value(secret, &to_base64url(json.as_bytes()))
}

fn decode_session(secret: &[u8], raw: &str) -> Option<HashMap<String, String>> {
    let encoded = verify_value(secret, raw)?;
    let json = String::from_utf8(from_base64url(&encoded)?).ok()?;
    serde_json::from_str(&json).ok()
}
