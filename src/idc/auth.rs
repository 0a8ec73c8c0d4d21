//! Session context
//!
//! Holds the tenant host, the realm and the credential material attached to
//! every request. A [`Session`] is an immutable value: switching realm yields a
//! new session rather than mutating a shared one.

use super::error::{IdcError, Result};
use reqwest::RequestBuilder;
use std::fmt;
use url::Url;

/// Default realm for cloud tenants
pub const DEFAULT_REALM: &str = "alpha";

/// Default AM session cookie name
pub const DEFAULT_COOKIE_NAME: &str = "iPlanetDirectoryPro";

/// Credential material attached to outgoing requests
#[derive(Clone, Default)]
pub struct Credentials {
    bearer: Option<String>,
    cookie: Option<(String, String)>,
}

impl Credentials {
    /// No credentials at all
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: Some(token.into()),
            cookie: None,
        }
    }

    pub fn cookie(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            bearer: None,
            cookie: Some((name.into(), value.into())),
        }
    }

    /// Add a session cookie next to an existing bearer token
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookie = Some((name.into(), value.into()));
        self
    }

    /// Resolve credentials from the environment
    ///
    /// `TIDC_TOKEN` supplies a bearer token, `TIDC_COOKIE` a session cookie
    /// (named by `TIDC_COOKIE_NAME`, default `iPlanetDirectoryPro`).
    pub fn from_env() -> Self {
        let mut credentials = Self::default();
        if let Ok(token) = std::env::var("TIDC_TOKEN") {
            if !token.trim().is_empty() {
                credentials.bearer = Some(token.trim().to_string());
            }
        }
        if let Ok(value) = std::env::var("TIDC_COOKIE") {
            if !value.trim().is_empty() {
                let name = std::env::var("TIDC_COOKIE_NAME")
                    .unwrap_or_else(|_| DEFAULT_COOKIE_NAME.to_string());
                credentials.cookie = Some((name, value.trim().to_string()));
            }
        }
        credentials
    }

    pub fn is_present(&self) -> bool {
        self.bearer.is_some() || self.cookie.is_some()
    }

    /// Attach the credential material to a request
    pub fn apply(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }
        if let Some((name, value)) = &self.cookie {
            request = request.header(reqwest::header::COOKIE, format!("{}={}", name, value));
        }
        request
    }
}

// Security: never print token or cookie values
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .field(
                "cookie",
                &self.cookie.as_ref().map(|(name, _)| format!("{}=<redacted>", name)),
            )
            .finish()
    }
}

/// Per-call session context: host, realm and credentials
#[derive(Debug, Clone)]
pub struct Session {
    host: Url,
    realm: String,
    credentials: Credentials,
}

impl Session {
    pub fn new(host: &str, realm: &str, credentials: Credentials) -> Result<Self> {
        let mut host = Url::parse(host.trim())
            .map_err(|e| IdcError::usage(format!("Invalid host URL '{}'", host)).with_source(e))?;
        if !matches!(host.scheme(), "http" | "https") {
            return Err(IdcError::usage(format!(
                "Unsupported URL scheme '{}'",
                host.scheme()
            )));
        }
        if !validate_realm(realm) {
            return Err(IdcError::usage(format!("Invalid realm '{}'", realm)));
        }
        // Endpoint paths are appended to the host, so only scheme, authority and path survive
        host.set_query(None);
        host.set_fragment(None);

        Ok(Self {
            host,
            realm: realm.to_string(),
            credentials,
        })
    }

    /// Host as configured, without query or fragment (may carry a deployment path such as `/am`)
    pub fn host(&self) -> &Url {
        &self.host
    }

    /// Scheme and authority only
    pub fn host_only(&self) -> Url {
        host_only_url(&self.host)
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Realm expressed as a URL path, e.g. `/realms/root/realms/alpha`
    pub fn realm_path(&self) -> String {
        realm_path(&self.realm)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Same host and credentials, different realm
    pub fn with_realm(&self, realm: &str) -> Result<Self> {
        Self::new(self.host.as_str(), realm, self.credentials.clone())
    }
}

/// Convert a realm name into its URL path
///
/// `/` and the empty string map to the root realm; names already expressed as
/// a path below `/realms/root` are returned unchanged.
pub fn realm_path(realm: &str) -> String {
    if realm == "/realms/root" || realm.starts_with("/realms/root/") {
        return realm.to_string();
    }

    let mut path = String::from("/realms/root");
    for element in realm.split('/').filter(|e| !e.is_empty()) {
        path.push_str("/realms/");
        path.push_str(element);
    }
    path
}

/// Strip path, query and fragment from a host URL
pub fn host_only_url(host: &Url) -> Url {
    let mut url = host.clone();
    url.set_path("");
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Realm names: letters, digits, `-`, `_`, `.` and `/` separators
fn validate_realm(realm: &str) -> bool {
    realm.len() <= 255
        && realm
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
}

/// Read the realm from the environment
/// Security: Validates the realm format before returning
pub fn get_default_realm() -> Option<String> {
    if let Ok(realm) = std::env::var("TIDC_REALM") {
        if validate_realm(&realm) {
            return Some(realm);
        }
        tracing::warn!("Invalid realm format in TIDC_REALM");
    }
    None
}

/// Read the tenant host from the environment
pub fn get_default_host() -> Option<String> {
    std::env::var("TIDC_HOST")
        .ok()
        .filter(|h| Url::parse(h).is_ok())
}
