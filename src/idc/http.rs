//! HTTP transport for identity cloud REST calls

use super::auth::Credentials;
use super::error::IdcError;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Attempts made when a retry strategy allows retrying
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff unit between attempts; attempt `n` waits `n * backoff`
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(250);

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Failures below the operation layer
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to create HTTP client")]
    Build(#[source] reqwest::Error),
    #[error("Failed to send request")]
    Network(#[source] reqwest::Error),
    #[error("Failed to read response body")]
    Body(#[source] reqwest::Error),
    #[error("API request failed: {status}")]
    Status {
        status: StatusCode,
        /// Vendor error payload, passed through untouched
        body: Option<Value>,
    },
    #[error("Failed to parse response JSON")]
    Decode(#[source] serde_json::Error),
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("Credentials required but none configured")]
    MissingCredentials,
}

impl TransportError {
    fn is_network(&self) -> bool {
        match self {
            Self::Network(err) => err.is_connect() || err.is_timeout() || err.is_request(),
            Self::Body(err) => err.is_timeout(),
            _ => false,
        }
    }
}

/// Which failures the transport retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryStrategy {
    /// Never retry
    #[default]
    Nothing,
    /// Retry connection failures and timeouts only
    Network,
    /// Retry every failure, including remote rejections
    Everything,
}

impl RetryStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nothing" => Some(Self::Nothing),
            "network" => Some(Self::Network),
            "everything" => Some(Self::Everything),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::Network => "network",
            Self::Everything => "everything",
        }
    }

    pub fn should_retry(&self, error: &TransportError) -> bool {
        match self {
            Self::Nothing => false,
            Self::Network => error.is_network(),
            Self::Everything => !matches!(
                error,
                TransportError::InvalidUrl(_) | TransportError::MissingCredentials
            ),
        }
    }
}

/// How a response body is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseShape {
    #[default]
    Json,
    /// Plain text (PEM certificates); returned as a JSON string
    Text,
}

/// A fully resolved request, ready to send
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: Option<Value>,
    pub shape: ResponseShape,
    pub requires_credentials: bool,
}

/// HTTP client wrapper for identity cloud API calls
#[derive(Debug, Clone)]
pub struct IdcHttpClient {
    client: Client,
    retry: RetryStrategy,
    max_attempts: u32,
    backoff: Duration,
}

impl IdcHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("tidc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::Build)?;

        Ok(Self {
            client,
            retry: RetryStrategy::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        })
    }

    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn retry(&self) -> RetryStrategy {
        self.retry
    }

    /// Send a request, retrying according to the configured strategy
    pub async fn send(
        &self,
        request: &HttpRequest,
        credentials: &Credentials,
    ) -> Result<Value, TransportError> {
        if request.requires_credentials && !credentials.is_present() {
            return Err(TransportError::MissingCredentials);
        }

        let mut attempt = 1;
        loop {
            match self.send_once(request, credentials).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && self.retry.should_retry(&err) => {
                    tracing::warn!(
                        "{} {} failed (attempt {}/{}): {}",
                        request.method,
                        request.url,
                        attempt,
                        self.max_attempts,
                        err
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(
        &self,
        request: &HttpRequest,
        credentials: &Credentials,
    ) -> Result<Value, TransportError> {
        tracing::debug!("{} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        builder = credentials.apply(builder);
        for (name, value) in &request.headers {
            builder = builder.header(*name, *value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(TransportError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(TransportError::Body)?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(TransportError::Status {
                status,
                body: serde_json::from_str(&body).ok(),
            });
        }

        decode_body(&body, request.shape)
    }
}

/// Decode a successful response body
pub fn decode_body(body: &str, shape: ResponseShape) -> Result<Value, TransportError> {
    // Handle empty response
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    match shape {
        ResponseShape::Json => serde_json::from_str(body).map_err(TransportError::Decode),
        ResponseShape::Text => match serde_json::from_str::<Value>(body) {
            Ok(Value::String(text)) => Ok(Value::String(text)),
            _ => Ok(Value::String(body.to_string())),
        },
    }
}

/// Format an error for display
/// Security: Sanitizes error messages to avoid leaking API details
pub fn format_idc_error(error: &IdcError) -> String {
    match error.status() {
        Some(401) => return "Authentication failed. Check your token or session cookie.".to_string(),
        Some(403) => return "Permission denied. Check the scopes granted to your credentials.".to_string(),
        Some(404) => return "Resource not found.".to_string(),
        Some(409) => return "Resource conflict. The resource may already exist or be in use.".to_string(),
        Some(429) => return "Rate limit exceeded. Please try again later.".to_string(),
        Some(400) => return "Invalid request. Check your parameters.".to_string(),
        Some(500) | Some(502) | Some(503) => {
            return "Identity cloud service temporarily unavailable. Please try again.".to_string()
        }
        _ => {}
    }

    let error_str = error.to_string();
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
