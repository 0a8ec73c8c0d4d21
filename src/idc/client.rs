//! Identity cloud client
//!
//! Main client combining the session context, the HTTP transport and the
//! progress reporter. Executes exactly one request per [`IdcClient::execute`].

use super::auth::Session;
use super::error::{IdcError, Result};
use super::http::IdcHttpClient;
use crate::progress::{NoProgress, ProgressReporter};
use crate::resource::Descriptor;
use serde_json::Value;
use std::sync::Arc;

/// Main identity cloud client
#[derive(Clone)]
pub struct IdcClient {
    session: Session,
    http: IdcHttpClient,
    progress: Arc<dyn ProgressReporter>,
}

impl IdcClient {
    /// Create a new client with a default transport
    pub fn new(session: Session) -> Result<Self> {
        let http = IdcHttpClient::new()
            .map_err(|e| IdcError::wrap("Failed to initialize client", e.into()))?;
        Ok(Self::with_http(session, http))
    }

    pub fn with_http(session: Session, http: IdcHttpClient) -> Self {
        Self {
            session,
            http,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn http(&self) -> &IdcHttpClient {
        &self.http
    }

    pub fn progress(&self) -> &dyn ProgressReporter {
        self.progress.as_ref()
    }

    /// A client bound to another realm of the same tenant
    pub fn with_realm(&self, realm: &str) -> Result<Self> {
        Ok(Self {
            session: self.session.with_realm(realm)?,
            http: self.http.clone(),
            progress: Arc::clone(&self.progress),
        })
    }

    /// Perform one request/response cycle for a descriptor
    pub async fn execute(&self, descriptor: &Descriptor<'_>, body: Option<&Value>) -> Result<Value> {
        self.execute_page(descriptor, body, None).await
    }

    /// Same as [`execute`](Self::execute), carrying a continuation cookie
    pub async fn execute_page(
        &self,
        descriptor: &Descriptor<'_>,
        body: Option<&Value>,
        page_cookie: Option<&str>,
    ) -> Result<Value> {
        let request = descriptor.request(&self.session, body.cloned(), page_cookie)?;
        let value = self
            .http
            .send(&request, self.session.credentials())
            .await?;
        Ok(value)
    }
}

impl std::fmt::Debug for IdcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdcClient")
            .field("session", &self.session)
            .field("http", &self.http)
            .finish_non_exhaustive()
    }
}
