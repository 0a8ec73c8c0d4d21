//! Typed path builder
//!
//! Every remote resource is one [`Endpoint`] variant carrying exactly the path
//! parameters it needs, so a URL with an unresolved placeholder cannot be
//! constructed. A [`Descriptor`] pairs an endpoint with a verb and the way its
//! response is read.

use crate::idc::auth::Session;
use crate::idc::http::{HttpRequest, ResponseShape, TransportError};
use reqwest::Method;
use serde_json::Value;
use url::Url;

const SOCIAL_IDP_SERVICE: &str = "/realm-config/services/SocialIdentityProviders";
const ENVIRONMENT_VARIABLES: &str = "/environment/variables";
const WSFED_ADMIN: &str = "/ws/admin/pf-admin-api/v1";

/// Query parameter carrying the paging continuation cookie
pub const PAGED_RESULTS_COOKIE_PARAM: &str = "_pagedResultsCookie";

/// API family an endpoint belongs to; decides base URL and version headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    /// Access management, realm-scoped, rooted at the configured host
    Am,
    /// Environment secrets and variables, rooted at the bare host
    Environment,
    /// WS-Federation admin API, rooted at the bare host
    WsFed,
}

impl Api {
    pub fn headers(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            Self::Am => vec![("Accept-API-Version", "protocol=2.1,resource=1.0")],
            Self::Environment => vec![("Accept-API-Version", "protocol=1.0,resource=1.0")],
            Self::WsFed => vec![("X-XSRF-Header", "PingFederate")],
        }
    }

    fn base_url(&self, session: &Session) -> String {
        let base = match self {
            Self::Am => session.host().clone(),
            Self::Environment | Self::WsFed => session.host_only(),
        };
        base.as_str().trim_end_matches('/').to_string()
    }
}

/// Remote resources addressable by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    SocialProviderTypes,
    SocialProvidersByType { provider_type: &'a str },
    SocialProviderDescendants,
    SocialProvider { provider_type: &'a str, id: &'a str },
    Variables,
    Variable { id: &'a str },
    VariableDescription { id: &'a str },
    SpConnections,
    SpConnection { id: &'a str },
    PolicyContracts,
    PolicyContract { id: &'a str },
    SigningKeyPairGenerate,
    SigningKeyPairs,
    SigningKeyPair { id: &'a str },
    SigningKeyPairCertificate { id: &'a str },
    FederationInfo,
    VirtualHostNames,
    IdpAdapters,
    IdpAdapter { id: &'a str },
    AuthenticationPolicies,
    AuthenticationPolicy { id: &'a str },
    ClusterReplicate,
}

impl Endpoint<'_> {
    pub fn api(&self) -> Api {
        match self {
            Self::SocialProviderTypes
            | Self::SocialProvidersByType { .. }
            | Self::SocialProviderDescendants
            | Self::SocialProvider { .. } => Api::Am,
            Self::Variables | Self::Variable { .. } | Self::VariableDescription { .. } => {
                Api::Environment
            }
            _ => Api::WsFed,
        }
    }

    /// Path below the API family's base, with parameters percent-encoded
    pub fn path(&self, realm_path: &str) -> String {
        let enc = |s: &str| urlencoding::encode(s).into_owned();
        match self {
            Self::SocialProviderTypes | Self::SocialProviderDescendants => {
                format!("/json{}{}", realm_path, SOCIAL_IDP_SERVICE)
            }
            Self::SocialProvidersByType { provider_type } => {
                format!("/json{}{}/{}", realm_path, SOCIAL_IDP_SERVICE, enc(provider_type))
            }
            Self::SocialProvider { provider_type, id } => format!(
                "/json{}{}/{}/{}",
                realm_path,
                SOCIAL_IDP_SERVICE,
                enc(provider_type),
                enc(id)
            ),
            Self::Variables => ENVIRONMENT_VARIABLES.to_string(),
            Self::Variable { id } | Self::VariableDescription { id } => {
                format!("{}/{}", ENVIRONMENT_VARIABLES, enc(id))
            }
            Self::SpConnections => format!("{}/idp/spConnections", WSFED_ADMIN),
            Self::SpConnection { id } => format!("{}/idp/spConnections/{}", WSFED_ADMIN, enc(id)),
            Self::PolicyContracts => format!("{}/authenticationPolicyContracts", WSFED_ADMIN),
            Self::PolicyContract { id } => {
                format!("{}/authenticationPolicyContracts/{}", WSFED_ADMIN, enc(id))
            }
            Self::SigningKeyPairGenerate => format!("{}/keyPairs/signing/generate", WSFED_ADMIN),
            Self::SigningKeyPairs => format!("{}/keyPairs/signing", WSFED_ADMIN),
            Self::SigningKeyPair { id } => format!("{}/keyPairs/signing/{}", WSFED_ADMIN, enc(id)),
            Self::SigningKeyPairCertificate { id } => {
                format!("{}/keyPairs/signing/{}/certificate", WSFED_ADMIN, enc(id))
            }
            Self::FederationInfo => format!("{}/serverSettings/federationInfo", WSFED_ADMIN),
            Self::VirtualHostNames => format!("{}/virtualHostNames", WSFED_ADMIN),
            Self::IdpAdapters => format!("{}/idp/adapters", WSFED_ADMIN),
            Self::IdpAdapter { id } => format!("{}/idp/adapters/{}", WSFED_ADMIN, enc(id)),
            Self::AuthenticationPolicies => format!("{}/authenticationPolicies/policy", WSFED_ADMIN),
            Self::AuthenticationPolicy { id } => {
                format!("{}/authenticationPolicies/policy/{}", WSFED_ADMIN, enc(id))
            }
            Self::ClusterReplicate => format!("{}/cluster/replicate", WSFED_ADMIN),
        }
    }

    /// Fixed query parameters (`_action`, `_queryFilter`)
    pub fn query(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::SocialProviderTypes => &[("_action", "getAllTypes")],
            Self::SocialProviderDescendants => &[("_action", "nextdescendents")],
            Self::SocialProvidersByType { .. } => &[("_queryFilter", "true")],
            Self::VariableDescription { .. } => &[("_action", "setDescription")],
            _ => &[],
        }
    }

    /// Whether the endpoint answers with a paged result and continuation cookie
    pub fn is_paged(&self) -> bool {
        matches!(
            self,
            Self::SocialProviderDescendants | Self::SocialProvidersByType { .. } | Self::Variables
        )
    }

    /// Absolute URL for this endpoint within a session
    pub fn url(&self, session: &Session, page_cookie: Option<&str>) -> Result<Url, TransportError> {
        let api = self.api();
        let raw = format!("{}{}", api.base_url(session), self.path(&session.realm_path()));
        let mut url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", raw, e)))?;

        let query = self.query();
        if !query.is_empty() || page_cookie.is_some() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            if let Some(cookie) = page_cookie {
                pairs.append_pair(PAGED_RESULTS_COOKIE_PARAM, cookie);
            }
        }

        Ok(url)
    }
}

/// Immutable description of one remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor<'a> {
    pub method: Method,
    pub endpoint: Endpoint<'a>,
    pub shape: ResponseShape,
    pub requires_credentials: bool,
}

impl<'a> Descriptor<'a> {
    pub fn new(method: Method, endpoint: Endpoint<'a>) -> Self {
        Self {
            method,
            endpoint,
            shape: ResponseShape::Json,
            requires_credentials: true,
        }
    }

    pub fn get(endpoint: Endpoint<'a>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: Endpoint<'a>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: Endpoint<'a>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn delete(endpoint: Endpoint<'a>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Read the response as text rather than JSON
    pub fn text(mut self) -> Self {
        self.shape = ResponseShape::Text;
        self
    }

    /// Send without requiring credential material
    pub fn anonymous(mut self) -> Self {
        self.requires_credentials = false;
        self
    }

    /// Resolve into a sendable request
    pub fn request(
        &self,
        session: &Session,
        body: Option<Value>,
        page_cookie: Option<&str>,
    ) -> Result<HttpRequest, TransportError> {
        Ok(HttpRequest {
            method: self.method.clone(),
            url: self.endpoint.url(session, page_cookie)?,
            headers: self.endpoint.api().headers(),
            body,
            shape: self.shape,
            requires_credentials: self.requires_credentials,
        })
    }
}
