use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

pub const AUTHORIZATION: &str = "Authorization";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl Credentials {
    pub fn scheme(&self) -> &'static str {
        match self {
            Credentials::Basic { .. } => "Basic",
            Credentials::Bearer { .. } => "Bearer",
        }
    }

    /// Who the request is made as. Tokens are opaque, so bearer requests have no principal.
    pub fn principal(&self) -> Option<&str> {
        match self {
            Credentials::Basic { username, .. } => Some(username),
            Credentials::Bearer { .. } => None,
        }
    }

    fn authorization_value(&self) -> String {
        match self {
            Credentials::Basic { username, password } => format!(
                "Basic {}",
                STANDARD.encode(format!("{}:{}", username, password))
            ),
            Credentials::Bearer { token } => format!("Bearer {}", token),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthMetadata {
    pub scheme: String,
    pub principal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub auth: Option<AuthMetadata>,
}

impl RequestMeta {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            headers: BTreeMap::from([("Accept".to_string(), "application/json".to_string())]),
            auth: None,
        }
    }
}

/// Tag the request with auth metadata and an `Authorization` header, unless there are no
/// credentials or the request is already tagged.
pub fn decorate_with_auth(request: &mut RequestMeta, credentials: Option<&Credentials>) {
    if request.auth.is_some() {
        return;
    }
    if let Some(credentials) = credentials {
        log::debug!(
            "Attaching {} credentials to request for {}",
            credentials.scheme(),
            request.url
        );
        request.auth = Some(AuthMetadata {
            scheme: credentials.scheme().to_string(),
            principal: credentials.principal().map(String::from),
        });
        request
            .headers
            .insert(AUTHORIZATION.to_string(), credentials.authorization_value());
    }
}
