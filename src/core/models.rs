use std::collections::HashMap;

use super::types::*;

/// Value a backend binds to an issued authorization code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct AuthCodeState {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "code_challenge")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub challenge: Option<String>,
}

#[derive(Debug, Clone)]
#[derive(serde::Deserialize)]
pub struct ClientRegistration {
    pub client_id: ClientId,
    pub redirect_uri: RedirectUri,
    #[serde(default)]
    pub scope: Scope,
    /// Scopes each user has already approved for this client.
    #[serde(default)]
    pub grants: HashMap<String, Scope>,
}

impl ClientRegistration {
    pub fn new(client_id: &str, redirect_uri: &str, scope: &str) -> Self {
        Self {
            client_id: ClientId(client_id.to_string()),
            redirect_uri: RedirectUri(redirect_uri.to_string()),
            scope: Scope::from_delimited_parts(scope),
            grants: HashMap::new(),
        }
    }
}
