use std::collections::HashMap;

use crate::auth::error::ErrorResponse;
use crate::core::types::{AuthCode, ClientId, RedirectUri, ResponseType, Scope};

use super::{MaybeRedirect, WithState};

pub type AuthorizationErrorResponse = WithState<ErrorResponse<AuthorizationErrorKind>>;
pub type AuthorizationError = MaybeRedirect<AuthorizationErrorResponse, DirectError>;

/// Parameters of an authorization request, read from the merged query
/// string and form body. Missing and empty parameters are both `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationRequest {
    pub response_type: Option<String>,
    pub client_id: Option<ClientId>,
    pub redirect_uri: Option<RedirectUri>,
    pub state: Option<String>,
    pub scope: Scope,
    pub challenge: Option<String>,
}

impl AuthorizationRequest {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let get = |name: &str| params.get(name).filter(|v| !v.is_empty()).cloned();

        Self {
            response_type: get("response_type"),
            client_id: get("client_id").map(ClientId),
            redirect_uri: get("redirect_uri").map(RedirectUri),
            state: get("state"),
            scope: get("scope")
                .map(|s| Scope::from_delimited_parts(&s))
                .unwrap_or_default(),
            challenge: get("challenge"),
        }
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type.as_deref().into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize)]
pub struct AuthorizationResponse {
    pub code: AuthCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AuthorizationResponse {
    pub fn new(code: AuthCode, state: Option<String>) -> Self {
        Self { code, state }
    }
}

/// Errors reported to the client through its redirect URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationErrorKind {
    InvalidRequest,
    Unauthorized,
    UnsupportedResponseType,
    ServerError,
}

impl From<AuthorizationErrorKind> for ErrorResponse<AuthorizationErrorKind> {
    fn from(kind: AuthorizationErrorKind) -> Self {
        ErrorResponse {
            kind,
            description: None,
            uri: None,
        }
    }
}

/// Errors answered directly, because no trusted redirect URI is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectError {
    InvalidClient,
    BadRedirect,
    ServerError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_parameters_read_as_absent() {
        let req = AuthorizationRequest::from_params(&params(&[
            ("response_type", "code"),
            ("client_id", ""),
            ("redirect_uri", ""),
            ("state", ""),
        ]));
        assert_eq!(req.response_type(), ResponseType::Code);
        assert_eq!(req.client_id, None);
        assert_eq!(req.redirect_uri, None);
        assert_eq!(req.state, None);
        assert!(req.scope.is_empty());
    }

    #[test]
    fn scope_and_challenge_are_read_from_their_own_keys() {
        let req = AuthorizationRequest::from_params(&params(&[
            ("client_id", "some_id"),
            ("scope", "scope1 scope2"),
            ("sccope", "ignored"),
            ("challenge", "abc"),
        ]));
        assert_eq!(req.client_id, Some(ClientId("some_id".to_string())));
        assert_eq!(req.scope, Scope::from_delimited_parts("scope2 scope1"));
        assert_eq!(req.challenge.as_deref(), Some("abc"));
        assert_eq!(req.response_type(), ResponseType::Unsupported);
    }
}
