use crate::{
    auth::{
        error::ErrorResponse, AuthorizationError, AuthorizationErrorKind, AuthorizationRequest,
        AuthorizationResponse, Client, Consent, IncomingRequest, MaybeHandled, Redirect, Store,
    },
    core::{models::AuthCodeState, types::ResponseType},
    provider::error::ResultExt,
};

use tracing::{event, Level};

use super::OAuth2Provider;

impl<S: Store> OAuth2Provider<S> {
    #[tracing::instrument(skip_all, fields(client_id = ?auth.client_id))]
    pub async fn authorization_request(
        &self,
        req: &IncomingRequest,
        auth: AuthorizationRequest,
    ) -> Result<MaybeHandled<Redirect<AuthorizationResponse>>, AuthorizationError> {
        let state = auth.state.clone();

        let (client, uri) = self
            .client_redirect_uri(req, &auth)
            .await
            .without_redirect()?;

        if auth.response_type() != ResponseType::Code {
            event!(
                Level::DEBUG,
                response_type = ?auth.response_type,
                "Unsupported response type"
            );
            return Err(ErrorResponse::from(AuthorizationErrorKind::UnsupportedResponseType))
                .add_state_context(&state)
                .add_redirect_context(uri);
        }

        match client.consent(req, &auth.scope).await {
            Consent::Granted => {}
            Consent::Denied => {
                return Err(ErrorResponse::from(AuthorizationErrorKind::Unauthorized))
                    .add_state_context(&state)
                    .add_redirect_context(uri);
            }
            Consent::Handled(response) => {
                event!(Level::DEBUG, "Consent handed off to backend");
                return Ok(MaybeHandled::Handled(response));
            }
        }

        let binding = AuthCodeState {
            state: state.clone(),
            challenge: auth.challenge.clone(),
        };

        let code = client
            .issue_code(req, binding)
            .await
            .map_err(|e| {
                event!(Level::WARN, error = %e, "Failed to issue authorization code");
                ErrorResponse::with_description(AuthorizationErrorKind::ServerError, e.to_string())
            })
            .add_state_context(&state)
            .add_redirect_context(uri.clone())?;

        event!(Level::DEBUG, "Issuing authorization code");
        Ok(MaybeHandled::Accept(Redirect::new(
            uri,
            AuthorizationResponse::new(code, state),
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use warp::http::{HeaderMap, Method, StatusCode};
    use warp::Reply;

    use super::*;
    use crate::auth::{DirectError, MaybeRedirect, WithState};
    use crate::core::types::{AuthCode, ClientId, RedirectUri, Scope};
    use crate::provider::error::Error;
    use crate::provider::redirect::{self, RedirectMismatch};

    const URI: &str = "http://localhost:7272/pqr?a=b";

    #[derive(Clone, Copy)]
    enum ConsentMode {
        Grant,
        Deny,
        Handle,
    }

    struct TestClient {
        consent: ConsentMode,
        fail_issue: bool,
    }

    #[async_trait]
    impl Client for TestClient {
        async fn consent(&self, _req: &IncomingRequest, _scope: &Scope) -> Consent {
            match self.consent {
                ConsentMode::Grant => Consent::Granted,
                ConsentMode::Deny => Consent::Denied,
                ConsentMode::Handle => Consent::Handled(
                    warp::reply::with_status("consent form", StatusCode::OK).into_response(),
                ),
            }
        }

        async fn redirect_uri(
            &self,
            _req: &IncomingRequest,
            candidate: Option<&RedirectUri>,
        ) -> Result<RedirectUri, RedirectMismatch> {
            redirect::resolve(candidate, &RedirectUri(URI.to_string()))
        }

        async fn issue_code(
            &self,
            _req: &IncomingRequest,
            state: AuthCodeState,
        ) -> Result<AuthCode, Error> {
            if self.fail_issue {
                Err(Error::Backend("code store unavailable".to_string()))
            } else {
                Ok(AuthCode(format!(
                    "code-for-{}",
                    state.challenge.unwrap_or_default()
                )))
            }
        }
    }

    enum TestStore {
        Found(ConsentMode, bool),
        Missing,
        Broken,
    }

    #[async_trait]
    impl Store for TestStore {
        type Client = TestClient;

        async fn get_client(
            &self,
            _req: &IncomingRequest,
            _client_id: &ClientId,
        ) -> Result<Option<TestClient>, Error> {
            match self {
                TestStore::Found(consent, fail_issue) => Ok(Some(TestClient {
                    consent: *consent,
                    fail_issue: *fail_issue,
                })),
                TestStore::Missing => Ok(None),
                TestStore::Broken => Err(Error::Backend("database is down".to_string())),
            }
        }
    }

    fn request(pairs: &[(&str, &str)]) -> (IncomingRequest, AuthorizationRequest) {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let auth = AuthorizationRequest::from_params(&params);
        (
            IncomingRequest::new(Method::GET, HeaderMap::new(), params),
            auth,
        )
    }

    fn code_request() -> (IncomingRequest, AuthorizationRequest) {
        request(&[
            ("response_type", "code"),
            ("client_id", "some_id"),
            ("state", "xyz"),
            ("challenge", "c1"),
        ])
    }

    fn redirected_error(
        result: Result<MaybeHandled<Redirect<AuthorizationResponse>>, AuthorizationError>,
    ) -> Redirect<WithState<ErrorResponse<AuthorizationErrorKind>>> {
        match result {
            Err(MaybeRedirect::Redirected(r)) => r,
            other => panic!("expected a redirected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn granted_consent_issues_code_bound_to_challenge() {
        let provider = OAuth2Provider::new(TestStore::Found(ConsentMode::Grant, false));
        let (req, auth) = code_request();

        match provider.authorization_request(&req, auth).await {
            Ok(MaybeHandled::Accept(redirect)) => {
                assert_eq!(redirect.uri, RedirectUri(URI.to_string()));
                assert_eq!(redirect.params.code, AuthCode("code-for-c1".to_string()));
                assert_eq!(redirect.params.state.as_deref(), Some("xyz"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn denied_consent_redirects_unauthorized() {
        let provider = OAuth2Provider::new(TestStore::Found(ConsentMode::Deny, false));
        let (req, auth) = code_request();

        let redirect = redirected_error(provider.authorization_request(&req, auth).await);
        assert_eq!(redirect.params.inner.kind, AuthorizationErrorKind::Unauthorized);
        assert_eq!(redirect.params.state.as_deref(), Some("xyz"));
    }

    #[tokio::test]
    async fn handled_consent_passes_the_backend_response_through() {
        let provider = OAuth2Provider::new(TestStore::Found(ConsentMode::Handle, false));
        let (req, auth) = code_request();

        match provider.authorization_request(&req, auth).await {
            Ok(MaybeHandled::Handled(response)) => assert_eq!(response.status(), StatusCode::OK),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn issuance_failure_redirects_server_error_with_description() {
        let provider = OAuth2Provider::new(TestStore::Found(ConsentMode::Grant, true));
        let (req, auth) = code_request();

        let redirect = redirected_error(provider.authorization_request(&req, auth).await);
        assert_eq!(redirect.params.inner.kind, AuthorizationErrorKind::ServerError);
        assert_eq!(
            redirect.params.inner.description.as_deref(),
            Some("code store unavailable")
        );
    }

    #[tokio::test]
    async fn unsupported_response_type_redirects_after_resolving_client() {
        let provider = OAuth2Provider::new(TestStore::Found(ConsentMode::Grant, false));
        let (req, auth) = request(&[
            ("response_type", "token"),
            ("client_id", "some_id"),
            ("state", "xyz"),
        ]);

        let redirect = redirected_error(provider.authorization_request(&req, auth).await);
        assert_eq!(
            redirect.params.inner.kind,
            AuthorizationErrorKind::UnsupportedResponseType
        );
        assert_eq!(redirect.params.state.as_deref(), Some("xyz"));
    }

    #[tokio::test]
    async fn unsupported_response_type_with_unknown_client_is_direct() {
        let provider = OAuth2Provider::new(TestStore::Missing);
        let (req, auth) = request(&[("client_id", "boo")]);

        let result = provider.authorization_request(&req, auth).await;
        assert!(matches!(
            result,
            Err(MaybeRedirect::Direct(DirectError::InvalidClient))
        ));
    }

    #[tokio::test]
    async fn lookup_failures_are_direct() {
        let provider = OAuth2Provider::new(TestStore::Broken);
        let (req, auth) = code_request();
        match provider.authorization_request(&req, auth).await {
            Err(MaybeRedirect::Direct(DirectError::ServerError(message))) => {
                assert_eq!(message, "database is down")
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let provider = OAuth2Provider::new(TestStore::Found(ConsentMode::Grant, false));
        let (req, auth) = request(&[("response_type", "code")]);
        assert!(matches!(
            provider.authorization_request(&req, auth).await,
            Err(MaybeRedirect::Direct(DirectError::InvalidClient))
        ));

        let (req, auth) = request(&[
            ("response_type", "code"),
            ("client_id", "some_id"),
            ("redirect_uri", "http://evil.example/"),
        ]);
        assert!(matches!(
            provider.authorization_request(&req, auth).await,
            Err(MaybeRedirect::Direct(DirectError::BadRedirect))
        ));
    }
}
