use crate::auth::{AuthorizationRequest, Client, DirectError, IncomingRequest, Store};
use crate::core::types::{ClientId, RedirectUri};

use tracing::{event, Level};

pub mod authorization;
pub mod error;
pub mod redirect;

#[derive(Debug)]
pub struct OAuth2Provider<S> {
    store: S,
}

impl<S: Store> OAuth2Provider<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn lookup_client(
        &self,
        req: &IncomingRequest,
        client_id: Option<&ClientId>,
    ) -> Result<S::Client, DirectError> {
        let client_id = client_id.ok_or(DirectError::InvalidClient)?;

        match self.store.get_client(req, client_id).await {
            Ok(Some(client)) => Ok(client),
            Ok(None) => Err(DirectError::InvalidClient),
            Err(e) => {
                event!(Level::WARN, ?client_id, error = %e, "Client lookup failed");
                Err(DirectError::ServerError(e.to_string()))
            }
        }
    }

    /// Resolves the client and the URI it may be redirected to. Both
    /// failures are answered directly since nothing is trusted yet.
    async fn client_redirect_uri(
        &self,
        req: &IncomingRequest,
        auth: &AuthorizationRequest,
    ) -> Result<(S::Client, RedirectUri), DirectError> {
        let client = self.lookup_client(req, auth.client_id.as_ref()).await?;

        let uri = client
            .redirect_uri(req, auth.redirect_uri.as_ref())
            .await
            .map_err(|_| DirectError::BadRedirect)?;

        Ok((client, uri))
    }
}
