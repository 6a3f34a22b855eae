use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use crate::auth::Store;
use crate::provider::OAuth2Provider;

mod endpoints;

use endpoints::oauth::{authorize_endpoint, token_endpoint};

use super::encoding::error::handle_reject;
use super::response;

#[derive(Debug)]
pub struct Server<S> {
    provider: Arc<OAuth2Provider<S>>,
    authorize_path: String,
    token_path: String,
}

impl<S: Store + 'static> Server<S> {
    pub fn new(
        provider: Arc<OAuth2Provider<S>>,
        authorize_path: impl Into<String>,
        token_path: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            authorize_path: authorize_path.into(),
            token_path: token_path.into(),
        }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
        let authorize = authorize_endpoint(Arc::clone(&self.provider), self.authorize_path.clone())
            .recover(handle_reject);

        let token = token_endpoint(self.token_path.clone());

        let fallback = warp::any().map(response::not_found);

        authorize
            .or(token)
            .or(fallback)
            .with(warp::log("http-api"))
    }

    pub async fn serve(self, addr: SocketAddr) {
        tracing::info!(
            %addr,
            authorize = %self.authorize_path,
            token = %self.token_path,
            "Serving authorization endpoint"
        );
        warp::serve(self.routes()).run(addr).await;
    }
}
