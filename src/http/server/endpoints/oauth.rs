use std::sync::Arc;

use warp::Filter;

use crate::auth::{AuthorizationRequest, IncomingRequest, Store};
use crate::http::encoding::{self, reply};
use crate::http::response;
use crate::provider::OAuth2Provider;

use tracing::{event, Level};

pub fn authorize_endpoint<S: Store + 'static>(
    provider: Arc<OAuth2Provider<S>>,
    path: String,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    encoding::exact_path(path)
        .and(encoding::with_value(provider))
        .and(encoding::incoming_request())
        .and_then(
            |provider: Arc<OAuth2Provider<S>>, req: IncomingRequest| async move {
                let auth = AuthorizationRequest::from_params(&req.params);
                let result = provider.authorization_request(&req, auth).await;
                reply::reply(result)
            },
        )
}

/// Code exchange is not served yet; the path answers like any unknown one.
pub fn token_endpoint(
    path: String,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    encoding::exact_path(path).map(|| {
        event!(Level::DEBUG, "Token exchange requested but not served");
        response::not_found()
    })
}
