use crate::auth::AuthorizationError;
use crate::http::response::text_reply;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

#[derive(Debug, Clone)]
pub enum AuthRejection {
    Authorization(AuthorizationError),
}

impl warp::reject::Reject for AuthRejection {}

impl From<AuthorizationError> for AuthRejection {
    fn from(error: AuthorizationError) -> Self {
        Self::Authorization(error)
    }
}

pub async fn handle_reject(err: Rejection) -> Result<warp::reply::Response, Rejection> {
    if let Some(e) = err.find::<AuthRejection>() {
        match e.clone() {
            AuthRejection::Authorization(e) => Ok(e.into_response()),
        }
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        Ok(text_reply(e.to_string(), StatusCode::BAD_REQUEST))
    } else {
        Err(err)
    }
}
