use super::error::AuthRejection;
use warp::reply::{Reply, Response};
use warp::Rejection;

pub fn reply<T, E>(result: Result<T, E>) -> Result<Response, Rejection>
where
    T: Reply,
    E: Into<AuthRejection>,
{
    result
        .map(|t| t.into_response())
        .map_err(|e| warp::reject::custom(e.into()))
}
