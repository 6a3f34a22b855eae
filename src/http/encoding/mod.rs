pub mod error;
pub mod reply;

use std::collections::HashMap;
use std::convert::Infallible;

use crate::auth::IncomingRequest;
use futures::{future, TryStreamExt};
use tracing::{event, Level};
use warp::http::{HeaderMap, Method};
use warp::hyper::body::Buf;
use warp::multipart::FormData;
use warp::{Filter, Rejection};

type Params = HashMap<String, String>;
type Pairs = Vec<(String, String)>;

/// Request parameters from the query and the form body. The first value
/// of a repeated key wins, and body values come before query values.
pub fn params() -> impl Filter<Extract = (Params,), Error = Rejection> + Clone {
    let body = warp::multipart::form()
        .and_then(multipart_pairs)
        .or(warp::body::form::<Pairs>())
        .unify()
        .or(warp::any().map(Pairs::new))
        .unify();

    warp::query::<Pairs>()
        .and(body)
        .map(|query: Pairs, body: Pairs| first_values(body.into_iter().chain(query)))
}

fn first_values(pairs: impl IntoIterator<Item = (String, String)>) -> Params {
    let mut params = Params::new();
    for (key, value) in pairs {
        params.entry(key).or_insert(value);
    }
    params
}

/// Collects the non-file fields of a multipart body. A malformed body
/// contributes no parameters.
async fn multipart_pairs(form: FormData) -> Result<Pairs, Infallible> {
    let pairs = form
        .try_filter(|part| future::ready(part.filename().is_none()))
        .and_then(|part| async move {
            let name = part.name().to_string();
            let value = part
                .stream()
                .try_fold(Vec::new(), |mut value, chunk| async move {
                    value.extend_from_slice(chunk.chunk());
                    Ok::<_, warp::Error>(value)
                })
                .await?;
            Ok::<_, warp::Error>((name, String::from_utf8_lossy(&value).into_owned()))
        })
        .try_collect::<Pairs>()
        .await;

    match pairs {
        Ok(pairs) => Ok(pairs),
        Err(e) => {
            event!(Level::DEBUG, error = %e, "Ignoring malformed multipart body");
            Ok(Pairs::new())
        }
    }
}

pub fn incoming_request() -> impl Filter<Extract = (IncomingRequest,), Error = Rejection> + Clone {
    warp::method()
        .and(warp::header::headers_cloned())
        .and(params())
        .map(|method: Method, headers: HeaderMap, params: Params| {
            IncomingRequest::new(method, headers, params)
        })
}

/// Matches when the full request path equals `path`.
pub fn exact_path(path: String) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::path::full()
        .and(warp::any().map(move || path.clone()))
        .and_then(|full: warp::path::FullPath, path: String| async move {
            if full.as_str() == path {
                Ok(())
            } else {
                Err(warp::reject::not_found())
            }
        })
        .untuple_one()
}

pub fn with_value<T: Clone + Send + Sync>(
    value: T,
) -> impl Filter<Extract = (T,), Error = Infallible> + Clone {
    warp::any().map(move || value.clone())
}
