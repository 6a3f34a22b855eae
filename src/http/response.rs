use std::collections::BTreeMap;

use crate::auth::error::ErrorResponse;
use crate::auth::{AuthorizationErrorKind, DirectError, MaybeHandled, MaybeRedirect, Redirect};
use crate::core::types::RedirectUri;

use tracing::{event, Level};
use url::{ParseError, Url};
use warp::http::{header, StatusCode};
use warp::reply::{Reply, Response};

pub type RedirectError = ErrorResponse<AuthorizationErrorKind>;

/// Response parameters destined for a redirect URI's query string.
///
/// Empty values are never kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseParams(BTreeMap<String, String>);

impl ResponseParams {
    pub fn encode(params: &impl serde::Serialize) -> Result<Self, RedirectError> {
        let encoded = serde_urlencoded::to_string(params).map_err(|e| {
            ErrorResponse::with_description(AuthorizationErrorKind::ServerError, e.to_string())
        })?;
        let pairs = form_urlencoded::parse(encoded.as_bytes())
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok(Self(pairs))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Sets every parameter on the query of `uri`, leaving other query
    /// parameters in place. The resulting query is sorted by key.
    ///
    /// A scheme-relative `uri` (`//host/path`) stays scheme-relative.
    pub fn merge_into(&self, uri: &RedirectUri) -> Result<String, RedirectError> {
        let server_error = |description: String| {
            ErrorResponse::with_description(AuthorizationErrorKind::ServerError, description)
        };

        let uri = uri.as_ref();
        let (mut url, scheme_relative) = match Url::parse(uri) {
            Ok(url) => (url, false),
            Err(ParseError::RelativeUrlWithoutBase) if has_authority(uri) => {
                let url = Url::parse(&format!("{}{}", SCHEME_RELATIVE_BASE, uri))
                    .map_err(|e| server_error(e.to_string()))?;
                (url, true)
            }
            Err(e) => return Err(server_error(e.to_string())),
        };

        if let Some(query) = url.query() {
            check_query(query).map_err(|description| {
                ErrorResponse::with_description(AuthorizationErrorKind::InvalidRequest, description)
            })?;
        }

        let mut query: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
        for (key, value) in &self.0 {
            query.insert(key.clone(), value.clone());
        }

        if query.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(query.iter());
        }

        let merged = url.as_str();
        match merged.strip_prefix(SCHEME_RELATIVE_BASE) {
            Some(relative) if scheme_relative => Ok(relative.to_string()),
            _ => Ok(merged.to_string()),
        }
    }

    /// Direct reply used when the redirect itself cannot be made. An
    /// `error` carried by the parameters takes precedence over `err`.
    fn direct_reply(&self, err: RedirectError) -> Response {
        let (kind, description) = match self.get("error") {
            Some(error) => (
                error.to_string(),
                self.get("error_description").unwrap_or_default().to_string(),
            ),
            None => (
                kind_name(err.kind).to_string(),
                err.description.unwrap_or_default(),
            ),
        };

        let status = match kind.as_str() {
            "server_error" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        text_reply(description, status)
    }
}

/// Scheme borrowed to parse scheme-relative references.
const SCHEME_RELATIVE_BASE: &str = "http:";

/// Whether a relative reference starts with a non-empty authority.
fn has_authority(uri: &str) -> bool {
    uri.strip_prefix("//")
        .map_or(false, |rest| !rest.is_empty() && !rest.starts_with('/'))
}

fn kind_name(kind: AuthorizationErrorKind) -> &'static str {
    match kind {
        AuthorizationErrorKind::InvalidRequest => "invalid_request",
        AuthorizationErrorKind::Unauthorized => "unauthorized",
        AuthorizationErrorKind::UnsupportedResponseType => "unsupported_response_type",
        AuthorizationErrorKind::ServerError => "server_error",
    }
}

/// Rejects query strings with broken percent escapes or `;` separators.
fn check_query(query: &str) -> Result<(), String> {
    let bytes = query.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b';' => return Err("invalid semicolon separator in query".to_string()),
            b'%' => {
                let escape = bytes.get(i + 1..i + 3);
                match escape {
                    Some(hex) if hex.iter().all(u8::is_ascii_hexdigit) => i += 3,
                    _ => {
                        let end = (i + 3).min(query.len());
                        let bad = query.get(i..end).unwrap_or("%");
                        return Err(format!("invalid URL escape {:?}", bad));
                    }
                }
            }
            _ => i += 1,
        }
    }
    Ok(())
}

pub fn text_reply(body: impl Into<String>, status: StatusCode) -> Response {
    warp::reply::with_status(body.into(), status).into_response()
}

pub fn not_found() -> Response {
    text_reply("Not found", StatusCode::NOT_FOUND)
}

impl<T: serde::Serialize + Send> Reply for Redirect<T> {
    fn into_response(self) -> Response {
        let params = match ResponseParams::encode(&self.params) {
            Ok(params) => params,
            Err(e) => return ResponseParams::default().direct_reply(e),
        };

        match params.merge_into(&self.uri) {
            Ok(location) => {
                warp::reply::with_header(StatusCode::FOUND, header::LOCATION, location)
                    .into_response()
            }
            Err(e) => {
                event!(
                    Level::WARN,
                    uri = %self.uri.0,
                    error = ?e.description,
                    "Cannot redirect to resolved redirect_uri"
                );
                params.direct_reply(e)
            }
        }
    }
}

impl Reply for DirectError {
    fn into_response(self) -> Response {
        match self {
            DirectError::InvalidClient => text_reply("invalid client_id", StatusCode::BAD_REQUEST),
            DirectError::BadRedirect => text_reply("invalid redirect_uri", StatusCode::BAD_REQUEST),
            DirectError::ServerError(message) => {
                text_reply(message, StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl<R: serde::Serialize + Send, D: Reply> Reply for MaybeRedirect<R, D> {
    fn into_response(self) -> Response {
        match self {
            Self::Redirected(r) => r.into_response(),
            Self::Direct(d) => d.into_response(),
        }
    }
}

impl<T: Reply> Reply for MaybeHandled<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Handled(response) => response,
            Self::Accept(r) => r.into_response(),
        }
    }
}
