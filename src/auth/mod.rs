use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use warp::http::{HeaderMap, Method};
use warp::reply::Response;

use crate::core::models::AuthCodeState;
use crate::core::types::{AuthCode, ClientId, RedirectUri, Scope};
use crate::provider::error::Error;
use crate::provider::redirect::RedirectMismatch;

pub mod authorization;
pub mod error;

pub use authorization::*;

/// What a backend sees of the request being served.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub params: HashMap<String, String>,
}

impl IncomingRequest {
    pub fn new(method: Method, headers: HeaderMap, params: HashMap<String, String>) -> Self {
        Self {
            method,
            headers,
            params,
        }
    }

    /// Value of a parameter, with empty values reading as absent.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Outcome of asking a client whether the requested scope is approved.
#[derive(Debug)]
pub enum Consent {
    Granted,
    Denied,
    /// The backend produced its own response, e.g. a consent page.
    Handled(Response),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaybeRedirect<R, D> {
    Redirected(Redirect<R>),
    Direct(D),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize)]
pub struct WithState<T> {
    #[serde(flatten)]
    pub inner: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl<T> From<(T, Option<String>)> for WithState<T> {
    fn from((t, state): (T, Option<String>)) -> Self {
        Self { inner: t, state }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect<T> {
    pub uri: RedirectUri,
    pub params: T,
}

impl<T> Redirect<T> {
    pub fn new(uri: RedirectUri, params: T) -> Self {
        Redirect { uri, params }
    }
}

#[derive(Debug)]
pub enum MaybeHandled<T> {
    Handled(Response),
    Accept(T),
}

/// Client lookup, implemented by storage backends.
#[async_trait]
pub trait Store: Send + Sync {
    type Client: Client;

    /// `Ok(None)` means the client does not exist, which is not an error.
    async fn get_client(
        &self,
        req: &IncomingRequest,
        client_id: &ClientId,
    ) -> Result<Option<Self::Client>, Error>;
}

/// Per-client capabilities used while serving an authorization request.
#[async_trait]
pub trait Client: Send + Sync {
    async fn consent(&self, req: &IncomingRequest, scope: &Scope) -> Consent;

    /// `candidate` is the request's `redirect_uri`, if any.
    async fn redirect_uri(
        &self,
        req: &IncomingRequest,
        candidate: Option<&RedirectUri>,
    ) -> Result<RedirectUri, RedirectMismatch>;

    /// Mints a code. The backend must keep `state` bound to it.
    async fn issue_code(&self, req: &IncomingRequest, state: AuthCodeState)
        -> Result<AuthCode, Error>;
}

#[async_trait]
impl<C: Client + ?Sized> Client for Arc<C> {
    async fn consent(&self, req: &IncomingRequest, scope: &Scope) -> Consent {
        (**self).consent(req, scope).await
    }

    async fn redirect_uri(
        &self,
        req: &IncomingRequest,
        candidate: Option<&RedirectUri>,
    ) -> Result<RedirectUri, RedirectMismatch> {
        (**self).redirect_uri(req, candidate).await
    }

    async fn issue_code(
        &self,
        req: &IncomingRequest,
        state: AuthCodeState,
    ) -> Result<AuthCode, Error> {
        (**self).issue_code(req, state).await
    }
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    type Client = S::Client;

    async fn get_client(
        &self,
        req: &IncomingRequest,
        client_id: &ClientId,
    ) -> Result<Option<Self::Client>, Error> {
        (**self).get_client(req, client_id).await
    }
}
