use crate::{
    auth::{MaybeRedirect, Redirect, WithState},
    core::types::RedirectUri,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Backend(String),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait ResultExt<T, E> {
    fn without_redirect<R>(self) -> Result<T, MaybeRedirect<R, E>>;
    fn add_redirect_context<D>(self, uri: RedirectUri) -> Result<T, MaybeRedirect<E, D>>;
    fn add_state_context(self, state: &Option<String>) -> Result<T, WithState<E>>;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn without_redirect<R>(self) -> Result<T, MaybeRedirect<R, E>> {
        self.map_err(MaybeRedirect::Direct)
    }

    fn add_redirect_context<D>(self, uri: RedirectUri) -> Result<T, MaybeRedirect<E, D>> {
        self.map_err(|e| MaybeRedirect::Redirected(Redirect::new(uri, e)))
    }

    fn add_state_context(self, state: &Option<String>) -> Result<T, WithState<E>> {
        self.map_err(|e| WithState {
            state: state.clone(),
            inner: e,
        })
    }
}
