use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{event, Level};
use warp::Reply;

use crate::auth::{Client, Consent, IncomingRequest, Redirect, Store};
use crate::core::models::{AuthCodeState, ClientRegistration};
use crate::core::types::{AuthCode, ClientId, HashedAuthCode, RedirectUri, Scope};
use crate::provider::error::Error;
use crate::provider::redirect::{self, RedirectMismatch};
use crate::util::hash::hash_code;
use crate::util::random::FromRandom;

type UserId = Arc<dyn Fn(&IncomingRequest) -> Option<String> + Send + Sync>;

/// How long an issued code can be taken.
pub const CODE_LIFETIME: Duration = Duration::from_secs(10 * 60);

/// In-memory client registry.
///
/// Clients are registered with [`MemoryStore::add_client`] and users'
/// prior approvals are recorded with [`MemoryStore::authorize_client`].
pub struct MemoryStore {
    user_id: UserId,
    consent_uri: Option<RedirectUri>,
    code_lifetime: Duration,
    clients: RwLock<HashMap<ClientId, Arc<MemoryClient>>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryStore {{ ... }}")
    }
}

impl MemoryStore {
    pub fn new(
        user_id: impl Fn(&IncomingRequest) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            user_id: Arc::new(user_id),
            consent_uri: None,
            code_lifetime: CODE_LIFETIME,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Identifies users by the value of `header`.
    pub fn from_header(header: impl Into<String>) -> Self {
        let header = header.into();
        Self::new(move |req| req.header(&header).map(ToString::to_string))
    }

    /// Requests without prior approval are sent to `uri` instead of being denied.
    pub fn with_consent_uri(mut self, uri: RedirectUri) -> Self {
        self.consent_uri = Some(uri);
        self
    }

    /// Applies to clients added afterwards.
    pub fn with_code_lifetime(mut self, lifetime: Duration) -> Self {
        self.code_lifetime = lifetime;
        self
    }

    pub async fn add_client(&self, registration: ClientRegistration) {
        let client = MemoryClient {
            id: registration.client_id.clone(),
            redirect_uri: registration.redirect_uri,
            scope: registration.scope,
            user_id: Arc::clone(&self.user_id),
            consent_uri: self.consent_uri.clone(),
            code_lifetime: self.code_lifetime,
            grants: Mutex::new(registration.grants),
            codes: Mutex::new(HashMap::new()),
        };

        event!(Level::DEBUG, client_id = ?client.id, "Registering client");
        self.clients
            .write()
            .await
            .insert(registration.client_id, Arc::new(client));
    }

    /// Records that `user` approved `scope` for the client. Returns false
    /// for unknown clients.
    pub async fn authorize_client(&self, client_id: &ClientId, user: &str, scope: &str) -> bool {
        let client = self.clients.read().await.get(client_id).cloned();
        match client {
            Some(client) => {
                client.authorize(user, Scope::from_delimited_parts(scope)).await;
                true
            }
            None => false,
        }
    }

    /// Removes an issued code and returns the state bound to it.
    pub async fn take_code(
        &self,
        client_id: &ClientId,
        code: &AuthCode,
    ) -> Option<AuthCodeState> {
        let client = self.clients.read().await.get(client_id).cloned()?;
        client.take_code(code).await
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Client = Arc<MemoryClient>;

    async fn get_client(
        &self,
        _req: &IncomingRequest,
        client_id: &ClientId,
    ) -> Result<Option<Self::Client>, Error> {
        Ok(self.clients.read().await.get(client_id).cloned())
    }
}

pub struct MemoryClient {
    id: ClientId,
    redirect_uri: RedirectUri,
    scope: Scope,
    user_id: UserId,
    consent_uri: Option<RedirectUri>,
    code_lifetime: Duration,
    grants: Mutex<HashMap<String, Scope>>,
    codes: Mutex<HashMap<HashedAuthCode, IssuedCode>>,
}

struct IssuedCode {
    state: AuthCodeState,
    expiry: SystemTime,
}

impl IssuedCode {
    fn is_live(&self, now: SystemTime) -> bool {
        self.expiry > now
    }
}

impl MemoryClient {
    async fn authorize(&self, user: &str, scope: Scope) {
        self.grants.lock().await.insert(user.to_string(), scope);
    }

    async fn take_code(&self, code: &AuthCode) -> Option<AuthCodeState> {
        let issued = self.codes.lock().await.remove(&hash_code(code))?;
        if issued.is_live(SystemTime::now()) {
            Some(issued.state)
        } else {
            None
        }
    }

    async fn is_granted(&self, user: Option<&str>, scope: &Scope) -> bool {
        match user {
            Some(user) => self
                .grants
                .lock()
                .await
                .get(user)
                .map_or(false, |granted| granted.contains_all(scope)),
            None => false,
        }
    }

    fn consent_redirect(
        &self,
        req: &IncomingRequest,
        consent_uri: &RedirectUri,
        scope: &Scope,
    ) -> Consent {
        #[derive(serde::Serialize)]
        struct ConsentRef<'a> {
            client_id: &'a ClientId,
            scope: &'a Scope,
            #[serde(skip_serializing_if = "Option::is_none")]
            state: Option<&'a str>,
        }

        let params = ConsentRef {
            client_id: &self.id,
            scope,
            state: req.param("state"),
        };
        let response = Redirect::new(consent_uri.clone(), params).into_response();
        Consent::Handled(response)
    }
}

#[async_trait]
impl Client for MemoryClient {
    async fn consent(&self, req: &IncomingRequest, scope: &Scope) -> Consent {
        if scope.is_empty() {
            return Consent::Granted;
        }

        if !self.scope.contains_all(scope) {
            event!(Level::DEBUG, client_id = ?self.id, ?scope, "Scope not registered for client");
            return Consent::Denied;
        }

        let user = (self.user_id)(req);
        if self.is_granted(user.as_deref(), scope).await {
            return Consent::Granted;
        }

        match &self.consent_uri {
            Some(uri) => self.consent_redirect(req, uri, scope),
            None => Consent::Denied,
        }
    }

    async fn redirect_uri(
        &self,
        _req: &IncomingRequest,
        candidate: Option<&RedirectUri>,
    ) -> Result<RedirectUri, RedirectMismatch> {
        redirect::resolve(candidate, &self.redirect_uri)
    }

    async fn issue_code(
        &self,
        _req: &IncomingRequest,
        state: AuthCodeState,
    ) -> Result<AuthCode, Error> {
        let now = SystemTime::now();
        let expiry = now
            .checked_add(self.code_lifetime)
            .ok_or_else(|| Error::Backend("code expiry out of range".to_string()))?;

        let code = AuthCode::from_random();
        let mut codes = self.codes.lock().await;
        codes.retain(|_, issued| issued.is_live(now));
        codes.insert(hash_code(&code), IssuedCode { state, expiry });
        Ok(code)
    }
}
