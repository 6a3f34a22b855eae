use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::core::models::ClientRegistration;
use crate::core::types::RedirectUri;
use crate::db::MemoryStore;
use crate::provider::error::Error;

#[derive(Debug, Parser)]
#[clap(
    name = "codegrantd",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS")
)]
pub struct Options {
    /// Address to listen on.
    #[clap(long, env = "BIND_ADDRESS", default_value = "127.0.0.1:8001")]
    pub bind_address: SocketAddr,
    #[clap(long, env = "AUTHORIZE_PATH", default_value = "/authorize")]
    pub authorize_path: String,
    #[clap(long, env = "TOKEN_PATH", default_value = "/token")]
    pub token_path: String,
    /// JSON list of client registrations.
    #[clap(long, env = "CLIENTS_FILE")]
    pub clients_file: PathBuf,
    /// Header carrying the authenticated user's id.
    #[clap(long, env = "USER_HEADER", default_value = "x-user-id")]
    pub user_header: String,
    /// Where users are sent to approve scopes they have not yet granted.
    #[clap(long, env = "CONSENT_URI")]
    pub consent_uri: Option<String>,
}

pub fn load_clients(path: &Path) -> Result<Vec<ClientRegistration>, Error> {
    let contents = std::fs::read_to_string(path)?;
    let clients = serde_json::from_str(&contents)?;
    Ok(clients)
}

pub async fn build_store(opts: &Options) -> Result<MemoryStore, Error> {
    let mut store = MemoryStore::from_header(opts.user_header.clone());
    if let Some(uri) = &opts.consent_uri {
        store = store.with_consent_uri(RedirectUri(uri.clone()));
    }

    for client in load_clients(&opts.clients_file)? {
        store.add_client(client).await;
    }
    Ok(store)
}
