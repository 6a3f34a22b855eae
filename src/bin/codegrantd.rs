use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use codegrant::http::server::Server;
use codegrant::provider::{error::Error, OAuth2Provider};
use codegrant::util::cli::{build_store, Options};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Options::parse();
    let store = build_store(&opts).await?;
    let provider = Arc::new(OAuth2Provider::new(store));

    let server = Server::new(provider, opts.authorize_path, opts.token_path);
    server.serve(opts.bind_address).await;
    Ok(())
}
