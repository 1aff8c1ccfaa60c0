//! Static HTTPS Server
//!
//! Serves the current directory over TLS with permissive CORS headers:
//! - TLS termination with rustls, using `cert.pem`/`key.pem` from disk
//! - HTTP/1.1 handling with hyper
//! - `.js` files always served as `application/javascript`

mod cors;
mod files;
mod handlers;
mod response;
mod server;

use common::ServerConfig;
use common::tls::install_crypto_provider;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Install the AWS LC crypto provider
    install_crypto_provider();

    let config = ServerConfig::default();
    info!("Starting HTTPS server on {}", config.bind_addr);

    let server = server::Server::start(config).await?;
    println!("Serving HTTPS on {}", server.local_addr());

    tokio::signal::ctrl_c().await?;

    println!("\nShutting down server");
    server.shutdown().await
}
