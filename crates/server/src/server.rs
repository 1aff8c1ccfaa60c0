//! HTTPS server lifecycle and connection handling.

use crate::cors;
use crate::files::StaticFiles;
use crate::handlers;
use anyhow::Context;
use common::ServerConfig;
use common::tls::{load_certificate_chain, server_tls_config};
use http::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info};

/// A running HTTPS static file server.
///
/// Owns the listening socket (through the accept task) and the TLS context.
/// Dropping it without calling [`Server::shutdown`] also stops the accept loop.
pub struct Server {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

impl Server {
    /// Load the certificate pair, bind the listener and start accepting.
    pub async fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let chain = load_certificate_chain(&config.cert_path, &config.key_path)?;
        let acceptor = TlsAcceptor::from(server_tls_config(chain)?);

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.bind_addr))?;
        let local_addr = listener.local_addr()?;

        let files = Arc::new(StaticFiles::new(config.root.clone()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            "HTTPS server listening on {}, serving {}",
            local_addr,
            config.root.display()
        );

        let accept_task = tokio::spawn(accept_loop(
            listener,
            acceptor,
            files,
            config.keep_alive,
            shutdown_rx,
        ));

        Ok(Self {
            local_addr,
            shutdown_tx,
            accept_task,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and close the listener.
    ///
    /// Connections already accepted run to completion.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.shutdown_tx.send(true);
        self.accept_task.await.context("accept loop panicked")?;
        info!("Listener on {} closed", self.local_addr);
        Ok(())
    }
}

async fn accept_loop(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    files: Arc<StaticFiles>,
    keep_alive: bool,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!("Shutdown requested");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, remote)) => {
                        debug!("New connection from {}", remote);
                        let acceptor = acceptor.clone();
                        let files = Arc::clone(&files);

                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(stream, acceptor, files, keep_alive).await
                            {
                                debug!("Connection from {} ended: {:?}", remote, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {:?}", e);
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    acceptor: TlsAcceptor,
    files: Arc<StaticFiles>,
    keep_alive: bool,
) -> anyhow::Result<()> {
    let tls_stream = acceptor
        .accept(stream)
        .await
        .context("TLS handshake failed")?;

    let service = service_fn(move |req: Request<Incoming>| {
        let files = Arc::clone(&files);
        async move { Ok::<_, Infallible>(cors::decorate(handlers::handle(req, &files).await)) }
    });

    http1::Builder::new()
        .timer(TokioTimer::new())
        .keep_alive(keep_alive)
        .serve_connection(TokioIo::new(tls_stream), service)
        .await
        .context("HTTP connection error")?;

    Ok(())
}
