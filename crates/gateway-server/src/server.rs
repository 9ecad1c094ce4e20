//! HTTP server lifecycle.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{routes::create_router, shutdown::shutdown_signal, state::AppState};

/// Server listen settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `host:port` to bind
    pub bind_address: String,
    /// How long open connections (including streams) may finish after a
    /// shutdown signal
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Settings from the gateway configuration
    #[must_use]
    pub fn from_config(config: &gateway_config::ServerConfig) -> Self {
        Self {
            bind_address: config.bind_address(),
            shutdown_timeout: config.shutdown_timeout,
        }
    }
}

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listen address could not be bound
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Address
        address: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an I/O error
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// The gateway HTTP server
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a server
    #[must_use]
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind and serve until Ctrl+C or SIGTERM
    ///
    /// # Errors
    /// Returns error if binding fails or the server stops with an I/O error
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|source| ServerError::Bind {
                address: self.config.bind_address.clone(),
                source,
            })?;

        self.serve(listener, async {
            let signal = shutdown_signal().await;
            info!(signal, "Shutdown signal received");
        })
        .await
    }

    /// Serve on an existing listener until `shutdown` completes, then give
    /// open connections up to the shutdown timeout to finish
    ///
    /// # Errors
    /// Returns error if the server stops with an I/O error
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local: Option<SocketAddr> = listener.local_addr().ok();
        info!(address = ?local, "Gateway listening");

        let (fired_tx, mut fired_rx) = watch::channel(false);
        let signal = async move {
            shutdown.await;
            let _ = fired_tx.send(true);
        };

        let app = create_router(self.state);
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .into_future();

        let grace = self.config.shutdown_timeout;
        let deadline = async move {
            if fired_rx.wait_for(|fired| *fired).await.is_err() {
                return std::future::pending().await;
            }
            tokio::time::sleep(grace).await;
        };

        tokio::select! {
            result = server => {
                result?;
                info!("Gateway stopped");
            }
            () = deadline => {
                warn!(timeout = ?grace, "Shutdown timeout elapsed, dropping open connections");
            }
        }

        Ok(())
    }
}
