//! TCP listener and per-connection dispatch.
//!
//! Binds the configured endpoint, accepts connections, and spawns one
//! handler task per connection into a supervised [`JoinSet`]. A slow or
//! failing handler never blocks the accept loop or any other handler;
//! per-connection faults are reaped and logged, never propagated.

use crate::config::Config;
use crate::connection::Connection;
use crate::delay::ProcessingDelay;
use crate::handler::ConnectionHandler;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info};

/// Server instance bound to a listening endpoint.
pub struct Server {
    listener: TcpListener,
    read_cap: usize,
    delay: ProcessingDelay,
}

impl Server {
    /// Bind the listening socket.
    ///
    /// Bind-level faults (address in use, permission denied) surface
    /// here; nothing later in the server's life is fatal to it except
    /// the listening socket itself faulting.
    pub async fn bind(config: &Config) -> io::Result<Self> {
        let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
        info!(address = %listener.local_addr()?, "server listening");
        Ok(Self {
            listener,
            read_cap: config.read_cap,
            delay: config.delay,
        })
    }

    /// The address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept and serve connections until the listening socket faults.
    pub async fn serve_forever(self) -> io::Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Accept and serve connections until `shutdown` resolves, then
    /// stop accepting and wait for in-flight connections to finish.
    pub async fn serve_with_shutdown(self, shutdown: impl Future<Output = ()>) -> io::Result<()> {
        let mut handlers = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = Connection::accept_from(&self.listener) => match accepted {
                    Ok(conn) => {
                        debug!(peer = %conn.peer(), "connection accepted");
                        let handler = ConnectionHandler::new(conn, self.read_cap, self.delay);
                        handlers.spawn(handler.run());
                    }
                    // Accept faults are scoped to the rejected
                    // connection; keep serving.
                    Err(e) => error!(error = %e, "failed to accept connection"),
                },

                Some(finished) = handlers.join_next() => report_finished(finished),

                _ = &mut shutdown => break,
            }
        }

        info!(in_flight = handlers.len(), "stopped accepting, draining live connections");
        while let Some(finished) = handlers.join_next().await {
            report_finished(finished);
        }
        Ok(())
    }
}

fn report_finished(result: Result<io::Result<()>, JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(error = %e, "connection ended with error"),
        Err(e) => error!(error = %e, "connection task failed"),
    }
}
