use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{Instrument, debug, error, info, info_span};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::server::pool::WorkerPool;

/// Pause after a failed accept, so descriptor exhaustion doesn't spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The bound listening socket plus the pool its connections run on.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    pool: WorkerPool,
    config: Arc<Config>,
    accepted: Arc<AtomicU64>,
}

impl Server {
    pub async fn bind(config: Arc<Config>) -> anyhow::Result<Self> {
        let addr = &config.server.listen_addr;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        let pool = WorkerPool::new(config.server.workers);

        Ok(Self {
            listener,
            pool,
            config,
            accepted: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Running count of accepted connections; also the source of connection ids.
    pub fn accepted(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.accepted)
    }

    /// Accepts forever, handing each connection to the pool.
    ///
    /// Nothing is accepted while the pool is full. A failed accept is
    /// logged and the loop carries on.
    pub async fn run(self) -> anyhow::Result<()> {
        info!(
            addr = %self.local_addr()?,
            root = %self.config.static_files.root.display(),
            workers = self.pool.size(),
            "Listening"
        );

        loop {
            // Hold a slot before accepting, so waiting clients stay in the
            // kernel backlog instead of becoming open sockets here.
            let slot = self.pool.reserve().await.context("worker pool closed")?;

            let (socket, peer) = loop {
                match self.listener.accept().await {
                    Ok(accepted) => break accepted,
                    Err(e) => {
                        error!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            };

            let id = self.accepted.fetch_add(1, Ordering::Relaxed) + 1;
            let span = info_span!("conn", id, %peer);
            debug!(parent: &span, active = self.pool.active(), "accepted");

            let conn = Connection::new(socket, Arc::clone(&self.config));
            slot.spawn(conn.run().instrument(span));
        }
    }
}
