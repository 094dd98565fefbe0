//! WebSocket server: listener, accept loop and shutdown.
//!
//! This module is responsible for:
//!
//! 1. Binding the TCP listener on the configured address.
//! 2. Starting network presence once the real port is known.
//! 3. Accepting connections and spawning one session task per client.
//! 4. On shutdown: refusing new connections, asking every session to close,
//!    waiting (bounded by `close_timeout`) for them to finish, and
//!    withdrawing the presence record.
//!
//! A failure to bind is fatal; a failure to advertise is logged and the
//! server keeps running.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tokio::task;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::application::dispatcher::Dispatcher;
use crate::application::injector::InputInjector;
use crate::domain::config::ServerConfig;
use crate::domain::session::SessionId;
use crate::infrastructure::presence::{PresenceService, PresenceStatus};
use crate::infrastructure::registry::SessionRegistry;
use crate::infrastructure::session::{handle_connection, SessionContext};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind WebSocket listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("listener has no local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// The Zenflow WebSocket server.
///
/// Share it behind an `Arc` so a signal handler can call
/// [`shutdown`](Self::shutdown) while [`listen`](Self::listen) runs.
pub struct Server {
    config: Arc<ServerConfig>,
    dispatcher: Arc<Dispatcher>,
    presence: Arc<Mutex<PresenceService>>,
    registry: SessionRegistry,
    shutdown_tx: watch::Sender<bool>,
}

impl Server {
    pub fn new(
        config: ServerConfig,
        injector: Arc<dyn InputInjector>,
        presence: PresenceService,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(injector, &config));
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config: Arc::new(config),
            dispatcher,
            presence: Arc::new(Mutex::new(presence)),
            registry: SessionRegistry::new(),
            shutdown_tx,
        }
    }

    /// Binds `addr` and serves until [`shutdown`](Self::shutdown).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is in use or not
    /// permitted.
    pub async fn listen(&self, addr: SocketAddr) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener).await
    }

    /// Serves connections from an already bound listener until
    /// [`shutdown`](Self::shutdown).
    ///
    /// Tests bind port 0 themselves and pass the listener in.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::LocalAddr`] if the listener's address cannot be
    /// read.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;
        info!("Zenflow server listening on ws://{local_addr}");

        self.start_presence(local_addr.port()).await;

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let ctx = SessionContext {
            dispatcher: Arc::clone(&self.dispatcher),
            config: Arc::clone(&self.config),
            registry: self.registry.clone(),
        };

        while !*shutdown_rx.borrow() {
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!("new connection from {peer}");
                        let close_rx = self.registry.insert(SessionId::new(peer)).await;
                        let ctx = ctx.clone();
                        tokio::spawn(async move {
                            handle_connection(stream, peer, close_rx, ctx).await;
                        });
                    }
                    Err(e) => {
                        // Transient (e.g. out of file descriptors); keep accepting.
                        error!("accept error: {e}");
                    }
                },
            }
        }

        drop(listener);
        info!("accept loop stopped");
        self.drain().await;
        Ok(())
    }

    /// Stops accepting, asks every session to close and withdraws presence.
    ///
    /// Returns once the request is issued; [`listen`](Self::listen) returns
    /// after sessions have drained.  Safe to call more than once.
    pub async fn shutdown(&self) {
        if self.shutdown_tx.send_replace(true) {
            return;
        }
        info!("shutdown requested");
        let signalled = self.registry.close_all().await;
        info!("asked {signalled} session(s) to close");
        self.stop_presence().await;
    }

    /// Number of sessions that have not reached `Closed`.
    pub async fn active_sessions(&self) -> usize {
        self.registry.len().await
    }

    /// Ids of the live sessions.
    pub async fn session_ids(&self) -> Vec<SessionId> {
        self.registry.ids().await
    }

    pub async fn presence_status(&self) -> PresenceStatus {
        self.presence.lock().await.status()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    async fn drain(&self) {
        // Sessions accepted while shutdown was being requested still need
        // the signal.
        self.registry.close_all().await;
        let limit = self.config.close_timeout;
        if timeout(limit, self.registry.wait_empty()).await.is_err() {
            warn!(
                "{} session(s) still open after {limit:?}; abandoning them",
                self.registry.len().await
            );
        }
        self.stop_presence().await;
        info!("server stopped");
    }

    // Presence calls block on the responder, so they run on the blocking pool.

    async fn start_presence(&self, port: u16) {
        let presence = Arc::clone(&self.presence);
        match task::spawn_blocking(move || presence.blocking_lock().start(port)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("network presence unavailable, clients must connect by address: {e}")
            }
            Err(e) => error!("presence start task failed: {e}"),
        }
    }

    async fn stop_presence(&self) {
        let presence = Arc::clone(&self.presence);
        if let Err(e) = task::spawn_blocking(move || presence.blocking_lock().stop()).await {
            error!("presence stop task failed: {e}");
        }
    }
}
