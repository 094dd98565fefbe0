//! Per-client WebSocket session.
//!
//! One task per accepted connection runs [`handle_connection`]:
//!
//! 1. Register the session (`Connecting`).
//! 2. Complete the WebSocket handshake (`Active`).
//! 3. Loop: read a frame, decode it, dispatch it on the blocking pool, and
//!    write exactly one response.  A transport ping goes out every
//!    `ping_interval`; a missing pong after `ping_timeout` ends the session.
//!    Time spent dispatching does not count against `ping_timeout`.
//! 4. On peer close, transport error, keepalive expiry or a shutdown request,
//!    send a close frame (`Closing`), leave the registry and drop the socket
//!    (`Closed`).
//!
//! Frames within a session are handled strictly one after another, so
//! responses come back in the order their requests arrived.  Sessions share
//! nothing but the [`Dispatcher`] and the registry.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{interval_at, sleep_until, timeout, Instant, MissedTickBehavior};
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    WebSocketStream,
};
use tracing::{debug, error, info, warn};
use zenflow_core::{decode_command, decode_command_bytes, encode_response, Command, DecodeError, Response};

use crate::application::dispatcher::Dispatcher;
use crate::domain::config::ServerConfig;
use crate::domain::session::{SessionId, SessionState};
use crate::infrastructure::registry::SessionRegistry;

/// Message sent back when a frame is not valid JSON.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON format";

/// Errors that end a session abnormally.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("WebSocket handshake failed: {0}")]
    Handshake(#[source] WsError),

    #[error("WebSocket handshake did not complete within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    #[error("no pong received within {0:?}")]
    KeepaliveExpired(Duration),
}

/// Why an active session stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    PeerClosed,
    StreamEnded,
    ShutdownRequested,
}

/// What woke the session loop.
enum SessionEvent {
    Frame(Option<Result<WsMessage, WsError>>),
    PingDue,
    PongOverdue,
    CloseRequested,
}

/// Everything a session task needs from the server.
#[derive(Clone)]
pub struct SessionContext {
    pub dispatcher: Arc<Dispatcher>,
    pub config: Arc<ServerConfig>,
    pub registry: SessionRegistry,
}

/// Tracks one session's lifecycle and mirrors it into the registry.
struct Session {
    id: SessionId,
    state: SessionState,
    registry: SessionRegistry,
}

impl Session {
    fn new(id: SessionId, registry: SessionRegistry) -> Self {
        Self {
            id,
            state: SessionState::Connecting,
            registry,
        }
    }

    async fn transition(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            error!(
                "session {}: illegal transition {} -> {next}",
                self.id, self.state
            );
            return;
        }
        debug!("session {}: {} -> {next}", self.id, self.state);
        self.state = next;
        if next.is_terminal() {
            self.registry.remove(&self.id).await;
        } else {
            self.registry.set_state(&self.id, next).await;
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        // Only reached when the task unwinds or is cancelled before `Closed`;
        // the registry entry must still go so shutdown does not wait on it.
        warn!("session {} dropped while {}; removing it", self.id, self.state);
        let registry = self.registry.clone();
        let id = self.id;
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                registry.remove(&id).await;
            });
        }
    }
}

// ── Per-connection entry point ────────────────────────────────────────────────

/// Runs a session for an accepted TCP connection until it is closed.
///
/// The caller must already have inserted `peer` into the registry and pass
/// the close receiver it got back; the session removes itself on exit.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    close_rx: watch::Receiver<bool>,
    ctx: SessionContext,
) {
    let id = SessionId::new(peer);
    let mut session = Session::new(id, ctx.registry.clone());

    match run_session(stream, &mut session, close_rx, &ctx).await {
        Ok(reason) => info!("session {id} closed ({reason:?})"),
        Err(e) => warn!("session {id} closed with error: {e}"),
    }

    if session.state != SessionState::Closing {
        session.transition(SessionState::Closing).await;
    }
    session.transition(SessionState::Closed).await;
}

async fn run_session(
    stream: TcpStream,
    session: &mut Session,
    mut close_rx: watch::Receiver<bool>,
    ctx: &SessionContext,
) -> Result<CloseReason, TransportError> {
    // The handshake is bounded by the keepalive timeout so a client that
    // opens TCP and never upgrades cannot hold a slot forever.
    let handshake_limit = ctx.config.ping_timeout;
    let mut ws = timeout(handshake_limit, accept_async(stream))
        .await
        .map_err(|_| TransportError::HandshakeTimeout(handshake_limit))?
        .map_err(TransportError::Handshake)?;

    session.transition(SessionState::Active).await;
    info!("session {} established", session.id);

    let outcome = run_active(&mut ws, &session.id, &mut close_rx, ctx).await;

    session.transition(SessionState::Closing).await;
    if !matches!(outcome, Err(TransportError::WebSocket(_))) {
        // Best effort: the peer may already be gone.
        match timeout(ctx.config.close_timeout, ws.close(None)).await {
            Ok(Ok(())) | Ok(Err(WsError::ConnectionClosed)) | Ok(Err(WsError::AlreadyClosed)) => {}
            Ok(Err(e)) => debug!("session {}: close handshake failed: {e}", session.id),
            Err(_) => debug!("session {}: close handshake timed out", session.id),
        }
    }
    outcome
}

// ── Active loop ───────────────────────────────────────────────────────────────

async fn run_active<S>(
    ws: &mut WebSocketStream<S>,
    id: &SessionId,
    close_rx: &mut watch::Receiver<bool>,
    ctx: &SessionContext,
) -> Result<CloseReason, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ping_interval = ctx.config.ping_interval;
    let ping_timeout = ctx.config.ping_timeout;
    let mut ping_ticker = interval_at(Instant::now() + ping_interval, ping_interval);
    ping_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pong_deadline: Option<Instant> = None;

    loop {
        if *close_rx.borrow() {
            return Ok(CloseReason::ShutdownRequested);
        }

        let event = tokio::select! {
            _ = close_rx.changed() => SessionEvent::CloseRequested,
            frame = ws.next() => SessionEvent::Frame(frame),
            _ = ping_ticker.tick() => SessionEvent::PingDue,
            _ = sleep_until(pong_deadline.unwrap_or_else(Instant::now)), if pong_deadline.is_some() => {
                SessionEvent::PongOverdue
            }
        };

        match event {
            SessionEvent::CloseRequested => return Ok(CloseReason::ShutdownRequested),

            SessionEvent::PingDue => {
                // Only one ping in flight; the deadline covers it.
                if pong_deadline.is_none() {
                    ws.send(WsMessage::Ping(Vec::new())).await?;
                    pong_deadline = Some(Instant::now() + ping_timeout);
                }
            }

            SessionEvent::PongOverdue => {
                warn!("session {id}: keepalive expired");
                return Err(TransportError::KeepaliveExpired(ping_timeout));
            }

            SessionEvent::Frame(None) => return Ok(CloseReason::StreamEnded),

            SessionEvent::Frame(Some(Err(e))) => {
                return match e {
                    WsError::ConnectionClosed | WsError::AlreadyClosed | WsError::Protocol(_) => {
                        debug!("session {id}: transport ended: {e}");
                        Ok(CloseReason::PeerClosed)
                    }
                    other => Err(TransportError::WebSocket(other)),
                };
            }

            SessionEvent::Frame(Some(Ok(msg))) => match msg {
                WsMessage::Text(text) => {
                    let response =
                        timed_dispatch(decode_command(&text), id, ctx, &mut pong_deadline).await;
                    send_response(ws, response, id).await?;
                }
                WsMessage::Binary(bytes) => {
                    let response =
                        timed_dispatch(decode_command_bytes(&bytes), id, ctx, &mut pong_deadline)
                            .await;
                    send_response(ws, response, id).await?;
                }
                WsMessage::Pong(_) => {
                    pong_deadline = None;
                }
                WsMessage::Ping(_) => {
                    // tungstenite queues the pong reply and flushes it with
                    // the next read or write.
                    debug!("session {id}: ping from client");
                }
                WsMessage::Close(frame) => {
                    debug!("session {id}: close frame received: {frame:?}");
                    return Ok(CloseReason::PeerClosed);
                }
                WsMessage::Frame(_) => {}
            },
        }
    }
}

/// Processes a frame and moves any pending pong deadline back by the time
/// spent, since no frames (pongs included) are read while dispatching.
async fn timed_dispatch(
    decoded: Result<Command, DecodeError>,
    id: &SessionId,
    ctx: &SessionContext,
    pong_deadline: &mut Option<Instant>,
) -> Response {
    let started = Instant::now();
    let response = process_frame(decoded, id, ctx).await;
    if let Some(deadline) = pong_deadline.as_mut() {
        *deadline += started.elapsed();
    }
    response
}

/// Turns one decoded (or undecodable) frame into its response.
async fn process_frame(
    decoded: Result<Command, DecodeError>,
    id: &SessionId,
    ctx: &SessionContext,
) -> Response {
    match decoded {
        Ok(command) => {
            debug!(
                "session {id}: {} / {}",
                command.category(),
                command.action()
            );
            dispatch_blocking(Arc::clone(&ctx.dispatcher), command).await
        }
        Err(DecodeError::InvalidSyntax(e)) => {
            warn!("session {id}: invalid JSON: {e}");
            Response::error(INVALID_JSON_MESSAGE)
        }
        Err(DecodeError::MalformedCommand(e)) => {
            warn!("session {id}: malformed command: {e}");
            Response::error(format!("Malformed command: {e}"))
        }
    }
}

/// Runs the dispatcher on Tokio's blocking pool so injector animations do
/// not stall other sessions.
async fn dispatch_blocking(dispatcher: Arc<Dispatcher>, command: Command) -> Response {
    match tokio::task::spawn_blocking(move || dispatcher.dispatch(&command)).await {
        Ok(response) => response,
        Err(e) => {
            error!("dispatch task failed: {e}");
            Response::error(format!("Server error: {e}"))
        }
    }
}

async fn send_response<S>(
    ws: &mut WebSocketStream<S>,
    mut response: Response,
    id: &SessionId,
) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    response.restamp();
    let frame = match encode_response(&response) {
        Ok(frame) => frame,
        Err(e) => {
            error!("session {id}: failed to encode response: {e}");
            match encode_response(&Response::error(format!("Server error: {e}"))) {
                Ok(fallback) => fallback,
                Err(_) => return Ok(()),
            }
        }
    };
    ws.send(WsMessage::Text(frame)).await?;
    Ok(())
}
