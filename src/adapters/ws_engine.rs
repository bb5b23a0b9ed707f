//! WebSocket engine — `tungstenite` over the dispatcher's connections.
//!
//! ```text
//!  dispatch ──register──▶ handshake ──▶ client thread ──▶ WsHandler
//!                                          ▲
//!  telemetry / callbacks ──broadcast──▶ per-client outbound queue
//! ```
//!
//! Each client thread alternates between draining its outbound queue
//! and a short-timeout read.  Broadcasting only enqueues, so it is safe
//! from inside a handler callback.  Outbound queues are bounded and
//! writes carry a timeout: a peer that stops reading loses messages, then
//! its session, and never pins a registry slot.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tungstenite::{Message, WebSocket};

use crate::app::events::{ClientId, DisconnectReason, Frame};
use crate::app::ports::{Broadcaster, WsEngine, WsHandler};
use crate::drivers::task_pin::{self, Core};
use crate::error::CommsError;
use crate::net::Connection;

/// How long a server-initiated close waits for the peer's close reply.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Messages buffered per client before broadcasts to it are dropped.
pub const OUTBOUND_QUEUE_DEPTH: usize = 16;

const CLIENT_TASK_PRIORITY: u8 = 5;
const CLIENT_TASK_STACK_KB: usize = 8;

// ── Replay stream ─────────────────────────────────────────────

/// Serves already-consumed bytes before reading from the stream again.
///
/// The dispatcher has read the upgrade request; the handshake needs to
/// see it once more.
pub struct Replay<S> {
    prefix: Vec<u8>,
    pos: usize,
    inner: S,
}

impl<S> Replay<S> {
    pub fn new(prefix: &[u8], inner: S) -> Self {
        Self {
            prefix: prefix.to_vec(),
            pos: 0,
            inner,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S: Read> Read for Replay<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos < self.prefix.len() {
            let n = buf.len().min(self.prefix.len() - self.pos);
            buf[..n].copy_from_slice(&self.prefix[self.pos..self.pos + n]);
            self.pos += n;
            if self.pos == self.prefix.len() {
                self.prefix = Vec::new();
                self.pos = 0;
            }
            return Ok(n);
        }
        self.inner.read(buf)
    }
}

impl<S: Write> Write for Replay<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ── Client registry ───────────────────────────────────────────

struct Slot {
    id: ClientId,
    tx: SyncSender<String>,
    /// Set by [`WsServer::disconnect`]; kept out of the queue so a full
    /// queue cannot swallow it.
    close: Arc<AtomicBool>,
}

struct Shared {
    slots: Mutex<Vec<Slot>>,
    max_clients: usize,
    poll_interval: Duration,
    handshake_timeout: Duration,
    send_timeout: Duration,
}

impl Shared {
    fn slots(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lowest free id, or `None` when the registry is full.
    fn insert(&self, tx: SyncSender<String>, close: Arc<AtomicBool>) -> Option<ClientId> {
        let mut slots = self.slots();
        if slots.len() >= self.max_clients {
            return None;
        }
        let id = (0..=ClientId::MAX).find(|id| slots.iter().all(|s| s.id != *id))?;
        slots.push(Slot { id, tx, close });
        Some(id)
    }

    fn remove(&self, id: ClientId) {
        self.slots().retain(|s| s.id != id);
    }
}

impl Broadcaster for Shared {
    fn broadcast_text(&self, text: &str) -> usize {
        self.slots()
            .iter()
            .filter(|slot| match slot.tx.try_send(text.to_owned()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    debug!("ws[{}]: outbound queue full, message dropped", slot.id);
                    false
                }
                Err(TrySendError::Disconnected(_)) => false,
            })
            .count()
    }
}

/// Registry plus per-client tasks.  Cheap to share behind an `Arc`.
pub struct WsServer {
    shared: Arc<Shared>,
}

impl WsServer {
    pub fn new(
        max_clients: u8,
        poll_interval_ms: u32,
        handshake_timeout_ms: u32,
        send_timeout_ms: u32,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                slots: Mutex::new(Vec::new()),
                max_clients: usize::from(max_clients),
                poll_interval: Duration::from_millis(u64::from(poll_interval_ms)),
                handshake_timeout: Duration::from_millis(u64::from(handshake_timeout_ms)),
                send_timeout: Duration::from_millis(u64::from(send_timeout_ms)),
            }),
        }
    }

    pub fn client_count(&self) -> usize {
        self.shared.slots().len()
    }

    /// Server-initiated close.  The handler sees `DisconnectReason::Internal`.
    pub fn disconnect(&self, id: ClientId) -> bool {
        let slots = self.shared.slots();
        let Some(slot) = slots.iter().find(|s| s.id == id) else {
            return false;
        };
        slot.close.store(true, Ordering::Release);
        true
    }

    fn try_register<C: Connection>(
        &self,
        conn: C,
        request: &[u8],
        path: &'static str,
        handler: Arc<dyn WsHandler>,
    ) -> Result<ClientId, CommsError> {
        if self.client_count() >= self.shared.max_clients {
            conn.close();
            return Err(CommsError::TooManyClients);
        }

        let handshake = Some(self.shared.handshake_timeout);
        conn.set_recv_timeout(handshake)
            .and_then(|()| conn.set_send_timeout(handshake))
            .map_err(|_| CommsError::HandshakeFailed)?;
        let ws = tungstenite::accept(Replay::new(request, conn)).map_err(|e| {
            warn!("ws: handshake on {} failed: {}", path, e);
            CommsError::HandshakeFailed
        })?;
        let stream = ws.get_ref().get_ref();
        stream
            .set_recv_timeout(Some(self.shared.poll_interval))
            .and_then(|()| stream.set_send_timeout(Some(self.shared.send_timeout)))
            .map_err(|_| CommsError::HandshakeFailed)?;

        let (tx, rx) = mpsc::sync_channel(OUTBOUND_QUEUE_DEPTH);
        let close = Arc::new(AtomicBool::new(false));
        let id = self
            .shared
            .insert(tx, Arc::clone(&close))
            .ok_or(CommsError::TooManyClients)?;
        handler.on_connect(id);

        let shared = Arc::clone(&self.shared);
        let task_handler = Arc::clone(&handler);
        let spawned = task_pin::spawn_on_core(
            Core::Pro,
            CLIENT_TASK_PRIORITY,
            CLIENT_TASK_STACK_KB,
            "ws-client\0",
            move || client_task(&shared, id, ws, &rx, &close, task_handler.as_ref()),
        );
        if let Err(e) = spawned {
            warn!("ws[{}]: cannot start client task: {}", id, e);
            self.shared.remove(id);
            handler.on_disconnect(id, DisconnectReason::Internal);
            return Err(CommsError::TaskSpawnFailed);
        }
        Ok(id)
    }
}

impl Broadcaster for WsServer {
    fn broadcast_text(&self, text: &str) -> usize {
        self.shared.broadcast_text(text)
    }
}

impl<C: Connection> WsEngine<C> for WsServer {
    fn register(&self, conn: C, request: &[u8], path: &'static str, handler: Arc<dyn WsHandler>) {
        let peer = conn.peer_label();
        match self.try_register(conn, request, path, handler) {
            Ok(id) => info!("ws[{}]: registered {} on {}", id, peer, path),
            Err(e) => warn!("ws: {} not registered: {}", peer, e),
        }
    }
}

// ── Client task ───────────────────────────────────────────────

fn client_task<S: Read + Write>(
    shared: &Shared,
    id: ClientId,
    mut ws: WebSocket<S>,
    rx: &Receiver<String>,
    close: &AtomicBool,
    handler: &dyn WsHandler,
) {
    let mut closing: Option<Instant> = None;

    let reason = 'session: loop {
        if closing.is_none() && close.load(Ordering::Acquire) {
            // May time out against a stalled peer; CLOSE_GRACE bounds the rest.
            let _ = ws.close(None);
            closing = Some(Instant::now());
        }

        if closing.is_none() {
            while let Ok(text) = rx.try_recv() {
                if let Err(e) = ws.send(Message::Text(text)) {
                    warn!("ws[{}]: send failed: {}", id, e);
                    break 'session closed_or_error(false, &e);
                }
            }
        }

        match ws.read() {
            Ok(Message::Text(text)) => handler.on_message(id, Frame::Text(text.as_bytes()), shared),
            Ok(Message::Binary(data)) => handler.on_message(id, Frame::Binary(&data), shared),
            Ok(Message::Ping(data)) => handler.on_message(id, Frame::Ping(&data), shared),
            Ok(Message::Pong(data)) => handler.on_message(id, Frame::Pong(&data), shared),
            Ok(Message::Close(_)) => {
                // Let tungstenite send the close reply.
                let _ = ws.flush();
                break if closing.is_some() {
                    DisconnectReason::Internal
                } else {
                    DisconnectReason::Graceful
                };
            }
            Ok(Message::Frame(_)) => {}
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                if closing.is_some_and(|t| t.elapsed() > CLOSE_GRACE) {
                    break DisconnectReason::Internal;
                }
            }
            Err(e) => break closed_or_error(closing.is_some(), &e),
        }
    };

    shared.remove(id);
    handler.on_disconnect(id, reason);
}

fn closed_or_error(closing: bool, e: &tungstenite::Error) -> DisconnectReason {
    match e {
        _ if closing => DisconnectReason::Internal,
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            DisconnectReason::Graceful
        }
        _ => DisconnectReason::Error,
    }
}
