//! Dispatch loop — one read, one route, one outcome per connection.
//!
//! Each dequeued connection gets a bounded receive, is classified by
//! [`router::classify`](super::router::classify), and then either
//! answered and closed, handed to the WebSocket engine, or closed
//! without a reply.  Nothing is retried.

use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::app::ports::{WsEngine, WsHandler};

use super::queue::ConnectionQueue;
use super::router::{self, Route, Status};
use super::transport::Connection;

/// Size of the single initial read.
pub const REQUEST_BUF_LEN: usize = 1536;

/// Path the WebSocket endpoint is registered under.
pub const WS_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A canned response was written and the connection closed.
    Served(Status),
    /// Ownership moved to the WebSocket engine.
    HandedOff,
    /// Closed without a response.
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Timeout,
    ReadError,
    Empty,
    Unrecognized,
}

pub struct Dispatcher<E> {
    engine: Arc<E>,
    handler: Arc<dyn WsHandler>,
    recv_timeout: Duration,
}

impl<E> Dispatcher<E> {
    pub fn new(engine: Arc<E>, handler: Arc<dyn WsHandler>, recv_timeout_ms: u32) -> Self {
        Self {
            engine,
            handler,
            recv_timeout: Duration::from_millis(u64::from(recv_timeout_ms)),
        }
    }

    /// Handle one connection to completion (or hand-off).
    pub fn serve<C>(&self, mut conn: C) -> DispatchOutcome
    where
        C: Connection,
        E: WsEngine<C>,
    {
        let peer = conn.peer_label();
        if let Err(e) = conn.set_recv_timeout(Some(self.recv_timeout)) {
            warn!("http[{}]: cannot set receive timeout: {}", peer, e);
            conn.close();
            return DispatchOutcome::Dropped(DropReason::ReadError);
        }

        let mut buf = [0u8; REQUEST_BUF_LEN];
        let len = match conn.read(&mut buf) {
            Ok(0) => {
                debug!("http[{}]: empty request", peer);
                conn.close();
                return DispatchOutcome::Dropped(DropReason::Empty);
            }
            Ok(n) => n,
            Err(e) => {
                let reason = match e.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => DropReason::Timeout,
                    _ => DropReason::ReadError,
                };
                info!("http[{}]: error on read ({}), closing connection", peer, e);
                conn.close();
                return DispatchOutcome::Dropped(reason);
            }
        };
        let request = &buf[..len];

        match router::classify(request) {
            Route::Upgrade => {
                info!("http[{}]: requesting websocket on {}", peer, WS_PATH);
                self.engine
                    .register(conn, request, WS_PATH, Arc::clone(&self.handler));
                DispatchOutcome::HandedOff
            }
            Route::Reject => {
                info!("http[{}]: unknown request, {} bytes", peer, len);
                conn.close();
                DispatchOutcome::Dropped(DropReason::Unrecognized)
            }
            route => {
                let Some(response) = route.response() else {
                    conn.close();
                    return DispatchOutcome::Dropped(DropReason::Unrecognized);
                };
                match route {
                    Route::Asset(asset) => info!("http[{}]: sending {}", peer, asset.path),
                    Route::NotFound => info!("http[{}]: unknown path, sending error page", peer),
                    _ => info!("http[{}]: sending /", peer),
                }
                if let Err(e) = response.write_to(&mut conn) {
                    warn!("http[{}]: write failed: {}", peer, e);
                }
                conn.close();
                DispatchOutcome::Served(response.status)
            }
        }
    }

    /// Serve queued connections forever.
    pub fn run<C>(&self, queue: &ConnectionQueue<C>) -> !
    where
        C: Connection,
        E: WsEngine<C>,
    {
        info!("dispatch: waiting for connections");
        loop {
            let conn = queue.pop();
            let outcome = self.serve(conn);
            debug!("dispatch: {:?}", outcome);
        }
    }
}
