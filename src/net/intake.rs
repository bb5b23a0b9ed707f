//! Accept loop.

use std::io;

use log::{debug, error, info};

use super::queue::ConnectionQueue;
use super::transport::{Connection, Listener};

/// Accept connections and enqueue them until `accept` fails.
///
/// Enqueueing blocks while the queue is full, leaving further clients in
/// the OS backlog.  Only returns on a listener failure, which the caller
/// treats as fatal.
pub fn run_intake<L: Listener>(listener: &L, queue: &ConnectionQueue<L::Conn>) -> io::Error {
    info!("intake: accepting connections");
    loop {
        match listener.accept_conn() {
            Ok(conn) => {
                debug!("intake: new client {}", conn.peer_label());
                queue.push(conn);
            }
            Err(e) => {
                error!("intake: accept failed: {}", e);
                return e;
            }
        }
    }
}
