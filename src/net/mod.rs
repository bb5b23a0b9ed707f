//! TCP front end: accept → bounded queue → one-shot dispatch.
//!
//! ```text
//!  Listener ──▶ intake ──▶ ConnectionQueue (10) ──▶ dispatch ──┬─▶ static response + close
//!                                                              └─▶ WsEngine::register
//! ```
//!
//! Every connection is owned by exactly one stage at a time.  The
//! queue is the only hand-off point between the two loops.

pub mod assets;
pub mod dispatch;
pub mod intake;
pub mod queue;
pub mod router;
pub mod transport;

pub use dispatch::{DispatchOutcome, Dispatcher, DropReason};
pub use queue::ConnectionQueue;
pub use router::{Route, classify};
pub use transport::{Connection, Listener};
