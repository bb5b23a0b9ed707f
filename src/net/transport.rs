//! Stream abstractions used by the intake and dispatch loops.
//!
//! Implemented for `std::net` here; tests substitute scripted mocks.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::time::Duration;

/// A live, exclusively owned client stream.
pub trait Connection: Read + Write + Send + 'static {
    /// Bound every subsequent read.  `None` blocks indefinitely.
    fn set_recv_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Bound every subsequent write.  `None` blocks indefinitely.
    fn set_send_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Remote address for logging.
    fn peer_label(&self) -> String;

    /// Flush, shut down and release the stream.
    fn close(self)
    where
        Self: Sized;
}

/// A bound listening socket.
pub trait Listener {
    type Conn: Connection;

    fn accept_conn(&self) -> io::Result<Self::Conn>;
}

impl Connection for TcpStream {
    fn set_recv_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(timeout)
    }

    fn set_send_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_write_timeout(timeout)
    }

    fn peer_label(&self) -> String {
        self.peer_addr()
            .map_or_else(|_| "<unknown>".to_owned(), |a| a.to_string())
    }

    fn close(mut self) {
        let _ = self.flush();
        let _ = self.shutdown(Shutdown::Write);
    }
}

impl Listener for TcpListener {
    type Conn = TcpStream;

    fn accept_conn(&self) -> io::Result<TcpStream> {
        self.accept().map(|(stream, _)| stream)
    }
}
