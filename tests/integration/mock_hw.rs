//! Mock adapters for integration tests.
//!
//! Records every actuator write, broadcast and WebSocket registration so
//! tests can assert on the full history without touching PWM registers
//! or real sockets.

use std::collections::{HashMap, VecDeque};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tankbot::app::actuators::{Actuator, ActuatorState, Duty};
use tankbot::app::ports::{ActuatorPort, AnalogPort, Broadcaster, WsEngine, WsHandler};
use tankbot::error::{ActuatorError, SensorError};
use tankbot::net::{Connection, Listener};

// ── MockPwm ───────────────────────────────────────────────────

/// Records `(actuator, percent)` for every write.
#[derive(Default)]
pub struct MockPwm {
    pub writes: Vec<(Actuator, u8)>,
}

impl ActuatorPort for MockPwm {
    fn write_duty(&mut self, actuator: Actuator, duty: Duty) -> Result<(), ActuatorError> {
        self.writes.push((actuator, duty.percent()));
        Ok(())
    }
}

#[allow(dead_code)]
impl MockPwm {
    pub fn last_for(&self, actuator: Actuator) -> Option<u8> {
        self.writes
            .iter()
            .rev()
            .find(|(a, _)| *a == actuator)
            .map(|(_, d)| *d)
    }
}

/// Actuator record over a [`MockPwm`] with the standard 40 % rest duty.
pub fn actuators() -> Arc<ActuatorState<MockPwm>> {
    Arc::new(ActuatorState::new(MockPwm::default(), Duty::new(40).unwrap()))
}

// ── CaptureBroadcaster ────────────────────────────────────────

/// Collects every broadcast; reports a fixed client count.
pub struct CaptureBroadcaster {
    pub sent: Mutex<Vec<String>>,
    pub clients: usize,
}

#[allow(dead_code)]
impl CaptureBroadcaster {
    pub fn with_clients(clients: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            clients,
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Broadcaster for CaptureBroadcaster {
    fn broadcast_text(&self, text: &str) -> usize {
        self.sent.lock().unwrap().push(text.to_owned());
        self.clients
    }
}

// ── ScriptedAdc ───────────────────────────────────────────────

/// Per-channel reading scripts.  An exhausted script repeats its last value;
/// an unknown channel fails.
#[derive(Default)]
pub struct ScriptedAdc {
    scripts: HashMap<u32, VecDeque<u16>>,
    pub reads: usize,
}

#[allow(dead_code)]
impl ScriptedAdc {
    pub fn channel(mut self, channel: u32, readings: &[u16]) -> Self {
        self.scripts.insert(channel, readings.iter().copied().collect());
        self
    }
}

impl AnalogPort for ScriptedAdc {
    fn read_raw(&mut self, channel: u32) -> Result<u16, SensorError> {
        self.reads += 1;
        let script = self.scripts.get_mut(&channel).ok_or(SensorError::AdcReadFailed)?;
        match script.len() {
            0 => Err(SensorError::AdcReadFailed),
            1 => Ok(script[0]),
            _ => Ok(script.pop_front().unwrap_or(0)),
        }
    }
}

// ── MockConn ──────────────────────────────────────────────────

/// What the single read on a [`MockConn`] produces.
#[derive(Debug, Clone)]
pub enum ReadScript {
    Data(Vec<u8>),
    Eof,
    Timeout,
    Reset,
}

/// Shared view of what the code under test did with a connection.
#[derive(Default)]
pub struct ConnTrace {
    pub written: Mutex<Vec<u8>>,
    pub closed: AtomicBool,
    pub timeout: Mutex<Option<Duration>>,
    pub send_timeout: Mutex<Option<Duration>>,
}

#[allow(dead_code)]
impl ConnTrace {
    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct MockConn {
    pub label: String,
    reads: VecDeque<ReadScript>,
    pub trace: Arc<ConnTrace>,
}

impl MockConn {
    pub fn new(label: &str, reads: Vec<ReadScript>) -> (Self, Arc<ConnTrace>) {
        let trace = Arc::new(ConnTrace::default());
        (
            Self {
                label: label.to_owned(),
                reads: reads.into(),
                trace: Arc::clone(&trace),
            },
            trace,
        )
    }

    pub fn request(label: &str, bytes: &[u8]) -> (Self, Arc<ConnTrace>) {
        Self::new(label, vec![ReadScript::Data(bytes.to_vec())])
    }
}

impl Read for MockConn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            None | Some(ReadScript::Eof) => Ok(0),
            Some(ReadScript::Timeout) => Err(io::Error::from(io::ErrorKind::WouldBlock)),
            Some(ReadScript::Reset) => Err(io::Error::from(io::ErrorKind::ConnectionReset)),
            Some(ReadScript::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.reads.push_front(ReadScript::Data(data[n..].to_vec()));
                }
                Ok(n)
            }
        }
    }
}

impl Write for MockConn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.trace.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Connection for MockConn {
    fn set_recv_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        *self.trace.timeout.lock().unwrap() = timeout;
        Ok(())
    }

    fn set_send_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        *self.trace.send_timeout.lock().unwrap() = timeout;
        Ok(())
    }

    fn peer_label(&self) -> String {
        self.label.clone()
    }

    fn close(self) {
        self.trace.closed.store(true, Ordering::SeqCst);
    }
}

// ── MockListener ──────────────────────────────────────────────

/// Hands out scripted connections, then fails.
pub struct MockListener {
    pending: Mutex<VecDeque<MockConn>>,
}

impl MockListener {
    pub fn new(conns: Vec<MockConn>) -> Self {
        Self {
            pending: Mutex::new(conns.into()),
        }
    }
}

impl Listener for MockListener {
    type Conn = MockConn;

    fn accept_conn(&self) -> io::Result<MockConn> {
        self.pending
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::other("listener closed"))
    }
}

// ── MockEngine ────────────────────────────────────────────────

/// One upgrade hand-off as seen by the engine.
pub struct Registration {
    pub peer: String,
    pub request: Vec<u8>,
    pub path: &'static str,
    pub handler: Arc<dyn WsHandler>,
}

#[derive(Default)]
pub struct MockEngine {
    pub registrations: Mutex<Vec<Registration>>,
    pub broadcasts: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockEngine {
    pub fn registration_count(&self) -> usize {
        self.registrations.lock().unwrap().len()
    }
}

impl Broadcaster for MockEngine {
    fn broadcast_text(&self, text: &str) -> usize {
        self.broadcasts.lock().unwrap().push(text.to_owned());
        self.registration_count()
    }
}

impl WsEngine<MockConn> for MockEngine {
    fn register(&self, conn: MockConn, request: &[u8], path: &'static str, handler: Arc<dyn WsHandler>) {
        self.registrations.lock().unwrap().push(Registration {
            peer: conn.label.clone(),
            request: request.to_vec(),
            path,
            handler,
        });
    }
}
