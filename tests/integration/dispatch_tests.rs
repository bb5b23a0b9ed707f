//! Intake → queue → dispatch pipeline against mock connections.

use std::sync::Arc;
use std::time::Duration;

use tankbot::app::ports::WsHandler;
use tankbot::app::service::CommandInterpreter;
use tankbot::net::assets;
use tankbot::net::intake::run_intake;
use tankbot::net::router::Status;
use tankbot::net::{ConnectionQueue, DispatchOutcome, Dispatcher, DropReason};

use crate::mock_hw::{MockConn, MockEngine, MockListener, ReadScript, actuators};

const WS_REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: 192.168.4.1\r\nUpgrade: websocket\r\n\
Connection: Upgrade\r\nSec-WebSocket-Key: x3JJHMbDL1EzLkh9GBhXDw==\r\nSec-WebSocket-Version: 13\r\n\r\n";

fn dispatcher() -> (Dispatcher<MockEngine>, Arc<MockEngine>) {
    let engine = Arc::new(MockEngine::default());
    let handler: Arc<dyn WsHandler> = Arc::new(CommandInterpreter::new(actuators()));
    (Dispatcher::new(Arc::clone(&engine), handler, 1000), engine)
}

fn split_response(out: &[u8]) -> (&[u8], &[u8]) {
    let pos = out
        .windows(2)
        .position(|w| w == b"\n\n")
        .expect("response head terminator");
    (&out[..pos + 2], &out[pos + 2..])
}

// ── Served routes ─────────────────────────────────────────────

#[test]
fn index_served_and_closed() {
    let (d, engine) = dispatcher();
    let (conn, trace) = MockConn::request("a", b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");

    assert_eq!(d.serve(conn), DispatchOutcome::Served(Status::Ok));

    let out = trace.written();
    let (head, body) = split_response(&out);
    assert_eq!(head, b"HTTP/1.1 200 OK\nContent-type: text/html\n\n");
    assert_eq!(body, assets::INDEX_HTML);
    assert!(trace.is_closed());
    assert_eq!(engine.registration_count(), 0);
}

#[test]
fn receive_timeout_is_applied() {
    let (d, _engine) = dispatcher();
    let (conn, trace) = MockConn::request("a", b"GET / HTTP/1.1\r\n\r\n");
    d.serve(conn);
    assert_eq!(*trace.timeout.lock().unwrap(), Some(Duration::from_millis(1000)));
}

#[test]
fn each_static_asset_has_its_content_type() {
    let (d, _engine) = dispatcher();
    for (path, ctype, body) in [
        ("/main.js", "text/javascript", assets::MAIN_JS.body),
        ("/index.css", "text/css", assets::INDEX_CSS.body),
        ("/favicon.ico", "image/x-icon", assets::FAVICON.body),
    ] {
        let req = format!("GET {} HTTP/1.1\r\n\r\n", path);
        let (conn, trace) = MockConn::request(path, req.as_bytes());
        assert_eq!(d.serve(conn), DispatchOutcome::Served(Status::Ok));
        let out = trace.written();
        let (head, got) = split_response(&out);
        assert_eq!(head, format!("HTTP/1.1 200 OK\nContent-type: {}\n\n", ctype).as_bytes());
        assert_eq!(got, body, "{}", path);
        assert!(trace.is_closed());
    }
}

#[test]
fn unknown_path_gets_error_page() {
    let (d, _engine) = dispatcher();
    let (conn, trace) = MockConn::request("a", b"GET /nope HTTP/1.1\r\n\r\n");
    assert_eq!(d.serve(conn), DispatchOutcome::Served(Status::NotFound));
    let out = trace.written();
    let (head, body) = split_response(&out);
    assert_eq!(head, b"HTTP/1.1 404 Not Found\nContent-type: text/html\n\n");
    assert_eq!(body, assets::ERROR_HTML);
    assert!(trace.is_closed());
}

// ── Hand-off ──────────────────────────────────────────────────

#[test]
fn upgrade_is_handed_off_with_raw_request() {
    let (d, engine) = dispatcher();
    let (conn, trace) = MockConn::request("ws-peer", WS_REQUEST);

    assert_eq!(d.serve(conn), DispatchOutcome::HandedOff);

    assert!(trace.written().is_empty(), "dispatcher must not answer an upgrade");
    assert!(!trace.is_closed(), "engine owns the connection now");
    let regs = engine.registrations.lock().unwrap();
    assert_eq!(regs.len(), 1);
    assert_eq!(regs[0].peer, "ws-peer");
    assert_eq!(regs[0].path, "/");
    assert_eq!(regs[0].request, WS_REQUEST);
}

#[test]
fn handed_off_handler_drives_actuators() {
    let (d, engine) = dispatcher();
    let (conn, _trace) = MockConn::request("ws", WS_REQUEST);
    d.serve(conn);

    let handler = Arc::clone(&engine.registrations.lock().unwrap()[0].handler);
    handler.on_message(0, tankbot::app::events::Frame::Text(b"L30"), engine.as_ref());
    assert_eq!(*engine.broadcasts.lock().unwrap(), vec!["L30"]);
}

// ── Dropped ───────────────────────────────────────────────────

#[test]
fn silent_close_cases() {
    let (d, engine) = dispatcher();
    for (script, reason) in [
        (ReadScript::Eof, DropReason::Empty),
        (ReadScript::Timeout, DropReason::Timeout),
        (ReadScript::Reset, DropReason::ReadError),
        (ReadScript::Data(b"\x16\x03\x01garbage".to_vec()), DropReason::Unrecognized),
        (ReadScript::Data(b"POST /x HTTP/1.1\r\n\r\n".to_vec()), DropReason::Unrecognized),
    ] {
        let (conn, trace) = MockConn::new("a", vec![script.clone()]);
        assert_eq!(d.serve(conn), DispatchOutcome::Dropped(reason), "{:?}", script);
        assert!(trace.written().is_empty(), "{:?} must get no reply", script);
        assert!(trace.is_closed());
    }
    assert_eq!(engine.registration_count(), 0);
}

#[test]
fn exactly_one_read_per_connection() {
    let (d, _engine) = dispatcher();
    // Request split across two segments: only the first is ever seen.
    let (conn, trace) = MockConn::new(
        "a",
        vec![
            ReadScript::Data(b"GE".to_vec()),
            ReadScript::Data(b"T / HTTP/1.1\r\n\r\n".to_vec()),
        ],
    );
    assert_eq!(d.serve(conn), DispatchOutcome::Dropped(DropReason::Unrecognized));
    assert!(trace.is_closed());
}

// ── Intake ────────────────────────────────────────────────────

#[test]
fn intake_enqueues_in_accept_order_then_reports_failure() {
    let queue = ConnectionQueue::new();
    let conns: Vec<MockConn> = (0..3)
        .map(|i| MockConn::request(&format!("c{}", i), b"GET / HTTP/1.1\r\n\r\n").0)
        .collect();
    let listener = MockListener::new(conns);

    let err = run_intake(&listener, &queue);
    assert_eq!(err.kind(), std::io::ErrorKind::Other);

    let order: Vec<String> = (0..3).map(|_| queue.pop().label).collect();
    assert_eq!(order, vec!["c0", "c1", "c2"]);
    assert!(queue.is_empty());
}

#[test]
fn intake_blocks_on_full_queue_until_dispatch_drains() {
    let queue = Arc::new(ConnectionQueue::new());
    let total = queue.capacity() + 3;
    let conns: Vec<MockConn> = (0..total)
        .map(|i| MockConn::request(&format!("c{}", i), b"GET / HTTP/1.1\r\n\r\n").0)
        .collect();
    let listener = MockListener::new(conns);

    let producer = {
        let queue = Arc::clone(&queue);
        std::thread::spawn(move || run_intake(&listener, &*queue))
    };

    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(queue.len(), queue.capacity(), "producer must stall at capacity");
    assert!(!producer.is_finished());

    let (d, _engine) = dispatcher();
    let mut served = Vec::new();
    for _ in 0..total {
        let conn = queue.pop();
        served.push(conn.label.clone());
        assert_eq!(d.serve(conn), DispatchOutcome::Served(Status::Ok));
    }
    producer.join().unwrap();

    let expected: Vec<String> = (0..total).map(|i| format!("c{}", i)).collect();
    assert_eq!(served, expected);
}
