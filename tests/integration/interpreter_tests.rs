//! Command interpreter against the actuator record and a capture broadcaster.

use std::sync::Arc;

use tankbot::app::actuators::{Actuator, DutySnapshot};
use tankbot::app::events::{DisconnectReason, Frame};
use tankbot::app::ports::WsHandler;
use tankbot::app::service::{CommandInterpreter, CommandOutcome};

use crate::mock_hw::{CaptureBroadcaster, MockPwm, actuators};

fn percents(s: DutySnapshot) -> (u8, u8, u8) {
    (s.motor_left.percent(), s.motor_right.percent(), s.indicator.percent())
}

fn setup() -> (CommandInterpreter<MockPwm>, CaptureBroadcaster) {
    (CommandInterpreter::new(actuators()), CaptureBroadcaster::with_clients(3))
}

#[test]
fn boots_at_safe_defaults() {
    let (it, _) = setup();
    assert_eq!(percents(it.actuators().snapshot()), (40, 40, 0));
}

#[test]
fn motor_command_round_trip() {
    let (it, out) = setup();
    it.on_message(1, Frame::Text(b"M55:60"), &out);

    assert_eq!(out.sent(), vec!["M55:60"], "exactly one verbatim rebroadcast");
    let snap = it.actuators().snapshot();
    assert_eq!((snap.motor_left.percent(), snap.motor_right.percent()), (55, 60));
    it.actuators().with_hardware(|hw| {
        assert_eq!(hw.last_for(Actuator::MotorLeft), Some(55));
        assert_eq!(hw.last_for(Actuator::MotorRight), Some(60));
    });
}

#[test]
fn indicator_command_round_trip() {
    let (it, out) = setup();
    assert_eq!(it.interpret(2, b"L75", &out), CommandOutcome::Applied);
    assert_eq!(out.sent(), vec!["L75"]);
    assert_eq!(it.actuators().get(Actuator::Indicator).percent(), 75);
}

#[test]
fn out_of_range_left_is_ignored_without_broadcast() {
    let (it, out) = setup();
    it.interpret(1, b"M10:10", &out);
    let before = it.actuators().get(Actuator::MotorLeft);

    assert_eq!(it.interpret(1, b"M200:60", &out), CommandOutcome::PartiallyApplied);
    assert_eq!(it.actuators().get(Actuator::MotorLeft), before);
    assert_eq!(it.actuators().get(Actuator::MotorRight).percent(), 60);
    assert_eq!(out.sent(), vec!["M10:10"], "no broadcast for M200:60");
}

#[test]
fn fully_rejected_commands_change_nothing() {
    let (it, out) = setup();
    let before = it.actuators().snapshot();
    assert_eq!(it.interpret(1, b"M-1:101", &out), CommandOutcome::Rejected);
    assert_eq!(it.interpret(1, b"L300", &out), CommandOutcome::Rejected);
    assert_eq!(it.actuators().snapshot(), before);
    assert!(out.sent().is_empty());
}

#[test]
fn unrecognized_and_empty_are_noops() {
    let (it, out) = setup();
    let before = it.actuators().snapshot();
    assert_eq!(it.interpret(1, b"hello", &out), CommandOutcome::Unrecognized);
    assert_eq!(it.interpret(1, &[b'X'; 4096], &out), CommandOutcome::Unrecognized);
    assert_eq!(it.interpret(1, b"\xff\x00M1:1", &out), CommandOutcome::Unrecognized);
    assert_eq!(it.interpret(1, b"", &out), CommandOutcome::Empty);
    assert_eq!(it.actuators().snapshot(), before);
    assert!(out.sent().is_empty());
}

#[test]
fn non_text_frames_never_touch_state() {
    let (it, out) = setup();
    let before = it.actuators().snapshot();
    it.on_message(1, Frame::Binary(b"M99:99"), &out);
    it.on_message(1, Frame::Ping(b"L99"), &out);
    it.on_message(1, Frame::Pong(b""), &out);
    assert_eq!(it.actuators().snapshot(), before);
    assert!(out.sent().is_empty());
}

// ── Disconnect fail-safe ──────────────────────────────────────

#[test]
fn graceful_and_error_disconnects_reset_to_safe() {
    for reason in [DisconnectReason::Graceful, DisconnectReason::Error] {
        let (it, out) = setup();
        it.on_connect(4);
        it.interpret(4, b"M100:0", &out);
        it.interpret(4, b"L100", &out);
        it.on_disconnect(4, reason);
        assert_eq!(percents(it.actuators().snapshot()), (40, 40, 0), "{:?}", reason);
    }
}

#[test]
fn internal_disconnect_leaves_state() {
    let (it, out) = setup();
    it.interpret(4, b"M100:0", &out);
    it.on_disconnect(4, DisconnectReason::Internal);
    assert_eq!(percents(it.actuators().snapshot()), (100, 0, 0));
}

// ── Concurrency ───────────────────────────────────────────────

#[test]
fn concurrent_clients_never_desync_record_and_hardware() {
    let it = Arc::new(CommandInterpreter::new(actuators()));
    let out = Arc::new(CaptureBroadcaster::with_clients(8));

    let workers: Vec<_> = (0..8u8)
        .map(|client| {
            let it = Arc::clone(&it);
            let out = Arc::clone(&out);
            std::thread::spawn(move || {
                for i in 0..200i64 {
                    let v = (i * 7 + i64::from(client) * 13) % 101;
                    let msg = format!("M{}:{}", v, 100 - v);
                    it.interpret(client, msg.as_bytes(), out.as_ref());
                    it.interpret(client, format!("L{}", v).as_bytes(), out.as_ref());
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let snap = it.actuators().snapshot();
    it.actuators().with_hardware(|hw| {
        for a in Actuator::ALL {
            assert_eq!(hw.last_for(a), Some(snap.get(a).percent()), "{:?}", a);
        }
    });
    assert_eq!(out.sent().len(), 8 * 200 * 2);
}
