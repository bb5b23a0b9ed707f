//! Fuzz target: `Command::parse` + `CommandInterpreter::interpret`
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - A message that is rebroadcast is byte-identical to the input
//! - Every recorded duty stays within 0–100 %
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use std::sync::{Arc, Mutex};

use libfuzzer_sys::fuzz_target;
use tankbot::app::actuators::{Actuator, ActuatorState, Duty};
use tankbot::app::commands::Command;
use tankbot::app::ports::{ActuatorPort, Broadcaster};
use tankbot::app::service::{CommandInterpreter, CommandOutcome};
use tankbot::error::ActuatorError;

struct NullPwm;

impl ActuatorPort for NullPwm {
    fn write_duty(&mut self, _a: Actuator, _d: Duty) -> Result<(), ActuatorError> {
        Ok(())
    }
}

#[derive(Default)]
struct Capture(Mutex<Vec<String>>);

impl Broadcaster for Capture {
    fn broadcast_text(&self, text: &str) -> usize {
        self.0.lock().unwrap().push(text.to_owned());
        1
    }
}

fuzz_target!(|data: &[u8]| {
    let _ = Command::parse(data);

    let state = Arc::new(ActuatorState::new(NullPwm, Duty::new(40).unwrap()));
    let it = CommandInterpreter::new(state);
    let out = Capture::default();
    let outcome = it.interpret(0, data, &out);

    let sent = out.0.lock().unwrap();
    if outcome == CommandOutcome::Applied {
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].as_bytes(), data);
    } else {
        assert!(sent.is_empty());
    }

    let snap = it.actuators().snapshot();
    for a in Actuator::ALL {
        assert!(snap.get(a).percent() <= 100);
    }
});
