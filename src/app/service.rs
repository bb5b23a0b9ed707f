//! Command interpreter — the WebSocket-facing application service.
//!
//! [`CommandInterpreter`] is handed to the WebSocket engine as its
//! [`WsHandler`].  Text frames are parsed into [`Command`]s, applied to
//! the shared [`ActuatorState`], and accepted commands are echoed to every
//! client so all peers stay in sync.
//!
//! ```text
//!  WsEngine ──▶ ┌────────────────────┐ ──▶ ActuatorState ──▶ ActuatorPort
//!               │ CommandInterpreter │
//!  Broadcaster ◀─└────────────────────┘
//! ```

use std::sync::Arc;

use log::{debug, info, warn};

use super::actuators::{Actuator, ActuatorState};
use super::commands::Command;
use super::events::{ClientId, DisconnectReason, Frame};
use super::ports::{ActuatorPort, Broadcaster, WsHandler};

/// Longest prefix of an unrecognized message that gets logged.
const LOG_PREVIEW_LEN: usize = 64;

/// What became of one text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Zero-length message.
    Empty,
    /// Every field applied; the message was rebroadcast.
    Applied,
    /// Some fields were out of range.  Valid ones were applied; no rebroadcast.
    PartiallyApplied,
    /// Every field was out of range.  Nothing changed.
    Rejected,
    /// Not a known command.
    Unrecognized,
}

pub struct CommandInterpreter<A: ActuatorPort> {
    actuators: Arc<ActuatorState<A>>,
}

impl<A: ActuatorPort> CommandInterpreter<A> {
    pub fn new(actuators: Arc<ActuatorState<A>>) -> Self {
        Self { actuators }
    }

    pub fn actuators(&self) -> &Arc<ActuatorState<A>> {
        &self.actuators
    }

    /// Parse, apply and (when fully accepted) rebroadcast one text message.
    pub fn interpret(&self, client: ClientId, msg: &[u8], out: &dyn Broadcaster) -> CommandOutcome {
        if msg.is_empty() {
            return CommandOutcome::Empty;
        }

        let outcome = match Command::parse(msg) {
            Command::SetMotorDuties { left, right } => {
                let accepted = [
                    self.apply(client, Actuator::MotorLeft, left),
                    self.apply(client, Actuator::MotorRight, right),
                ];
                tally(&accepted)
            }
            Command::SetIndicatorDuty(value) => {
                let accepted = [self.apply(client, Actuator::Indicator, value)];
                tally(&accepted)
            }
            Command::Unrecognized => {
                let shown = &msg[..msg.len().min(LOG_PREVIEW_LEN)];
                info!(
                    "WS[{}]: unknown message, {} bytes: {:?}",
                    client,
                    msg.len(),
                    String::from_utf8_lossy(shown)
                );
                CommandOutcome::Unrecognized
            }
        };

        if outcome == CommandOutcome::Applied {
            // Parse succeeded, so the message is valid UTF-8.
            if let Ok(text) = core::str::from_utf8(msg) {
                out.broadcast_text_from_callback(text);
            }
        }
        outcome
    }

    fn apply(&self, client: ClientId, actuator: Actuator, value: i64) -> bool {
        match self.actuators.set(actuator, value) {
            Ok(duty) => {
                debug!("WS[{}]: {} = {}%", client, actuator.name(), duty.percent());
                true
            }
            Err(e) => {
                debug!("WS[{}]: {} ignored: {}", client, actuator.name(), e);
                false
            }
        }
    }
}

fn tally(accepted: &[bool]) -> CommandOutcome {
    match accepted.iter().filter(|ok| **ok).count() {
        n if n == accepted.len() => CommandOutcome::Applied,
        0 => CommandOutcome::Rejected,
        _ => CommandOutcome::PartiallyApplied,
    }
}

impl<A: ActuatorPort> WsHandler for CommandInterpreter<A> {
    fn on_connect(&self, client: ClientId) {
        info!("WS[{}]: connected", client);
    }

    fn on_disconnect(&self, client: ClientId, reason: DisconnectReason) {
        match reason {
            DisconnectReason::Graceful => info!("WS[{}]: sent a disconnect message", client),
            DisconnectReason::Internal => info!("WS[{}]: was disconnected", client),
            DisconnectReason::Error => warn!("WS[{}]: was disconnected due to an error", client),
        }
        if reason.requires_failsafe() {
            self.actuators.reset_to_safe();
            info!("WS[{}]: actuators reset to safe defaults", client);
        }
    }

    fn on_message(&self, client: ClientId, frame: Frame<'_>, out: &dyn Broadcaster) {
        match frame {
            Frame::Text(msg) => {
                let _ = self.interpret(client, msg, out);
            }
            Frame::Binary(data) => {
                info!("WS[{}]: binary message, {} bytes", client, data.len());
            }
            Frame::Ping(data) => {
                info!("WS[{}]: ping, {} bytes", client, data.len());
            }
            Frame::Pong(_) => {
                info!("WS[{}]: responded to the ping", client);
            }
        }
    }
}
