//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ app (domain)
//! ```
//!
//! Driven adapters (PWM, ADC, the WebSocket engine, config storage)
//! implement these traits.  The domain consumes them via generics or
//! trait objects, so it never touches hardware or sockets directly.

use std::sync::Arc;

use crate::config::SystemConfig;
use crate::error::{ActuatorError, ConfigError, SensorError};

use super::actuators::{Actuator, Duty};
use super::events::{ClientId, DisconnectReason, Frame};

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: "set actuator duty".
///
/// Called with the actuator record locked, so implementations never see
/// two concurrent writes.
pub trait ActuatorPort: Send {
    /// Drive `actuator` at `duty` percent.  Takes effect immediately.
    fn write_duty(&mut self, actuator: Actuator, duty: Duty) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Analog port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one raw ADC conversion.
///
/// A raw value of `0` is a legal return and is treated by the samplers
/// as a conversion glitch, not a valid reading.
pub trait AnalogPort: Send {
    fn read_raw(&mut self, channel: u32) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// WebSocket engine ports
// ───────────────────────────────────────────────────────────────

/// Best-effort text broadcast to every registered WebSocket client.
pub trait Broadcaster: Send + Sync {
    /// Queue `text` for every client.  Returns how many clients it reached.
    fn broadcast_text(&self, text: &str) -> usize;

    /// Variant that is safe to call from inside a [`WsHandler`] callback.
    fn broadcast_text_from_callback(&self, text: &str) {
        let _ = self.broadcast_text(text);
    }
}

/// Event interface the engine invokes for each registered client.
///
/// Implementations must tolerate concurrent calls from several client
/// tasks at once.
pub trait WsHandler: Send + Sync {
    fn on_connect(&self, client: ClientId);

    fn on_disconnect(&self, client: ClientId, reason: DisconnectReason);

    /// One inbound frame.  `out` is the broadcaster to use from within
    /// this callback.
    fn on_message(&self, client: ClientId, frame: Frame<'_>, out: &dyn Broadcaster);
}

/// Upgrade handoff into the WebSocket engine.
pub trait WsEngine<C>: Broadcaster {
    /// Take ownership of `conn`.  `request` is the initial request that
    /// has already been read from it; the engine completes the handshake
    /// and manages the client's lifetime from here on.
    fn register(&self, conn: C, request: &[u8], path: &'static str, handler: Arc<dyn WsHandler>);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads system configuration.
///
/// Implementations MUST validate before returning.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    fn load(&self) -> Result<SystemConfig, ConfigError>;
}
