//! WebSocket-side events and outbound telemetry.
//!
//! Inbound: the engine reports client lifecycle changes and frames through
//! the [`WsHandler`](super::ports::WsHandler) port using these types.
//! Outbound: samplers produce [`TelemetrySample`]s which are rendered to
//! the short text protocol and broadcast.

use core::fmt::Write;

/// Engine-assigned identity of a WebSocket client.
pub type ClientId = u8;

/// Why a client left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The client sent a close frame or shut the socket down cleanly.
    Graceful,
    /// The server side dropped the client.
    Internal,
    /// A transport or protocol error ended the session.
    Error,
}

impl DisconnectReason {
    /// Client-initiated and error-induced disconnects may leave the device
    /// without its commanding peer; those trigger the actuator fail-safe.
    pub fn requires_failsafe(self) -> bool {
        matches!(self, Self::Graceful | Self::Error)
    }
}

/// One inbound WebSocket frame, borrowed from the engine's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    Text(&'a [u8]),
    Binary(&'a [u8]),
    Ping(&'a [u8]),
    Pong(&'a [u8]),
}

/// Longest rendered telemetry message: `A` + two `u32` + separator.
pub const TELEMETRY_TEXT_CAP: usize = 24;

/// Fixed-capacity telemetry text.
pub type TelemetryText = heapless::String<TELEMETRY_TEXT_CAP>;

/// A sampled value ready for broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetrySample {
    /// Battery voltage in millivolts.
    BatteryVoltage(u32),
    /// Motor current draw in milliamps.
    MotorCurrent { left: u32, right: u32 },
}

impl TelemetrySample {
    /// Render to the wire format: `V<mv>` or `A<left>,<right>`.
    pub fn to_text(&self) -> TelemetryText {
        let mut s = TelemetryText::new();
        // Capacity covers the widest u32 pair, so formatting cannot fail.
        let _ = match *self {
            Self::BatteryVoltage(mv) => write!(s, "V{}", mv),
            Self::MotorCurrent { left, right } => write!(s, "A{},{}", left, right),
        };
        s
    }
}
