//! Application core — pure domain logic, zero I/O.
//!
//! Actuator state, the remote-control command protocol, and the
//! WebSocket event handler.  All interaction with hardware and sockets
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod actuators;
pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
