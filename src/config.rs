//! System configuration parameters
//!
//! All tunable parameters for the TankBot controller.  Values can be
//! overridden through a [`ConfigPort`](crate::app::ports::ConfigPort)
//! (a JSON file on host builds).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Capacity of the accept → dispatch connection queue.
///
/// Compile-time because the channel is const-generic over its depth.
pub const CONNECTION_QUEUE_DEPTH: usize = 10;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Network ---
    /// TCP port for HTTP + WebSocket
    pub http_port: u16,
    /// Receive timeout for the initial request read (milliseconds)
    pub recv_timeout_ms: u32,
    /// Maximum simultaneously registered WebSocket clients
    pub max_ws_clients: u8,
    /// Per-client read poll interval inside the WebSocket engine (milliseconds)
    pub ws_poll_interval_ms: u32,
    /// Longest a single outbound WebSocket write may block before the
    /// client is dropped (milliseconds)
    pub ws_send_timeout_ms: u32,

    // --- Actuators ---
    /// Resting motor duty (0-100%), applied at boot and on fail-safe reset
    pub motor_rest_duty: u8,

    // --- Battery telemetry ---
    /// Battery broadcast period (milliseconds)
    pub battery_period_ms: u32,
    /// Raw readings averaged per battery broadcast
    pub battery_samples: u16,
    /// Battery divider ratio ×1000
    pub battery_divider_milli: u32,

    // --- Motor current telemetry ---
    /// Motor current broadcast period (milliseconds)
    pub current_period_ms: u32,
    /// Raw readings averaged per channel per current broadcast
    pub current_samples: u16,
    /// Current-sense conversion numerator (mA = mV × num / den)
    pub current_sense_num: u32,
    /// Current-sense conversion denominator
    pub current_sense_den: u32,

    // --- ADC ---
    /// Delay between consecutive raw readings (milliseconds)
    pub inter_sample_delay_ms: u32,
    /// ADC reference voltage used for calibration (millivolts)
    pub default_vref_mv: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Network
            http_port: 80,
            recv_timeout_ms: 1000,
            max_ws_clients: 8,
            ws_poll_interval_ms: 20,
            ws_send_timeout_ms: 2000,

            // Actuators
            motor_rest_duty: 40,

            // Battery
            battery_period_ms: 200, // 5 Hz
            battery_samples: 16,
            battery_divider_milli: 5168,

            // Motor current
            current_period_ms: 100, // 10 Hz
            current_samples: 64,
            current_sense_num: 6800,
            current_sense_den: 2400,

            // ADC
            inter_sample_delay_ms: 2,
            default_vref_mv: 1100,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.motor_rest_duty > 100 {
            return Err(ConfigError::ValidationFailed("motor_rest_duty"));
        }
        if self.recv_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("recv_timeout_ms"));
        }
        if self.max_ws_clients == 0 {
            return Err(ConfigError::ValidationFailed("max_ws_clients"));
        }
        if self.ws_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("ws_poll_interval_ms"));
        }
        if self.ws_send_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("ws_send_timeout_ms"));
        }
        if self.battery_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("battery_period_ms"));
        }
        if self.current_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("current_period_ms"));
        }
        if self.battery_samples == 0 {
            return Err(ConfigError::ValidationFailed("battery_samples"));
        }
        if self.current_samples == 0 {
            return Err(ConfigError::ValidationFailed("current_samples"));
        }
        if self.current_sense_den == 0 {
            return Err(ConfigError::ValidationFailed("current_sense_den"));
        }
        if self.default_vref_mv == 0 {
            return Err(ConfigError::ValidationFailed("default_vref_mv"));
        }
        Ok(())
    }
}
