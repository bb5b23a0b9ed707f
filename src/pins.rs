//! GPIO / peripheral pin assignments for the TankBot main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Drive motors (dual H-bridge, PWM speed inputs)
// ---------------------------------------------------------------------------

/// Left track motor PWM output.
pub const MOTOR_LEFT_GPIO: i32 = 12;
/// Right track motor PWM output.
pub const MOTOR_RIGHT_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Indicator LED
// ---------------------------------------------------------------------------

/// Dimmable indicator LED.
pub const INDICATOR_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Analog inputs (ADC1)
// ---------------------------------------------------------------------------

/// Battery voltage through a ~5.17:1 resistive divider (GPIO36).
pub const BATTERY_ADC_CHANNEL: u32 = 0;
/// Left motor current-sense amplifier output (GPIO39).
pub const MOTOR_LEFT_SENSE_ADC_CHANNEL: u32 = 3;
/// Right motor current-sense amplifier output (GPIO33).
pub const MOTOR_RIGHT_SENSE_ADC_CHANNEL: u32 = 5;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// Maximum LEDC duty register value at [`PWM_RESOLUTION_BITS`].
pub const PWM_MAX_DUTY: u16 = (1 << PWM_RESOLUTION_BITS) - 1;
/// Shared LEDC timer frequency for motors and indicator.
pub const PWM_FREQ_HZ: u32 = 400;
