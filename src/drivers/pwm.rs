//! LEDC channel as an `embedded-hal` PWM output.
//!
//! `set_duty_cycle_percent` from the trait maps `p %` to
//! `p × 255 / 100` register counts at 8-bit resolution.

use embedded_hal::pwm::{self, ErrorKind, ErrorType, SetDutyCycle};

use crate::error::ActuatorError;
use crate::pins;

use super::hw_init;

/// The LEDC peripheral refused a duty update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedcError(pub u32);

impl pwm::Error for LedcError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl From<LedcError> for ActuatorError {
    fn from(_: LedcError) -> Self {
        ActuatorError::PwmWriteFailed
    }
}

/// One configured LEDC channel.
#[derive(Debug)]
pub struct LedcChannel {
    channel: u32,
}

impl LedcChannel {
    pub const fn new(channel: u32) -> Self {
        Self { channel }
    }

    pub const fn channel(&self) -> u32 {
        self.channel
    }
}

impl ErrorType for LedcChannel {
    type Error = LedcError;
}

impl SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        pins::PWM_MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        hw_init::ledc_set(self.channel, u32::from(duty.min(pins::PWM_MAX_DUTY)))
            .map_err(|_| LedcError(self.channel))
    }
}
