//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! [`PwmActuators`] drives the three outputs through any `embedded-hal`
//! PWM channel; [`AdcReader`] exposes ADC1 as an [`AnalogPort`].  On
//! non-espidf targets the underlying drivers are in-memory simulations.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::actuators::{Actuator, Duty};
use crate::app::ports::{ActuatorPort, AnalogPort};
use crate::drivers::hw_init;
use crate::drivers::pwm::LedcChannel;
use crate::error::{ActuatorError, SensorError};

/// The three PWM outputs.
pub struct PwmActuators<P: SetDutyCycle> {
    motor_left: P,
    motor_right: P,
    indicator: P,
}

impl<P: SetDutyCycle> PwmActuators<P> {
    pub fn new(motor_left: P, motor_right: P, indicator: P) -> Self {
        Self {
            motor_left,
            motor_right,
            indicator,
        }
    }

    fn channel(&mut self, actuator: Actuator) -> &mut P {
        match actuator {
            Actuator::MotorLeft => &mut self.motor_left,
            Actuator::MotorRight => &mut self.motor_right,
            Actuator::Indicator => &mut self.indicator,
        }
    }
}

impl PwmActuators<LedcChannel> {
    /// The board's LEDC channels 0–2.
    pub fn ledc() -> Self {
        Self::new(
            LedcChannel::new(hw_init::LEDC_CH_MOTOR_LEFT),
            LedcChannel::new(hw_init::LEDC_CH_MOTOR_RIGHT),
            LedcChannel::new(hw_init::LEDC_CH_INDICATOR),
        )
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P: SetDutyCycle + Send> ActuatorPort for PwmActuators<P> {
    fn write_duty(&mut self, actuator: Actuator, duty: Duty) -> Result<(), ActuatorError> {
        self.channel(actuator)
            .set_duty_cycle_percent(duty.percent())
            .map_err(|e| {
                warn!("pwm: {} write failed: {:?}", actuator.name(), e);
                ActuatorError::PwmWriteFailed
            })
    }
}

// ── AnalogPort implementation ─────────────────────────────────

/// ADC1 oneshot reader.  Cheap to copy; one per sampling task.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdcReader;

impl AnalogPort for AdcReader {
    fn read_raw(&mut self, channel: u32) -> Result<u16, SensorError> {
        hw_init::adc1_read(channel)
    }
}
