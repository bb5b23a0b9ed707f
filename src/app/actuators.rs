//! Actuator duty record.
//!
//! Holds the current duty of both drive motors and the indicator.  Every
//! write is validated, pushed straight to the [`ActuatorPort`], and only
//! then recorded, all under one lock, so concurrent command delivery from
//! several WebSocket clients cannot interleave a single actuator update.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::error::ActuatorError;

use super::ports::ActuatorPort;

/// The three PWM outputs under remote control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actuator {
    MotorLeft,
    MotorRight,
    Indicator,
}

impl Actuator {
    pub const ALL: [Actuator; 3] = [Self::MotorLeft, Self::MotorRight, Self::Indicator];

    pub fn name(self) -> &'static str {
        match self {
            Self::MotorLeft => "motor-left",
            Self::MotorRight => "motor-right",
            Self::Indicator => "indicator",
        }
    }
}

/// A validated duty percentage, 0–100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Duty(u8);

impl Duty {
    pub const OFF: Duty = Duty(0);
    pub const MAX_PERCENT: u8 = 100;

    /// Validate a requested percentage.  Out-of-range values are rejected.
    pub fn new(percent: i64) -> Result<Self, ActuatorError> {
        if (0..=i64::from(Self::MAX_PERCENT)).contains(&percent) {
            Ok(Self(percent as u8))
        } else {
            Err(ActuatorError::DutyOutOfRange(percent))
        }
    }

    pub const fn percent(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Duty {
    type Error = ActuatorError;

    fn try_from(percent: i64) -> Result<Self, Self::Error> {
        Self::new(percent)
    }
}

/// Point-in-time copy of all three duties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DutySnapshot {
    pub motor_left: Duty,
    pub motor_right: Duty,
    pub indicator: Duty,
}

impl DutySnapshot {
    pub fn get(&self, actuator: Actuator) -> Duty {
        match actuator {
            Actuator::MotorLeft => self.motor_left,
            Actuator::MotorRight => self.motor_right,
            Actuator::Indicator => self.indicator,
        }
    }

    fn slot_mut(&mut self, actuator: Actuator) -> &mut Duty {
        match actuator {
            Actuator::MotorLeft => &mut self.motor_left,
            Actuator::MotorRight => &mut self.motor_right,
            Actuator::Indicator => &mut self.indicator,
        }
    }
}

struct Guarded<A> {
    hw: A,
    duties: DutySnapshot,
}

/// Shared actuator state.  Construct once at boot, share via `Arc`.
pub struct ActuatorState<A: ActuatorPort> {
    inner: Mutex<Guarded<A>>,
    safe: DutySnapshot,
}

impl<A: ActuatorPort> ActuatorState<A> {
    /// Take ownership of the hardware and drive it to the safe defaults
    /// (motors at `motor_rest`, indicator off).
    pub fn new(hw: A, motor_rest: Duty) -> Self {
        let safe = DutySnapshot {
            motor_left: motor_rest,
            motor_right: motor_rest,
            indicator: Duty::OFF,
        };
        let state = Self {
            inner: Mutex::new(Guarded {
                hw,
                duties: DutySnapshot::default(),
            }),
            safe,
        };
        state.reset_to_safe();
        info!(
            "actuators: ready, motors at {}%, indicator off",
            motor_rest.percent()
        );
        state
    }

    /// Validate and apply one duty.  On rejection nothing changes.
    pub fn set(&self, actuator: Actuator, percent: i64) -> Result<Duty, ActuatorError> {
        let duty = Duty::new(percent)?;
        let mut guard = self.lock();
        guard.hw.write_duty(actuator, duty)?;
        *guard.duties.slot_mut(actuator) = duty;
        Ok(duty)
    }

    /// Fail-safe: motors back to resting duty, indicator off.
    pub fn reset_to_safe(&self) {
        let mut guard = self.lock();
        for actuator in Actuator::ALL {
            let duty = self.safe.get(actuator);
            match guard.hw.write_duty(actuator, duty) {
                Ok(()) => *guard.duties.slot_mut(actuator) = duty,
                Err(e) => warn!("actuators: safe reset of {} failed: {}", actuator.name(), e),
            }
        }
    }

    pub fn get(&self, actuator: Actuator) -> Duty {
        self.lock().duties.get(actuator)
    }

    pub fn snapshot(&self) -> DutySnapshot {
        self.lock().duties
    }

    /// The duties applied by [`reset_to_safe`](Self::reset_to_safe).
    pub fn safe_defaults(&self) -> DutySnapshot {
        self.safe
    }

    /// Inspect the hardware adapter under the lock.
    pub fn with_hardware<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        f(&self.lock().hw)
    }

    fn lock(&self) -> MutexGuard<'_, Guarded<A>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
