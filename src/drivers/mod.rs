//! Peripheral drivers: one-shot init, LEDC PWM channels, delays, task spawn.

pub mod delay;
pub mod hw_init;
pub mod pwm;
pub mod task_pin;
