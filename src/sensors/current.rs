//! Motor current monitor.
//!
//! Both H-bridge sense outputs are read on ADC1 at 11 dB attenuation,
//! interleaved so the two channels see the same load instant.  The sense
//! voltage is converted to milliamps with a fixed rational factor.

use embedded_hal::delay::DelayNs;
use log::trace;

use crate::app::events::TelemetrySample;
use crate::app::ports::AnalogPort;
use crate::config::SystemConfig;

use super::{Accumulator, Calibration, Sampler, oversample};

pub struct MotorCurrentMonitor<P: AnalogPort, D: DelayNs> {
    adc: P,
    delay: D,
    channels: [u32; 2],
    cal: Calibration,
    samples: u16,
    inter_sample_delay_ms: u32,
    sense_num: u32,
    sense_den: u32,
}

impl<P: AnalogPort, D: DelayNs> MotorCurrentMonitor<P, D> {
    /// `channels` is `[left, right]`.
    pub fn new(adc: P, delay: D, channels: [u32; 2], cal: Calibration, cfg: &SystemConfig) -> Self {
        Self {
            adc,
            delay,
            channels,
            cal,
            samples: cfg.current_samples,
            inter_sample_delay_ms: cfg.inter_sample_delay_ms,
            sense_num: cfg.current_sense_num,
            sense_den: cfg.current_sense_den.max(1),
        }
    }

    /// Averaged `(left, right)` draw in milliamps.
    pub fn read_milliamps(&mut self) -> (u32, u32) {
        let mut left = Accumulator::default();
        let mut right = Accumulator::default();
        let [left_ch, right_ch] = self.channels;
        oversample(
            &mut self.adc,
            &mut self.delay,
            self.samples,
            self.inter_sample_delay_ms,
            |adc| {
                left.push(adc.read_raw(left_ch));
                right.push(adc.read_raw(right_ch));
            },
        );

        let l = self.to_milliamps(left.average());
        let r = self.to_milliamps(right.average());
        trace!(
            "current: {}/{} valid, {} mA / {} mA",
            left.valid_count(),
            right.valid_count(),
            l,
            r
        );
        (l, r)
    }

    fn to_milliamps(&self, raw_avg: u32) -> u32 {
        let mv = u64::from(self.cal.raw_to_millivolts(raw_avg));
        (mv * u64::from(self.sense_num) / u64::from(self.sense_den)) as u32
    }
}

impl<P: AnalogPort, D: DelayNs + Send> Sampler for MotorCurrentMonitor<P, D> {
    fn sample(&mut self) -> TelemetrySample {
        let (left, right) = self.read_milliamps();
        TelemetrySample::MotorCurrent { left, right }
    }
}
