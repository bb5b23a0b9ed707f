//! Battery voltage monitor.
//!
//! The pack is measured through a resistor divider on ADC1 (6 dB
//! attenuation).  Each sample averages a burst of raw conversions,
//! discarding zero glitches, then scales the divider tap back up to the
//! pack voltage.

use embedded_hal::delay::DelayNs;
use log::trace;

use crate::app::events::TelemetrySample;
use crate::app::ports::AnalogPort;
use crate::config::SystemConfig;

use super::{Accumulator, Calibration, Sampler, oversample};

pub struct BatteryMonitor<P: AnalogPort, D: DelayNs> {
    adc: P,
    delay: D,
    channel: u32,
    cal: Calibration,
    samples: u16,
    inter_sample_delay_ms: u32,
    divider_milli: u32,
}

impl<P: AnalogPort, D: DelayNs> BatteryMonitor<P, D> {
    pub fn new(adc: P, delay: D, channel: u32, cal: Calibration, cfg: &SystemConfig) -> Self {
        Self {
            adc,
            delay,
            channel,
            cal,
            samples: cfg.battery_samples,
            inter_sample_delay_ms: cfg.inter_sample_delay_ms,
            divider_milli: cfg.battery_divider_milli,
        }
    }

    /// Averaged pack voltage in millivolts.
    pub fn read_millivolts(&mut self) -> u32 {
        let mut acc = Accumulator::default();
        let channel = self.channel;
        oversample(
            &mut self.adc,
            &mut self.delay,
            self.samples,
            self.inter_sample_delay_ms,
            |adc| acc.push(adc.read_raw(channel)),
        );

        let tap_mv = self.cal.raw_to_millivolts(acc.average());
        let pack_mv = (u64::from(tap_mv) * u64::from(self.divider_milli) / 1000) as u32;
        trace!(
            "battery: {} valid, tap {} mV, pack {} mV",
            acc.valid_count(),
            tap_mv,
            pack_mv
        );
        pack_mv
    }
}

impl<P: AnalogPort, D: DelayNs + Send> Sampler for BatteryMonitor<P, D> {
    fn sample(&mut self) -> TelemetrySample {
        TelemetrySample::BatteryVoltage(self.read_millivolts())
    }
}
