//! Analog sensing — calibration, oversampling and the monitors built on them.
//!
//! Each monitor owns its ADC handle, its delay source and a copy of the
//! [`Calibration`] for its channel group.  Accumulators live on the stack
//! of each [`Sampler::sample`] call, so the two periodic tasks share no
//! mutable state.

pub mod battery;
pub mod current;

use embedded_hal::delay::DelayNs;

use crate::app::events::TelemetrySample;
use crate::app::ports::AnalogPort;

/// Anything that produces one telemetry sample per schedule tick.
pub trait Sampler: Send {
    fn sample(&mut self) -> TelemetrySample;
}

// ───────────────────────────────────────────────────────────────
// Calibration
// ───────────────────────────────────────────────────────────────

/// ADC input attenuation.  Sets the usable input range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attenuation {
    Db0,
    Db2_5,
    Db6,
    Db11,
}

impl Attenuation {
    /// Full-scale multiplier over the reference voltage, ×1000.
    const fn scale_milli(self) -> u32 {
        match self {
            Self::Db0 => 1000,
            Self::Db2_5 => 1334,
            Self::Db6 => 2000,
            Self::Db11 => 3548,
        }
    }
}

/// Raw → millivolt characterisation for one channel group.
///
/// A straight line from `offset_mv` at code 0 to `full_scale_mv` at the
/// top code.  Derived once at startup and read-only thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    offset_mv: u32,
    full_scale_mv: u32,
    max_raw: u32,
}

impl Calibration {
    /// Linear characterisation from the reference voltage, attenuation
    /// and conversion width (bits).
    pub fn characterize(vref_mv: u32, atten: Attenuation, width_bits: u32) -> Self {
        Self::from_endpoints(0, vref_mv.saturating_mul(atten.scale_milli()) / 1000, width_bits)
    }

    /// Line through two measured points, e.g. the chip's own
    /// line-fitting calibration evaluated at code 0 and the top code.
    pub fn from_endpoints(offset_mv: u32, full_scale_mv: u32, width_bits: u32) -> Self {
        let width_bits = width_bits.clamp(1, 16);
        Self {
            offset_mv: offset_mv.min(full_scale_mv),
            full_scale_mv,
            max_raw: (1u32 << width_bits) - 1,
        }
    }

    pub fn offset_mv(&self) -> u32 {
        self.offset_mv
    }

    pub fn full_scale_mv(&self) -> u32 {
        self.full_scale_mv
    }

    /// Convert an (averaged) raw reading.  Readings above full scale
    /// saturate at the full-scale voltage.
    pub fn raw_to_millivolts(&self, raw: u32) -> u32 {
        let raw = u64::from(raw.min(self.max_raw));
        let span = u64::from(self.full_scale_mv - self.offset_mv);
        self.offset_mv + (raw * span / u64::from(self.max_raw)) as u32
    }
}

// ───────────────────────────────────────────────────────────────
// Oversampling
// ───────────────────────────────────────────────────────────────

/// Running sum of non-zero readings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Accumulator {
    sum: u32,
    count: u32,
}

impl Accumulator {
    /// Add one reading.  Zero readings and failed reads are glitches and
    /// are skipped.
    pub fn push(&mut self, reading: Result<u16, crate::error::SensorError>) {
        if let Ok(raw) = reading {
            if raw > 0 {
                self.sum += u32::from(raw);
                self.count += 1;
            }
        }
    }

    pub fn valid_count(&self) -> u32 {
        self.count
    }

    /// Mean of the accepted readings, `0` when none were accepted.
    pub fn average(&self) -> u32 {
        if self.count == 0 { 0 } else { self.sum / self.count }
    }
}

/// Take `samples` rounds of readings, calling `read` once per round with
/// `delay_ms` between rounds.
pub(crate) fn oversample<P, D, F>(adc: &mut P, delay: &mut D, samples: u16, delay_ms: u32, mut read: F)
where
    P: AnalogPort,
    D: DelayNs,
    F: FnMut(&mut P),
{
    for _ in 0..samples {
        read(adc);
        delay.delay_ms(delay_ms);
    }
}
