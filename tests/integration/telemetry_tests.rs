//! Samplers and telemetry tasks against scripted ADC readings.

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use tankbot::app::events::TelemetrySample;
use tankbot::config::SystemConfig;
use tankbot::pins;
use tankbot::sensors::battery::BatteryMonitor;
use tankbot::sensors::current::MotorCurrentMonitor;
use tankbot::sensors::{Attenuation, Calibration, Sampler};
use tankbot::telemetry::TelemetryTask;

use crate::mock_hw::{CaptureBroadcaster, ScriptedAdc};

#[derive(Default)]
struct TallyDelay {
    calls: u32,
}

impl DelayNs for TallyDelay {
    fn delay_ns(&mut self, _ns: u32) {
        self.calls += 1;
    }

    fn delay_ms(&mut self, _ms: u32) {
        self.calls += 1;
    }
}

fn battery_cal() -> Calibration {
    Calibration::characterize(1100, Attenuation::Db6, 12)
}

fn current_cal() -> Calibration {
    Calibration::characterize(1100, Attenuation::Db11, 12)
}

#[test]
fn battery_uses_configured_window_and_divider() {
    let cfg = SystemConfig::default();
    let adc = ScriptedAdc::default().channel(pins::BATTERY_ADC_CHANNEL, &[2665]);
    let mut mon = BatteryMonitor::new(adc, TallyDelay::default(), pins::BATTERY_ADC_CHANNEL, battery_cal(), &cfg);

    // 2665 counts @ 2200 mV full scale = 1431 mV; × 5.168 = 7395 mV
    assert_eq!(mon.sample(), TelemetrySample::BatteryVoltage(7395));
}

#[test]
fn battery_zero_glitches_do_not_drag_the_average() {
    let cfg = SystemConfig {
        battery_samples: 8,
        ..SystemConfig::default()
    };
    let mut readings = vec![0u16; 7];
    readings.push(4095);
    let clean = ScriptedAdc::default().channel(0, &[4095]);
    let glitchy = ScriptedAdc::default().channel(0, &readings);

    let mut a = BatteryMonitor::new(clean, TallyDelay::default(), 0, battery_cal(), &cfg);
    let mut b = BatteryMonitor::new(glitchy, TallyDelay::default(), 0, battery_cal(), &cfg);
    assert_eq!(a.sample(), b.sample());
}

#[test]
fn current_reads_both_channels_per_round() {
    let cfg = SystemConfig {
        current_samples: 64,
        ..SystemConfig::default()
    };
    let adc = ScriptedAdc::default()
        .channel(pins::MOTOR_LEFT_SENSE_ADC_CHANNEL, &[0, 100, 0, 100])
        .channel(pins::MOTOR_RIGHT_SENSE_ADC_CHANNEL, &[200]);
    let mut mon = MotorCurrentMonitor::new(
        adc,
        TallyDelay::default(),
        [pins::MOTOR_LEFT_SENSE_ADC_CHANNEL, pins::MOTOR_RIGHT_SENSE_ADC_CHANNEL],
        current_cal(),
        &cfg,
    );

    // 11 dB full scale = 1100 × 3.548 = 3902 mV
    // left: 100 counts → 95 mV → 269 mA; right: 200 counts → 190 mV → 538 mA
    assert_eq!(
        mon.sample(),
        TelemetrySample::MotorCurrent { left: 269, right: 538 }
    );
}

#[test]
fn telemetry_task_broadcasts_rendered_text() {
    let cfg = SystemConfig::default();
    let out = Arc::new(CaptureBroadcaster::with_clients(0));

    let adc = ScriptedAdc::default()
        .channel(pins::MOTOR_LEFT_SENSE_ADC_CHANNEL, &[0])
        .channel(pins::MOTOR_RIGHT_SENSE_ADC_CHANNEL, &[0]);
    let mon = MotorCurrentMonitor::new(
        adc,
        TallyDelay::default(),
        [pins::MOTOR_LEFT_SENSE_ADC_CHANNEL, pins::MOTOR_RIGHT_SENSE_ADC_CHANNEL],
        current_cal(),
        &cfg,
    );
    let mut task = TelemetryTask::new("current", mon, out.clone(), cfg.current_period_ms);

    assert_eq!(task.tick(), 0, "zero clients is harmless");
    assert_eq!(out.sent(), vec!["A0,0"]);
}
