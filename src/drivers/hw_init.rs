//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC1 oneshot unit and the LEDC timer/channels using
//! raw ESP-IDF sys calls.  Called once from `main()` before any task
//! starts.  Host builds replace the registers with atomics that tests
//! and the simulator can poke.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::{info, warn};

use crate::error::{ActuatorError, SensorError};
use crate::pins;
use crate::sensors::{Attenuation, Calibration};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    LedcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::AdcInitFailed(_) => Self::Init("ADC1"),
            HwInitError::LedcInitFailed(_) => Self::Init("LEDC"),
        }
    }
}

pub const LEDC_CH_MOTOR_LEFT: u32 = 0;
pub const LEDC_CH_MOTOR_RIGHT: u32 = 1;
pub const LEDC_CH_INDICATOR: u32 = 2;

const LEDC_CHANNELS: usize = 3;

/// ADC1 conversion width.
pub const ADC_WIDTH_BITS: u32 = 12;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before any task is spawned.
    unsafe {
        init_adc()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// Serialises oneshot conversions from the two telemetry tasks.
#[cfg(target_os = "espidf")]
static ADC1_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// SAFETY: `ADC1_HANDLE` is written once in `init_adc()` before any
/// reader thread exists, and is read-only afterwards.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    // Battery divider tap: 6 dB.  Motor sense outputs: 11 dB (now DB_12).
    let channels = [
        (pins::BATTERY_ADC_CHANNEL, Attenuation::Db6),
        (pins::MOTOR_LEFT_SENSE_ADC_CHANNEL, Attenuation::Db11),
        (pins::MOTOR_RIGHT_SENSE_ADC_CHANNEL, Attenuation::Db11),
    ];
    for (channel, atten) in channels {
        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten(atten),
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }
    }

    info!(
        "hw_init: ADC1 configured (CH{}=battery, CH{}/CH{}=motor sense)",
        pins::BATTERY_ADC_CHANNEL,
        pins::MOTOR_LEFT_SENSE_ADC_CHANNEL,
        pins::MOTOR_RIGHT_SENSE_ADC_CHANNEL
    );
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let _guard = ADC1_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; conversions serialised by ADC1_LOCK.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.max(0) as u16)
}

// ── ADC calibration ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn adc_atten(atten: Attenuation) -> adc_atten_t {
    match atten {
        Attenuation::Db0 => adc_atten_t_ADC_ATTEN_DB_0,
        Attenuation::Db2_5 => adc_atten_t_ADC_ATTEN_DB_2_5,
        Attenuation::Db6 => adc_atten_t_ADC_ATTEN_DB_6,
        Attenuation::Db11 => adc_atten_t_ADC_ATTEN_DB_12,
    }
}

/// Calibration for one ADC1 attenuation group.
///
/// Uses the chip's line-fitting scheme (eFuse two-point / Vref data, or
/// `default_vref_mv` when the eFuse is blank) and samples that line at
/// both ends of the code range.  Falls back to the nominal model when the
/// scheme is unavailable.
#[cfg(all(target_os = "espidf", any(esp32, esp32s2, esp32c2)))]
pub fn adc1_calibration(atten: Attenuation, default_vref_mv: u32) -> Calibration {
    #[allow(unused_mut)]
    let mut cfg = adc_cali_line_fitting_config_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        atten: adc_atten(atten),
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        ..Default::default()
    };
    #[cfg(esp32)]
    {
        cfg.default_vref = default_vref_mv;
    }

    let mut handle: adc_cali_handle_t = core::ptr::null_mut();
    // SAFETY: `cfg` and `handle` outlive the call; the scheme is deleted below.
    let ret = unsafe { adc_cali_create_scheme_line_fitting(&cfg, &mut handle) };
    if ret != ESP_OK as i32 {
        warn!("hw_init: ADC line fitting unavailable (rc={}), nominal {} mV vref", ret, default_vref_mv);
        return Calibration::characterize(default_vref_mv, atten, ADC_WIDTH_BITS);
    }

    let max_raw = (1i32 << ADC_WIDTH_BITS) - 1;
    let (mut low_mv, mut high_mv) = (0i32, 0i32);
    // SAFETY: `handle` is live until the delete call.
    let ok = unsafe {
        let ok = adc_cali_raw_to_voltage(handle, 0, &mut low_mv) == ESP_OK as i32
            && adc_cali_raw_to_voltage(handle, max_raw, &mut high_mv) == ESP_OK as i32;
        adc_cali_delete_scheme_line_fitting(handle);
        ok
    };
    if !ok {
        warn!("hw_init: ADC calibration lookup failed, nominal {} mV vref", default_vref_mv);
        return Calibration::characterize(default_vref_mv, atten, ADC_WIDTH_BITS);
    }

    info!("hw_init: ADC1 {:?} calibrated {}..{} mV", atten, low_mv, high_mv);
    Calibration::from_endpoints(low_mv.max(0) as u32, high_mv.max(0) as u32, ADC_WIDTH_BITS)
}

/// Chips without the line-fitting scheme use the nominal model.
#[cfg(all(target_os = "espidf", not(any(esp32, esp32s2, esp32c2))))]
pub fn adc1_calibration(atten: Attenuation, default_vref_mv: u32) -> Calibration {
    Calibration::characterize(default_vref_mv, atten, ADC_WIDTH_BITS)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_calibration(atten: Attenuation, default_vref_mv: u32) -> Calibration {
    Calibration::characterize(default_vref_mv, atten, ADC_WIDTH_BITS)
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0: motors + indicator (400 Hz, 8-bit)
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

    let outputs = [
        (LEDC_CH_MOTOR_LEFT, pins::MOTOR_LEFT_GPIO),
        (LEDC_CH_MOTOR_RIGHT, pins::MOTOR_RIGHT_GPIO),
        (LEDC_CH_INDICATOR, pins::INDICATOR_GPIO),
    ];
    for (channel, gpio) in outputs {
        let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        }) };
        if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }
    }

    info!("hw_init: LEDC configured (motor-left=CH0, motor-right=CH1, indicator=CH2)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u32) -> Result<(), ActuatorError> {
    // SAFETY: LEDC channels were configured in init_ledc(); callers hold
    // the actuator record lock, so writes never interleave.
    let ret = unsafe {
        let rc = ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty);
        if rc == ESP_OK as i32 {
            ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel)
        } else {
            rc
        }
    };
    if ret != ESP_OK as i32 {
        return Err(ActuatorError::PwmWriteFailed);
    }
    Ok(())
}

// ── Host simulation ──────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicU16, AtomicU32};

    pub(super) const ADC_CHANNELS: usize = 10;

    pub(super) static ADC: [AtomicU16; ADC_CHANNELS] = [const { AtomicU16::new(0) }; ADC_CHANNELS];
    pub(super) static LEDC: [AtomicU32; super::LEDC_CHANNELS] =
        [const { AtomicU32::new(0) }; super::LEDC_CHANNELS];
}

/// Set the raw value every subsequent simulated conversion on `channel` returns.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: u32, raw: u16) {
    if let Some(slot) = sim::ADC.get(channel as usize) {
        slot.store(raw, core::sync::atomic::Ordering::Relaxed);
    }
}

/// Last duty register value written to a simulated LEDC channel.
#[cfg(not(target_os = "espidf"))]
pub fn sim_ledc_duty(channel: u32) -> Option<u32> {
    sim::LEDC
        .get(channel as usize)
        .map(|slot| slot.load(core::sync::atomic::Ordering::Relaxed))
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    sim::ADC
        .get(channel as usize)
        .map(|slot| slot.load(core::sync::atomic::Ordering::Relaxed))
        .ok_or(SensorError::AdcReadFailed)
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(channel: u32, duty: u32) -> Result<(), ActuatorError> {
    let slot = sim::LEDC
        .get(channel as usize)
        .ok_or(ActuatorError::PwmWriteFailed)?;
    slot.store(duty, core::sync::atomic::Ordering::Relaxed);
    Ok(())
}

// ── Restart ──────────────────────────────────────────────────

/// Reboot the device.  Used when the listener dies.
#[cfg(target_os = "espidf")]
pub fn restart() -> ! {
    // SAFETY: esp_restart never returns and may be called from any task.
    unsafe { esp_restart() }
}

#[cfg(not(target_os = "espidf"))]
pub fn restart() -> ! {
    log::error!("hw_init(sim): restart requested, exiting");
    std::process::exit(1)
}
