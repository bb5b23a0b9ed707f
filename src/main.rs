//! TankBot firmware — main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                      │
//! │                                                               │
//! │  PwmActuators (ActuatorPort)   AdcReader (AnalogPort)         │
//! │  WsServer (WsEngine + Broadcaster)   FileConfig (ConfigPort)  │
//! │                                                               │
//! │  ─────────────── Port Trait Boundary ───────────────          │
//! │                                                               │
//! │   ActuatorState · CommandInterpreter (pure logic)             │
//! │                                                               │
//! │  Tasks: http-intake → queue → http-dispatch                   │
//! │         telemetry-battery · telemetry-current · ws-client×N   │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Result;
use log::{error, info};

use tankbot::adapters::hardware::{AdcReader, PwmActuators};
use tankbot::adapters::ws_engine::WsServer;
use tankbot::app::actuators::{ActuatorState, Duty};
use tankbot::app::ports::{Broadcaster, WsHandler};
use tankbot::app::service::CommandInterpreter;
use tankbot::config::SystemConfig;
use tankbot::drivers::delay::StdDelay;
use tankbot::drivers::hw_init;
use tankbot::drivers::task_pin::{Core, spawn_on_core};
use tankbot::net::{ConnectionQueue, Dispatcher, intake};
use tankbot::pins;
use tankbot::sensors::battery::BatteryMonitor;
use tankbot::sensors::current::MotorCurrentMonitor;
use tankbot::sensors::Attenuation;
use tankbot::telemetry::TelemetryTask;

/// Accept → dispatch hand-off.
static CONNECTIONS: ConnectionQueue<TcpStream> = ConnectionQueue::new();

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Bootstrap + logging ────────────────────────────────
    init_logging()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TankBot v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config();

    // ── 3. Peripherals + safe actuator defaults ───────────────
    hw_init::init_peripherals()?;
    let rest = Duty::new(i64::from(config.motor_rest_duty)).map_err(tankbot::error::Error::from)?;
    let actuators = Arc::new(ActuatorState::new(PwmActuators::ledc(), rest));

    #[cfg(not(target_os = "espidf"))]
    seed_simulated_adc();

    // ── 4. WebSocket engine + command interpreter ─────────────
    let ws = Arc::new(WsServer::new(
        config.max_ws_clients,
        config.ws_poll_interval_ms,
        config.recv_timeout_ms,
        config.ws_send_timeout_ms,
    ));
    let interpreter: Arc<dyn WsHandler> = Arc::new(CommandInterpreter::new(Arc::clone(&actuators)));

    // ── 5. Listener ───────────────────────────────────────────
    let listener = TcpListener::bind(("0.0.0.0", config.http_port))?;
    info!("server listening on port {}", config.http_port);

    // ── 6. Tasks ──────────────────────────────────────────────
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    tasks.push(spawn_on_core(Core::Pro, 9, 4, "http-intake\0", move || {
        let err = intake::run_intake(&listener, &CONNECTIONS);
        error!("listener failed ({}), restarting", err);
        hw_init::restart()
    })?);

    let dispatcher = Dispatcher::new(Arc::clone(&ws), interpreter, config.recv_timeout_ms);
    tasks.push(spawn_on_core(Core::Pro, 8, 8, "http-dispatch\0", move || {
        dispatcher.run(&CONNECTIONS)
    })?);

    let broadcaster: Arc<dyn Broadcaster> = ws;

    let battery = BatteryMonitor::new(
        AdcReader,
        StdDelay,
        pins::BATTERY_ADC_CHANNEL,
        hw_init::adc1_calibration(Attenuation::Db6, config.default_vref_mv),
        &config,
    );
    let battery_task = TelemetryTask::new(
        "telemetry-battery",
        battery,
        Arc::clone(&broadcaster),
        config.battery_period_ms,
    );
    tasks.push(spawn_on_core(Core::App, 5, 4, "telemetry-battery\0", move || {
        battery_task.run()
    })?);

    let current = MotorCurrentMonitor::new(
        AdcReader,
        StdDelay,
        [pins::MOTOR_LEFT_SENSE_ADC_CHANNEL, pins::MOTOR_RIGHT_SENSE_ADC_CHANNEL],
        hw_init::adc1_calibration(Attenuation::Db11, config.default_vref_mv),
        &config,
    );
    let current_task = TelemetryTask::new(
        "telemetry-current",
        current,
        broadcaster,
        config.current_period_ms,
    );
    tasks.push(spawn_on_core(Core::App, 5, 4, "telemetry-current\0", move || {
        current_task.run()
    })?);

    // ── 7. Supervise ──────────────────────────────────────────
    // None of the tasks return; one that does has panicked.
    loop {
        std::thread::sleep(Duration::from_secs(1));
        if let Some(dead) = tasks.iter().find(|t| t.is_finished()) {
            error!(
                "task '{}' exited, restarting",
                dead.thread().name().unwrap_or("?")
            );
            hw_init::restart();
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn init_logging() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn init_logging() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init()?;
    Ok(())
}

#[cfg(target_os = "espidf")]
fn load_config() -> SystemConfig {
    info!("config: using built-in defaults");
    SystemConfig::default()
}

#[cfg(not(target_os = "espidf"))]
fn load_config() -> SystemConfig {
    use tankbot::adapters::config_file::FileConfig;
    use tankbot::app::ports::ConfigPort;

    let source = FileConfig::from_env();
    match source.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

/// Plausible idle readings so the simulator broadcasts non-zero telemetry.
#[cfg(not(target_os = "espidf"))]
fn seed_simulated_adc() {
    // ~7.4 V pack through the divider at 6 dB
    hw_init::sim_set_adc(pins::BATTERY_ADC_CHANNEL, 2665);
    // light idle draw on both tracks at 11 dB
    hw_init::sim_set_adc(pins::MOTOR_LEFT_SENSE_ADC_CHANNEL, 90);
    hw_init::sim_set_adc(pins::MOTOR_RIGHT_SENSE_ADC_CHANNEL, 95);
    info!("hw_init(sim): ADC seeded");
}
