//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements            | Connects to                |
//! |---------------|-----------------------|----------------------------|
//! | `hardware`    | ActuatorPort          | LEDC PWM channels          |
//! |               | AnalogPort            | ADC1 oneshot               |
//! | `ws_engine`   | WsEngine, Broadcaster | tungstenite over TCP       |
//! | `config_file` | ConfigPort            | JSON file (`TANKBOT_CONFIG`) |

pub mod config_file;
pub mod hardware;
pub mod ws_engine;
