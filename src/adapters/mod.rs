//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements    | Connects to                      |
//! |------------|---------------|----------------------------------|
//! | `hardware` | SensorPort    | ESP32 ADC1 (probe inputs)        |
//! |            | ActuatorPort  | Output latch → fan/servo LEDC    |
//! | `log_sink` | EventSink     | Serial log output                |
//! | `nvs`      | ConfigPort    | NVS / in-memory store            |
//! | `time`     | Clock         | ESP32 system timer               |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
