//! PZEM-017 Modbus RTU Driver
//!
//! This library talks to a single PZEM-017 DC power monitor over a
//! Modbus RTU serial link. It exposes named getters and setters for the
//! device's registers (voltage, current, power, energy, alarm thresholds,
//! shunt range, slave address) with a bounded retry policy wrapped around
//! every register operation.

pub mod config;
pub mod devices;
pub mod modbus;
pub mod utils;

// Re-export commonly used types
pub use config::SensorConfig;
pub use devices::pzem017::TransportFactory;
pub use devices::registers::shunt_name;
pub use devices::{Pzem017, ShuntType};
pub use modbus::{ModbusTransport, RtuClient};
pub use utils::error::Error;
pub use utils::retry::RetryPolicy;

pub const VERSION: &str = "0.1.0";
