use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::error::Error;

/// Lowest slave address assignable on a Modbus bus.
pub const ADDRESS_MIN: u8 = 1;
/// Highest slave address assignable on a Modbus bus (248+ are reserved).
pub const ADDRESS_MAX: u8 = 247;

/// Connection parameters for one PZEM-017 unit.
///
/// One config describes exactly one physical sensor; the device handle
/// built from it owns the serial port for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Serial device path, e.g. `/dev/ttyUSB0`.
    pub serial_port: String,
    /// Human-readable identifier for log lines and payloads.
    pub name: String,
    /// Modbus slave address.
    pub address: u8,
    pub baud_rate: u32,
    /// Response timeout in seconds.
    pub timeout_secs: u64,
    pub stop_bits: u8,
    /// Initial retry budget for register operations. 0 = fail on first error.
    pub max_retries: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            serial_port: "/dev/ttyUSB0".to_string(),
            name: "PZEM-017".to_string(),
            address: 1,
            baud_rate: 9600,
            timeout_secs: 5,
            stop_bits: 2,
            max_retries: 0,
        }
    }
}

impl SensorConfig {
    pub fn new<S: Into<String>>(serial_port: S, name: S) -> Self {
        Self {
            serial_port: serial_port.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks the parameters the transport cannot express.
    /// Called at handle construction; invalid values never reach the port.
    pub fn validate(&self) -> Result<(), Error> {
        if self.serial_port.is_empty() {
            return Err(Error::Config("serial port path is empty".to_string()));
        }
        if !(ADDRESS_MIN..=ADDRESS_MAX).contains(&self.address) {
            return Err(Error::Config(format!(
                "slave address {} outside valid range {}-{}",
                self.address, ADDRESS_MIN, ADDRESS_MAX
            )));
        }
        if self.baud_rate == 0 {
            return Err(Error::Config("baud rate must be non-zero".to_string()));
        }
        if self.stop_bits != 1 && self.stop_bits != 2 {
            return Err(Error::Config(format!(
                "stop bits must be 1 or 2, got {}",
                self.stop_bits
            )));
        }
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: SensorConfig =
            toml::from_str(&content).map_err(|e| Error::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("failed to create config dir: {}", e)))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("failed to write config: {}", e)))?;
        Ok(())
    }
}
