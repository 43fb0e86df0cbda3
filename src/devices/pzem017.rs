use async_trait::async_trait;
use log::{debug, info};

use super::registers::{self, ShuntType};
use crate::config::settings::{ADDRESS_MAX, ADDRESS_MIN};
use crate::config::SensorConfig;
use crate::modbus::client::{ModbusTransport, RtuClient};
use crate::utils::error::Error;
use crate::utils::retry::{with_retry, RetryPolicy};

/// Builds a transport binding for the given connection parameters.
/// Invoked at construction and again whenever the slave address changes.
pub type TransportFactory =
    Box<dyn Fn(&SensorConfig) -> Result<Box<dyn ModbusTransport>, Error> + Send + Sync>;

/// Handle for one PZEM-017 unit on a Modbus RTU bus.
///
/// The handle owns its serial transport exclusively; all register traffic
/// for the device goes through it, one blocking exchange at a time. Every
/// operation is a fresh round trip, there is no caching. Mutating the
/// handle itself (retry budget, slave address) requires `&mut self`, so
/// concurrent calls against one handle are ruled out at compile time.
pub struct Pzem017 {
    config: SensorConfig,
    policy: RetryPolicy,
    transport: Box<dyn ModbusTransport>,
    factory: TransportFactory,
}

impl Pzem017 {
    /// Opens a serial RTU connection described by `config`.
    pub fn connect(config: SensorConfig) -> Result<Self, Error> {
        Self::with_transport(
            config,
            Box::new(|c| Ok(Box::new(RtuClient::open(c)?) as Box<dyn ModbusTransport>)),
        )
    }

    /// Builds a handle over an injected transport factory. This is the seam
    /// used by the test suite; production code goes through [`connect`].
    ///
    /// [`connect`]: Pzem017::connect
    pub fn with_transport(config: SensorConfig, factory: TransportFactory) -> Result<Self, Error> {
        config.validate()?;
        let transport = factory(&config)?;
        let policy = RetryPolicy::new(config.max_retries);
        info!(
            "Connected to PZEM-017 '{}' at address {} on {}",
            config.name, config.address, config.serial_port
        );
        Ok(Self {
            config,
            policy,
            transport,
            factory,
        })
    }

    /// Human-readable identifier given at construction.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Current retry budget. 0 means fail on the first transport error.
    pub fn retries(&self) -> u32 {
        self.policy.max_retries
    }

    pub fn set_retries(&mut self, count: u32) {
        self.policy.max_retries = count;
        self.config.max_retries = count;
    }

    /// Voltage in 0.1 V units (raw register word, no scaling applied).
    pub async fn voltage(&self) -> Result<u16, Error> {
        self.read_input("voltage", registers::INPUT_VOLTAGE).await
    }

    /// Current in 0.1 A units.
    pub async fn current(&self) -> Result<u16, Error> {
        self.read_input("current", registers::INPUT_CURRENT).await
    }

    /// Power in 0.1 W units, combined from the low/high register pair.
    ///
    /// The two words are read in separate exchanges; if the device updates
    /// its value in between, the result can mix old and new halves.
    pub async fn power(&self) -> Result<u32, Error> {
        let low = self.read_input("power", registers::INPUT_POWER_LOW).await?;
        let high = self.read_input("power", registers::INPUT_POWER_HIGH).await?;
        Ok(u32::from(high) * 65536 + u32::from(low))
    }

    /// Accumulated energy in Wh, combined from the low/high register pair.
    /// Same torn-read caveat as [`power`].
    ///
    /// [`power`]: Pzem017::power
    pub async fn energy(&self) -> Result<u32, Error> {
        let low = self
            .read_input("energy", registers::INPUT_ENERGY_LOW)
            .await?;
        let high = self
            .read_input("energy", registers::INPUT_ENERGY_HIGH)
            .await?;
        Ok(u32::from(high) * 65536 + u32::from(low))
    }

    /// Slave address as reported by the device itself.
    pub async fn address(&self) -> Result<u8, Error> {
        let word = self
            .read_holding("address", registers::HOLDING_SLAVE_ADDRESS)
            .await?;
        Ok(word as u8)
    }

    /// Writes a new slave address, then rebinds the transport so subsequent
    /// operations target the device under its new identity.
    ///
    /// The old binding is released before the new one is opened (a serial
    /// port cannot be held twice). If reopening fails the handle is left
    /// disconnected: calls fail with a connection error until `set_address`
    /// succeeds, but the handle itself stays usable.
    pub async fn set_address(&mut self, new_address: u8) -> Result<(), Error> {
        if !(ADDRESS_MIN..=ADDRESS_MAX).contains(&new_address) {
            return Err(Error::InvalidAddress(new_address));
        }

        self.write_holding(
            "set_address",
            registers::HOLDING_SLAVE_ADDRESS,
            u16::from(new_address),
        )
        .await?;

        let old_address = self.config.address;
        self.transport = Box::new(Disconnected);
        self.config.address = new_address;
        self.transport = (self.factory)(&self.config)?;

        info!(
            "PZEM-017 '{}' rebound from address {} to {}",
            self.config.name, old_address, new_address
        );
        Ok(())
    }

    /// High-voltage alarm threshold in 0.1 V units.
    pub async fn high_voltage_alarm(&self) -> Result<u16, Error> {
        self.read_holding("high_voltage_alarm", registers::HOLDING_HIGH_VOLTAGE_ALARM)
            .await
    }

    pub async fn set_high_voltage_alarm(&self, threshold: u16) -> Result<(), Error> {
        self.write_holding(
            "set_high_voltage_alarm",
            registers::HOLDING_HIGH_VOLTAGE_ALARM,
            threshold,
        )
        .await
    }

    /// Low-voltage alarm threshold in 0.1 V units.
    pub async fn low_voltage_alarm(&self) -> Result<u16, Error> {
        self.read_holding("low_voltage_alarm", registers::HOLDING_LOW_VOLTAGE_ALARM)
            .await
    }

    pub async fn set_low_voltage_alarm(&self, threshold: u16) -> Result<(), Error> {
        self.write_holding(
            "set_low_voltage_alarm",
            registers::HOLDING_LOW_VOLTAGE_ALARM,
            threshold,
        )
        .await
    }

    /// Configured shunt range. Fails with [`Error::InvalidShuntCode`] if the
    /// device reports a code outside the known table.
    pub async fn shunt_type(&self) -> Result<ShuntType, Error> {
        let code = self
            .read_holding("shunt_type", registers::HOLDING_SHUNT_TYPE)
            .await?;
        ShuntType::try_from(code)
    }

    pub async fn set_shunt_type(&self, shunt: ShuntType) -> Result<(), Error> {
        self.write_holding("set_shunt_type", registers::HOLDING_SHUNT_TYPE, shunt.code())
            .await
    }

    /// Pure code-to-label lookup, no device traffic.
    pub fn shunt_name(&self, code: u16) -> Result<&'static str, Error> {
        registers::shunt_name(code)
    }

    async fn read_input(&self, operation: &'static str, register: u16) -> Result<u16, Error> {
        let slave = self.config.address;
        let value = with_retry(&self.policy, operation, || {
            self.transport.read_input_register(slave, register)
        })
        .await?;
        debug!("{}: input register {} = {}", operation, register, value);
        Ok(value)
    }

    async fn read_holding(&self, operation: &'static str, register: u16) -> Result<u16, Error> {
        let slave = self.config.address;
        with_retry(&self.policy, operation, || {
            self.transport.read_holding_register(slave, register)
        })
        .await
    }

    async fn write_holding(
        &self,
        operation: &'static str,
        register: u16,
        value: u16,
    ) -> Result<(), Error> {
        let slave = self.config.address;
        with_retry(&self.policy, operation, || {
            self.transport.write_register(slave, register, value)
        })
        .await
    }
}

/// Placeholder transport held while the handle is between bindings.
struct Disconnected;

#[async_trait]
impl ModbusTransport for Disconnected {
    async fn read_holding_register(&self, _slave: u8, _register: u16) -> Result<u16, Error> {
        Err(Error::Connection("transport not bound".to_string()))
    }

    async fn read_input_register(&self, _slave: u8, _register: u16) -> Result<u16, Error> {
        Err(Error::Connection("transport not bound".to_string()))
    }

    async fn write_register(&self, _slave: u8, _register: u16, _value: u16) -> Result<(), Error> {
        Err(Error::Connection("transport not bound".to_string()))
    }
}
