//! Fixed register map of the PZEM-017, defined by the device firmware.
//!
//! Holding registers carry configuration, input registers carry live
//! measurements. All measurement scaling (0.1 V / 0.1 A / 0.1 W / 1 Wh)
//! is left to the caller; the accessor returns raw register words.

use crate::utils::error::Error;

// Holding registers (read/write configuration)
pub const HOLDING_HIGH_VOLTAGE_ALARM: u16 = 0;
pub const HOLDING_LOW_VOLTAGE_ALARM: u16 = 1;
pub const HOLDING_SLAVE_ADDRESS: u16 = 2;
pub const HOLDING_SHUNT_TYPE: u16 = 3;

// Input registers (read-only measurements)
pub const INPUT_VOLTAGE: u16 = 0;
pub const INPUT_CURRENT: u16 = 1;
pub const INPUT_POWER_LOW: u16 = 2;
pub const INPUT_POWER_HIGH: u16 = 3;
pub const INPUT_ENERGY_LOW: u16 = 4;
pub const INPUT_ENERGY_HIGH: u16 = 5;

/// External shunt rating, selected on the device by a small integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuntType {
    A100,
    A50,
    A200,
    A300,
}

impl ShuntType {
    /// Register code written to [`HOLDING_SHUNT_TYPE`].
    pub fn code(self) -> u16 {
        match self {
            ShuntType::A100 => 1,
            ShuntType::A50 => 2,
            ShuntType::A200 => 3,
            ShuntType::A300 => 4,
        }
    }

    /// Current-range label as printed on the shunt.
    pub fn label(self) -> &'static str {
        match self {
            ShuntType::A100 => "100A",
            ShuntType::A50 => "50A",
            ShuntType::A200 => "200A",
            ShuntType::A300 => "300A",
        }
    }
}

impl TryFrom<u16> for ShuntType {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ShuntType::A100),
            2 => Ok(ShuntType::A50),
            3 => Ok(ShuntType::A200),
            4 => Ok(ShuntType::A300),
            other => Err(Error::InvalidShuntCode(other)),
        }
    }
}

impl std::fmt::Display for ShuntType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Pure code-to-label lookup over the shunt table.
pub fn shunt_name(code: u16) -> Result<&'static str, Error> {
    ShuntType::try_from(code).map(ShuntType::label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shunt_lookup_is_total_on_valid_codes() {
        assert_eq!(shunt_name(1).unwrap(), "100A");
        assert_eq!(shunt_name(2).unwrap(), "50A");
        assert_eq!(shunt_name(3).unwrap(), "200A");
        assert_eq!(shunt_name(4).unwrap(), "300A");
    }

    #[test]
    fn shunt_lookup_rejects_unknown_codes() {
        assert!(matches!(shunt_name(0), Err(Error::InvalidShuntCode(0))));
        assert!(matches!(shunt_name(5), Err(Error::InvalidShuntCode(5))));
        assert!(matches!(
            shunt_name(u16::MAX),
            Err(Error::InvalidShuntCode(u16::MAX))
        ));
    }

    #[test]
    fn codes_round_trip() {
        for shunt in [
            ShuntType::A100,
            ShuntType::A50,
            ShuntType::A200,
            ShuntType::A300,
        ] {
            assert_eq!(ShuntType::try_from(shunt.code()).unwrap(), shunt);
        }
    }
}
