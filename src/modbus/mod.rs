pub mod client;
pub mod crc;

pub use client::{ModbusTransport, RtuClient};
pub use crc::crc16;
