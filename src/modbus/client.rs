use std::io::{Read, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use log::{debug, info};
use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};

use super::crc::crc16;
use crate::config::SensorConfig;
use crate::utils::error::Error;

const FC_READ_HOLDING: u8 = 0x03;
const FC_READ_INPUT: u8 = 0x04;
const FC_WRITE_SINGLE: u8 = 0x06;

/// The Modbus master the device accessor talks through.
///
/// Exactly the operations the PZEM-017 needs: single-register reads of
/// both register classes and a single-register write. Implementations
/// signal transient failures as [`Error::NoResponse`] / [`Error::Transport`]
/// so the retry policy can tell them from protocol-level faults.
#[async_trait]
pub trait ModbusTransport: Send + Sync {
    async fn read_holding_register(&self, slave: u8, register: u16) -> Result<u16, Error>;

    async fn read_input_register(&self, slave: u8, register: u16) -> Result<u16, Error>;

    async fn write_register(&self, slave: u8, register: u16, value: u16) -> Result<(), Error>;
}

/// Modbus RTU master over one serial port.
pub struct RtuClient {
    port: Mutex<Box<dyn SerialPort>>,
}

impl RtuClient {
    pub fn open(config: &SensorConfig) -> Result<Self, Error> {
        config.validate()?;

        let stop_bits = match config.stop_bits {
            1 => StopBits::One,
            _ => StopBits::Two,
        };

        info!(
            "Opening Modbus RTU port {} ({} baud, 8N{}, timeout {}s)",
            config.serial_port, config.baud_rate, config.stop_bits, config.timeout_secs
        );

        let port = serialport::new(&config.serial_port, config.baud_rate)
            .timeout(config.timeout())
            .data_bits(DataBits::Eight)
            .stop_bits(stop_bits)
            .parity(Parity::None)
            .open()
            .map_err(|e| {
                Error::Connection(format!("failed to open {}: {}", config.serial_port, e))
            })?;

        Ok(Self {
            port: Mutex::new(port),
        })
    }

    /// One request/response exchange. `response_len` is the frame length a
    /// normal reply has; exception replies are shorter and handled inline.
    fn transact(&self, request: &[u8], response_len: usize) -> Result<Vec<u8>, Error> {
        let mut port = self.port.lock().map_err(|_| Error::Lock)?;

        // stale bytes from an aborted exchange would desync the framing
        let _ = port.clear(ClearBuffer::Input);

        port.write_all(request)?;
        port.flush()?;

        let mut head = [0u8; 3];
        port.read_exact(&mut head)?;

        if head[1] & 0x80 != 0 {
            let mut trailer = [0u8; 2];
            port.read_exact(&mut trailer)?;
            let mut frame = head.to_vec();
            frame.extend_from_slice(&trailer);
            verify_crc(&frame)?;
            if frame[0] != request[0] {
                return Err(Error::InvalidResponse);
            }
            return Err(Error::Exception(head[2]));
        }

        let mut rest = vec![0u8; response_len - head.len()];
        port.read_exact(&mut rest)?;
        let mut frame = head.to_vec();
        frame.extend_from_slice(&rest);

        verify_crc(&frame)?;
        if frame[0] != request[0] || frame[1] != request[1] {
            return Err(Error::InvalidResponse);
        }
        Ok(frame)
    }

    fn read_register(&self, slave: u8, function_code: u8, register: u16) -> Result<u16, Error> {
        let request = read_request(slave, function_code, register);
        debug!(
            "-> slave {} fc {:#04x} register {}",
            slave, function_code, register
        );

        // slave + fc + byte count + one word + crc
        let frame = self.transact(&request, 7)?;
        if frame[2] != 2 {
            return Err(Error::InvalidResponse);
        }
        let value = u16::from_be_bytes([frame[3], frame[4]]);
        debug!("<- slave {} register {} = {}", slave, register, value);
        Ok(value)
    }
}

#[async_trait]
impl ModbusTransport for RtuClient {
    async fn read_holding_register(&self, slave: u8, register: u16) -> Result<u16, Error> {
        self.read_register(slave, FC_READ_HOLDING, register)
    }

    async fn read_input_register(&self, slave: u8, register: u16) -> Result<u16, Error> {
        self.read_register(slave, FC_READ_INPUT, register)
    }

    async fn write_register(&self, slave: u8, register: u16, value: u16) -> Result<(), Error> {
        let request = write_request(slave, register, value);
        debug!("-> slave {} write register {} = {}", slave, register, value);

        // a successful write echoes the request
        let frame = self.transact(&request, 8)?;
        if frame[2..6] != request[2..6] {
            return Err(Error::InvalidResponse);
        }
        Ok(())
    }
}

fn read_request(slave: u8, function_code: u8, register: u16) -> Vec<u8> {
    let mut request = vec![slave, function_code];
    request.extend_from_slice(&register.to_be_bytes());
    request.extend_from_slice(&1u16.to_be_bytes());
    let crc = crc16(&request);
    request.extend_from_slice(&crc.to_le_bytes());
    request
}

fn write_request(slave: u8, register: u16, value: u16) -> Vec<u8> {
    let mut request = vec![slave, FC_WRITE_SINGLE];
    request.extend_from_slice(&register.to_be_bytes());
    request.extend_from_slice(&value.to_be_bytes());
    let crc = crc16(&request);
    request.extend_from_slice(&crc.to_le_bytes());
    request
}

fn verify_crc(frame: &[u8]) -> Result<(), Error> {
    let split = frame.len() - 2;
    let received = u16::from_le_bytes([frame[split], frame[split + 1]]);
    if received != crc16(&frame[..split]) {
        return Err(Error::CrcMismatch);
    }
    Ok(())
}
