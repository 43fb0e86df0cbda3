use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("No response from device")]
    NoResponse,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout occurred")]
    Timeout,

    #[error("CRC checksum mismatch")]
    CrcMismatch,

    #[error("Invalid response from device")]
    InvalidResponse,

    #[error("Modbus exception response: code {0}")]
    Exception(u8),

    #[error("Max retries exceeded calling {operation} ({attempts} attempts): {source}")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid shunt code: {0}")]
    InvalidShuntCode(u16),

    #[error("Invalid slave address: {0}")]
    InvalidAddress(u8),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock acquisition failed")]
    Lock,
}

impl Error {
    /// Whether retrying the same register operation can plausibly succeed.
    /// Matches the transport's "no response / I/O error" signal; malformed
    /// frames and Modbus exceptions are not retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::NoResponse | Error::Transport(_) | Error::Timeout
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => Error::NoResponse,
            _ => Error::Transport(format!("IO error: {}", err)),
        }
    }
}
