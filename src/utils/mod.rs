pub mod error;
pub mod retry;

pub use error::Error;
pub use retry::RetryPolicy;
