pub mod pzem017;
pub mod registers;

pub use pzem017::Pzem017;
pub use registers::ShuntType;
