// Shared utilities

pub mod cursor;
pub mod encoding;

pub use cursor::{ByteCursor, Endian};
