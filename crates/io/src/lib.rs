//! Neo.IO
//!
//! Little-endian binary reading and writing with the var-int framing used by
//! every Neo wire format.

mod binary_writer;
mod error;
mod memory_reader;
mod serializable;

pub use binary_writer::BinaryWriter;
pub use error::{IoError, IoResult};
pub use memory_reader::MemoryReader;
pub use serializable::{Serializable, SerializableExt};

/// Returns the number of bytes `write_var_int(value)` produces.
pub fn var_int_size(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Returns the encoded size of a var-length byte string.
pub fn var_bytes_size(len: usize) -> usize {
    var_int_size(len as u64) + len
}
