//! Bounds-checked little-endian reader over a borrowed byte slice.

use crate::{IoError, IoResult};
use byteorder::{ByteOrder, LittleEndian};
use std::mem::size_of;

pub struct MemoryReader<'a> {
    memory: &'a [u8],
    pos: usize,
}

impl<'a> MemoryReader<'a> {
    pub fn new(memory: &'a [u8]) -> Self {
        Self { memory, pos: 0 }
    }

    /// Fails unless `move_by` more bytes are available. Never overflows.
    #[inline(always)]
    fn ensure_position(&self, move_by: usize) -> IoResult<()> {
        match self.pos.checked_add(move_by) {
            Some(end) if end <= self.memory.len() => Ok(()),
            _ => Err(IoError::EndOfStream {
                offset: self.pos,
                needed: move_by,
            }),
        }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.memory.len() - self.pos
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    #[inline(always)]
    pub fn peek(&self) -> IoResult<u8> {
        self.ensure_position(1)?;
        Ok(self.memory[self.pos])
    }

    /// Reads a boolean; any non-zero byte is true.
    pub fn read_bool(&mut self) -> IoResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> IoResult<u8> {
        self.ensure_position(1)?;
        let value = self.memory[self.pos];
        self.pos += 1;
        Ok(value)
    }

    #[inline(always)]
    pub fn read_i16(&mut self) -> IoResult<i16> {
        self.ensure_position(size_of::<i16>())?;
        let value = LittleEndian::read_i16(&self.memory[self.pos..]);
        self.pos += size_of::<i16>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u16(&mut self) -> IoResult<u16> {
        self.ensure_position(size_of::<u16>())?;
        let value = LittleEndian::read_u16(&self.memory[self.pos..]);
        self.pos += size_of::<u16>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_i32(&mut self) -> IoResult<i32> {
        self.ensure_position(size_of::<i32>())?;
        let value = LittleEndian::read_i32(&self.memory[self.pos..]);
        self.pos += size_of::<i32>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u32(&mut self) -> IoResult<u32> {
        self.ensure_position(size_of::<u32>())?;
        let value = LittleEndian::read_u32(&self.memory[self.pos..]);
        self.pos += size_of::<u32>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u64(&mut self) -> IoResult<u64> {
        self.ensure_position(size_of::<u64>())?;
        let value = LittleEndian::read_u64(&self.memory[self.pos..]);
        self.pos += size_of::<u64>();
        Ok(value)
    }

    /// Reads a var-int (`0xfd` u16, `0xfe` u32, `0xff` u64 prefixes).
    pub fn read_var_int(&mut self, max: u64) -> IoResult<u64> {
        let b = self.read_u8()?;
        let value = match b {
            0xfd => self.read_u16()? as u64,
            0xfe => self.read_u32()? as u64,
            0xff => self.read_u64()?,
            _ => b as u64,
        };
        if value > max {
            return Err(IoError::VarIntTooLarge { value, max });
        }
        Ok(value)
    }

    /// Borrows the next `count` bytes.
    pub fn read_slice(&mut self, count: usize) -> IoResult<&'a [u8]> {
        self.ensure_position(count)?;
        let slice = &self.memory[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    pub fn read_bytes(&mut self, count: usize) -> IoResult<Vec<u8>> {
        Ok(self.read_slice(count)?.to_vec())
    }

    pub fn read_fixed<const N: usize>(&mut self) -> IoResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    /// Reads a var-int length followed by that many bytes.
    pub fn read_var_bytes(&mut self, max: usize) -> IoResult<Vec<u8>> {
        let len = self.read_var_int(max as u64)? as usize;
        self.read_bytes(len)
    }

    pub fn read_var_string(&mut self, max: usize) -> IoResult<String> {
        let bytes = self.read_var_bytes(max)?;
        String::from_utf8(bytes).map_err(|e| IoError::invalid_data(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_values() {
        let data = [0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut reader = MemoryReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 1);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u32().unwrap(), 0x1234_5678);
        assert!(reader.is_empty());
    }

    #[test]
    fn var_int_prefixes() {
        let data = hex::decode("fcfd0001fe00000100").unwrap();
        let mut reader = MemoryReader::new(&data);
        assert_eq!(reader.read_var_int(u64::MAX).unwrap(), 0xfc);
        assert_eq!(reader.read_var_int(u64::MAX).unwrap(), 0x100);
        assert_eq!(reader.read_var_int(u64::MAX).unwrap(), 0x10000);
    }

    #[test]
    fn var_int_respects_maximum() {
        let mut reader = MemoryReader::new(&[0xfd, 0x00, 0x04]);
        assert_eq!(reader.read_var_int(1024), Ok(1024));
        let mut reader = MemoryReader::new(&[0xfd, 0x01, 0x04]);
        assert!(matches!(
            reader.read_var_int(1024),
            Err(IoError::VarIntTooLarge { value: 1025, max: 1024 })
        ));
    }

    #[test]
    fn short_reads_fail_without_advancing() {
        let mut reader = MemoryReader::new(&[0x01, 0x02]);
        assert!(matches!(
            reader.read_u32(),
            Err(IoError::EndOfStream { offset: 0, needed: 4 })
        ));
        assert_eq!(reader.position(), 0);
        assert!(reader.read_slice(usize::MAX).is_err());
    }
}
