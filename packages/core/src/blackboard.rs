//! Byte area holding the current value of every parameter in a tree.

use serde::{Deserialize, Serialize};

use crate::access::AccessError;

/// Byte order of multi-byte registers in the blackboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// An owned, fixed-size byte area.
///
/// Each parameter owns a region of the blackboard at the offset assigned
/// when the tree was laid out. Registers of 1 to 8 bytes are moved in and out
/// as `u64` images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blackboard {
    data: Vec<u8>,
}

impl Blackboard {
    /// A zero-filled blackboard of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn check(&self, offset: usize, size: usize) -> Result<(), AccessError> {
        match offset.checked_add(size) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(AccessError::OutOfBounds {
                offset,
                size,
                len: self.data.len(),
            }),
        }
    }

    pub fn read_area(&self, offset: usize, size: usize) -> Result<&[u8], AccessError> {
        self.check(offset, size)?;
        Ok(&self.data[offset..offset + size])
    }

    pub fn write_area(&mut self, offset: usize, bytes: &[u8]) -> Result<(), AccessError> {
        self.check(offset, bytes.len())?;
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Read a `size`-byte register as an unsigned integer.
    pub fn read_u64(
        &self,
        offset: usize,
        size: usize,
        endianness: Endianness,
    ) -> Result<u64, AccessError> {
        debug_assert!((1..=8).contains(&size), "register of {} bytes", size);
        let bytes = self.read_area(offset, size)?;

        let mut raw = [0u8; 8];
        let value = match endianness {
            Endianness::Little => {
                raw[..size].copy_from_slice(bytes);
                u64::from_le_bytes(raw)
            }
            Endianness::Big => {
                raw[8 - size..].copy_from_slice(bytes);
                u64::from_be_bytes(raw)
            }
        };
        Ok(value)
    }

    /// Write the low `size` bytes of `value` as a register.
    pub fn write_u64(
        &mut self,
        offset: usize,
        size: usize,
        value: u64,
        endianness: Endianness,
    ) -> Result<(), AccessError> {
        debug_assert!((1..=8).contains(&size), "register of {} bytes", size);
        self.check(offset, size)?;

        match endianness {
            Endianness::Little => {
                let raw = value.to_le_bytes();
                self.write_area(offset, &raw[..size])
            }
            Endianness::Big => {
                let raw = value.to_be_bytes();
                self.write_area(offset, &raw[8 - size..])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_register_layout() {
        let mut bb = Blackboard::new(4);
        bb.write_u64(0, 2, 0xA1B2, Endianness::Little).unwrap();
        assert_eq!(bb.as_bytes(), &[0xB2, 0xA1, 0, 0]);
        assert_eq!(bb.read_u64(0, 2, Endianness::Little).unwrap(), 0xA1B2);
    }

    #[test]
    fn big_endian_register_layout() {
        let mut bb = Blackboard::new(4);
        bb.write_u64(1, 2, 0xA1B2, Endianness::Big).unwrap();
        assert_eq!(bb.as_bytes(), &[0, 0xA1, 0xB2, 0]);
        assert_eq!(bb.read_u64(1, 2, Endianness::Big).unwrap(), 0xA1B2);
    }

    #[test]
    fn write_truncates_to_register_size() {
        let mut bb = Blackboard::new(2);
        bb.write_u64(0, 1, 0x1FF, Endianness::Little).unwrap();
        assert_eq!(bb.as_bytes(), &[0xFF, 0]);
    }

    #[test]
    fn full_width_register() {
        let mut bb = Blackboard::new(8);
        bb.write_u64(0, 8, u64::MAX - 1, Endianness::Big).unwrap();
        assert_eq!(bb.read_u64(0, 8, Endianness::Big).unwrap(), u64::MAX - 1);
    }

    #[test]
    fn out_of_bounds_access_fails() {
        let mut bb = Blackboard::new(2);
        assert!(matches!(
            bb.read_u64(1, 2, Endianness::Little),
            Err(AccessError::OutOfBounds {
                offset: 1,
                size: 2,
                len: 2
            })
        ));
        assert!(bb.write_area(usize::MAX, &[1]).is_err());
    }
}
