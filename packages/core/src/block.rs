//! Register blocks shared by several bit parameters.

use crate::area::{AreaConfiguration, SyncerSet};
use crate::bit_parameter::{BitField, BitParameter};
use crate::tree::TreeError;

/// A 1, 2, 4 or 8 byte register split into non-overlapping bit fields.
///
/// The block is what occupies the blackboard; its fields only describe
/// which bits of it they own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitParameterBlock {
    path: String,
    offset: usize,
    size: usize,
    bits: Vec<BitParameter>,
}

impl BitParameterBlock {
    pub fn new(path: impl Into<String>, offset: usize, size: usize) -> Result<Self, TreeError> {
        let path = path.into();
        if !matches!(size, 1 | 2 | 4 | 8) {
            return Err(TreeError::InvalidLayout {
                path,
                message: format!("block size {} not one of 1, 2, 4, 8", size),
            });
        }
        Ok(Self {
            path,
            offset,
            size,
            bits: Vec::new(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn footprint(&self) -> usize {
        self.size
    }

    pub fn bits(&self) -> &[BitParameter] {
        &self.bits
    }

    pub fn bit(&self, name: &str) -> Option<&BitParameter> {
        self.bits.iter().find(|b| b.name() == name)
    }

    /// Declare a field of `width` bits at bit `pos`.
    pub fn add_bit(
        &mut self,
        name: &str,
        pos: u32,
        width: u32,
        max: Option<u64>,
    ) -> Result<&BitParameter, TreeError> {
        let path = format!("{}/{}", self.path, name);
        let layout_error = |message: String| TreeError::InvalidLayout {
            path: path.clone(),
            message,
        };

        if self.bit(name).is_some() {
            return Err(TreeError::Duplicate {
                parent: self.path.clone(),
                name: name.to_string(),
            });
        }

        let mut field =
            BitField::new(pos, width, (self.size * 8) as u32).map_err(|e| layout_error(e.message))?;
        if let Some(max) = max {
            field = field.with_max(max).map_err(|e| layout_error(e.message))?;
        }

        if let Some(sibling) = self
            .bits
            .iter()
            .find(|b| b.field().mask() & field.mask() != 0)
        {
            return Err(layout_error(format!(
                "overlaps sibling field '{}'",
                sibling.name()
            )));
        }

        let bit = BitParameter::new(path.clone(), field, self.offset, self.size)?;
        self.bits.push(bit);
        Ok(&self.bits[self.bits.len() - 1])
    }

    pub fn create_area_configuration(&self, syncers: &SyncerSet) -> AreaConfiguration {
        AreaConfiguration::new(self.offset, self.size, syncers.clone())
    }
}
