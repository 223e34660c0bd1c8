//! Bit-field parameters packed into shared register blocks.

use crate::access::{
    format_unsigned, parse_boolean, parse_unsigned, AccessContext, AccessError, ParameterValue,
};
use crate::area::{AreaConfiguration, SyncerSet};
use crate::tree::TreeError;

/// A bit field description that cannot be laid out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid bit layout: {message}")]
pub struct LayoutError {
    pub message: String,
}

impl LayoutError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

/// Position, width and ceiling of a bit field within its block.
///
/// Construction guarantees `pos + width <= block width` and
/// `1 <= width <= 64`, so the shift and mask arithmetic below never
/// overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pos: u32,
    width: u32,
    max: u64,
}

impl BitField {
    /// A field of `width` bits at bit `pos` of a `block_width`-bit block.
    pub fn new(pos: u32, width: u32, block_width: u32) -> Result<Self, LayoutError> {
        if width == 0 || width > 64 {
            return Err(LayoutError::new(format!(
                "bit width {} not in 1..=64",
                width
            )));
        }
        if block_width > 64 {
            return Err(LayoutError::new(format!(
                "block width {} exceeds 64 bits",
                block_width
            )));
        }
        if pos.checked_add(width).map_or(true, |end| end > block_width) {
            return Err(LayoutError::new(format!(
                "bits [{}, {}) do not fit in a {} bit block",
                pos,
                u64::from(pos) + u64::from(width),
                block_width
            )));
        }

        Ok(Self {
            pos,
            width,
            max: Self::width_mask(width),
        })
    }

    /// Lower the largest accepted value below `2^width - 1`.
    pub fn with_max(mut self, max: u64) -> Result<Self, LayoutError> {
        if max > Self::width_mask(self.width) {
            return Err(LayoutError::new(format!(
                "max {} does not fit in {} bits",
                max, self.width
            )));
        }
        self.max = max;
        Ok(self)
    }

    /// All-ones in the low `width` bits.
    fn width_mask(width: u32) -> u64 {
        if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        }
    }

    pub fn pos(&self) -> u32 {
        self.pos
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// The field's bits in place within the register.
    pub fn mask(&self) -> u64 {
        Self::width_mask(self.width) << self.pos
    }

    pub fn is_encodable(&self, value: u64) -> bool {
        value <= self.max
    }

    /// Replace this field's bits in `register` with `value`.
    ///
    /// Bits outside `[pos, pos + width)` are returned untouched.
    pub fn merge(&self, register: u64, value: u64) -> u64 {
        let mask = self.mask();
        (register & !mask) | ((value << self.pos) & mask)
    }

    /// This field's value, shifted down out of `register`.
    pub fn extract(&self, register: u64) -> u64 {
        (register & self.mask()) >> self.pos
    }
}

/// A leaf parameter occupying some bits of a shared register block.
///
/// The node never holds the register contents: reads and writes go through
/// the blackboard carried by the [`AccessContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitParameter {
    path: String,
    field: BitField,
    block_offset: usize,
    block_size: usize,
}

impl BitParameter {
    /// A bit parameter at `path` inside the `block_size`-byte block that
    /// starts at `block_offset` of the blackboard.
    pub fn new(
        path: impl Into<String>,
        field: BitField,
        block_offset: usize,
        block_size: usize,
    ) -> Result<Self, TreeError> {
        let path = path.into();
        if !(1..=8).contains(&block_size)
            || field.pos() + field.width() > (block_size as u32) * 8
        {
            return Err(TreeError::InvalidLayout {
                path,
                message: format!(
                    "field at bit {} of width {} outside a {} byte block",
                    field.pos(),
                    field.width(),
                    block_size
                ),
            });
        }

        Ok(Self {
            path,
            field,
            block_offset,
            block_size,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn field(&self) -> &BitField {
        &self.field
    }

    /// Single-bit fields also accept boolean access.
    pub fn is_boolean(&self) -> bool {
        self.field.width() == 1
    }

    /// Blackboard bytes this leaf needs on its own: the whole block, since a
    /// field is always stored as part of its register.
    pub fn footprint(&self) -> usize {
        self.block_size
    }

    /// Size in bytes of the register this field lives in.
    pub fn belonging_block_size(&self) -> usize {
        self.block_size
    }

    /// Offset of the owning block in the blackboard.
    pub fn block_offset(&self) -> usize {
        self.block_offset
    }

    /// See [`BitField::merge`].
    pub fn merge(&self, register: u64, value: u64) -> u64 {
        self.field.merge(register, value)
    }

    /// The region to commit after writing this field: its whole block.
    pub fn create_area_configuration(&self, syncers: &SyncerSet) -> AreaConfiguration {
        AreaConfiguration::new(self.block_offset, self.block_size, syncers.clone())
    }

    /// Read (`set == false`) or write (`set == true`) the field through `value`.
    ///
    /// Errors are also recorded in `ctx`; a failed write leaves the
    /// blackboard untouched.
    pub fn access<V: ParameterValue>(
        &self,
        value: &mut V,
        set: bool,
        ctx: &mut AccessContext<'_>,
    ) -> Result<(), AccessError> {
        if V::BOOLEAN && !self.is_boolean() {
            return ctx.fail(
                AccessError::TypeMismatch(format!(
                    "boolean access on a {} bit field",
                    self.field.width()
                )),
                &self.path,
            );
        }

        if set {
            self.set_raw(value.to_raw(), ctx)
        } else {
            let raw = self.get_raw(ctx)?;
            match V::from_raw(raw) {
                Some(v) => {
                    *value = v;
                    Ok(())
                }
                None => ctx.fail(
                    AccessError::Unrepresentable {
                        value: raw,
                        target: V::TYPE_NAME,
                    },
                    &self.path,
                ),
            }
        }
    }

    pub fn get<V: ParameterValue + Default>(
        &self,
        ctx: &mut AccessContext<'_>,
    ) -> Result<V, AccessError> {
        let mut value = V::default();
        self.access(&mut value, false, ctx)?;
        Ok(value)
    }

    pub fn set<V: ParameterValue>(
        &self,
        mut value: V,
        ctx: &mut AccessContext<'_>,
    ) -> Result<(), AccessError> {
        self.access(&mut value, true, ctx)
    }

    fn get_raw(&self, ctx: &mut AccessContext<'_>) -> Result<u64, AccessError> {
        match ctx.read_register(self.block_offset, self.block_size) {
            Ok(register) => Ok(self.field.extract(register)),
            Err(e) => ctx.fail(e, &self.path),
        }
    }

    fn set_raw(&self, value: u64, ctx: &mut AccessContext<'_>) -> Result<(), AccessError> {
        if !self.field.is_encodable(value) {
            return ctx.fail(
                AccessError::OutOfRange {
                    value,
                    min: 0,
                    max: self.field.max(),
                },
                &self.path,
            );
        }

        let merged = match ctx.read_register(self.block_offset, self.block_size) {
            Ok(register) => self.field.merge(register, value),
            Err(e) => return ctx.fail(e, &self.path),
        };
        if let Err(e) = ctx.write_register(self.block_offset, self.block_size, merged) {
            return ctx.fail(e, &self.path);
        }
        Ok(())
    }

    /// Parse `text` and write it.
    ///
    /// Accepts decimal or `0x` hex; single-bit fields also take
    /// `true`/`false`.
    pub fn set_value_string(
        &self,
        text: &str,
        ctx: &mut AccessContext<'_>,
    ) -> Result<(), AccessError> {
        let parsed = if self.is_boolean() {
            parse_boolean(text)
                .map(u64::from)
                .or_else(|_| parse_unsigned(text))
        } else {
            parse_unsigned(text)
        };

        match parsed {
            Ok(value) => self.set_raw(value, ctx),
            Err(e) => ctx.fail(e, &self.path),
        }
    }

    /// Read the field as text: decimal, or `0x` hex when `ctx` asks for it.
    pub fn value_string(&self, ctx: &mut AccessContext<'_>) -> Result<String, AccessError> {
        let value = self.get_raw(ctx)?;
        Ok(format_unsigned(value, ctx.hex_output(), self.field.width()))
    }
}
