//! Whole-register unsigned integer parameters.

use crate::access::{
    format_unsigned, parse_boolean, parse_unsigned, AccessContext, AccessError, ParameterValue,
};
use crate::area::{AreaConfiguration, SyncerSet};
use crate::tree::TreeError;

/// An unsigned integer of 1, 2 or 4 bytes owning its whole region.
///
/// A boolean parameter is the single-byte flavour restricted to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerParameter {
    path: String,
    offset: usize,
    size: usize,
    min: u64,
    max: u64,
    boolean: bool,
}

impl IntegerParameter {
    pub fn new(
        path: impl Into<String>,
        offset: usize,
        size: usize,
        min: Option<u64>,
        max: Option<u64>,
    ) -> Result<Self, TreeError> {
        let path = path.into();
        if !matches!(size, 1 | 2 | 4) {
            return Err(TreeError::InvalidLayout {
                path,
                message: format!("integer size {} not one of 1, 2, 4", size),
            });
        }

        let type_max = (1u64 << (size * 8)) - 1;
        let min = min.unwrap_or(0);
        let max = max.unwrap_or(type_max);
        if max > type_max || min > max {
            return Err(TreeError::InvalidLayout {
                path,
                message: format!(
                    "range [{}, {}] invalid for a {} byte integer",
                    min, max, size
                ),
            });
        }

        Ok(Self {
            path,
            offset,
            size,
            min,
            max,
            boolean: false,
        })
    }

    pub fn boolean(path: impl Into<String>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
            size: 1,
            min: 0,
            max: 1,
            boolean: true,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn footprint(&self) -> usize {
        self.size
    }

    pub fn is_boolean(&self) -> bool {
        self.boolean
    }

    pub fn create_area_configuration(&self, syncers: &SyncerSet) -> AreaConfiguration {
        AreaConfiguration::new(self.offset, self.size, syncers.clone())
    }

    pub fn access<V: ParameterValue>(
        &self,
        value: &mut V,
        set: bool,
        ctx: &mut AccessContext<'_>,
    ) -> Result<(), AccessError> {
        if V::BOOLEAN && !self.boolean {
            return ctx.fail(
                AccessError::TypeMismatch("boolean access on an integer".to_string()),
                &self.path,
            );
        }

        if set {
            return self.set_raw(value.to_raw(), ctx);
        }
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

    fn get_raw(&self, ctx: &mut AccessContext<'_>) -> Result<u64, AccessError> {
        match ctx.read_register(self.offset, self.size) {
            Ok(raw) => Ok(raw),
            Err(e) => ctx.fail(e, &self.path),
        }
    }

    fn set_raw(&self, value: u64, ctx: &mut AccessContext<'_>) -> Result<(), AccessError> {
        if value < self.min || value > self.max {
            return ctx.fail(
                AccessError::OutOfRange {
                    value,
                    min: self.min,
                    max: self.max,
                },
                &self.path,
            );
        }
        match ctx.write_register(self.offset, self.size, value) {
            Ok(()) => Ok(()),
            Err(e) => ctx.fail(e, &self.path),
        }
    }

    pub fn set_value_string(
        &self,
        text: &str,
        ctx: &mut AccessContext<'_>,
    ) -> Result<(), AccessError> {
        let parsed = if self.boolean {
            parse_boolean(text).map(u64::from)
        } else {
            parse_unsigned(text)
        };
        match parsed {
            Ok(value) => self.set_raw(value, ctx),
            Err(e) => ctx.fail(e, &self.path),
        }
    }

    pub fn value_string(&self, ctx: &mut AccessContext<'_>) -> Result<String, AccessError> {
        let value = self.get_raw(ctx)?;
        Ok(format_unsigned(
            value,
            ctx.hex_output(),
            (self.size * 8) as u32,
        ))
    }
}
