//! Access context and errors shared by every parameter kind.

use crate::blackboard::{Blackboard, Endianness};

/// Errors raised while reading or writing a parameter.
///
/// A failed access never mutates the blackboard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The value does not fit the parameter's range.
    #[error("value {value} out of range [{min}, {max}]")]
    OutOfRange { value: u64, min: u64, max: u64 },

    /// The textual form could not be parsed.
    #[error("invalid value '{text}': {reason}")]
    InvalidValue { text: String, reason: String },

    /// The requested representation does not suit the parameter.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// The stored value cannot be represented by the requested type.
    #[error("value {value} does not fit in {target}")]
    Unrepresentable { value: u64, target: &'static str },

    /// The parameter lies outside the blackboard in use.
    #[error("{size} bytes at offset {offset} lie outside the {len} byte blackboard")]
    OutOfBounds {
        offset: usize,
        size: usize,
        len: usize,
    },
}

/// Everything a parameter needs for one access.
///
/// Holds the blackboard being read or written, where that blackboard sits in
/// the full parameter layout (`base_offset`, non-zero when accessing the
/// saved copy of an area), formatting options, and the text of the last
/// error for reporting back to a remote peer.
#[derive(Debug)]
pub struct AccessContext<'a> {
    blackboard: &'a mut Blackboard,
    base_offset: usize,
    endianness: Endianness,
    hex_output: bool,
    error: Option<String>,
}

impl<'a> AccessContext<'a> {
    pub fn new(blackboard: &'a mut Blackboard) -> Self {
        Self {
            blackboard,
            base_offset: 0,
            endianness: Endianness::default(),
            hex_output: false,
            error: None,
        }
    }

    /// Treat the blackboard as starting at `base_offset` of the full layout.
    #[must_use]
    pub fn with_base_offset(mut self, base_offset: usize) -> Self {
        self.base_offset = base_offset;
        self
    }

    #[must_use]
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    #[must_use]
    pub fn with_hex_output(mut self, hex_output: bool) -> Self {
        self.hex_output = hex_output;
        self
    }

    pub fn blackboard(&self) -> &Blackboard {
        &*self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut *self.blackboard
    }

    pub fn base_offset(&self) -> usize {
        self.base_offset
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn hex_output(&self) -> bool {
        self.hex_output
    }

    /// Text of the last failed access, suffixed with the parameter path.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Record `error` against the parameter at `path` and return it.
    pub fn fail<T>(&mut self, error: AccessError, path: &str) -> Result<T, AccessError> {
        self.error = Some(format!("{} (parameter {})", error, path));
        Err(error)
    }

    fn local_offset(&self, offset: usize, size: usize) -> Result<usize, AccessError> {
        offset
            .checked_sub(self.base_offset)
            .ok_or(AccessError::OutOfBounds {
                offset,
                size,
                len: self.blackboard.len(),
            })
    }

    /// Read the `size`-byte register at absolute `offset`.
    pub fn read_register(&self, offset: usize, size: usize) -> Result<u64, AccessError> {
        let local = self.local_offset(offset, size)?;
        self.blackboard.read_u64(local, size, self.endianness)
    }

    /// Write the `size`-byte register at absolute `offset`.
    pub fn write_register(
        &mut self,
        offset: usize,
        size: usize,
        value: u64,
    ) -> Result<(), AccessError> {
        let local = self.local_offset(offset, size)?;
        self.blackboard.write_u64(local, size, value, self.endianness)
    }
}

/// A typed representation a parameter can be accessed through.
pub trait ParameterValue: Copy {
    /// Boolean access is only allowed on single-bit parameters.
    const BOOLEAN: bool;
    const TYPE_NAME: &'static str;

    fn to_raw(self) -> u64;
    fn from_raw(raw: u64) -> Option<Self>;
}

impl ParameterValue for bool {
    const BOOLEAN: bool = true;
    const TYPE_NAME: &'static str = "bool";

    fn to_raw(self) -> u64 {
        u64::from(self)
    }

    fn from_raw(raw: u64) -> Option<Self> {
        Some(raw != 0)
    }
}

impl ParameterValue for u32 {
    const BOOLEAN: bool = false;
    const TYPE_NAME: &'static str = "u32";

    fn to_raw(self) -> u64 {
        u64::from(self)
    }

    fn from_raw(raw: u64) -> Option<Self> {
        u32::try_from(raw).ok()
    }
}

impl ParameterValue for u64 {
    const BOOLEAN: bool = false;
    const TYPE_NAME: &'static str = "u64";

    fn to_raw(self) -> u64 {
        self
    }

    fn from_raw(raw: u64) -> Option<Self> {
        Some(raw)
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal unsigned integer.
pub(crate) fn parse_unsigned(text: &str) -> Result<u64, AccessError> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };

    parsed.map_err(|e| AccessError::InvalidValue {
        text: text.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn parse_boolean(text: &str) -> Result<bool, AccessError> {
    match text.trim() {
        "1" | "true" | "0x1" => Ok(true),
        "0" | "false" | "0x0" => Ok(false),
        _ => Err(AccessError::InvalidValue {
            text: text.to_string(),
            reason: "expected 1, 0, true or false".to_string(),
        }),
    }
}

/// Decimal, or zero-padded uppercase hex sized to `width_bits`.
pub(crate) fn format_unsigned(value: u64, hex: bool, width_bits: u32) -> String {
    if hex {
        let digits = width_bits.div_ceil(4) as usize;
        format!("0x{:0digits$X}", value, digits = digits)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decimal_and_hex() {
        assert_eq!(parse_unsigned("42").unwrap(), 42);
        assert_eq!(parse_unsigned(" 7 ").unwrap(), 7);
        assert_eq!(parse_unsigned("0x1F").unwrap(), 31);
        assert_eq!(parse_unsigned("0Xff").unwrap(), 255);
    }

    #[test]
    fn parse_rejects_garbage() {
        for text in ["", "abc", "-1", "0x", "0xZZ", "1.5"] {
            let err = parse_unsigned(text).unwrap_err();
            assert!(matches!(err, AccessError::InvalidValue { .. }), "{:?}", text);
        }
    }

    #[test]
    fn parse_booleans() {
        assert!(parse_boolean("1").unwrap());
        assert!(parse_boolean("true").unwrap());
        assert!(!parse_boolean("0x0").unwrap());
        assert!(parse_boolean("2").is_err());
    }

    #[test]
    fn format_pads_hex_to_width() {
        assert_eq!(format_unsigned(10, false, 4), "10");
        assert_eq!(format_unsigned(10, true, 4), "0xA");
        assert_eq!(format_unsigned(10, true, 12), "0x00A");
        assert_eq!(format_unsigned(1, true, 1), "0x1");
    }

    #[test]
    fn fail_records_error_with_path() {
        let mut bb = Blackboard::new(1);
        let mut ctx = AccessContext::new(&mut bb);
        let result: Result<(), _> = ctx.fail(
            AccessError::TypeMismatch("not a boolean".into()),
            "root/a",
        );
        assert!(result.is_err());
        assert_eq!(
            ctx.error(),
            Some("type mismatch: not a boolean (parameter root/a)")
        );
        ctx.clear_error();
        assert_eq!(ctx.error(), None);
    }

    #[test]
    fn base_offset_shifts_register_access() {
        let mut bb = Blackboard::new(2);
        let mut ctx = AccessContext::new(&mut bb).with_base_offset(10);
        ctx.write_register(11, 1, 0x5A).unwrap();
        assert_eq!(ctx.read_register(11, 1).unwrap(), 0x5A);
        assert_eq!(ctx.blackboard().as_bytes(), &[0, 0x5A]);
        assert!(matches!(
            ctx.read_register(9, 1),
            Err(AccessError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn typed_conversions() {
        assert_eq!(true.to_raw(), 1);
        assert_eq!(bool::from_raw(3), Some(true));
        assert_eq!(u32::from_raw(u64::from(u32::MAX) + 1), None);
        assert_eq!(u64::from_raw(5), Some(5));
    }
}
