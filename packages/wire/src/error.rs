//! Error types for the wire layer.
//!
//! Errors at this level are transport-focused: a failed read or write on the
//! stream, or a frame that cannot be trusted. Once one of these is returned
//! the stream has lost byte alignment and must be dropped.

use std::fmt;

/// Which step of a send or receive failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoPhase {
    SizeWrite,
    DataWrite,
    SizeRead,
    DataRead,
}

impl fmt::Display for IoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            IoPhase::SizeWrite => "size write",
            IoPhase::DataWrite => "data write",
            IoPhase::SizeRead => "size read",
            IoPhase::DataRead => "data read",
        };
        f.write_str(phase)
    }
}

/// Errors at the wire layer.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The underlying stream failed.
    #[error("{phase} failed: {source}")]
    Io {
        phase: IoPhase,
        #[source]
        source: std::io::Error,
    },

    /// The peer announced a frame larger than we are willing to allocate.
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge { size: u32, max: u32 },

    /// The peer announced a frame with no room for the kind byte.
    #[error("invalid frame size {size}")]
    InvalidSize { size: u32 },

    /// The kind byte does not name a known packet.
    #[error("unknown message kind {0:#04x}")]
    UnknownKind(u8),

    /// A length-prefixed field claims more bytes than the payload holds.
    #[error("truncated payload: field needs {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    /// A string field is not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
}

impl WireError {
    pub(crate) fn io(phase: IoPhase, source: std::io::Error) -> Self {
        WireError::Io { phase, source }
    }

    /// True when the peer closed the stream cleanly between two frames.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            WireError::Io {
                phase: IoPhase::SizeRead,
                source,
            } if source.kind() == std::io::ErrorKind::UnexpectedEof
        )
    }
}
