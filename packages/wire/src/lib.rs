//! paramfs-wire: framed binary messages for remote parameter access.
//!
//! This is the narrow waist of the paramfs stack. Everything at this level
//! is pure bytes - no path resolution, no parameter semantics.
//!
//! Every frame on the stream looks like:
//!
//! ```text
//! [u32 LE total length][u8 kind][payload ...]
//! ```
//!
//! where `total length` counts the kind byte plus the payload. Strings inside
//! a payload are a `u32` LE length followed by the raw bytes, no terminator.
//!
//! # Example
//!
//! ```rust
//! use paramfs_wire::{Packet, DEFAULT_MAX_FRAME_SIZE};
//!
//! let mut wire = Vec::new();
//! Packet::request("getParameter", ["root/volume"]).send(&mut wire).unwrap();
//!
//! let received = Packet::recv(&mut wire.as_slice(), DEFAULT_MAX_FRAME_SIZE).unwrap();
//! assert_eq!(received, Packet::request("getParameter", ["root/volume"]));
//! ```

pub use bytes::Bytes;

mod error;
mod message;
mod packet;

pub use error::{IoPhase, WireError};
pub use message::{Message, MessageState, DEFAULT_MAX_FRAME_SIZE, SIZE_FIELD_LEN, UNSET_KIND};
pub use packet::{MessageKind, Packet};
