//! Framed message buffer with a read/write cursor.

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};

use crate::error::{IoPhase, WireError};

/// Kind byte of a message whose kind is only known after receive.
pub const UNSET_KIND: u8 = u8::MAX;

/// Width of the length prefix on the wire.
pub const SIZE_FIELD_LEN: usize = std::mem::size_of::<u32>();

/// Largest frame `recv` accepts unless the caller picks another limit.
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 1024 * 1024;

const KIND_LEN: usize = std::mem::size_of::<u8>();

/// Which half of its lifecycle a message is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    /// Built locally, waiting to be sent.
    Filling,
    /// Received from a peer, waiting to be consumed.
    Filled,
}

/// A kind-tagged byte buffer with a cursor.
///
/// The buffer is sized once, either by [`Message::allocate`] before filling
/// or by [`Message::recv`] from the size the peer announced. Every read or
/// write advances the cursor by exactly the number of bytes moved; moving
/// past the end of the buffer is a programming error and panics.
#[derive(Debug, Clone)]
pub struct Message {
    kind: u8,
    data: Vec<u8>,
    index: usize,
    state: MessageState,
}

impl Message {
    /// Create an empty outbound message.
    pub fn new(kind: u8) -> Self {
        Self {
            kind,
            data: Vec::new(),
            index: 0,
            state: MessageState::Filling,
        }
    }

    /// Create an empty message whose kind is discovered on receive.
    pub fn unset() -> Self {
        Self::new(UNSET_KIND)
    }

    pub fn kind(&self) -> u8 {
        self.kind
    }

    pub fn state(&self) -> MessageState {
        self.state
    }

    /// Payload size in bytes, excluding the kind byte.
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Reserve `size` zeroed payload bytes and rewind the cursor.
    pub fn allocate(&mut self, size: usize) {
        self.data = vec![0; size];
        self.index = 0;
        self.state = MessageState::Filling;
    }

    /// Copy `data` into the buffer at the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the message was received rather than built, or if the write
    /// would run past the allocated size.
    pub fn write_data(&mut self, data: &[u8]) {
        assert_eq!(
            self.state,
            MessageState::Filling,
            "write on a received message"
        );
        let end = self.index + data.len();
        assert!(
            end <= self.data.len(),
            "message write of {} bytes at {} overruns {} byte buffer",
            data.len(),
            self.index,
            self.data.len()
        );
        self.data[self.index..end].copy_from_slice(data);
        self.index = end;
    }

    /// Copy `out.len()` bytes from the cursor into `out`.
    ///
    /// # Panics
    ///
    /// Panics if the message is still being built, or if the read would run
    /// past the received size.
    pub fn read_data(&mut self, out: &mut [u8]) {
        assert_eq!(
            self.state,
            MessageState::Filled,
            "read on a message that is still being built"
        );
        let end = self.index + out.len();
        assert!(
            end <= self.data.len(),
            "message read of {} bytes at {} overruns {} byte buffer",
            out.len(),
            self.index,
            self.data.len()
        );
        out.copy_from_slice(&self.data[self.index..end]);
        self.index = end;
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_data(&value.to_le_bytes());
    }

    pub fn read_u32(&mut self) -> u32 {
        let mut raw = [0u8; 4];
        self.read_data(&mut raw);
        u32::from_le_bytes(raw)
    }

    /// Write a length-prefixed string.
    pub fn write_string(&mut self, s: &str) {
        let len = u32::try_from(s.len()).expect("string longer than u32::MAX bytes");
        self.write_u32(len);
        self.write_data(s.as_bytes());
    }

    /// Read a length-prefixed string.
    ///
    /// The length comes from the peer, so an overlong or non-UTF-8 field is
    /// an error rather than a panic.
    pub fn read_string(&mut self) -> Result<String, WireError> {
        self.ensure_remaining(SIZE_FIELD_LEN)?;
        let len = self.read_u32() as usize;
        self.ensure_remaining(len)?;

        let mut raw = vec![0u8; len];
        self.read_data(&mut raw);
        String::from_utf8(raw).map_err(|_| WireError::InvalidUtf8)
    }

    /// Bytes a string occupies once written: its length plus the prefix.
    pub fn string_size(s: &str) -> usize {
        s.len() + SIZE_FIELD_LEN
    }

    /// Bytes not yet consumed (or not yet written) after the cursor.
    pub fn remaining_data_size(&self) -> usize {
        self.data.len() - self.index
    }

    fn ensure_remaining(&self, needed: usize) -> Result<(), WireError> {
        let remaining = self.remaining_data_size();
        if needed > remaining {
            return Err(WireError::Truncated { needed, remaining });
        }
        Ok(())
    }

    /// Write the frame to `stream`.
    ///
    /// The header (length and kind) goes out in full before any payload byte.
    ///
    /// # Panics
    ///
    /// Panics if the payload was not filled exactly to its allocated size.
    pub fn send<W: Write + ?Sized>(&self, stream: &mut W) -> Result<(), WireError> {
        assert_eq!(
            self.state,
            MessageState::Filling,
            "send on a received message"
        );
        assert_eq!(
            self.index,
            self.data.len(),
            "message filled {} of {} allocated bytes",
            self.index,
            self.data.len()
        );

        let total = u32::try_from(KIND_LEN + self.data.len())
            .expect("message payload longer than u32::MAX bytes");

        let mut header = BytesMut::with_capacity(SIZE_FIELD_LEN + KIND_LEN);
        header.put_u32_le(total);
        header.put_u8(self.kind);

        stream
            .write_all(&header)
            .map_err(|e| WireError::io(IoPhase::SizeWrite, e))?;
        stream
            .write_all(&self.data)
            .and_then(|()| stream.flush())
            .map_err(|e| WireError::io(IoPhase::DataWrite, e))?;

        tracing::debug!(kind = self.kind, size = total, "sent message");
        Ok(())
    }

    /// Read one frame from `stream`.
    ///
    /// Frames announcing more than `max_size` bytes are rejected before any
    /// payload is allocated.
    pub fn recv<R: Read + ?Sized>(stream: &mut R, max_size: u32) -> Result<Self, WireError> {
        let mut size_field = [0u8; SIZE_FIELD_LEN];
        stream
            .read_exact(&mut size_field)
            .map_err(|e| WireError::io(IoPhase::SizeRead, e))?;
        let size = u32::from_le_bytes(size_field);

        if (size as usize) < KIND_LEN {
            tracing::warn!(size, "rejected frame without kind byte");
            return Err(WireError::InvalidSize { size });
        }
        if size > max_size {
            tracing::warn!(size, max_size, "rejected oversized frame");
            return Err(WireError::FrameTooLarge {
                size,
                max: max_size,
            });
        }

        let mut kind = [0u8; KIND_LEN];
        stream
            .read_exact(&mut kind)
            .map_err(|e| WireError::io(IoPhase::DataRead, e))?;

        let mut data = vec![0u8; size as usize - KIND_LEN];
        stream
            .read_exact(&mut data)
            .map_err(|e| WireError::io(IoPhase::DataRead, e))?;

        tracing::debug!(kind = kind[0], size, "received message");
        Ok(Self {
            kind: kind[0],
            data,
            index: 0,
            state: MessageState::Filled,
        })
    }
}
