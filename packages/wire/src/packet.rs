//! The closed set of packets exchanged with a remote processor.

use std::io::{Read, Write};

use crate::error::WireError;
use crate::message::Message;

/// Kind byte carried in every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    CommandRequest = 0,
    SuccessAnswer = 1,
    FailureAnswer = 2,
}

impl TryFrom<u8> for MessageKind {
    type Error = WireError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(MessageKind::CommandRequest),
            1 => Ok(MessageKind::SuccessAnswer),
            2 => Ok(MessageKind::FailureAnswer),
            other => Err(WireError::UnknownKind(other)),
        }
    }
}

/// A protocol payload.
///
/// Each variant knows its encoded size, how to fill an outbound
/// [`Message`], and how to parse itself from a received one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// A command name and its arguments. The arguments run to the end of
    /// the payload.
    Request {
        command: String,
        arguments: Vec<String>,
    },
    /// The command ran; carries its textual result.
    Success(String),
    /// The command failed; carries the reason.
    Failure(String),
}

impl Packet {
    pub fn request<I, S>(command: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Packet::Request {
            command: command.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Packet::Request { .. } => MessageKind::CommandRequest,
            Packet::Success(_) => MessageKind::SuccessAnswer,
            Packet::Failure(_) => MessageKind::FailureAnswer,
        }
    }

    /// Encoded payload size, excluding the frame header.
    pub fn data_size(&self) -> usize {
        match self {
            Packet::Request { command, arguments } => {
                Message::string_size(command)
                    + arguments
                        .iter()
                        .map(|a| Message::string_size(a))
                        .sum::<usize>()
            }
            Packet::Success(result) | Packet::Failure(result) => Message::string_size(result),
        }
    }

    fn fill(&self, msg: &mut Message) {
        match self {
            Packet::Request { command, arguments } => {
                msg.write_string(command);
                for argument in arguments {
                    msg.write_string(argument);
                }
            }
            Packet::Success(result) | Packet::Failure(result) => msg.write_string(result),
        }
    }

    fn collect(msg: &mut Message) -> Result<Self, WireError> {
        match MessageKind::try_from(msg.kind())? {
            MessageKind::CommandRequest => {
                let command = msg.read_string()?;
                let mut arguments = Vec::new();
                while msg.remaining_data_size() > 0 {
                    arguments.push(msg.read_string()?);
                }
                Ok(Packet::Request { command, arguments })
            }
            MessageKind::SuccessAnswer => Ok(Packet::Success(msg.read_string()?)),
            MessageKind::FailureAnswer => Ok(Packet::Failure(msg.read_string()?)),
        }
    }

    /// Build the frame for this packet and write it to `stream`.
    pub fn send<W: Write + ?Sized>(&self, stream: &mut W) -> Result<(), WireError> {
        let mut msg = Message::new(self.kind() as u8);
        msg.allocate(self.data_size());
        self.fill(&mut msg);
        msg.send(stream)
    }

    /// Read one frame from `stream` and parse it.
    pub fn recv<R: Read + ?Sized>(stream: &mut R, max_size: u32) -> Result<Self, WireError> {
        let mut msg = Message::recv(stream, max_size)?;
        Self::collect(&mut msg)
    }
}
