//! Blocking client for a remote parameter server.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use paramfs_wire::{Packet, DEFAULT_MAX_FRAME_SIZE};

use crate::error::Error;

/// Sends one command at a time and waits for its answer.
pub struct Client<S = TcpStream> {
    stream: S,
    max_frame_size: u32,
}

impl Client<TcpStream> {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, Error> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

impl<S: Read + Write> Client<S> {
    /// Talk over an already connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    #[must_use]
    pub fn with_max_frame_size(mut self, max_frame_size: u32) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Run `command` remotely and return its output.
    ///
    /// A `Failure` answer is returned as [`Error::CommandFailed`].
    pub fn send_command<I, A>(&mut self, command: &str, arguments: I) -> Result<String, Error>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Packet::request(command, arguments).send(&mut self.stream)?;

        match Packet::recv(&mut self.stream, self.max_frame_size)? {
            Packet::Success(output) => Ok(output),
            Packet::Failure(message) => Err(Error::CommandFailed(message)),
            Packet::Request { command, .. } => Err(Error::UnexpectedAnswer(format!(
                "server sent a '{}' request",
                command
            ))),
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Duplex {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn replying(answer: Packet) -> Client<Duplex> {
        let mut input = Vec::new();
        answer.send(&mut input).unwrap();
        Client::new(Duplex {
            input: Cursor::new(input),
            output: Vec::new(),
        })
    }

    #[test]
    fn success_returns_output_and_request_is_framed() {
        let mut client = replying(Packet::Success("42".into()));
        let output = client
            .send_command("getParameter", ["dev/level"])
            .unwrap();
        assert_eq!(output, "42");

        let sent = client.into_inner().output;
        assert_eq!(
            Packet::recv(&mut sent.as_slice(), DEFAULT_MAX_FRAME_SIZE).unwrap(),
            Packet::request("getParameter", ["dev/level"])
        );
    }

    #[test]
    fn failure_maps_to_command_failed() {
        let mut client = replying(Packet::Failure("no element 'x'".into()));
        let err = client.send_command("getParameter", ["dev/x"]).unwrap_err();
        assert!(matches!(err, Error::CommandFailed(m) if m == "no element 'x'"));
    }

    #[test]
    fn request_answer_is_unexpected() {
        let mut client = replying(Packet::request("help", Vec::<String>::new()));
        assert!(matches!(
            client.send_command("help", Vec::<String>::new()),
            Err(Error::UnexpectedAnswer(_))
        ));
    }

    #[test]
    fn closed_connection_is_a_disconnect() {
        let mut client = Client::new(Duplex {
            input: Cursor::new(Vec::new()),
            output: Vec::new(),
        });
        let err = client.send_command("help", Vec::<String>::new()).unwrap_err();
        assert!(err.is_disconnect());
    }
}
