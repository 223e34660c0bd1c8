//! Blocking TCP server answering remote commands.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use serde::{Deserialize, Serialize};

use paramfs_wire::{Packet, DEFAULT_MAX_FRAME_SIZE};

use crate::commands::CommandTable;
use crate::error::Error;
use crate::manager::ParameterManager;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    /// Frames announcing more bytes than this drop the connection.
    pub max_frame_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN_ADDR.to_string(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Accepts connections and serves each on its own thread.
///
/// All connections share one [`ParameterManager`]; its lock serializes
/// accesses and commits.
pub struct Server {
    listener: TcpListener,
    manager: Arc<Mutex<ParameterManager>>,
    commands: Arc<CommandTable>,
    max_frame_size: u32,
}

impl Server {
    pub fn bind(config: &ServerConfig, manager: ParameterManager) -> Result<Self, Error> {
        Self::with_commands(config, manager, CommandTable::standard())
    }

    pub fn with_commands(
        config: &ServerConfig,
        manager: ParameterManager,
        commands: CommandTable,
    ) -> Result<Self, Error> {
        let listener = TcpListener::bind(&config.listen)?;
        Ok(Self {
            listener,
            manager: Arc::new(Mutex::new(manager)),
            commands: Arc::new(commands),
            max_frame_size: config.max_frame_size,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared handle on the served parameters.
    pub fn manager(&self) -> Arc<Mutex<ParameterManager>> {
        Arc::clone(&self.manager)
    }

    /// Accept connections until the listener fails.
    pub fn serve(self) -> Result<(), Error> {
        tracing::info!(addr = ?self.listener.local_addr().ok(), "serving parameters");

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => self.spawn(stream),
                Err(e) => tracing::warn!(error = %e, "accept failed"),
            }
        }
        Ok(())
    }

    fn spawn(&self, mut stream: TcpStream) {
        let peer = stream.peer_addr().ok();
        let manager = Arc::clone(&self.manager);
        let commands = Arc::clone(&self.commands);
        let max_frame_size = self.max_frame_size;

        tracing::info!(?peer, "client connected");
        thread::spawn(move || {
            match handle_connection(&mut stream, &manager, &commands, max_frame_size) {
                Ok(()) => tracing::info!(?peer, "client disconnected"),
                Err(e) => tracing::warn!(?peer, error = %e, "connection dropped"),
            }
        });
    }
}

/// Serve requests from `stream` until the peer closes it.
///
/// Returns `Ok` on a clean close between frames. Any transport or framing
/// error ends the connection.
pub fn handle_connection<S: Read + Write + ?Sized>(
    stream: &mut S,
    manager: &Mutex<ParameterManager>,
    commands: &CommandTable,
    max_frame_size: u32,
) -> Result<(), Error> {
    loop {
        let packet = match Packet::recv(stream, max_frame_size) {
            Ok(packet) => packet,
            Err(e) if e.is_disconnect() => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let answer = match packet {
            Packet::Request { command, arguments } => {
                tracing::debug!(%command, args = arguments.len(), "request");
                let mut manager = manager.lock().unwrap_or_else(PoisonError::into_inner);
                commands.dispatch(&mut manager, &command, &arguments)
            }
            other => {
                tracing::warn!(kind = ?other.kind(), "expected a command request");
                Packet::Failure("expected a command request".to_string())
            }
        };
        answer.send(stream)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramfs_core::{StructureConfig, SyncerSet};
    use std::io::Cursor;

    fn manager() -> Mutex<ParameterManager> {
        let config = StructureConfig::from_json(
            r#"{"name": "dev", "children": [{"type": "integer", "name": "level", "size": 1}]}"#,
        )
        .unwrap();
        Mutex::new(ParameterManager::from_config(&config, SyncerSet::new()).unwrap())
    }

    /// An in-memory duplex: reads from `input`, collects writes.
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

    fn script(packets: &[Packet]) -> Duplex {
        let mut input = Vec::new();
        for packet in packets {
            packet.send(&mut input).unwrap();
        }
        Duplex {
            input: Cursor::new(input),
            output: Vec::new(),
        }
    }

    fn answers(output: &[u8]) -> Vec<Packet> {
        let mut reader = output;
        let mut packets = Vec::new();
        while !reader.is_empty() {
            packets.push(Packet::recv(&mut reader, DEFAULT_MAX_FRAME_SIZE).unwrap());
        }
        packets
    }

    #[test]
    fn answers_each_request_in_order() {
        let manager = manager();
        let mut duplex = script(&[
            Packet::request("setParameter", ["dev/level", "42"]),
            Packet::request("getParameter", ["dev/level"]),
        ]);

        handle_connection(&mut duplex, &manager, &CommandTable::standard(), 1024).unwrap();
        assert_eq!(
            answers(&duplex.output),
            vec![
                Packet::Success("Done".into()),
                Packet::Success("42".into())
            ]
        );
    }

    #[test]
    fn answer_packets_are_refused() {
        let manager = manager();
        let mut duplex = script(&[Packet::Success("hi".into())]);

        handle_connection(&mut duplex, &manager, &CommandTable::standard(), 1024).unwrap();
        assert_eq!(
            answers(&duplex.output),
            vec![Packet::Failure("expected a command request".into())]
        );
    }

    #[test]
    fn oversized_frame_drops_connection() {
        let manager = manager();
        let mut duplex = script(&[Packet::request("getParameter", ["dev/level"])]);

        let err = handle_connection(&mut duplex, &manager, &CommandTable::standard(), 8)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Wire(paramfs_wire::WireError::FrameTooLarge { .. })
        ));
        assert!(duplex.output.is_empty());
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen, "127.0.0.1:5000");
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
    }
}
