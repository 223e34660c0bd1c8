//! # paramfs-remote
//!
//! Remote access to a parameter tree over framed TCP.
//!
//! A client sends a [`Packet::Request`](paramfs_wire::Packet::Request)
//! naming a command and its arguments; the server looks the command up in
//! its [`CommandTable`], runs it against the shared [`ParameterManager`] and
//! answers with a `Success` or `Failure` packet carrying text.
//!
//! ## Commands
//!
//! - `help` - list commands
//! - `listParameters` - every parameter path, one per line
//! - `getParameter <path>` - value as text
//! - `setParameter <path> <value>` - write and commit
//! - `setOutputRawFormat dec|hex` - how values are printed
//! - `getOutputRawFormat`
//!
//! ```no_run
//! use paramfs_remote::Client;
//!
//! let mut client = Client::connect("127.0.0.1:5000")?;
//! client.send_command("setParameter", ["audio/volume", "42"])?;
//! let volume = client.send_command("getParameter", ["audio/volume"])?;
//! # Ok::<(), paramfs_remote::Error>(())
//! ```

mod client;
mod commands;
mod error;
mod manager;
mod server;

pub use client::Client;
pub use commands::{CommandResult, CommandSpec, CommandTable, Handler};
pub use error::Error;
pub use manager::{OutputFormat, ParameterManager};
pub use server::{handle_connection, Server, ServerConfig, DEFAULT_LISTEN_ADDR};
