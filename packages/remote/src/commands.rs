//! Remote command table and dispatch.
//!
//! Commands:
//! - `help` - List commands with their usage
//! - `listParameters` - Every parameter path, one per line
//! - `getParameter <path>` - Read a parameter
//! - `setParameter <path> <value>` - Write and commit a parameter
//! - `setOutputRawFormat dec|hex` - Choose how values are printed
//! - `getOutputRawFormat` - Show the current format

use std::collections::BTreeMap;

use paramfs_wire::Packet;

use crate::manager::{OutputFormat, ParameterManager};

/// Answer text for a command that ran but has nothing to report.
pub const DONE: &str = "Done";

/// Result of running a command handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Command succeeded with nothing to say
    Done,
    /// Command succeeded with output
    Succeeded(String),
    /// Command failed with an error message
    Failed(String),
    /// Arguments were malformed; answer with the usage line
    ShowUsage,
    /// Answer with the command list
    Help,
}

pub type Handler = fn(&mut ParameterManager, &[String]) -> CommandResult;

/// One entry of the command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    /// Fewer arguments than this is answered with the usage line.
    pub min_args: usize,
    pub usage: &'static str,
    pub description: &'static str,
    pub handler: Handler,
}

/// Commands understood by the server, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    commands: BTreeMap<&'static str, CommandSpec>,
}

impl CommandTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard parameter commands.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(CommandSpec {
            name: "help",
            min_args: 0,
            usage: "help",
            description: "Show this list",
            handler: |_, _| CommandResult::Help,
        });
        table.register(CommandSpec {
            name: "listParameters",
            min_args: 0,
            usage: "listParameters",
            description: "List every parameter path",
            handler: list_parameters,
        });
        table.register(CommandSpec {
            name: "getParameter",
            min_args: 1,
            usage: "getParameter <path>",
            description: "Get parameter value",
            handler: get_parameter,
        });
        table.register(CommandSpec {
            name: "setParameter",
            min_args: 2,
            usage: "setParameter <path> <value>",
            description: "Set parameter value",
            handler: set_parameter,
        });
        table.register(CommandSpec {
            name: "setOutputRawFormat",
            min_args: 1,
            usage: "setOutputRawFormat dec|hex",
            description: "Print values in decimal or hexadecimal",
            handler: set_output_raw_format,
        });
        table.register(CommandSpec {
            name: "getOutputRawFormat",
            min_args: 0,
            usage: "getOutputRawFormat",
            description: "Show the value output format",
            handler: get_output_raw_format,
        });
        table
    }

    /// Add or replace a command.
    pub fn register(&mut self, spec: CommandSpec) {
        self.commands.insert(spec.name, spec);
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// One line per command: usage then description.
    pub fn help_text(&self) -> String {
        let width = self.iter().map(|c| c.usage.len()).max().unwrap_or(0);
        self.iter()
            .map(|c| format!("{:width$}  {}", c.usage, c.description, width = width))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Run `command` and build the answer packet.
    pub fn dispatch(
        &self,
        manager: &mut ParameterManager,
        command: &str,
        arguments: &[String],
    ) -> Packet {
        let Some(spec) = self.get(command) else {
            tracing::warn!(command, "unknown command");
            return Packet::Failure(format!(
                "Command not found: '{}', use 'help' for a list of commands",
                command
            ));
        };

        let result = if arguments.len() < spec.min_args {
            CommandResult::ShowUsage
        } else {
            (spec.handler)(manager, arguments)
        };

        match result {
            CommandResult::Done => Packet::Success(DONE.to_string()),
            CommandResult::Succeeded(output) => Packet::Success(output),
            CommandResult::Failed(message) => {
                tracing::warn!(command, %message, "command failed");
                Packet::Failure(message)
            }
            CommandResult::ShowUsage => Packet::Failure(format!("Usage: {}", spec.usage)),
            CommandResult::Help => Packet::Success(self.help_text()),
        }
    }
}

fn list_parameters(manager: &mut ParameterManager, _: &[String]) -> CommandResult {
    CommandResult::Succeeded(manager.list_parameters().join("\n"))
}

fn get_parameter(manager: &mut ParameterManager, args: &[String]) -> CommandResult {
    match manager.get_value(&args[0]) {
        Ok(value) => CommandResult::Succeeded(value),
        Err(e) => CommandResult::Failed(e.to_string()),
    }
}

fn set_parameter(manager: &mut ParameterManager, args: &[String]) -> CommandResult {
    // Values may contain spaces and arrive split across arguments.
    let value = args[1..].join(" ");
    match manager.set_value(&args[0], &value) {
        Ok(()) => CommandResult::Done,
        Err(e) => CommandResult::Failed(e.to_string()),
    }
}

fn set_output_raw_format(manager: &mut ParameterManager, args: &[String]) -> CommandResult {
    match args[0].parse::<OutputFormat>() {
        Ok(format) => {
            manager.set_output_format(format);
            CommandResult::Done
        }
        Err(_) => CommandResult::ShowUsage,
    }
}

fn get_output_raw_format(manager: &mut ParameterManager, _: &[String]) -> CommandResult {
    CommandResult::Succeeded(manager.output_format().to_string())
}
