use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use paramfs_core::{RegisterFile, StructureConfig, Syncer, SyncerSet};
use paramfs_remote::{Client, Error, ParameterManager, Server, ServerConfig, DEFAULT_LISTEN_ADDR};

/// paramfs - serve and drive parameter trees over TCP
#[derive(Parser, Debug)]
#[command(name = "paramfs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the parameters described by a structure file
    Serve {
        /// JSON structure description
        #[arg(long)]
        config: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
        listen: String,

        /// Largest frame accepted from a client, in bytes
        #[arg(long)]
        max_frame: Option<u32>,
    },
    /// Send one command to a running server and print the answer
    Send {
        /// Server address
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
        server: String,

        /// Command name, e.g. getParameter
        command: String,

        /// Command arguments
        args: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info".into()),
        1 => tracing_subscriber::EnvFilter::new("debug"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Command::Serve {
            config,
            listen,
            max_frame,
        } => serve(config, listen, max_frame),
        Command::Send {
            server,
            command,
            args,
        } => send(&server, &command, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn serve(config: PathBuf, listen: String, max_frame: Option<u32>) -> Result<(), Error> {
    let structure = StructureConfig::load(&config)?;

    // Writes land in an in-memory register file.
    let registers = RegisterFile::default();
    let syncers: SyncerSet = [Arc::new(registers) as Arc<dyn Syncer>]
        .into_iter()
        .collect();
    let manager = ParameterManager::from_config(&structure, syncers)?;
    tracing::info!(
        root = manager.tree().root_name(),
        parameters = manager.list_parameters().len(),
        footprint = manager.tree().footprint(),
        "loaded {}",
        config.display()
    );

    let mut server_config = ServerConfig {
        listen,
        ..ServerConfig::default()
    };
    if let Some(max_frame) = max_frame {
        server_config.max_frame_size = max_frame;
    }

    let server = Server::bind(&server_config, manager)?;
    tracing::info!("listening on {}", server.local_addr()?);
    server.serve()
}

fn send(server: &str, command: &str, args: Vec<String>) -> Result<(), Error> {
    let mut client = Client::connect(server)?;
    let output = client.send_command(command, args)?;
    println!("{}", output);
    Ok(())
}
