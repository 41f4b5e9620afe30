//! kvwire CLI
//!
//! Decode captured replies, encode commands, or send one command to a server.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kvwire::protocol::{write_command, Decoder};
use kvwire::{CodecConfig, Connection, KvWireError};
use tracing_subscriber::{fmt, EnvFilter};

/// kvwire CLI
#[derive(Parser, Debug)]
#[command(name = "kvwire-cli")]
#[command(about = "Inspect and produce RESP2/RESP3 wire traffic")]
#[command(version)]
struct Args {
    /// Maximum aggregate nesting depth accepted while decoding
    #[arg(long, default_value = "128")]
    max_depth: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode every value in a capture and print it
    Decode {
        /// Capture file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Write the wire encoding of a command to stdout
    Encode {
        /// Command name and arguments
        #[arg(required = true)]
        args: Vec<String>,
    },

    /// Send a command to a server and print the reply
    Send {
        /// Server address
        #[arg(short, long, default_value = "127.0.0.1:6379")]
        server: String,

        /// Command name and arguments
        #[arg(required = true)]
        args: Vec<String>,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvwire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = CodecConfig::builder().max_depth(args.max_depth).build();

    if let Err(e) = run(args.command, &config) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, config: &CodecConfig) -> kvwire::Result<()> {
    config.validate()?;
    match command {
        Commands::Decode { input } => match input {
            Some(path) => decode_all(BufReader::new(File::open(path)?), config),
            None => decode_all(io::stdin().lock(), config),
        },
        Commands::Encode { args } => {
            let mut stdout = io::stdout().lock();
            write_command(&mut stdout, &args)?;
            stdout.flush()?;
            Ok(())
        }
        Commands::Send { server, args } => {
            tracing::info!("Connecting to {}", server);
            let stream = TcpStream::connect(&server)?;
            let mut conn = Connection::from_tcp(stream, config)?;
            let reply = conn.request(&args)?;
            println!("{}", reply);
            Ok(())
        }
    }
}

/// Print values until the input is exhausted at a value boundary
fn decode_all<R: BufRead>(reader: R, config: &CodecConfig) -> kvwire::Result<()> {
    let mut decoder = Decoder::with_config(reader, config);
    let mut count = 0usize;
    loop {
        if decoder.get_mut().fill_buf()?.is_empty() {
            tracing::debug!("Decoded {} values", count);
            return Ok(());
        }
        match decoder.decode() {
            Ok(value) => {
                if let Some(attrs) = value.attributes() {
                    println!("(attributes) {}", attrs);
                }
                println!("{}", value);
                count += 1;
            }
            Err(e @ KvWireError::Io(_)) if e.is_disconnect() => {
                tracing::warn!("Input ended mid-value after {} values", count);
                return Err(e);
            }
            Err(e) => return Err(e),
        }
    }
}
