//! Entry point for `rdt-over-tcp`.
//!
//! Parses CLI arguments and dispatches into either **server** or **client**
//! mode.  All actual protocol work is delegated to library modules;
//! `main.rs` owns only process setup (logging, argument parsing, the
//! prompt/file configuration path) and TCP connect/accept plumbing.

use std::io::Write as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::{TcpListener, TcpStream};

use rdt_over_tcp::config::{
    ConfigError, ReceiverConfig, SenderConfig, KEY_MAXIMUM_MSG_SIZE, KEY_TIMEOUT, KEY_WINDOW_SIZE,
};
use rdt_over_tcp::receiver::Receiver;
use rdt_over_tcp::sender::Sender;

/// Reliable ordered data transfer over TCP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run as a server, receiving one message per accepted connection.
    Server {
        /// Local address to bind.
        #[arg(short, long, default_value = "127.0.0.1:9999")]
        bind: String,
        /// Configuration file carrying `maximum_msg_size`; prompts when absent.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Run as a client, transferring the configured message to a server.
    Client {
        /// Remote server address.
        #[arg(short, long, default_value = "127.0.0.1:9999")]
        server: String,
        /// Configuration file carrying `message`, `window_size`, and
        /// `timeout`; prompts when absent.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.mode {
        Mode::Server { bind, file } => run_server(&bind, file).await,
        Mode::Client { server, file } => run_client(&server, file).await,
    };

    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Server mode
// ---------------------------------------------------------------------------

async fn run_server(bind: &str, file: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match file {
        Some(path) => ReceiverConfig::from_file(path)?,
        None => {
            let size =
                prompt_number("Enter the maximum message size (Bytes): ", KEY_MAXIMUM_MSG_SIZE)?;
            ReceiverConfig::new(size)?
        }
    };

    let listener = TcpListener::bind(bind).await?;
    log::info!(
        "server listening on {} (max_segment_size={})",
        listener.local_addr()?,
        config.max_segment_size
    );

    loop {
        let (socket, peer) = listener.accept().await?;
        log::info!("connection from {peer}");

        // One conversation per connection, each on its own task.
        tokio::spawn(async move {
            match Receiver::new(socket, config).run().await {
                Ok(message) => {
                    log::info!("{peer}: received {} byte(s)", message.len());
                    println!("{peer}: {}", String::from_utf8_lossy(&message));
                }
                Err(e) => log::warn!("{peer}: conversation failed: {e}"),
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Client mode
// ---------------------------------------------------------------------------

async fn run_client(server: &str, file: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match file {
        Some(path) => SenderConfig::from_file(path)?,
        None => {
            let message = prompt("Enter the message: ")?;
            let window_size = prompt_number("Enter the window size: ", KEY_WINDOW_SIZE)?;
            let timeout = prompt_number("Enter the timeout (seconds): ", KEY_TIMEOUT)?;
            SenderConfig::new(message, window_size, timeout)?
        }
    };

    log::info!("connecting to {server}");
    let socket = TcpStream::connect(server).await?;

    let summary = Sender::new(socket, config).run().await?;
    println!(
        "message delivered: {} segment(s) of ≤{} byte(s), {} retransmission(s)",
        summary.segments, summary.max_segment_size, summary.retransmissions
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Interactive input
// ---------------------------------------------------------------------------

fn prompt(label: &str) -> Result<String, ConfigError> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn prompt_number(label: &str, key: &'static str) -> Result<u64, ConfigError> {
    let raw = prompt(label)?;
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: raw.trim().to_string(),
        })
}
