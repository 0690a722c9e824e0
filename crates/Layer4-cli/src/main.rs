//! hostbridge CLI - Main entry point

mod client;
mod interaction_log;
mod serve;

pub use client::BridgeClient;
pub use interaction_log::InteractionLog;

use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::{Parser, Subcommand};
use hostbridge_foundation::BridgeConfig;
use hostbridge_server::{ResponseBody, Status};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// hostbridge - run code and capture views inside a single-threaded host over HTTP
#[derive(Parser, Debug)]
#[command(name = "hostbridge")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Directory for the interaction log
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the demo host with the bridge attached
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Seconds a request waits for the host
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Send code to a running bridge and print its output
    Run {
        /// File to send (stdin when neither FILE nor --code is given)
        file: Option<PathBuf>,

        /// Code to send
        #[arg(short, long, conflicts_with = "file")]
        code: Option<String>,

        /// Bridge URL (defaults to the configured host and port)
        #[arg(long)]
        url: Option<String>,
    },
    /// Capture the active camera of a running bridge
    View {
        /// Bridge URL (defaults to the configured host and port)
        #[arg(long)]
        url: Option<String>,

        /// Where to write the PNG
        #[arg(short, long, default_value = "agent_view.png")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config = BridgeConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        BridgeConfig::default()
    });

    match args.command {
        Command::Serve {
            host,
            port,
            timeout,
        } => {
            let mut config = config;
            if let Some(host) = host {
                config = config.host(host);
            }
            if let Some(port) = port {
                config = config.port(port);
            }
            if let Some(secs) = timeout {
                config = config.request_timeout(Duration::from_secs(secs));
            }
            serve::serve(config)
        }
        Command::Run { file, code, url } => {
            let code = match (code, file) {
                (Some(code), _) => code,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => {
                    let mut code = String::new();
                    std::io::stdin()
                        .read_to_string(&mut code)
                        .context("failed to read code from stdin")?;
                    code
                }
            };
            run_code(&client(url, &config), &InteractionLog::new(args.log_dir), &code)
        }
        Command::View { url, output } => capture_view(&client(url, &config), &output),
    }
}

fn client(url: Option<String>, config: &BridgeConfig) -> BridgeClient {
    let url = url.unwrap_or_else(|| format!("http://{}:{}", config.host, config.port));
    // outlast the bridge's own timeout so its 504 arrives
    BridgeClient::with_timeout(url, config.request_timeout_duration() + Duration::from_secs(10))
}

fn run_code(client: &BridgeClient, log: &InteractionLog, code: &str) -> anyhow::Result<()> {
    let response = client.execute(code);
    log.record(code, &response);

    if response.is_success() {
        print!("{}", response.output.unwrap_or_default());
        Ok(())
    } else {
        anyhow::bail!(
            "{}",
            response.message.unwrap_or_else(|| "unknown error".to_string())
        )
    }
}

fn capture_view(client: &BridgeClient, output: &Path) -> anyhow::Result<()> {
    let encoded = match client.capture() {
        ResponseBody {
            status: Status::Success,
            image: Some(image),
            ..
        } => image,
        response => anyhow::bail!(
            "{}",
            response.message.unwrap_or_else(|| "no image in response".to_string())
        ),
    };

    let bytes = STANDARD
        .decode(encoded)
        .context("capture is not valid base64")?;
    std::fs::write(output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Saved {} ({} bytes) from {}",
        output.display(),
        bytes.len(),
        client.base_url()
    );
    Ok(())
}
