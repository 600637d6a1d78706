use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tftpc::tftp::client::{Client, ClientConfig};
use tftpc::tftp::core::Mode;

#[derive(Parser, Debug)]
#[command(name = "tftpc")]
#[command(about = "Fetch or deliver a single file over TFTP", long_about = None)]
#[command(version)]
struct Cli {
    /// Server host name or IP address
    host: String,

    /// Transfer direction
    #[arg(value_enum)]
    operation: Operation,

    /// Name of the file to transfer
    filename: String,

    /// Server port (default: 3333)
    #[arg(short, long)]
    port: Option<u16>,

    /// Local path, if it differs from the remote file name
    #[arg(short, long)]
    local: Option<PathBuf>,

    /// Transfer mode
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Seconds to wait for each reply (default: 5)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Retransmissions of one packet before giving up (default: 5)
    #[arg(short, long)]
    retries: Option<u32>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
    /// Download from the server
    Get,
    /// Upload to the server
    Put,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let base = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    let config = base.merge_cli(
        Some(cli.host),
        cli.port,
        cli.timeout.map(Duration::from_secs),
        cli.retries,
        cli.mode,
    );

    let local = cli
        .local
        .unwrap_or_else(|| PathBuf::from(&cli.filename));
    let client = Client::new(config);

    match cli.operation {
        Operation::Get => {
            client
                .get(&cli.filename, &local)
                .with_context(|| format!("Failed to download {}", cli.filename))?;
        }
        Operation::Put => {
            client
                .put(&local, &cli.filename)
                .with_context(|| format!("Failed to upload {}", local.display()))?;
        }
    }
    Ok(())
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .init();
}
