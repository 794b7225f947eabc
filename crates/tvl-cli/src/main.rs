use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tvl_core::BucketKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "tvlctl",
    about = "Validate and store protocol TVL in hourly and daily buckets",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to tvl.toml (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the database path from the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a TVL value against history and store it.
    ///
    /// A confirmed spike disables the protocol; later calls are refused
    /// until `tvlctl enable` is run.
    Store {
        #[arg(long)]
        protocol_id: String,
        #[arg(long)]
        protocol_name: String,
        /// Unix timestamp in seconds (default: now)
        #[arg(long)]
        timestamp: Option<u64>,
        /// Total as a number, or a JSON object `{"tvl": .., "breakdown": {..}}`
        #[arg(long)]
        tvl: String,
        /// Skip the spike check and previous-period fields (first write)
        #[arg(long)]
        no_previous: bool,
    },
    /// Print the newest records of a bucket as JSON
    Show {
        #[arg(long)]
        protocol_id: String,
        #[arg(long, value_enum, default_value = "hourly")]
        kind: KindArg,
        #[arg(long, default_value = "24")]
        limit: usize,
    },
    /// Re-enable a protocol disabled after a rejected spike
    Enable {
        #[arg(long)]
        protocol_id: String,
    },
    /// List disabled protocols
    Disabled,
    /// Write a default tvl.toml
    InitConfig {
        #[arg(short, long, default_value = "tvl.toml")]
        path: PathBuf,
        /// Directory for the database file
        #[arg(long, default_value = "/var/lib/tvl")]
        data_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Hourly,
    Daily,
}

impl From<KindArg> for BucketKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Hourly => BucketKind::Hourly,
            KindArg::Daily => BucketKind::Daily,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tvl=debug")),
        )
        .init();

    let Cli {
        config,
        db,
        command,
    } = Cli::parse();
    let load_config = || commands::load_config(config.as_deref(), db.clone());

    match command {
        Commands::Store {
            protocol_id,
            protocol_name,
            timestamp,
            tvl,
            no_previous,
        } => {
            commands::ingest::store(
                &load_config()?,
                protocol_id,
                protocol_name,
                timestamp,
                &tvl,
                !no_previous,
            )
            .await
        }
        Commands::Show {
            protocol_id,
            kind,
            limit,
        } => commands::inspect::show(&load_config()?, &protocol_id, kind.into(), limit),
        Commands::Enable { protocol_id } => {
            commands::registry::enable(&load_config()?, &protocol_id)
        }
        Commands::Disabled => commands::registry::list(&load_config()?),
        Commands::InitConfig { path, data_dir } => commands::init_config(&path, &data_dir),
    }
}
