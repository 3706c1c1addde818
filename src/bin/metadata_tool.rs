//! Metadata Tool CLI
//!
//! Inspects and checks metadata files without the domain types that wrote them.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use familiar_metadata::codec::outline;
use familiar_metadata::{Metadata, MetadataConfig, MetadataExt, MetadataSerializer, ProxyRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "metadata-tool")]
#[command(about = "Inspect and check metadata files")]
struct Cli {
    /// Configuration file layered over the default locations
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the version, keys and type tags of a file
    Inspect {
        /// Metadata file
        file: PathBuf,
    },

    /// Fully decode a file and report the first error
    Check {
        /// Metadata file
        file: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = MetadataConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Inspect { file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let wire: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", file.display()))?;
            print!("{}", outline(&wire)?);
        }

        Commands::Check { file } => {
            let serializer = MetadataSerializer::from_config(ProxyRegistry::new(), &config);
            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let document = serializer
                .parse(&text)
                .with_context(|| format!("decoding {}", file.display()))?;
            println!(
                "✅ {}: version {}, {} entries",
                file.display(),
                document.version(),
                document.len()
            );
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
