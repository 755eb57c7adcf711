//! Asset Engine
//!
//! Command line front end for expanding and resolving asset directives.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use engine::config::Config;
use engine::{AssetEngine, EncodingMode, InMemoryAssetStore, RequestContext};

/// Asset Engine - resolve and expand `{#asset}` directives.
#[derive(Parser, Debug)]
#[command(name = "asset-engine")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to a JSON asset manifest used as the asset store
    #[arg(short, long, global = true, value_name = "MANIFEST")]
    pub store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Expand all asset directives in a file and print the result
    Expand {
        /// File to expand
        file: PathBuf,
    },

    /// Resolve a single asset and print its encoded content
    Resolve {
        /// Asset name or link
        name: String,

        /// Encoding mode (utf8, base64, string, link, dataURI)
        #[arg(long, short, default_value = "utf8")]
        encoding: EncodingMode,
    },

    /// Print the absolute path a link resolves to, if allowed
    Link {
        /// Link to resolve
        path: String,
    },

    /// Print the HTTP metadata used to serve an asset's raw content
    Content {
        /// Asset name or link
        name: String,

        /// Serve as an attachment
        #[arg(long)]
        download: bool,
    },

    /// Print the effective configuration, or save it to a file
    Config {
        /// Write the configuration to this file instead of stdout
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };

    // Apply environment variable overrides
    config.apply_env_overrides();

    // Initialize tracing
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.engine.log_level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(config_path) = &cli.config {
        tracing::debug!("Using config file: {:?}", config_path);
    }

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Config { output: Some(path) } => {
            config.save(&path)?;
            tracing::info!("Saved configuration to {}", path.display());
        }
        Commands::Config { output: None } => print!("{}", config.to_toml()?),
        command => run(command, cli.store.as_deref(), &config).await?,
    }

    Ok(())
}

/// Run a command that needs the engine.
async fn run(command: Commands, store: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    let store = match store {
        Some(path) => InMemoryAssetStore::load(path)?,
        None => InMemoryAssetStore::new(),
    };
    let engine = AssetEngine::from_config(config, store)?;
    let ctx = RequestContext::new();

    match command {
        Commands::Expand { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let expansion = engine.expand_traced(&text, &ctx).await?;
            if expansion.truncated {
                tracing::warn!(
                    "Pass limit reached while expanding {}, left in place: {}",
                    file.display(),
                    expansion.remaining.join(", ")
                );
            }
            tracing::info!("Expanded {} in {} passes", file.display(), expansion.scans);
            print!("{}", expansion.text);
        }
        Commands::Resolve { name, encoding } => {
            let asset = engine.resolve_asset(&name, encoding, &ctx).await?;
            println!("{}", asset.content);
        }
        Commands::Link { path } => {
            let resolved = engine.link_path(&path)?;
            println!("{}", resolved.display());
        }
        Commands::Content { name, download } => {
            let content = engine.content(&name, download, &ctx).await?;
            for (header, value) in content.headers() {
                println!("{}: {}", header, value);
            }
            println!("Content-Length: {}", content.body.len());
        }
        Commands::Config { .. } => print!("{}", config.to_toml()?),
    }

    Ok(())
}
