//! # AInstein CLI (`ainstein`)
//!
//! Loads a directory of Archi `.archimate` models and answers questions
//! about them, from the command line or over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! ainstein --config ./config/ainstein.toml <command>
//! ainstein --models ./models <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ainstein models` | List loaded models and skipped files |
//! | `ainstein stats` | Element counts, actor partition, type histogram |
//! | `ainstein ask "<question>"` | Answer a question in Markdown |
//! | `ainstein element <id-or-name>` | Show one element and its relationships |
//! | `ainstein impact <id-or-name>` | Bounded traversal from an element |
//! | `ainstein serve` | Start the HTTP chat server |
//!
//! Logs go to stderr and are filtered by `RUST_LOG` (default `ainstein=info`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ainstein::assistant::Assistant;
use ainstein::config::{self, Config};
use ainstein::impact::{self, ImpactArgs};
use ainstein::{get, loader, server, sources, stats};
use ainstein_core::repository::ModelRepository;

/// AInstein: ask questions about ArchiMate architecture models.
///
/// Commands read a TOML configuration file (`--config`) or just a models
/// directory (`--models`). See `config/ainstein.example.toml`.
#[derive(Parser)]
#[command(
    name = "ainstein",
    about = "AInstein: ask questions about ArchiMate architecture models",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ainstein.toml")]
    config: PathBuf,

    /// Models directory. Overrides `[models].root`; when the config file
    /// does not exist, defaults are used for everything else.
    #[arg(long, global = true)]
    models: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List loaded models and any files that failed to parse.
    Models,

    /// Show element counts and the business actor partition.
    Stats,

    /// Answer a question about the loaded models.
    Ask {
        /// The question, e.g. "How many business actors are there?"
        query: String,

        /// Print the answer, intent and validation report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show an element by id or exact name.
    Element {
        /// Element id or name.
        key: String,
    },

    /// Show what an element affects within a number of hops.
    Impact {
        /// Element id or name.
        key: String,

        /// Maximum number of hops (defaults to `[traversal].max_depth`).
        #[arg(long)]
        depth: Option<usize>,

        /// `outgoing`, `incoming` or `both`.
        #[arg(long, default_value = "both")]
        direction: String,

        /// Only follow these relationship kinds (repeatable).
        #[arg(long = "kind")]
        kinds: Vec<String>,

        /// Print outgoing dependency paths instead of reached elements.
        #[arg(long)]
        chains: bool,
    },

    /// Start the HTTP chat server.
    Serve {
        /// Override `[server].bind`.
        #[arg(long)]
        bind: Option<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "ainstein=info,ainstein_core=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut cfg = match (&cli.models, cli.config.exists()) {
        (_, true) => config::load_config(&cli.config)?,
        (Some(models), false) => Config::with_models_root(models),
        (None, false) => anyhow::bail!(
            "config file not found: {} (pass --config or --models)",
            cli.config.display()
        ),
    };
    if let Some(models) = &cli.models {
        cfg.models.root = models.clone();
    }
    config::validate(&cfg)?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;

    let mut repo = ModelRepository::new();
    let report = loader::load_into_with(&mut repo, &cfg.models)
        .with_context(|| format!("Failed to load models from {}", cfg.models.root.display()))?;

    match cli.command {
        Commands::Models => sources::list_sources(&repo, &report)?,
        Commands::Stats => stats::run_stats(&repo, &report)?,
        Commands::Ask { query, json } => {
            let assistant = Assistant::from_config(Arc::new(repo), &cfg);
            if json {
                let response = assistant.answer(&query);
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", assistant.generate_response(&query));
            }
        }
        Commands::Element { key } => get::run_get(&repo, &key)?,
        Commands::Impact {
            key,
            depth,
            direction,
            kinds,
            chains,
        } => {
            let args = ImpactArgs {
                key: &key,
                max_depth: depth.unwrap_or(cfg.traversal.max_depth),
                direction: impact::parse_direction(&direction)?,
                kinds: &kinds,
                chains,
            };
            impact::run_impact(&repo, &args)?;
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| cfg.server.bind.clone());
            let assistant = Assistant::from_config(Arc::new(repo), &cfg);
            server::run_server(assistant, &bind).await?;
        }
    }

    Ok(())
}
