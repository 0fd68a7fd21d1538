use std::{
    io,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use thiserror::Error;
use toolbench::{
    bulk::BulkOrderError, comparison::AggregateError, export::ExportError, remote::RemoteError,
    render::RenderError, session::SearchError, suppliers::SupplierError,
};

pub(crate) mod config;
pub(crate) mod logging;

mod bulk;
mod compare;
mod search;

use config::LoggingConfig;

#[derive(Debug, Parser)]
#[command(
    name = "toolbench",
    about = "Compare trade tool prices across suppliers",
    long_about = None
)]
pub(crate) struct Cli {
    /// Logging output settings.
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search supplier prices and fetch AI recommendations
    Search(search::SearchArgs),

    /// Compare a saved set of search results offline
    Compare(compare::CompareArgs),

    /// Price a bulk order with quantity discounts
    Bulk(bulk::BulkArgs),
}

/// Errors reported by a command.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// The search failed; shown with its user-facing message.
    #[error("{}", .0.user_message())]
    Search(#[from] SearchError),

    /// The HTTP client could not be built.
    #[error("failed to create search client: {0}")]
    Client(#[from] RemoteError),

    /// A results file had no valid prices.
    #[error("{0}")]
    Aggregate(#[from] AggregateError),

    /// The supplier table could not be loaded.
    #[error("{0}")]
    Suppliers(#[from] SupplierError),

    /// A bulk order change was rejected.
    #[error("{0}")]
    Bulk(#[from] BulkOrderError),

    /// An input file could not be read (path, source).
    #[error("failed to read {}: {}", .0.display(), .1)]
    Read(PathBuf, #[source] io::Error),

    /// An input file could not be parsed (path, message).
    #[error("failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, String),

    /// The comparison could not be exported.
    #[error("{0}")]
    Export(#[from] ExportError),

    /// Output could not be written.
    #[error("{0}")]
    Render(#[from] RenderError),

    /// The background insight task failed.
    #[error("insight task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Cli {
    /// Load configuration from `.env`, the environment and CLI arguments.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) async fn run(self) -> Result<(), CliError> {
        match self.command {
            Commands::Search(args) => search::run(args).await,
            Commands::Compare(args) => compare::run(&args),
            Commands::Bulk(args) => bulk::run(&args),
        }
    }
}

/// Reads a YAML (or JSON) input file.
fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| CliError::Read(path.to_path_buf(), source))?;

    serde_norway::from_str(&contents)
        .map_err(|error| CliError::Parse(path.to_path_buf(), error.to_string()))
}
