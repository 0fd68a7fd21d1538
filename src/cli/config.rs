//! CLI configuration groups

use std::{path::PathBuf, time::Duration};

use clap::Args;
use toolbench::{
    comparison::ComparisonFilter,
    remote::EdgeFunctionsConfig,
    suppliers::{SupplierDirectory, SupplierError},
};
use tracing::debug;

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, env = "RUST_LOG", default_value = "info")]
    pub(crate) log_level: String,

    /// Log format (compact, json)
    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub(crate) log_format: LogFormat,
}

/// Supabase edge function settings.
#[derive(Debug, Args)]
pub(crate) struct RemoteConfig {
    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    pub(crate) supabase_url: String,

    /// Supabase anonymous API key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub(crate) supabase_anon_key: String,

    /// Name of the price search function
    #[arg(long, env = "TOOLBENCH_SEARCH_FUNCTION", default_value = "tool-price-search")]
    pub(crate) search_function: String,

    /// Name of the AI recommendation function
    #[arg(
        long,
        env = "TOOLBENCH_ANALYSIS_FUNCTION",
        default_value = "ai-tool-recommendations"
    )]
    pub(crate) analysis_function: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "TOOLBENCH_HTTP_TIMEOUT_SECONDS", default_value_t = 30u64)]
    pub(crate) http_timeout_seconds: u64,
}

impl RemoteConfig {
    /// Client configuration for the edge functions.
    pub(crate) fn edge_functions(&self) -> EdgeFunctionsConfig {
        EdgeFunctionsConfig {
            base_url: self.supabase_url.clone(),
            anon_key: self.supabase_anon_key.clone(),
            search_function: self.search_function.clone(),
            analysis_function: self.analysis_function.clone(),
            timeout: Duration::from_secs(self.http_timeout_seconds),
        }
    }
}

/// Supplier table settings.
#[derive(Debug, Args)]
pub(crate) struct SupplierConfig {
    /// YAML file overriding supplier ratings and delivery estimates
    #[arg(long, env = "TOOLBENCH_SUPPLIERS")]
    pub(crate) suppliers: Option<PathBuf>,
}

impl SupplierConfig {
    /// The built-in supplier table, extended from the configured file if any.
    pub(crate) fn directory(&self) -> Result<SupplierDirectory, SupplierError> {
        let Some(path) = self.suppliers.as_deref() else {
            return Ok(SupplierDirectory::default());
        };

        let directory = SupplierDirectory::load(path)?;

        debug!(path = %path.display(), suppliers = directory.len(), "loaded supplier table");

        Ok(directory)
    }
}

/// Client-side refinement flags shared by the comparison commands.
#[derive(Debug, Args)]
pub(crate) struct FilterArgs {
    /// Only show tools whose name, category or brand contains this text
    #[arg(long)]
    pub(crate) text: Option<String>,

    /// Only show this brand
    #[arg(long)]
    pub(crate) brand: Option<String>,

    /// Only show this voltage, e.g. 18V
    #[arg(long)]
    pub(crate) voltage: Option<String>,

    /// Only show offers from this supplier
    #[arg(long)]
    pub(crate) only_supplier: Option<String>,

    /// Hide out-of-stock offers
    #[arg(long)]
    pub(crate) in_stock: bool,
}

impl FilterArgs {
    pub(crate) fn filter(&self) -> ComparisonFilter {
        ComparisonFilter {
            text: self.text.clone(),
            brand: self.brand.clone(),
            voltage: self.voltage.clone(),
            supplier: self.only_supplier.clone(),
            in_stock_only: self.in_stock,
        }
    }
}
