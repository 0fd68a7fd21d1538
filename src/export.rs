//! Export
//!
//! The JSON document a comparison is saved as, and the name of the file it is
//! saved under.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use jiff::{Timestamp, tz::TimeZone};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::{
    comparison::PriceComparison,
    pricing::{format_price, percent_points},
    products::StockStatus,
};

/// Errors raised while writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The document could not be serialised.
    #[error("failed to serialise export: {0}")]
    Json(#[from] serde_json::Error),

    /// The file could not be written.
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),
}

/// One tool row in an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedTool {
    /// Product title.
    pub name: String,

    /// Supplier name.
    pub supplier: String,

    /// Price formatted as GBP.
    pub price: String,

    /// Derived voltage, or empty.
    pub voltage: String,

    /// Derived brand, or empty.
    pub brand: String,

    /// Stock availability.
    pub stock_status: StockStatus,

    /// Saving against the most expensive offer, formatted as GBP.
    pub savings: String,
}

/// Summary statistics in an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    /// Number of tools compared.
    pub total_results: usize,

    /// Lowest price.
    #[serde(with = "rust_decimal::serde::float")]
    pub cheapest_price: Decimal,

    /// Mean price.
    #[serde(with = "rust_decimal::serde::float")]
    pub average_price: Decimal,

    /// Highest price.
    #[serde(with = "rust_decimal::serde::float")]
    pub highest_price: Decimal,

    /// `"£a - £b"`.
    pub price_range: String,

    /// Highest minus lowest price.
    #[serde(with = "rust_decimal::serde::float")]
    pub potential_savings: Decimal,

    /// Potential savings as a percentage of the highest price.
    #[serde(with = "rust_decimal::serde::float")]
    pub savings_percent: Decimal,

    /// Number of distinct suppliers.
    pub suppliers: usize,
}

/// A comparison as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonExport {
    /// Search term the comparison was built for.
    pub search_term: String,

    /// Tools in comparison order.
    pub tools: Vec<ExportedTool>,

    /// Summary statistics.
    pub summary: ExportSummary,

    /// When the export was made.
    pub export_date: Timestamp,
}

impl ComparisonExport {
    /// Builds the export document for `comparison`.
    pub fn from_comparison(comparison: &PriceComparison, export_date: Timestamp) -> Self {
        let tools = comparison
            .tools()
            .iter()
            .map(|tool| ExportedTool {
                name: tool.name.clone(),
                supplier: tool.supplier.clone(),
                price: format_price(tool.numeric_price),
                voltage: tool.voltage.clone(),
                brand: tool.brand.clone(),
                stock_status: tool.stock_status,
                savings: format_price(comparison.savings_for(tool)),
            })
            .collect();

        Self {
            search_term: comparison.search_term().to_string(),
            tools,
            summary: ExportSummary {
                total_results: comparison.len(),
                cheapest_price: comparison.cheapest_price(),
                average_price: comparison.average_price(),
                highest_price: comparison.highest_price(),
                price_range: comparison.price_range(),
                potential_savings: comparison.potential_savings(),
                savings_percent: percent_points(comparison.savings_percent()),
                suppliers: comparison.supplier_count(),
            },
            export_date,
        }
    }

    /// File name: `tool-price-comparison-<slug>-<YYYY-MM-DD>.json`, dated in UTC.
    pub fn file_name(&self) -> String {
        let date = self.export_date.to_zoned(TimeZone::UTC).date();

        format!(
            "tool-price-comparison-{}-{date}.json",
            slugify(&self.search_term)
        )
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Json`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the export into `dir` under [`ComparisonExport::file_name`].
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] if serialisation or the write fails.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let path = dir.as_ref().join(self.file_name());

        fs::write(&path, self.to_json()?)?;

        info!(path = %path.display(), tools = self.tools.len(), "exported comparison");

        Ok(path)
    }
}

/// Lowercase ASCII slug with runs of other characters collapsed to `-`.
fn slugify(term: &str) -> String {
    let slug = term
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "search".to_string()
    } else {
        slug
    }
}
