use std::{io, path::PathBuf};

use clap::Args;
use jiff::Timestamp;
use serde::Deserialize;
use toolbench::{
    comparison::aggregate, export::ComparisonExport, products::RawRecord,
    remote::SearchResponse, render::write_comparison,
};
use tracing::info;

use super::{
    CliError,
    config::{FilterArgs, SupplierConfig},
    read_yaml,
};

#[derive(Debug, Args)]
pub(crate) struct CompareArgs {
    /// YAML or JSON file of raw search records, or a saved search response
    input: PathBuf,

    /// Search term to label the comparison with; defaults to the file name
    #[arg(long)]
    term: Option<String>,

    /// Write the comparison as JSON into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(flatten)]
    suppliers: SupplierConfig,
}

impl CompareArgs {
    fn term(&self) -> String {
        self.term.clone().unwrap_or_else(|| {
            self.input
                .file_stem()
                .map(|stem| stem.to_string_lossy().replace(['-', '_'], " "))
                .unwrap_or_default()
        })
    }
}

/// A results file: either a bare list of records or a saved search response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultsFile {
    Records(Vec<RawRecord>),
    Response(SearchResponse),
}

impl ResultsFile {
    fn into_records(self) -> Vec<RawRecord> {
        match self {
            Self::Records(records) => records,
            Self::Response(response) => response.tools,
        }
    }
}

pub(crate) fn run(args: &CompareArgs) -> Result<(), CliError> {
    let records = read_yaml::<ResultsFile>(&args.input)?.into_records();
    let comparison = aggregate(&args.term(), records, &args.suppliers.directory()?)?;

    write_comparison(io::stdout().lock(), &comparison, &args.filter.filter())?;

    if let Some(dir) = args.export.as_deref() {
        let path =
            ComparisonExport::from_comparison(&comparison, Timestamp::now()).write_to_dir(dir)?;

        info!(path = %path.display(), "comparison exported");
    }

    Ok(())
}
