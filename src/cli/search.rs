use std::{io, path::PathBuf, sync::Arc, time::Instant};

use clap::Args;
use humanize_duration::{Truncate, prelude::DurationExt};
use jiff::Timestamp;
use toolbench::{
    comparison::PriceComparison,
    export::ComparisonExport,
    remote::EdgeFunctionsClient,
    render::{write_comparison, write_insight_state, write_insights},
    session::{InsightApplied, SearchQuery, SearchSession},
};
use tracing::{info, warn};

use super::{
    CliError,
    config::{FilterArgs, RemoteConfig, SupplierConfig},
};

#[derive(Debug, Args)]
pub(crate) struct SearchArgs {
    /// Tool to search for, e.g. "18V combi drill"
    #[arg(required = true, num_args = 1..)]
    term: Vec<String>,

    /// Restrict the remote search to a category
    #[arg(long)]
    category: Option<String>,

    /// Restrict the remote search to a supplier
    #[arg(long)]
    supplier: Option<String>,

    /// Skip the AI recommendation request
    #[arg(long)]
    no_insights: bool,

    /// Write the comparison as JSON into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(flatten)]
    remote: RemoteConfig,

    #[command(flatten)]
    suppliers: SupplierConfig,
}

impl SearchArgs {
    fn query(&self) -> SearchQuery {
        let mut query = SearchQuery::new(self.term.join(" "));

        if let Some(category) = &self.category {
            query = query.with_category(category);
        }

        if let Some(supplier) = &self.supplier {
            query = query.with_supplier(supplier);
        }

        query
    }
}

pub(crate) async fn run(args: SearchArgs) -> Result<(), CliError> {
    let started = Instant::now();

    let client = EdgeFunctionsClient::new(args.remote.edge_functions())?;
    let mut session = SearchSession::new(Arc::new(client), args.suppliers.directory()?);

    let ticket = session.search(args.query()).await?;

    // Recommendations are slow; fetch them while the table is printed.
    let pending = (!args.no_insights).then(|| {
        let service = session.service();

        tokio::spawn(async move { ticket.fetch(service.as_ref()).await })
    });

    if let Some(comparison) = session.comparison() {
        write_comparison(io::stdout().lock(), comparison, &args.filter.filter())?;
    }

    if let Some(pending) = pending {
        if session.apply_insights(pending.await?) == InsightApplied::Stale {
            warn!("recommendations arrived for a superseded search");
        }

        match session.comparison().and_then(PriceComparison::insights) {
            Some(insights) => write_insights(io::stdout().lock(), insights)?,
            None => write_insight_state(io::stdout().lock(), session.insight_state())?,
        }
    }

    if let (Some(dir), Some(comparison)) = (args.export.as_deref(), session.comparison()) {
        let path = ComparisonExport::from_comparison(comparison, Timestamp::now()).write_to_dir(dir)?;

        info!(path = %path.display(), "comparison exported");
    }

    let elapsed = started.elapsed();

    info!(elapsed = %elapsed.human(Truncate::Nano), "search finished");

    Ok(())
}
