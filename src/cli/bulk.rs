use std::{io, path::PathBuf};

use clap::Args;
use serde::Deserialize;
use toolbench::{
    bulk::BulkOrder,
    products::{Product, RawRecord},
    render::write_bulk_order,
    suppliers::SupplierDirectory,
};
use tracing::{debug, warn};

use super::{CliError, config::SupplierConfig, read_yaml};

#[derive(Debug, Args)]
pub(crate) struct BulkArgs {
    /// YAML order file with `lines` of `tool` and `quantity`
    order: PathBuf,

    #[command(flatten)]
    suppliers: SupplierConfig,
}

#[derive(Debug, Deserialize)]
struct OrderFile {
    #[serde(default)]
    lines: Vec<OrderEntry>,
}

#[derive(Debug, Deserialize)]
struct OrderEntry {
    tool: RawRecord,
    quantity: u32,
}

impl OrderFile {
    fn into_order(self, suppliers: &SupplierDirectory) -> Result<BulkOrder, CliError> {
        let mut order = BulkOrder::new();

        for entry in self.lines {
            let tool = Product::from_raw(entry.tool, suppliers);

            if !tool.has_valid_price() {
                warn!(tool = %tool.name, price = %tool.price, "skipping line without a valid price");

                continue;
            }

            order.add(tool, entry.quantity)?;
        }

        debug!(lines = order.len(), "built bulk order");

        Ok(order)
    }
}

pub(crate) fn run(args: &BulkArgs) -> Result<(), CliError> {
    let order = read_yaml::<OrderFile>(&args.order)?.into_order(&args.suppliers.directory()?)?;

    write_bulk_order(io::stdout().lock(), &order)?;

    Ok(())
}
