//! Output formatting for CLI commands.
//!
//! Everything written here goes to stdout; logs go to stderr. In JSON mode a
//! product list is always a bare JSON array of ids, so callers can parse the
//! output without knowing whether the run was personalized.

use std::io::{self, Write};

use serde::Serialize;

use crate::cli::args::{OutputFormat, VitrineArgs};
use crate::data::ProductCatalog;
use crate::engine::EngineStats;
use crate::error::Result;

/// Print a list of product ids.
///
/// In human mode, names from the catalog are shown next to the ids when
/// available.
pub fn output_products(
    products: &[String],
    catalog: Option<&ProductCatalog>,
    args: &VitrineArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(products, args),
        OutputFormat::Human => {
            let mut out = io::stdout().lock();
            if products.is_empty() {
                writeln!(out, "No products to recommend.")?;
            }
            for (rank, id) in products.iter().enumerate() {
                match catalog.and_then(|c| c.get(id)).filter(|p| !p.name.is_empty()) {
                    Some(product) => writeln!(out, "{:>3}. {id} ({})", rank + 1, product.name)?,
                    None => writeln!(out, "{:>3}. {id}", rank + 1)?,
                }
            }
            Ok(())
        }
    }
}

/// Print engine statistics.
pub fn output_stats(stats: &EngineStats, args: &VitrineArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(stats, args),
        OutputFormat::Human => {
            let mut out = io::stdout().lock();
            writeln!(out, "Interactions:     {}", stats.interactions)?;
            writeln!(out, "Users:            {}", stats.users)?;
            writeln!(out, "Products:         {}", stats.products)?;
            writeln!(out, "Catalog products: {}", stats.catalog_products)?;
            writeln!(out, "Trained:          {}", stats.trained)?;
            if let Some(k) = stats.n_neighbors {
                writeln!(out, "Neighbors:        {k}")?;
            }
            if let (Some(metric), Some(structure)) = (stats.metric, stats.structure) {
                writeln!(out, "Index:            {structure} ({metric})")?;
            }
            Ok(())
        }
    }
}

/// Print the empty list emitted on failure.
///
/// This is always JSON regardless of the selected format.
pub fn output_empty_list() {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "[]");
    let _ = out.flush();
}

fn output_json<T: Serialize + ?Sized>(value: &T, args: &VitrineArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let mut out = io::stdout().lock();
    writeln!(out, "{json}")?;
    out.flush()?;
    Ok(())
}
