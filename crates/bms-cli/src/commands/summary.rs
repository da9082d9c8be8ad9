//! Summary command - fault statistics for an exported fault list

use std::path::Path;

use anyhow::{Context, Result};
use bms_core::{AggregateSummary, FaultRecord, TimeWindow};
use chrono::{DateTime, Utc};

use crate::output::{CountRow, DescriptionRow, OutputContext, OutputFormat};

/// Load a JSON array of fault records
pub fn load_faults(path: &Path) -> Result<Vec<FaultRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fault file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse fault file: {}", path.display()))
}

/// Keep the faults detected within `window` before `now`
pub fn within_window(faults: Vec<FaultRecord>, window: TimeWindow, now: DateTime<Utc>) -> Vec<FaultRecord> {
    let cutoff = window.cutoff(now);
    faults.into_iter().filter(|f| f.time >= cutoff).collect()
}

/// Print statistics for the faults in a file
pub fn summary(path: &Path, range: &str, all: bool, ctx: &OutputContext) -> Result<()> {
    let faults = load_faults(path)?;
    let loaded = faults.len();

    let (faults, scope) = if all {
        (faults, "all records".to_string())
    } else {
        let window: TimeWindow = range.parse().map_err(anyhow::Error::msg)?;
        (within_window(faults, window, Utc::now()), window.description().to_string())
    };
    tracing::debug!(loaded, selected = faults.len(), %scope, "Computing summary");

    let summary = AggregateSummary::compute(&faults);

    if ctx.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    ctx.print_kv(&[
        ("Range", scope),
        ("Total", summary.total.to_string()),
        ("Active", summary.active.to_string()),
        ("Resolution rate", format!("{}%", summary.resolution_rate)),
    ]);

    if ctx.format == OutputFormat::Csv {
        return Ok(());
    }

    let counts = |list: &[bms_core::NamedCount]| -> Vec<CountRow> {
        list.iter()
            .map(|c| CountRow {
                name: c.name.clone(),
                count: c.value,
            })
            .collect()
    };

    ctx.heading("By device type");
    ctx.print(&counts(&summary.by_device_type));
    ctx.heading("By severity");
    ctx.print(&counts(&summary.by_severity));
    ctx.heading("Top locations");
    ctx.print(&counts(&summary.top_locations));
    ctx.heading("Top fault types");
    let descriptions: Vec<DescriptionRow> = summary
        .top_fault_types
        .iter()
        .map(|d| DescriptionRow {
            fault: d.fault_type.clone(),
            count: d.count,
        })
        .collect();
    ctx.print(&descriptions);

    Ok(())
}
