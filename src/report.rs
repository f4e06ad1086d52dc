use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::data::filter::ALL;
use crate::error::Feature;
use crate::state::DashboardView;

/// How undefined aggregates are shown.
pub const NOT_AVAILABLE: &str = "N/A";

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    v.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.decimals$}"))
}

/// Format string columns as an ASCII table.
fn table(headers: &[String], rows: &[Vec<String>]) -> Result<String> {
    let schema = Arc::new(Schema::new(
        headers
            .iter()
            .map(|h| Field::new(h, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    ));
    let columns: Vec<ArrayRef> = (0..headers.len())
        .map(|c| {
            let values: Vec<&str> = rows.iter().map(|r| r[c].as_str()).collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();
    let batch = RecordBatch::try_new(schema, columns)?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}

/// Render a view as a plain-text report, showing the first `top` ranked rows.
pub fn render_text(view: &DashboardView, top: usize) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "Filters")?;
    for stage in &view.filters {
        let options: Vec<String> = std::iter::once(ALL.to_string())
            .chain(stage.values.iter().map(|v| v.to_string()))
            .collect();
        writeln!(
            out,
            "  {:<18} = {:<20} [{}]",
            stage.column,
            stage.selection.to_string(),
            options.join(", ")
        )?;
    }
    writeln!(out, "Rows: {} of {}", view.row_count(), view.total_rows)?;
    if view.row_count() == 0 {
        writeln!(out, "No data for the current selection.")?;
    }

    let km = &view.key_metrics;
    writeln!(out)?;
    writeln!(out, "Key Performance Metrics")?;
    writeln!(out, "  Avg Total Dilution: {} BBLs", fmt_opt(km.avg_total_dilution, 2))?;
    writeln!(out, "  Avg SCE:            {}", fmt_opt(km.avg_total_sce, 2))?;
    let dsre = km
        .avg_dsre_pct
        .map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.1}%"));
    writeln!(out, "  Avg DSRE:           {dsre}")?;

    writeln!(out)?;
    writeln!(out, "Equipment Summary")?;
    match &view.equipment_summary {
        Feature::Available { value } if value.is_empty() => writeln!(out, "  No data.")?,
        Feature::Available { value } => {
            let mut headers = vec!["Group".to_string(), "Rows".to_string()];
            headers.extend(view.metrics.iter().cloned());
            let rows: Vec<Vec<String>> = value
                .iter()
                .map(|g| {
                    let mut row = vec![g.group.to_string(), g.rows.to_string()];
                    row.extend(view.metrics.iter().map(|m| fmt_opt(g.mean_of(m), 2)));
                    row
                })
                .collect();
            writeln!(out, "{}", table(&headers, &rows)?)?;
        }
        Feature::Unavailable { reason } => writeln!(out, "  Skipped: {reason}")?,
    }

    writeln!(out)?;
    writeln!(out, "Efficiency Ranking (top {top})")?;
    if view.ranking.is_empty() {
        writeln!(out, "  No data.")?;
    } else {
        let headers = ["#", "Well", "Score"].map(String::from);
        let rows: Vec<Vec<String>> = view
            .ranking
            .iter()
            .take(top)
            .enumerate()
            .map(|(i, r)| vec![(i + 1).to_string(), r.label.clone(), format!("{:.2}", r.score)])
            .collect();
        writeln!(out, "{}", table(&headers, &rows)?)?;
    }

    writeln!(out)?;
    writeln!(out, "Metric Correlations")?;
    match &view.correlations {
        Feature::Available { value } => {
            let mut headers = vec![String::new()];
            headers.extend(value.columns.iter().cloned());
            let rows: Vec<Vec<String>> = value
                .columns
                .iter()
                .zip(&value.values)
                .map(|(name, row)| {
                    std::iter::once(name.clone())
                        .chain(row.iter().map(|v| fmt_opt(*v, 2)))
                        .collect()
                })
                .collect();
            writeln!(out, "{}", table(&headers, &rows)?)?;
        }
        Feature::Unavailable { reason } => writeln!(out, "  Skipped: {reason}")?,
    }

    Ok(out)
}
