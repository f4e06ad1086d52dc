//! Aggregates over the narrowed rows: group means, headline metrics and the
//! metric correlation matrix. Means here skip nulls instead of counting them
//! as zero, unlike the efficiency score.

use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{CellValue, Record, RigDataset};
use crate::error::FeatureError;

/// Round to two decimal places, halves to even like `DataFrame.round`.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// Arithmetic mean of the numeric cells of `column`; `None` when there are none.
pub fn mean(rows: &[&Record], column: &str) -> Option<f64> {
    let (sum, n) = rows
        .iter()
        .filter_map(|r| r.number(column))
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

// ---------------------------------------------------------------------------
// Availability checks
// ---------------------------------------------------------------------------

/// The column must exist in the dataset.
pub fn require_column(dataset: &RigDataset, column: &str) -> Result<(), FeatureError> {
    if dataset.has_column(column) {
        Ok(())
    } else {
        Err(FeatureError::MissingColumn(column.to_string()))
    }
}

/// The column must exist and hold at least one numeric value among `rows`.
pub fn require_numeric(
    dataset: &RigDataset,
    rows: &[&Record],
    column: &str,
) -> Result<(), FeatureError> {
    require_column(dataset, column)?;
    if rows.iter().any(|r| r.number(column).is_some()) {
        Ok(())
    } else {
        Err(FeatureError::NoNumericData(column.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Group summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricMean {
    pub column: String,
    /// `None` when the group has no numeric value for this column.
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: CellValue,
    pub rows: usize,
    pub means: Vec<MetricMean>,
}

impl GroupSummary {
    pub fn mean_of(&self, column: &str) -> Option<f64> {
        self.means
            .iter()
            .find(|m| m.column == column)
            .and_then(|m| m.mean)
    }
}

/// Mean of each metric per distinct group key, rounded to 2 decimals.
/// Groups are sorted by key; rows whose key is null are left out.
pub fn group_summary<F>(rows: &[&Record], group_of: F, metrics: &[String]) -> Vec<GroupSummary>
where
    F: Fn(&Record) -> CellValue,
{
    let mut groups: BTreeMap<CellValue, Vec<&Record>> = BTreeMap::new();
    for &r in rows {
        let key = group_of(r);
        if !key.is_null() {
            groups.entry(key).or_default().push(r);
        }
    }

    groups
        .into_iter()
        .map(|(group, members)| GroupSummary {
            rows: members.len(),
            means: metrics
                .iter()
                .map(|m| MetricMean {
                    column: m.clone(),
                    mean: mean(&members, m).map(round2),
                })
                .collect(),
            group,
        })
        .collect()
}

/// [`group_summary`] keyed by an existing column.
pub fn group_summary_by_column(
    rows: &[&Record],
    group_column: &str,
    metrics: &[String],
) -> Vec<GroupSummary> {
    group_summary(rows, |r| r.get(group_column).clone(), metrics)
}

// ---------------------------------------------------------------------------
// Key metrics
// ---------------------------------------------------------------------------

/// Headline numbers for the current selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub rows: usize,
    /// Mean total dilution, BBLs.
    pub avg_total_dilution: Option<f64>,
    pub avg_total_sce: Option<f64>,
    /// Mean DSRE expressed as a percentage.
    pub avg_dsre_pct: Option<f64>,
}

pub fn key_metrics(rows: &[&Record], dilution: &str, sce: &str, dsre: &str) -> KeyMetrics {
    KeyMetrics {
        rows: rows.len(),
        avg_total_dilution: mean(rows, dilution),
        avg_total_sce: mean(rows, sce),
        avg_dsre_pct: mean(rows, dsre).map(|v| v * 100.0),
    }
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `None` where the pair has <2 complete observations or no variance.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Pairwise-complete Pearson correlation between metric columns.
pub fn correlation_matrix(
    dataset: &RigDataset,
    rows: &[&Record],
    metrics: &[String],
) -> Result<CorrelationMatrix, FeatureError> {
    if metrics.len() < 2 {
        return Err(FeatureError::InsufficientColumns {
            needed: 2,
            got: metrics.len(),
        });
    }
    for m in metrics {
        require_numeric(dataset, rows, m)?;
    }

    let values = metrics
        .iter()
        .map(|a| {
            metrics
                .iter()
                .map(|b| {
                    let (xs, ys): (Vec<f64>, Vec<f64>) = rows
                        .iter()
                        .filter_map(|r| Some((r.number(a)?, r.number(b)?)))
                        .unzip();
                    pearson(&xs, &ys).map(round2)
                })
                .collect()
        })
        .collect();

    Ok(CorrelationMatrix {
        columns: metrics.to_vec(),
        values,
    })
}

/// r = Σ[(xi - x̄)(yi - ȳ)] / sqrt(Σ(xi - x̄)² × Σ(yi - ȳ)²)
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denominator = (sxx * syy).sqrt();
    if denominator == 0.0 {
        None
    } else {
        Some((sxy / denominator).clamp(-1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::{classify_equipment, EquipmentClass};

    fn dataset(rows: &[(&str, Option<f64>, Option<f64>)]) -> RigDataset {
        let cols = vec!["flowline_Shakers".to_string(), "Total_Dil".into(), "DSRE".into()];
        let rows = rows
            .iter()
            .map(|(shaker, dil, dsre)| {
                let mut m = BTreeMap::new();
                m.insert("flowline_Shakers".to_string(), CellValue::infer(shaker));
                m.insert("Total_Dil".to_string(), dil.map_or(CellValue::Null, CellValue::Float));
                m.insert("DSRE".to_string(), dsre.map_or(CellValue::Null, CellValue::Float));
                m
            })
            .collect();
        RigDataset::from_rows(cols, rows)
    }

    fn by_equipment(r: &Record) -> CellValue {
        classify_equipment(r, "flowline_Shakers", "derrick").into()
    }

    fn metrics(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn round2_halves_go_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
        assert_eq!(round2(1.5), 1.5);
    }

    #[test]
    fn group_means_per_class() {
        let ds = dataset(&[
            ("Derrick 500", Some(10.0), None),
            ("Brandt", Some(5.0), None),
            ("derrick hyperpool", Some(20.0), None),
        ]);
        let summary = group_summary(&ds.rows(), by_equipment, &metrics(&["Total_Dil"]));
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].group, EquipmentClass::Derrick.into());
        assert_eq!(summary[0].mean_of("Total_Dil"), Some(15.0));
        assert_eq!(summary[1].group, CellValue::String("Non-Derrick".into()));
        assert_eq!(summary[1].mean_of("Total_Dil"), Some(5.0));
    }

    #[test]
    fn group_means_skip_nulls_and_round() {
        let ds = dataset(&[
            ("Derrick", Some(1.0), None),
            ("Derrick", None, None),
            ("Derrick", Some(2.0), None),
            ("Derrick", Some(2.0), None),
        ]);
        let summary = group_summary(&ds.rows(), by_equipment, &metrics(&["Total_Dil", "DSRE"]));
        assert_eq!(summary[0].rows, 4);
        assert_eq!(summary[0].mean_of("Total_Dil"), Some(1.67));
        assert_eq!(summary[0].mean_of("DSRE"), None);
    }

    #[test]
    fn empty_rows_give_empty_summary_and_undefined_metrics() {
        let km = key_metrics(&[], "Total_Dil", "Total_SCE", "DSRE");
        assert_eq!(km.rows, 0);
        assert_eq!(km.avg_total_dilution, None);
        assert_eq!(km.avg_dsre_pct, None);
        assert!(group_summary(&[], by_equipment, &metrics(&["Total_Dil"])).is_empty());
    }

    #[test]
    fn group_by_column_drops_null_keys() {
        let ds = dataset(&[("A", Some(1.0), None), ("", Some(3.0), None), ("A", Some(2.0), None)]);
        let summary = group_summary_by_column(&ds.rows(), "flowline_Shakers", &metrics(&["Total_Dil"]));
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].mean_of("Total_Dil"), Some(1.5));
    }

    #[test]
    fn dsre_reported_as_percent() {
        let ds = dataset(&[("A", None, Some(0.9)), ("B", None, Some(0.8))]);
        let km = key_metrics(&ds.rows(), "Total_Dil", "Total_SCE", "DSRE");
        assert!((km.avg_dsre_pct.unwrap() - 85.0).abs() < 1e-9);
        assert_eq!(km.avg_total_sce, None);
    }

    #[test]
    fn correlation_of_linear_columns() {
        let ds = dataset(&[
            ("A", Some(1.0), Some(0.1)),
            ("A", Some(2.0), Some(0.2)),
            ("A", Some(3.0), None),
            ("A", Some(4.0), Some(0.4)),
        ]);
        let m = correlation_matrix(&ds, &ds.rows(), &metrics(&["Total_Dil", "DSRE"])).unwrap();
        assert_eq!(m.get("Total_Dil", "DSRE"), Some(1.0));
        assert_eq!(m.get("DSRE", "DSRE"), Some(1.0));
    }

    #[test]
    fn correlation_errors_are_scoped() {
        let ds = dataset(&[("A", Some(1.0), None), ("B", Some(2.0), None)]);
        let rows = ds.rows();
        assert_eq!(
            correlation_matrix(&ds, &rows, &metrics(&["Total_Dil"])),
            Err(FeatureError::InsufficientColumns { needed: 2, got: 1 })
        );
        assert_eq!(
            correlation_matrix(&ds, &rows, &metrics(&["Total_Dil", "DSRE"])),
            Err(FeatureError::NoNumericData("DSRE".into()))
        );
        assert_eq!(
            correlation_matrix(&ds, &rows, &metrics(&["Total_Dil", "ROP"])),
            Err(FeatureError::MissingColumn("ROP".into()))
        );
    }

    #[test]
    fn constant_column_has_undefined_correlation() {
        let ds = dataset(&[("A", Some(1.0), Some(0.5)), ("A", Some(2.0), Some(0.5))]);
        let m = correlation_matrix(&ds, &ds.rows(), &metrics(&["Total_Dil", "DSRE"])).unwrap();
        assert_eq!(m.get("Total_Dil", "DSRE"), None);
    }
}
