use std::fmt;

use serde::Serialize;

use super::model::{CellValue, Record};

// ---------------------------------------------------------------------------
// Equipment classification
// ---------------------------------------------------------------------------

/// Binary shaker category derived from the free-text equipment field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EquipmentClass {
    Derrick,
    #[serde(rename = "Non-Derrick")]
    NonDerrick,
}

impl EquipmentClass {
    pub fn label(self) -> &'static str {
        match self {
            EquipmentClass::Derrick => "Derrick",
            EquipmentClass::NonDerrick => "Non-Derrick",
        }
    }
}

impl fmt::Display for EquipmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<EquipmentClass> for CellValue {
    fn from(class: EquipmentClass) -> Self {
        CellValue::String(class.label().to_string())
    }
}

/// Classify one row by case-insensitive `keyword` match in `column`.
/// Null, missing and non-string cells are `NonDerrick`.
pub fn classify_equipment(row: &Record, column: &str, keyword: &str) -> EquipmentClass {
    match row.get(column).as_str() {
        Some(s) if s.to_lowercase().contains(&keyword.to_lowercase()) => EquipmentClass::Derrick,
        _ => EquipmentClass::NonDerrick,
    }
}

// ---------------------------------------------------------------------------
// Efficiency score
// ---------------------------------------------------------------------------

/// Columns feeding the efficiency score.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScoreFields {
    /// Fractional efficiency ratio (DSRE), 0–1.
    pub efficiency: String,
    pub penalty_a: String,
    pub penalty_b: String,
}

/// `efficiency*100 - penalty_a*10 - penalty_b*10`; a missing input contributes 0.
pub fn efficiency_score(row: &Record, fields: &ScoreFields) -> f64 {
    let term = |column: &str| row.number(column).unwrap_or(0.0);
    term(&fields.efficiency) * 100.0 - term(&fields.penalty_a) * 10.0 - term(&fields.penalty_b) * 10.0
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// A row with its computed score, ready for ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRow {
    /// Row position in the loaded file.
    pub index: usize,
    pub label: String,
    pub score: f64,
}

/// Score every row. The label is `label_column` when it holds a value,
/// otherwise `row <n>`.
pub fn score_rows(rows: &[&Record], fields: &ScoreFields, label_column: &str) -> Vec<ScoredRow> {
    rows.iter()
        .map(|r| {
            let label = match r.get(label_column) {
                CellValue::Null => format!("row {}", r.index),
                v => v.to_string(),
            };
            ScoredRow {
                index: r.index,
                label,
                score: efficiency_score(r, fields),
            }
        })
        .collect()
}

/// Sort by score descending. Ties keep their input order.
pub fn rank_by_score(mut rows: Vec<ScoredRow>) -> Vec<ScoredRow> {
    rows.sort_by(|a, b| b.score.total_cmp(&a.score));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(index: usize, cells: &[(&str, CellValue)]) -> Record {
        let cells: BTreeMap<String, CellValue> =
            cells.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        Record::new(index, cells)
    }

    fn fields() -> ScoreFields {
        ScoreFields {
            efficiency: "DSRE".into(),
            penalty_a: "Dilution_Ratio".into(),
            penalty_b: "Discard_Ratio".into(),
        }
    }

    #[test]
    fn classify_keyword_case_insensitive() {
        let r = row(0, &[("flowline_Shakers", CellValue::String("Derrick Shaker 500".into()))]);
        assert_eq!(classify_equipment(&r, "flowline_Shakers", "derrick"), EquipmentClass::Derrick);
        let r = row(0, &[("flowline_Shakers", CellValue::String("MONGOOSE by DERRICK".into()))]);
        assert_eq!(classify_equipment(&r, "flowline_Shakers", "derrick"), EquipmentClass::Derrick);
    }

    #[test]
    fn classify_defaults_to_non_derrick() {
        let brand = row(0, &[("flowline_Shakers", CellValue::String("Brand X".into()))]);
        let null = row(1, &[("flowline_Shakers", CellValue::Null)]);
        let number = row(2, &[("flowline_Shakers", CellValue::Integer(500))]);
        let missing = row(3, &[]);
        for r in [&brand, &null, &number, &missing] {
            assert_eq!(
                classify_equipment(r, "flowline_Shakers", "derrick"),
                EquipmentClass::NonDerrick
            );
        }
    }

    #[test]
    fn score_treats_missing_as_zero() {
        let r = row(
            0,
            &[
                ("DSRE", CellValue::Float(0.95)),
                ("Dilution_Ratio", CellValue::Float(0.1)),
                ("Discard_Ratio", CellValue::Null),
            ],
        );
        assert!((efficiency_score(&r, &fields()) - 94.0).abs() < 1e-9);
        assert_eq!(efficiency_score(&row(1, &[]), &fields()), 0.0);
    }

    #[test]
    fn rank_is_stable_descending() {
        let scored = vec![
            ScoredRow { index: 0, label: "A".into(), score: 50.0 },
            ScoredRow { index: 1, label: "B".into(), score: 90.0 },
            ScoredRow { index: 2, label: "C".into(), score: 50.0 },
            ScoredRow { index: 3, label: "D".into(), score: 50.0 },
        ];
        let ranked: Vec<usize> = rank_by_score(scored).iter().map(|r| r.index).collect();
        assert_eq!(ranked, vec![1, 0, 2, 3]);
    }

    #[test]
    fn score_is_finite_for_nan_spelled_inputs() {
        let r = row(
            0,
            &[
                ("DSRE", CellValue::infer("-nan")),
                ("Dilution_Ratio", CellValue::infer("0.1")),
                ("Discard_Ratio", CellValue::infer("NAN")),
            ],
        );
        let score = efficiency_score(&r, &fields());
        assert!(score.is_finite());
        assert!((score - -1.0).abs() < 1e-9);
    }

    #[test]
    fn computed_ties_keep_file_order() {
        let cells = |dsre: &str, dil: &str, well: &str| {
            vec![
                ("DSRE", CellValue::infer(dsre)),
                ("Dilution_Ratio", CellValue::infer(dil)),
                ("Well_Name", CellValue::infer(well)),
            ]
        };
        // 0.875*100 - 1.25*10 == 0.75*100 == 75
        let rows = [
            row(0, &cells("0.75", "", "W-1")),
            row(1, &cells("0.95", "", "W-2")),
            row(2, &cells("0.875", "1.25", "W-3")),
            row(3, &cells("0.75", "", "W-4")),
        ];
        let refs: Vec<&Record> = rows.iter().collect();
        let scored = score_rows(&refs, &fields(), "Well_Name");
        assert_eq!(scored[0].score, scored[2].score);
        assert_eq!(scored[0].score, scored[3].score);
        let ranked: Vec<String> = rank_by_score(scored).into_iter().map(|r| r.label).collect();
        assert_eq!(ranked, vec!["W-2", "W-1", "W-3", "W-4"]);
    }

    #[test]
    fn labels_fall_back_to_row_number() {
        let a = row(4, &[("Well_Name", CellValue::String("W-7".into()))]);
        let b = row(5, &[]);
        let scored = score_rows(&[&a, &b], &fields(), "Well_Name");
        assert_eq!(scored[0].label, "W-7");
        assert_eq!(scored[1].label, "row 5");
    }
}
