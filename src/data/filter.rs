use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::model::{CellValue, Record};

// ---------------------------------------------------------------------------
// Filter predicate: one selection per cascade column
// ---------------------------------------------------------------------------

/// Text of the "no restriction" choice offered first in every dropdown.
pub const ALL: &str = "All";

/// A dropdown choice: the identity filter or one concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Selection {
    #[default]
    All,
    Value(CellValue),
}

impl Selection {
    /// Parse user input. `All` is the sentinel; anything else is inferred like a
    /// loaded cell so `12.25` matches a numeric column.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == ALL {
            Selection::All
        } else {
            Selection::Value(CellValue::infer(raw))
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "{ALL}"),
            Selection::Value(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for Selection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::All => serializer.serialize_str(ALL),
            Selection::Value(v) => v.serialize(serializer),
        }
    }
}

/// One stage of the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilterStage {
    pub column: String,
    pub selection: Selection,
}

impl FilterStage {
    pub fn new(column: impl Into<String>, selection: Selection) -> Self {
        FilterStage {
            column: column.into(),
            selection,
        }
    }
}

/// Ordered filter state, applied left to right.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct FilterSpec {
    pub stages: Vec<FilterStage>,
}

impl FilterSpec {
    pub fn new(stages: Vec<FilterStage>) -> Self {
        FilterSpec { stages }
    }
}

/// Candidate values offered for one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageOptions {
    pub column: String,
    pub selection: Selection,
    /// Sorted, distinct, non-null values; `All` is implied in front.
    pub values: Vec<CellValue>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Sorted distinct non-null values of `column` among `rows`.
pub fn available_values(rows: &[&Record], column: &str) -> Vec<CellValue> {
    rows.iter()
        .map(|r| r.get(column))
        .filter(|v| !v.is_null())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Keep rows whose `column` equals the selection. `All` keeps everything;
/// null cells never match a concrete value. Row order is preserved.
pub fn apply_filter<'a>(rows: &[&'a Record], column: &str, selection: &Selection) -> Vec<&'a Record> {
    match selection {
        Selection::All => rows.to_vec(),
        Selection::Value(wanted) => rows
            .iter()
            .copied()
            .filter(|r| {
                let v = r.get(column);
                !v.is_null() && v == wanted
            })
            .collect(),
    }
}

/// Apply every stage in order, each narrowing the previous stage's output.
pub fn apply_filter_cascade<'a>(rows: &[&'a Record], spec: &FilterSpec) -> Vec<&'a Record> {
    spec.stages
        .iter()
        .fold(rows.to_vec(), |current, stage| {
            apply_filter(&current, &stage.column, &stage.selection)
        })
}

/// Fold over the cascade, recording each stage's candidates from the rows
/// narrowed by the preceding stages only. Returns the options and the fully
/// narrowed rows.
pub fn cascade_options<'a>(
    rows: &[&'a Record],
    spec: &FilterSpec,
) -> (Vec<StageOptions>, Vec<&'a Record>) {
    let mut options = Vec::with_capacity(spec.stages.len());
    let mut current = rows.to_vec();
    for stage in &spec.stages {
        let values = available_values(&current, &stage.column);
        if let Selection::Value(wanted) = &stage.selection {
            if !values.contains(wanted) {
                log::warn!(
                    "'{wanted}' is not offered for '{}'; no rows will match",
                    stage.column
                );
            }
        }
        options.push(StageOptions {
            column: stage.column.clone(),
            selection: stage.selection.clone(),
            values,
        });
        current = apply_filter(&current, &stage.column, &stage.selection);
        log::debug!("Filter '{}' = {} → {} rows", stage.column, stage.selection, current.len());
    }
    (options, current)
}
