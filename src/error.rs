use serde::Serialize;
use thiserror::Error;

/// A failure scoped to one dashboard feature. Never aborts the others.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("column '{0}' is not present in the dataset")]
    MissingColumn(String),

    #[error("column '{0}' has no numeric values in the current selection")]
    NoNumericData(String),

    #[error("need at least {needed} numeric columns, got {got}")]
    InsufficientColumns { needed: usize, got: usize },
}

/// Outcome of a feature after its availability check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Feature<T> {
    Available { value: T },
    Unavailable { reason: String },
}

impl<T> Feature<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Feature::Available { value } => Some(value),
            Feature::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Feature::Available { .. })
    }
}

impl<T> From<Result<T, FeatureError>> for Feature<T> {
    fn from(result: Result<T, FeatureError>) -> Self {
        match result {
            Ok(value) => Feature::Available { value },
            Err(e) => {
                log::warn!("Feature unavailable: {e}");
                Feature::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}
