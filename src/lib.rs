//! Drilling-rig performance comparison.
//!
//! Loads a rig export, narrows it through a cascade of dropdown selections
//! (Operator → Contractor → shaker → hole size) and derives the numbers the
//! comparison dashboard shows: equipment classification, efficiency scores,
//! per-group means, headline metrics and metric correlations.

pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod state;

pub use config::DashboardConfig;
pub use data::loader::load_file;
pub use data::model::{CellValue, Record, RigDataset};
pub use error::{Feature, FeatureError};
pub use state::{DashboardSession, DashboardView, Selections};
