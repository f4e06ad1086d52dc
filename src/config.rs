use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::derive::ScoreFields;

/// Column mapping and defaults for the comparison dashboard.
///
/// Every field has a default matching the standard rig export, so a config
/// file only needs to name what differs:
///
/// ```json
/// { "equipment_column": "Shaker_Model", "default_metrics": ["Total_Dil", "ROP"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub operator_column: String,
    pub contractor_column: String,
    /// Free-text shaker/equipment identifier; also the third cascade stage.
    pub equipment_column: String,
    pub hole_size_column: String,
    pub well_name_column: String,
    /// Case-insensitive substring marking Derrick equipment.
    pub equipment_keyword: String,
    pub efficiency_column: String,
    pub dilution_ratio_column: String,
    pub discard_ratio_column: String,
    pub total_dilution_column: String,
    pub total_sce_column: String,
    /// Metrics compared when the caller does not pick any.
    pub default_metrics: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            operator_column: "Operator".into(),
            contractor_column: "Contractor".into(),
            equipment_column: "flowline_Shakers".into(),
            hole_size_column: "Hole_Size".into(),
            well_name_column: "Well_Name".into(),
            equipment_keyword: "derrick".into(),
            efficiency_column: "DSRE".into(),
            dilution_ratio_column: "Dilution_Ratio".into(),
            discard_ratio_column: "Discard_Ratio".into(),
            total_dilution_column: "Total_Dil".into(),
            total_sce_column: "Total_SCE".into(),
            default_metrics: vec!["Total_Dil".into(), "Total_SCE".into(), "DSRE".into()],
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded dashboard config from {}", path.display());
        Ok(config)
    }

    /// Cascade columns in dependency order.
    pub fn cascade_columns(&self) -> [&str; 4] {
        [
            &self.operator_column,
            &self.contractor_column,
            &self.equipment_column,
            &self.hole_size_column,
        ]
    }

    pub fn score_fields(&self) -> ScoreFields {
        ScoreFields {
            efficiency: self.efficiency_column.clone(),
            penalty_a: self.dilution_ratio_column.clone(),
            penalty_b: self.discard_ratio_column.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: DashboardConfig =
            serde_json::from_str(r#"{ "equipment_keyword": "mongoose" }"#).unwrap();
        assert_eq!(cfg.equipment_keyword, "mongoose");
        assert_eq!(cfg.operator_column, "Operator");
        assert_eq!(
            cfg.cascade_columns(),
            ["Operator", "Contractor", "flowline_Shakers", "Hole_Size"]
        );
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(&path, r#"{ "default_metrics": ["ROP"] }"#).unwrap();
        let cfg = DashboardConfig::load(&path).unwrap();
        assert_eq!(cfg.default_metrics, vec!["ROP".to_string()]);
        assert!(DashboardConfig::load(&dir.path().join("missing.json")).is_err());
    }
}
