use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use serde::Serialize;

use crate::config::DashboardConfig;
use crate::data::derive::{classify_equipment, rank_by_score, score_rows, EquipmentClass, ScoredRow};
use crate::data::filter::{cascade_options, FilterSpec, FilterStage, Selection, StageOptions};
use crate::data::model::{CellValue, Record, RigDataset};
use crate::data::summary::{
    correlation_matrix, group_summary, key_metrics, require_column, CorrelationMatrix,
    GroupSummary, KeyMetrics,
};
use crate::error::Feature;

// ---------------------------------------------------------------------------
// User selections
// ---------------------------------------------------------------------------

/// The four dropdown values, in cascade order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Selections {
    pub operator: Selection,
    pub contractor: Selection,
    pub equipment: Selection,
    pub hole_size: Selection,
}

impl Selections {
    /// Pair each selection with its configured column.
    pub fn to_filter_spec(&self, config: &DashboardConfig) -> FilterSpec {
        let [op, con, eq, hole] = config.cascade_columns();
        FilterSpec::new(vec![
            FilterStage::new(op, self.operator.clone()),
            FilterStage::new(con, self.contractor.clone()),
            FilterStage::new(eq, self.equipment.clone()),
            FilterStage::new(hole, self.hole_size.clone()),
        ])
    }
}

// ---------------------------------------------------------------------------
// One recomputed view
// ---------------------------------------------------------------------------

/// Everything the presentation layer consumes for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub total_rows: usize,
    /// Per-stage candidate values.
    pub filters: Vec<StageOptions>,
    /// Positions of the surviving rows, in file order.
    pub row_indices: Vec<usize>,
    pub metrics: Vec<String>,
    /// Classification aligned with `row_indices`.
    pub equipment: Feature<Vec<EquipmentClass>>,
    /// Scores aligned with `row_indices`.
    pub scores: Vec<f64>,
    pub ranking: Vec<ScoredRow>,
    pub key_metrics: KeyMetrics,
    pub equipment_summary: Feature<Vec<GroupSummary>>,
    pub correlations: Feature<CorrelationMatrix>,
}

impl DashboardView {
    /// Run one full pass: cascade, derived columns, aggregates, ranking.
    pub fn compute(
        dataset: &RigDataset,
        config: &DashboardConfig,
        spec: &FilterSpec,
        metrics: &[String],
    ) -> Self {
        let (filters, rows) = cascade_options(&dataset.rows(), spec);

        let equipment_col = &config.equipment_column;
        let keyword = &config.equipment_keyword;
        let classify = |r: &Record| classify_equipment(r, equipment_col, keyword);

        let equipment: Feature<Vec<EquipmentClass>> = require_column(dataset, equipment_col)
            .map(|()| rows.iter().map(|r| classify(r)).collect())
            .into();
        let equipment_summary: Feature<Vec<GroupSummary>> = require_column(dataset, equipment_col)
            .map(|()| group_summary(&rows, |r| CellValue::from(classify(r)), metrics))
            .into();

        let scored = score_rows(&rows, &config.score_fields(), &config.well_name_column);
        let scores = scored.iter().map(|s| s.score).collect();

        DashboardView {
            total_rows: dataset.len(),
            filters,
            row_indices: rows.iter().map(|r| r.index).collect(),
            metrics: metrics.to_vec(),
            equipment,
            scores,
            ranking: rank_by_score(scored),
            key_metrics: key_metrics(
                &rows,
                &config.total_dilution_column,
                &config.total_sce_column,
                &config.efficiency_column,
            ),
            equipment_summary,
            correlations: correlation_matrix(dataset, &rows, metrics).into(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_indices.len()
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

type ViewKey = (FilterSpec, Vec<String>);

/// Views kept per session before the least recently used one is dropped.
pub const DEFAULT_CACHE_VIEWS: usize = 32;

/// Loaded dataset plus memoized views, keyed on the full filter state and
/// metric choice.
pub struct DashboardSession {
    dataset: Arc<RigDataset>,
    config: DashboardConfig,
    cache: LruCache<ViewKey, Arc<DashboardView>>,
}

impl DashboardSession {
    pub fn new(dataset: RigDataset, config: DashboardConfig) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CACHE_VIEWS).unwrap_or(NonZeroUsize::MIN);
        Self::with_cache_capacity(dataset, config, capacity)
    }

    /// Session that keeps at most `capacity` views.
    pub fn with_cache_capacity(
        dataset: RigDataset,
        config: DashboardConfig,
        capacity: NonZeroUsize,
    ) -> Self {
        log::info!("Session started with {} rows", dataset.len());
        DashboardSession {
            dataset: Arc::new(dataset),
            config,
            cache: LruCache::new(capacity),
        }
    }

    pub fn dataset(&self) -> &RigDataset {
        &self.dataset
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Replace the dataset (a new upload). Cached views are dropped.
    pub fn set_dataset(&mut self, dataset: RigDataset) {
        log::info!("Dataset replaced: {} rows", dataset.len());
        self.dataset = Arc::new(dataset);
        self.cache.clear();
    }

    /// The view for these selections. An empty `metrics` falls back to the
    /// configured defaults.
    pub fn view(&mut self, selections: &Selections, metrics: &[String]) -> Arc<DashboardView> {
        let metrics = if metrics.is_empty() {
            self.config.default_metrics.clone()
        } else {
            metrics.to_vec()
        };
        let key = (selections.to_filter_spec(&self.config), metrics);

        if let Some(view) = self.cache.get(&key) {
            log::debug!("View cache hit");
            return Arc::clone(view);
        }

        let view = Arc::new(DashboardView::compute(&self.dataset, &self.config, &key.0, &key.1));
        if let Some((_, evicted)) = self.cache.push(key, Arc::clone(&view)) {
            log::debug!("View cache full, dropped view of {} rows", evicted.row_count());
        }
        view
    }

    pub fn cached_views(&self) -> usize {
        self.cache.len()
    }
}
