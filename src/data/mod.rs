/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RigDataset
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ RigDataset │  Vec<Record>, header order
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  cascade of selections → narrowed rows + options
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ derive / summary │  classification, scores, means, correlations
///   └──────────────────┘
/// ```

pub mod derive;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
