/// Data layer: core types, loading, and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → rows → SampleTable (schema check)
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ SampleTable  │  Vec<SampleRecord>, column list
///   └─────────────┘
///        │
///        ├──────────────► histogram  → ConditionCounts
///        │
///        ▼
///   ┌──────────┐
///   │ summary   │  totals, distinct conditions / batches
///   └──────────┘
/// ```

pub mod histogram;
pub mod loader;
pub mod model;
pub mod summary;
