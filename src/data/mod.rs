/// Data layer: core types, loading, and the post-prediction steps.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  detect   │  column labels → name column (or none)
///   └──────────┘
///        │          predictions from crate::predict
///        ▼                 │
///   ┌──────────┐           │
///   │  merge    │ ◄────────┘  attach pred_gender / confidence_score
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  summary  │  canonical label counts for the chart
///   └──────────┘
/// ```

pub mod detect;
pub mod label;
pub mod loader;
pub mod merge;
pub mod model;
pub mod summary;
