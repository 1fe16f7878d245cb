/// Data layer: core types, loading, and writing.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (trimmed headers, f64 cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │    model      │  GeometryKey, SweepSample, DesignMetrics
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  UTF-8 BOM CSV, empty cell for missing
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod writer;
