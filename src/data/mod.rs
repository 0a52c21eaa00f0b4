/// Data layer: core types, extraction, and display statistics.
///
/// Architecture:
/// ```text
///  report_1.csv  report_2.csv  ...
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  skip header rows, read column 10 → MeasurementRecord
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  (label, record) pairs in selection order
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  pooled or per-file value + spread per dimension
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod stats;
