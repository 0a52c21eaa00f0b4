use std::fmt;
use std::ops::{Index, IndexMut};
use std::path::Path;

// ---------------------------------------------------------------------------
// Dimension – one of the six measured tile edges
// ---------------------------------------------------------------------------

/// A tile-edge dimension reported by the instrument.
///
/// The declaration order is the order of the rows in the report's data block
/// and the order of the subplots in the comparison figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Top,
    Bottom,
    Left,
    Right,
    Width,
    Height,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Top,
        Dimension::Bottom,
        Dimension::Left,
        Dimension::Right,
        Dimension::Width,
        Dimension::Height,
    ];

    /// Position in [`Dimension::ALL`], also the row offset of the mean value.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Lower-case key, e.g. `"top"`.
    pub fn key(self) -> &'static str {
        match self {
            Dimension::Top => "top",
            Dimension::Bottom => "bottom",
            Dimension::Left => "left",
            Dimension::Right => "right",
            Dimension::Width => "width",
            Dimension::Height => "height",
        }
    }

    /// Capitalised name used in panel titles.
    pub fn title(self) -> &'static str {
        match self {
            Dimension::Top => "Top",
            Dimension::Bottom => "Bottom",
            Dimension::Left => "Left",
            Dimension::Right => "Right",
            Dimension::Width => "Width",
            Dimension::Height => "Height",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// DimensionValues – one number per dimension
// ---------------------------------------------------------------------------

/// One `f64` per [`Dimension`]. Cells that failed numeric coercion hold `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionValues([f64; 6]);

impl DimensionValues {
    pub fn new(values: [f64; 6]) -> Self {
        Self(values)
    }

    /// All six values missing.
    pub fn missing() -> Self {
        Self([f64::NAN; 6])
    }

    pub fn get(&self, dim: Dimension) -> f64 {
        self.0[dim.ordinal()]
    }
}

impl Index<Dimension> for DimensionValues {
    type Output = f64;

    fn index(&self, dim: Dimension) -> &f64 {
        &self.0[dim.ordinal()]
    }
}

impl IndexMut<Dimension> for DimensionValues {
    fn index_mut(&mut self, dim: Dimension) -> &mut f64 {
        &mut self.0[dim.ordinal()]
    }
}

// ---------------------------------------------------------------------------
// MeasurementRecord – what one report file yields
// ---------------------------------------------------------------------------

/// The values extracted from a single report.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    /// Measured deviation per dimension.
    pub means: DimensionValues,
    /// Reported uncertainty per dimension, only when the extended block was read.
    pub uncertainties: Option<DimensionValues>,
}

// ---------------------------------------------------------------------------
// Dataset – ordered records with their labels
// ---------------------------------------------------------------------------

/// One successfully extracted report.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetEntry {
    /// File stem of the source report.
    pub label: String,
    pub record: MeasurementRecord,
}

/// Records in selection order. Labels and records are stored as pairs so
/// their counts cannot diverge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    entries: Vec<DatasetEntry>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, record: MeasurementRecord) {
        self.entries.push(DatasetEntry {
            label: label.into(),
            record,
        });
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    /// Labels in selection order.
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.label.clone()).collect()
    }

    /// Every record's value for one dimension, in selection order.
    pub fn column(&self, dim: Dimension) -> Vec<f64> {
        self.entries.iter().map(|e| e.record.means[dim]).collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Display label for a report path: the file name without its last extension.
pub fn label_for_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
