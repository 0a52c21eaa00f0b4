use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Plot configuration
// ---------------------------------------------------------------------------

/// Fixed error bar height used by the per-file legacy chart.
pub const LEGACY_FIXED_ERROR: f64 = 0.05;

/// Where the vertical error bar of a per-file marker comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorBars {
    /// Same constant height for every marker.
    Fixed(f64),
    /// The uncertainty the instrument reported for that file and dimension.
    Reported,
}

/// How the value and spread of each marker are computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatisticMode {
    /// Mean and standard deviation over all files together, drawn identically
    /// at every file position. Legacy behavior.
    Pooled,
    /// Each file's own value.
    PerFile { error_bars: ErrorBars },
}

impl StatisticMode {
    /// Whether the extended uncertainty block must be read from each report.
    pub fn needs_uncertainties(&self) -> bool {
        matches!(
            self,
            StatisticMode::PerFile {
                error_bars: ErrorBars::Reported
            }
        )
    }

    pub fn describe(&self) -> String {
        match self {
            StatisticMode::Pooled => "Pooled (legacy)".to_string(),
            StatisticMode::PerFile {
                error_bars: ErrorBars::Fixed(v),
            } => format!("Per file, fixed ±{v}"),
            StatisticMode::PerFile {
                error_bars: ErrorBars::Reported,
            } => "Per file, reported uncertainty".to_string(),
        }
    }
}

/// Everything that shapes a comparison chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub mode: StatisticMode,
    /// Visible y range `(min, max)` in mm; values outside are clipped.
    pub y_range: (f64, f64),
    /// Height of the dashed target line.
    pub target: f64,
    /// Height of the dashed tolerance-limit line.
    pub tolerance: f64,
    /// Figure size in inches `(width, height)`.
    pub figure_size_in: (f64, f64),
    pub dpi: u32,
    /// Output directory; relative paths resolve against the working directory.
    pub output_dir: PathBuf,
    pub file_name: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            mode: StatisticMode::Pooled,
            y_range: (0.0, 0.8),
            target: 0.0,
            tolerance: 0.6,
            figure_size_in: (12.0, 10.0),
            dpi: 300,
            output_dir: PathBuf::from("Tile_Analysis_Results"),
            file_name: "wrapped_tile_comparison.png".to_string(),
        }
    }
}

impl PlotConfig {
    /// Per-file values with the fixed ±0.05 error bar.
    pub fn legacy_per_file() -> Self {
        Self {
            mode: StatisticMode::PerFile {
                error_bars: ErrorBars::Fixed(LEGACY_FIXED_ERROR),
            },
            ..Self::default()
        }
    }

    /// Full path of the saved chart.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }

    /// Canvas size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let (w, h) = self.figure_size_in;
        let dpi = self.dpi as f64;
        ((w * dpi).round() as u32, (h * dpi).round() as u32)
    }

    /// Convert a font size in points to pixels at the configured DPI.
    pub fn pt(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }
}
