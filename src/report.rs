use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::PlotConfig;
use crate::data::loader::{extract_record, ExtractError, Layout};
use crate::data::model::{label_for_path, Dataset};
use crate::figure::ComparisonFigure;
use crate::render;

// ---------------------------------------------------------------------------
// Outcome / errors of one "Generate Graph" request
// ---------------------------------------------------------------------------

/// A selected report that was left out of the chart.
#[derive(Debug)]
pub struct SkippedInput {
    pub path: PathBuf,
    pub label: String,
    pub error: ExtractError,
}

#[derive(Debug)]
pub struct ReportOutcome {
    pub output_path: PathBuf,
    pub figure: ComparisonFigure,
    pub skipped: Vec<SkippedInput>,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no files selected")]
    NoInputs,

    #[error("none of the {} selected files could be read", .skipped.len())]
    NothingToPlot { skipped: Vec<SkippedInput> },

    #[error("saving chart failed: {0:#}")]
    Render(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Extract every report that can be read, in order. Unreadable reports are
/// returned separately and do not occupy an x position.
pub fn collect_dataset(paths: &[PathBuf], layout: Layout) -> (Dataset, Vec<SkippedInput>) {
    let mut dataset = Dataset::new();
    let mut skipped = Vec::new();

    for path in paths {
        let label = label_for_path(path);
        match extract_record(path, layout) {
            Ok(record) => dataset.push(label, record),
            Err(error) => {
                log::warn!("Skipping {}: {error}", path.display());
                skipped.push(SkippedInput {
                    path: path.clone(),
                    label,
                    error,
                });
            }
        }
    }
    (dataset, skipped)
}

/// Build, render and save the comparison chart for the given reports.
pub fn generate_report(paths: &[PathBuf], config: &PlotConfig) -> Result<ReportOutcome, ReportError> {
    let outcome = prepare(paths, config, &config.output_path())?;
    render::save_png(&outcome.figure, config, &outcome.output_path)?;
    log::info!(
        "Saved comparison of {} files to {} ({} skipped)",
        outcome.figure.file_count(),
        outcome.output_path.display(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

/// Everything up to rasterisation: extraction, dataset and figure layout.
pub fn prepare(
    paths: &[PathBuf],
    config: &PlotConfig,
    output_path: &Path,
) -> Result<ReportOutcome, ReportError> {
    if paths.is_empty() {
        return Err(ReportError::NoInputs);
    }

    let (dataset, skipped) = collect_dataset(paths, Layout::for_mode(&config.mode));
    if dataset.is_empty() {
        return Err(ReportError::NothingToPlot { skipped });
    }

    Ok(ReportOutcome {
        output_path: output_path.to_path_buf(),
        figure: ComparisonFigure::build(&dataset, config),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ErrorBars, StatisticMode};
    use crate::data::loader::tests::synthetic_report;
    use std::fs;
    use tempfile::tempdir;

    const MEANS: [&str; 6] = ["0.1", "0.2", "0.3", "0.4", "0.5", "0.6"];

    fn write(dir: &Path, name: &str, body: String) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let err = prepare(&[], &PlotConfig::default(), Path::new("out.png")).unwrap_err();
        assert!(matches!(err, ReportError::NoInputs));
    }

    #[test]
    fn test_malformed_file_is_skipped_and_named() {
        let dir = tempdir().unwrap();
        let paths = vec![
            write(dir.path(), "tile_1.csv", synthetic_report(&MEANS, 6, 11)),
            write(dir.path(), "tile_bad.csv", synthetic_report(&MEANS, 6, 8)),
            write(dir.path(), "tile_3.csv", synthetic_report(&MEANS, 6, 11)),
        ];
        let outcome = prepare(
            &paths,
            &PlotConfig::legacy_per_file(),
            &dir.path().join("chart.png"),
        )
        .unwrap();

        for panel in &outcome.figure.panels {
            let xs: Vec<usize> = panel.markers.iter().map(|m| m.file_index).collect();
            assert_eq!(xs, vec![0, 1]);
        }
        assert_eq!(outcome.figure.x_labels, vec!["tile_1", "tile_3"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].label, "tile_bad");
        assert!(matches!(
            outcome.skipped[0].error,
            ExtractError::TooFewColumns { found: 8, .. }
        ));
    }

    #[test]
    fn test_all_files_failing_is_an_error() {
        let dir = tempdir().unwrap();
        let paths = vec![dir.path().join("missing.csv")];
        let err = prepare(&paths, &PlotConfig::default(), Path::new("x.png")).unwrap_err();
        match err {
            ReportError::NothingToPlot { skipped } => {
                assert_eq!(skipped.len(), 1);
                assert_eq!(skipped[0].label, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_selection_order_is_kept() {
        let dir = tempdir().unwrap();
        let paths = vec![
            write(dir.path(), "zeta.csv", synthetic_report(&MEANS, 6, 11)),
            write(dir.path(), "alpha.csv", synthetic_report(&MEANS, 6, 11)),
            write(dir.path(), "mid.csv", synthetic_report(&MEANS, 6, 11)),
        ];
        let outcome = prepare(&paths, &PlotConfig::default(), Path::new("x.png")).unwrap();
        assert_eq!(outcome.figure.x_labels, vec!["zeta", "alpha", "mid"]);
        assert_eq!(outcome.figure.legend.len(), 4);
    }

    #[test]
    fn test_reported_mode_reads_uncertainty_block() {
        let dir = tempdir().unwrap();
        let values = [
            "0.1", "0.2", "0.3", "0.4", "0.5", "0.6", "0.01", "0.02", "0.03", "0.04", "0.05",
            "0.06",
        ];
        let paths = vec![
            write(dir.path(), "full.csv", synthetic_report(&values, 13, 11)),
            write(dir.path(), "short.csv", synthetic_report(&MEANS, 6, 11)),
        ];
        let config = PlotConfig {
            mode: StatisticMode::PerFile {
                error_bars: ErrorBars::Reported,
            },
            ..PlotConfig::default()
        };
        let outcome = prepare(&paths, &config, Path::new("x.png")).unwrap();

        assert_eq!(outcome.figure.panels[2].markers[0].y_err, 0.03);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(matches!(
            outcome.skipped[0].error,
            ExtractError::TooFewRows { required: 13, .. }
        ));
    }

    #[test]
    fn test_generate_twice_writes_identical_bytes() {
        let dir = tempdir().unwrap();
        let paths = vec![
            write(dir.path(), "a.csv", synthetic_report(&MEANS, 6, 11)),
            write(dir.path(), "b.csv", synthetic_report(&MEANS, 6, 11)),
        ];
        let config = PlotConfig {
            dpi: 50,
            output_dir: dir.path().join("Tile_Analysis_Results"),
            ..PlotConfig::default()
        };

        let first = generate_report(&paths, &config).unwrap();
        let bytes_1 = fs::read(&first.output_path).unwrap();
        let second = generate_report(&paths, &config).unwrap();
        let bytes_2 = fs::read(&second.output_path).unwrap();

        assert_eq!(first.output_path, config.output_path());
        assert_eq!(bytes_1, bytes_2);
    }
}
