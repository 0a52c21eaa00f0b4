use palette::Srgb;

use crate::config::PlotConfig;
use crate::data::model::{Dataset, Dimension};
use crate::data::stats::display_statistics;
use crate::style::{MarkerStyle, TARGET_COLOR, TOLERANCE_COLOR};

pub const FIGURE_TITLE: &str = "Wrapped Tile Comparison";
pub const Y_AXIS_LABEL: &str = "Measured - Target [mm]";
pub const TOLERANCE_LABEL: &str = "Tolerance Limit";

/// Panel grid `(rows, columns)`; panels fill it row by row.
pub const GRID: (usize, usize) = (3, 2);

// ---------------------------------------------------------------------------
// Figure model
// ---------------------------------------------------------------------------

/// One data point of a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Index of the file in the dataset; also the x position.
    pub file_index: usize,
    pub y: f64,
    /// Half-length of the error bar; `NaN` draws none.
    pub y_err: f64,
    pub style: MarkerStyle,
}

/// A horizontal dashed reference line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub y: f64,
    pub color: Srgb<u8>,
    /// Stroke width in points.
    pub width_pt: f64,
    /// Name shown in legends; the target line has none.
    pub label: Option<&'static str>,
}

/// One subplot.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub dimension: Dimension,
    pub title: String,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LegendKey {
    Marker(MarkerStyle),
    DashedLine(Srgb<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub key: LegendKey,
}

/// Everything needed to draw the comparison chart, independent of the
/// drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonFigure {
    pub title: String,
    pub x_labels: Vec<String>,
    pub panels: Vec<Panel>,
    pub target: ReferenceLine,
    pub tolerance: ReferenceLine,
    pub y_range: (f64, f64),
    pub legend: Vec<LegendEntry>,
}

impl ComparisonFigure {
    /// Lay out the six panels for a dataset.
    ///
    /// Markers whose value is not finite are left out of their panel, the
    /// file still keeps its x position and legend entry.
    pub fn build(dataset: &Dataset, config: &PlotConfig) -> Self {
        let stats = display_statistics(dataset, &config.mode);

        let panels = Dimension::ALL
            .iter()
            .map(|&dim| Panel {
                dimension: dim,
                title: format!("{} Comparison", dim.title()),
                markers: stats
                    .iter()
                    .enumerate()
                    .filter_map(|(file_index, file_stats)| {
                        let s = file_stats[dim.ordinal()];
                        s.value.is_finite().then(|| Marker {
                            file_index,
                            y: s.value,
                            y_err: s.spread,
                            style: MarkerStyle::for_index(file_index),
                        })
                    })
                    .collect(),
            })
            .collect();

        let x_labels = dataset.labels();
        let legend = build_legend(&x_labels);

        Self {
            title: FIGURE_TITLE.to_string(),
            x_labels,
            panels,
            target: ReferenceLine {
                y: config.target,
                color: TARGET_COLOR,
                width_pt: 0.8,
                label: None,
            },
            tolerance: ReferenceLine {
                y: config.tolerance,
                color: TOLERANCE_COLOR,
                width_pt: 1.0,
                label: Some(TOLERANCE_LABEL),
            },
            y_range: config.y_range,
            legend,
        }
    }

    /// Number of files on the x axis.
    pub fn file_count(&self) -> usize {
        self.x_labels.len()
    }
}

/// One entry per distinct label in first-occurrence order, then the
/// tolerance line.
fn build_legend(labels: &[String]) -> Vec<LegendEntry> {
    let mut seen: Vec<&str> = Vec::new();
    let mut legend = Vec::new();
    for (i, label) in labels.iter().enumerate() {
        if seen.contains(&label.as_str()) {
            continue;
        }
        seen.push(label);
        legend.push(LegendEntry {
            label: label.clone(),
            key: LegendKey::Marker(MarkerStyle::for_index(i)),
        });
    }
    legend.push(LegendEntry {
        label: TOLERANCE_LABEL.to_string(),
        key: LegendKey::DashedLine(TOLERANCE_COLOR),
    });
    legend
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ErrorBars, StatisticMode};
    use crate::data::model::{DimensionValues, MeasurementRecord};
    use crate::style::MarkerShape;

    fn dataset(labels: &[&str]) -> Dataset {
        let mut ds = Dataset::new();
        for (i, label) in labels.iter().enumerate() {
            ds.push(
                *label,
                MeasurementRecord {
                    means: DimensionValues::new([0.1 * (i as f64 + 1.0); 6]),
                    uncertainties: None,
                },
            );
        }
        ds
    }

    #[test]
    fn test_one_marker_per_file_in_every_panel() {
        let ds = dataset(&["a", "b", "c", "d"]);
        let fig = ComparisonFigure::build(&ds, &PlotConfig::legacy_per_file());

        assert_eq!(fig.panels.len(), 6);
        for (panel, dim) in fig.panels.iter().zip(Dimension::ALL) {
            assert_eq!(panel.dimension, dim);
            let xs: Vec<usize> = panel.markers.iter().map(|m| m.file_index).collect();
            assert_eq!(xs, vec![0, 1, 2, 3]);
            assert_eq!(panel.markers[2].y, 0.30000000000000004);
            assert_eq!(panel.markers[2].y_err, 0.05);
        }
        assert_eq!(fig.panels[4].title, "Width Comparison");
        assert_eq!(fig.x_labels, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_pooled_markers_share_height() {
        let ds = dataset(&["a", "b"]);
        let fig = ComparisonFigure::build(&ds, &PlotConfig::default());

        let ys: Vec<f64> = fig.panels[0].markers.iter().map(|m| m.y).collect();
        assert_eq!(ys.len(), 2);
        assert_eq!(ys[0], ys[1]);
    }

    #[test]
    fn test_marker_styles_cycle_with_file_index() {
        let labels: Vec<String> = (0..8).map(|i| format!("f{i}")).collect();
        let refs: Vec<&str> = labels.iter().map(|s| s.as_str()).collect();
        let fig = ComparisonFigure::build(&dataset(&refs), &PlotConfig::legacy_per_file());

        let markers = &fig.panels[1].markers;
        assert_eq!(markers[6].style, markers[0].style);
        assert_eq!(markers[7].style, markers[1].style);
        assert_eq!(markers[3].style.shape, MarkerShape::Diamond);
    }

    #[test]
    fn test_legend_has_distinct_labels_plus_tolerance() {
        let ds = dataset(&["tile_a", "tile_b", "tile_a", "tile_c"]);
        for config in [PlotConfig::default(), PlotConfig::legacy_per_file()] {
            let fig = ComparisonFigure::build(&ds, &config);
            let labels: Vec<&str> = fig.legend.iter().map(|e| e.label.as_str()).collect();
            assert_eq!(labels, vec!["tile_a", "tile_b", "tile_c", "Tolerance Limit"]);
            assert_eq!(fig.legend[2].key, LegendKey::Marker(MarkerStyle::for_index(3)));
            assert_eq!(fig.legend[3].key, LegendKey::DashedLine(TOLERANCE_COLOR));
        }
    }

    #[test]
    fn test_missing_values_drop_only_their_marker() {
        let mut ds = dataset(&["a", "b"]);
        let mut means = DimensionValues::new([0.2; 6]);
        means[Dimension::Bottom] = f64::NAN;
        ds.push(
            "c",
            MeasurementRecord {
                means,
                uncertainties: None,
            },
        );
        let fig = ComparisonFigure::build(&ds, &PlotConfig::legacy_per_file());

        assert_eq!(fig.panels[Dimension::Top.ordinal()].markers.len(), 3);
        let bottom: Vec<usize> = fig.panels[Dimension::Bottom.ordinal()]
            .markers
            .iter()
            .map(|m| m.file_index)
            .collect();
        assert_eq!(bottom, vec![0, 1]);
        assert_eq!(fig.legend.len(), 4);
    }

    #[test]
    fn test_reported_errors_without_uncertainties_have_no_bar() {
        let ds = dataset(&["a"]);
        let config = PlotConfig {
            mode: StatisticMode::PerFile {
                error_bars: ErrorBars::Reported,
            },
            ..PlotConfig::default()
        };
        let fig = ComparisonFigure::build(&ds, &config);
        assert!(fig.panels[0].markers[0].y_err.is_nan());
    }

    #[test]
    fn test_reference_lines_and_range_follow_config() {
        let config = PlotConfig {
            y_range: (-0.2, 1.0),
            tolerance: 0.75,
            ..PlotConfig::default()
        };
        let fig = ComparisonFigure::build(&dataset(&["a"]), &config);
        assert_eq!(fig.y_range, (-0.2, 1.0));
        assert_eq!(fig.tolerance.y, 0.75);
        assert_eq!(fig.target.y, 0.0);
    }

    #[test]
    fn test_only_tolerance_line_is_named() {
        let fig = ComparisonFigure::build(&dataset(&["a", "b"]), &PlotConfig::default());
        assert_eq!(fig.target.label, None);
        assert_eq!(fig.tolerance.label, Some(TOLERANCE_LABEL));
        assert_eq!(
            fig.legend.last().map(|e| e.label.as_str()),
            fig.tolerance.label
        );
    }
}
