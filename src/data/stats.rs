use super::model::{Dataset, Dimension};
use crate::config::{ErrorBars, StatisticMode};

// ---------------------------------------------------------------------------
// Display statistics: what each marker shows
// ---------------------------------------------------------------------------

/// Marker height and error-bar half-length for one file in one dimension.
/// A `NaN` spread means no error bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayStatistic {
    pub value: f64,
    pub spread: f64,
}

/// Per-file statistics indexed by `Dimension::ordinal`.
pub type FileStatistics = [DisplayStatistic; 6];

/// Compute the display statistic of every file, in dataset order.
///
/// * [`StatisticMode::Pooled`]: every file gets the mean and population
///   standard deviation of the whole dataset for that dimension, so all
///   markers of a panel sit at the same height.
/// * [`StatisticMode::PerFile`]: every file gets its own value; the spread
///   comes from the chosen [`ErrorBars`].
pub fn display_statistics(dataset: &Dataset, mode: &StatisticMode) -> Vec<FileStatistics> {
    match mode {
        StatisticMode::Pooled => {
            let pooled: Vec<DisplayStatistic> = Dimension::ALL
                .iter()
                .map(|&dim| {
                    let column = dataset.column(dim);
                    DisplayStatistic {
                        value: mean(&column),
                        spread: population_std(&column),
                    }
                })
                .collect();
            let row: FileStatistics = std::array::from_fn(|i| pooled[i]);
            vec![row; dataset.len()]
        }
        StatisticMode::PerFile { error_bars } => dataset
            .entries()
            .iter()
            .map(|entry| {
                std::array::from_fn(|i| {
                    let dim = Dimension::ALL[i];
                    let spread = match error_bars {
                        ErrorBars::Fixed(v) => *v,
                        ErrorBars::Reported => entry
                            .record
                            .uncertainties
                            .map(|u| u[dim])
                            .unwrap_or(f64::NAN),
                    };
                    DisplayStatistic {
                        value: entry.record.means[dim],
                        spread,
                    }
                })
            })
            .collect(),
    }
}

/// Arithmetic mean. `NaN` for an empty slice or when any value is `NaN`.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor `n`). `NaN` propagates like [`mean`].
pub fn population_std(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.is_nan() {
        return f64::NAN;
    }
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
