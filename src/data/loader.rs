use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;

use super::model::{Dimension, DimensionValues, MeasurementRecord};
use crate::config::StatisticMode;

/// Metadata lines at the top of every instrument report. Blank lines count.
pub const HEADER_ROWS: usize = 11;
/// Zero-based column holding the measured values.
pub const VALUE_COLUMN: usize = 10;
/// First data-block row of the uncertainty values.
pub const UNCERTAINTY_ROW_OFFSET: usize = 6;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid format: data block has {found} columns, at least {required} required")]
    TooFewColumns { found: usize, required: usize },

    #[error("invalid format: data block has {found} rows, at least {required} required")]
    TooFewRows { found: usize, required: usize },

    #[error("invalid format: data row {row} has {found} fields, expected at most {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Which fixed cells are read from the data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Rows 0..=5: the six dimension means.
    Means,
    /// Rows 0..=5 plus rows 6..=11 holding the per-dimension uncertainty.
    WithUncertainties,
}

impl Layout {
    /// Read the uncertainty block only when the chart will use it.
    pub fn for_mode(mode: &StatisticMode) -> Self {
        if mode.needs_uncertainties() {
            Layout::WithUncertainties
        } else {
            Layout::Means
        }
    }

    /// Minimum number of data rows a report must have.
    pub fn required_rows(self) -> usize {
        match self {
            Layout::Means => Dimension::ALL.len(),
            Layout::WithUncertainties => 13,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Extract one measurement record from an instrument report on disk.
pub fn extract_record(path: &Path, layout: Layout) -> Result<MeasurementRecord, ExtractError> {
    let file = File::open(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let record = extract_from_reader(file, layout)?;
    log::debug!("extracted {} ({layout:?}): {:?}", path.display(), record.means);
    Ok(record)
}

/// Extract one measurement record from any CSV source.
///
/// The first [`HEADER_ROWS`] physical lines are skipped, blank or not; the
/// remaining non-empty records form the data block. Its width is the field
/// count of its first row; later rows may be shorter (missing cells) but not
/// longer.
pub fn extract_from_reader<R: Read>(
    reader: R,
    layout: Layout,
) -> Result<MeasurementRecord, ExtractError> {
    let mut reader = BufReader::new(reader);
    skip_lines(&mut reader, HEADER_ROWS).map_err(csv::Error::from)?;

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows: Vec<StringRecord> = Vec::new();
    for result in csv_reader.records() {
        rows.push(result?);
    }

    let width = rows.first().map(|r| r.len()).unwrap_or(0);
    if let Some((row, found)) = rows
        .iter()
        .enumerate()
        .find(|(_, r)| r.len() > width)
        .map(|(i, r)| (i, r.len()))
    {
        return Err(ExtractError::RaggedRow {
            row,
            found,
            expected: width,
        });
    }

    if width < VALUE_COLUMN + 1 {
        return Err(ExtractError::TooFewColumns {
            found: width,
            required: VALUE_COLUMN + 1,
        });
    }
    if rows.len() < layout.required_rows() {
        return Err(ExtractError::TooFewRows {
            found: rows.len(),
            required: layout.required_rows(),
        });
    }

    let means = read_block(&rows, 0);
    let uncertainties = match layout {
        Layout::Means => None,
        Layout::WithUncertainties => Some(read_block(&rows, UNCERTAINTY_ROW_OFFSET)),
    };

    Ok(MeasurementRecord {
        means,
        uncertainties,
    })
}

// -- Helpers --

/// Consume `count` lines, stopping early at end of input.
fn skip_lines<B: BufRead>(reader: &mut B, count: usize) -> io::Result<()> {
    let mut line = Vec::new();
    for _ in 0..count {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
    }
    Ok(())
}

fn read_block(rows: &[StringRecord], first_row: usize) -> DimensionValues {
    let mut values = DimensionValues::missing();
    for dim in Dimension::ALL {
        values[dim] = rows
            .get(first_row + dim.ordinal())
            .and_then(|r| r.get(VALUE_COLUMN))
            .map(coerce_numeric)
            .unwrap_or(f64::NAN);
    }
    values
}

/// Parse a cell as a number; anything unparsable becomes `NaN`.
pub fn coerce_numeric(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    /// Build a report: 11 metadata rows, then `rows` data rows of `width`
    /// columns with `values[i]` in the value column of row `i`.
    pub(crate) fn synthetic_report(values: &[&str], rows: usize, width: usize) -> String {
        let mut out = String::new();
        out.push_str("Report,Wrapped tile\n");
        for i in 1..HEADER_ROWS {
            out.push_str(&format!("Meta{i},x\n"));
        }
        for row in 0..rows {
            let cells: Vec<String> = (0..width)
                .map(|col| {
                    if col == VALUE_COLUMN {
                        values.get(row).map(|v| v.to_string()).unwrap_or_default()
                    } else {
                        format!("r{row}c{col}")
                    }
                })
                .collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }

    const MEANS: [&str; 6] = ["0.11", "0.22", "0.33", "0.44", "0.55", "0.66"];

    #[test]
    fn test_extracts_means_at_fixed_positions() {
        let csv = synthetic_report(&MEANS, 6, 12);
        let rec = extract_from_reader(Cursor::new(csv), Layout::Means).unwrap();

        assert_eq!(rec.means.get(Dimension::Top), 0.11);
        assert_eq!(rec.means.get(Dimension::Bottom), 0.22);
        assert_eq!(rec.means.get(Dimension::Left), 0.33);
        assert_eq!(rec.means.get(Dimension::Right), 0.44);
        assert_eq!(rec.means.get(Dimension::Width), 0.55);
        assert_eq!(rec.means.get(Dimension::Height), 0.66);
        assert!(rec.uncertainties.is_none());
    }

    #[test]
    fn test_extracts_uncertainties_from_second_block() {
        let values = [
            "0.11", "0.22", "0.33", "0.44", "0.55", "0.66", // means
            "0.01", "0.02", "0.03", "0.04", "0.05", "0.06", // uncertainties
        ];
        let csv = synthetic_report(&values, 13, 11);
        let rec = extract_from_reader(Cursor::new(csv), Layout::WithUncertainties).unwrap();

        let unc = rec.uncertainties.unwrap();
        assert_eq!(rec.means.get(Dimension::Height), 0.66);
        assert_eq!(unc.get(Dimension::Top), 0.01);
        assert_eq!(unc.get(Dimension::Height), 0.06);
    }

    #[test]
    fn test_too_few_columns_is_rejected() {
        let csv = synthetic_report(&MEANS, 6, 10);
        let err = extract_from_reader(Cursor::new(csv), Layout::Means).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::TooFewColumns {
                found: 10,
                required: 11
            }
        ));
    }

    #[test]
    fn test_extended_layout_needs_thirteen_rows() {
        let csv = synthetic_report(&MEANS, 12, 11);
        let err = extract_from_reader(Cursor::new(csv), Layout::WithUncertainties).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::TooFewRows {
                found: 12,
                required: 13
            }
        ));

        // The same file is fine when only the means are needed.
        let csv = synthetic_report(&MEANS, 12, 11);
        assert!(extract_from_reader(Cursor::new(csv), Layout::Means).is_ok());
    }

    #[test]
    fn test_short_data_block_is_rejected() {
        let csv = synthetic_report(&MEANS, 5, 11);
        let err = extract_from_reader(Cursor::new(csv), Layout::Means).unwrap_err();
        assert!(matches!(err, ExtractError::TooFewRows { found: 5, .. }));
    }

    #[test]
    fn test_non_numeric_cell_becomes_nan() {
        let values = ["0.11", "n/a", "0.33", "", "0.55", " 0.66 "];
        let csv = synthetic_report(&values, 6, 11);
        let rec = extract_from_reader(Cursor::new(csv), Layout::Means).unwrap();

        assert!(rec.means.get(Dimension::Bottom).is_nan());
        assert!(rec.means.get(Dimension::Right).is_nan());
        assert_eq!(rec.means.get(Dimension::Top), 0.11);
        assert_eq!(rec.means.get(Dimension::Left), 0.33);
        assert_eq!(rec.means.get(Dimension::Height), 0.66);
    }

    #[test]
    fn test_wider_row_after_first_is_rejected() {
        let mut csv = synthetic_report(&MEANS, 6, 11);
        csv.push_str(&vec!["9"; 14].join(","));
        csv.push('\n');
        let err = extract_from_reader(Cursor::new(csv), Layout::Means).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::RaggedRow {
                row: 6,
                found: 14,
                expected: 11
            }
        ));
    }

    #[test]
    fn test_ragged_header_rows_are_skipped() {
        let mut csv = String::from("only one field\n");
        csv.push_str(&synthetic_report(&MEANS, 6, 11).lines().skip(1).collect::<Vec<_>>().join("\n"));
        let rec = extract_from_reader(Cursor::new(csv), Layout::Means).unwrap();
        assert_eq!(rec.means.get(Dimension::Width), 0.55);
    }

    #[test]
    fn test_blank_header_lines_count_as_rows() {
        // Eleven physical lines, one of them empty.
        let mut csv = String::from("Report,x\n\n");
        for i in 2..HEADER_ROWS {
            csv.push_str(&format!("Meta{i},x\n"));
        }
        let full = synthetic_report(&MEANS, 6, 11);
        for line in full.lines().skip(HEADER_ROWS) {
            csv.push_str(line);
            csv.push('\n');
        }

        let rec = extract_from_reader(Cursor::new(csv), Layout::Means).unwrap();
        assert_eq!(rec.means.get(Dimension::Top), 0.11);
        assert_eq!(rec.means.get(Dimension::Height), 0.66);
    }

    #[test]
    fn test_blank_lines_inside_data_block_are_ignored() {
        let full = synthetic_report(&MEANS, 6, 11);
        let mut lines: Vec<&str> = full.lines().collect();
        lines.insert(HEADER_ROWS + 2, "");
        let csv = lines.join("\n");

        let rec = extract_from_reader(Cursor::new(csv), Layout::Means).unwrap();
        assert_eq!(rec.means.get(Dimension::Left), 0.33);
        assert_eq!(rec.means.get(Dimension::Height), 0.66);
    }

    #[test]
    fn test_crlf_line_endings() {
        let csv = synthetic_report(&MEANS, 6, 11).replace('\n', "\r\n");
        let rec = extract_from_reader(Cursor::new(csv), Layout::Means).unwrap();
        assert_eq!(rec.means.get(Dimension::Top), 0.11);
        assert_eq!(rec.means.get(Dimension::Height), 0.66);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        let err = extract_record(&path, Layout::Means).unwrap_err();

        assert!(matches!(err, ExtractError::Io { .. }));
        assert!(err.to_string().contains("absent.csv"));
    }

    #[test]
    fn test_extract_record_reads_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tile_01.csv");
        fs::write(&path, synthetic_report(&MEANS, 6, 11)).unwrap();

        let rec = extract_record(&path, Layout::Means).unwrap();
        assert_eq!(rec.means.get(Dimension::Right), 0.44);
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric("1.5"), 1.5);
        assert_eq!(coerce_numeric("  -0.25\t"), -0.25);
        assert_eq!(coerce_numeric("1e-3"), 0.001);
        assert!(coerce_numeric("mm").is_nan());
        assert!(coerce_numeric("").is_nan());
    }
}
