use std::path::PathBuf;

use crate::config::PlotConfig;
use crate::report::{generate_report, ReportError, ReportOutcome, SkippedInput};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// What the user should be told after an action. The UI turns each notice
/// into one message box.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Warning(String),
    Error { title: String, message: String },
    Saved(PathBuf),
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct Session {
    /// Reports chosen so far, in selection order. Only "Clear" empties it.
    pub selected_files: Vec<PathBuf>,

    /// Chart settings edited in the side panel.
    pub config: PlotConfig,

    /// Result of the last successful generation, shown in the preview.
    pub last_outcome: Option<ReportOutcome>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Bumped on every successful generation so the preview resets its view.
    pub generation: u64,
}

impl Session {
    /// Append newly picked files; earlier picks are kept.
    pub fn add_files(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        let before = self.selected_files.len();
        self.selected_files.extend(paths);
        let added = self.selected_files.len() - before;
        if added > 0 {
            log::info!(
                "Selected {added} file(s), {} in total",
                self.selected_files.len()
            );
        }
    }

    pub fn clear_files(&mut self) {
        self.selected_files.clear();
        self.last_outcome = None;
        self.status_message = None;
    }

    /// File names for the selection list.
    pub fn selected_names(&self) -> Vec<String> {
        self.selected_files
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.display().to_string())
            })
            .collect()
    }

    /// Run the whole extract → plot → save pipeline for the current
    /// selection and report what the user must be told, in order.
    pub fn generate(&mut self) -> Vec<Notice> {
        if self.selected_files.is_empty() {
            self.status_message = Some("Please select files first!".to_string());
            return vec![Notice::Warning("Please select files first!".to_string())];
        }

        match generate_report(&self.selected_files, &self.config) {
            Ok(outcome) => {
                let mut notices = skipped_notices(&outcome.skipped);
                notices.push(Notice::Saved(outcome.output_path.clone()));
                self.status_message = Some(format!(
                    "Graph saved to {} ({} of {} files plotted)",
                    outcome.output_path.display(),
                    outcome.figure.file_count(),
                    self.selected_files.len()
                ));
                self.last_outcome = Some(outcome);
                self.generation += 1;
                notices
            }
            Err(ReportError::NothingToPlot { skipped }) => {
                log::error!("No readable files among {}", self.selected_files.len());
                let mut notices = skipped_notices(&skipped);
                notices.push(Notice::Error {
                    title: "Error".to_string(),
                    message: "None of the selected files could be read.".to_string(),
                });
                self.status_message = Some("Error: no readable files".to_string());
                notices
            }
            Err(e) => {
                log::error!("Failed to generate graph: {e}");
                self.status_message = Some(format!("Error: {e}"));
                vec![Notice::Error {
                    title: "Error".to_string(),
                    message: e.to_string(),
                }]
            }
        }
    }
}

fn skipped_notices(skipped: &[SkippedInput]) -> Vec<Notice> {
    skipped
        .iter()
        .map(|s| Notice::Error {
            title: "Error".to_string(),
            message: format!("Error reading {}: {}", s.path.display(), s.error),
        })
        .collect()
}
