use eframe::egui::{Ui, Vec2b};
use egui_extras::{Size, StripBuilder};
use egui_plot::{HLine, Legend, Line, LineStyle, MarkerShape as PlotMarker, Plot, Points};

use crate::figure::{ComparisonFigure, Panel, GRID, Y_AXIS_LABEL};
use crate::state::Session;
use crate::style::{to_color32, MarkerShape};

// ---------------------------------------------------------------------------
// Comparison preview (central panel)
// ---------------------------------------------------------------------------

/// Render the interactive 3×2 preview of the last generated chart.
pub fn comparison_preview(ui: &mut Ui, state: &Session) {
    let Some(outcome) = &state.last_outcome else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Select files and press \"Generate Graph\"");
        });
        return;
    };
    let figure = &outcome.figure;

    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(&figure.title);
    });

    let (rows, cols) = GRID;
    StripBuilder::new(ui)
        .sizes(Size::remainder(), rows)
        .vertical(|mut strip| {
            for row in 0..rows {
                strip.strip(|builder| {
                    builder
                        .sizes(Size::remainder(), cols)
                        .horizontal(|mut strip| {
                            for col in 0..cols {
                                let index = row * cols + col;
                                strip.cell(|ui: &mut Ui| {
                                    if let Some(panel) = figure.panels.get(index) {
                                        panel_plot(ui, figure, panel, index, state.generation);
                                    }
                                });
                            }
                        });
                });
            }
        });
}

fn panel_plot(ui: &mut Ui, figure: &ComparisonFigure, panel: &Panel, index: usize, generation: u64) {
    let labels = figure.x_labels.clone();
    let (y_min, y_max) = figure.y_range;
    // Only the first panel carries the legend, like the saved figure's single legend.
    let with_legend = index == 0;

    let mut plot = Plot::new(("comparison_preview", generation, index))
        .y_axis_label(Y_AXIS_LABEL)
        .include_x(-0.5)
        .include_x(figure.file_count() as f64 - 0.5)
        .include_y(y_min)
        .include_y(y_max)
        .auto_bounds(Vec2b::new(false, false))
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if i >= 0.0 && (mark.value - i).abs() < 1e-6 {
                labels.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        });
    if with_legend {
        plot = plot.legend(Legend::default());
    }

    ui.label(&panel.title);
    plot.show(ui, |plot_ui| {
        plot_ui.hline(
            HLine::new(figure.target.y)
                .color(to_color32(figure.target.color))
                .style(LineStyle::dashed_loose()),
        );
        let mut tolerance = HLine::new(figure.tolerance.y)
            .color(to_color32(figure.tolerance.color))
            .style(LineStyle::dashed_dense());
        if let (true, Some(name)) = (with_legend, figure.tolerance.label) {
            tolerance = tolerance.name(name);
        }
        plot_ui.hline(tolerance);

        for marker in &panel.markers {
            let x = marker.file_index as f64;
            let color = to_color32(marker.style.color);
            if marker.y_err.is_finite() && marker.y_err > 0.0 {
                plot_ui.line(
                    Line::new(vec![[x, marker.y - marker.y_err], [x, marker.y + marker.y_err]])
                        .color(color)
                        .width(1.5),
                );
            }
            let mut points = Points::new(vec![[x, marker.y]])
                .shape(plot_marker(marker.style.shape))
                .filled(true)
                .radius(5.0)
                .color(color);
            if with_legend {
                points = points.name(&figure.x_labels[marker.file_index]);
            }
            plot_ui.points(points);
        }
    });
}

fn plot_marker(shape: MarkerShape) -> PlotMarker {
    match shape {
        MarkerShape::Circle => PlotMarker::Circle,
        MarkerShape::Square => PlotMarker::Square,
        MarkerShape::TriangleUp => PlotMarker::Up,
        MarkerShape::Diamond => PlotMarker::Diamond,
        MarkerShape::TriangleDown => PlotMarker::Down,
        MarkerShape::PlusFilled => PlotMarker::Plus,
    }
}
