use std::fs;
use std::io::Cursor;
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use image::{ImageFormat, RgbImage};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::element::DashedPathElement;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontDesc, FontFamily, FontStyle, FontTransform};

use crate::config::PlotConfig;
use crate::figure::{ComparisonFigure, LegendKey, Marker, Panel, ReferenceLine, GRID, Y_AXIS_LABEL};
use crate::style::{to_rgb, MarkerShape};

// ---------------------------------------------------------------------------
// Sizes in points, converted to pixels with `PlotConfig::pt`
// ---------------------------------------------------------------------------

const SUPTITLE_PT: f64 = 14.0;
const PANEL_TITLE_PT: f64 = 10.0;
const AXIS_DESC_PT: f64 = 10.0;
const TICK_LABEL_PT: f64 = 8.0;
const LEGEND_PT: f64 = 10.0;
const MARKER_RADIUS_PT: f64 = 3.0;
/// `ErrorBar` also strokes a ring of half this width around the centre, so it
/// matches the marker radius and stays under the glyph.
const CAP_WIDTH_PT: f64 = 2.0 * MARKER_RADIUS_PT;
const ERRORBAR_WIDTH_PT: f64 = 1.5;
const DASH_PT: f64 = 4.0;
const DASH_GAP_PT: f64 = 2.0;
/// Largest share of a panel's height the rotated file labels may take.
const MAX_LABEL_SHARE: f64 = 0.35;

const SANS: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const SANS_BOLD: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Rasterise the figure into an RGB image of `config.pixel_size()`.
pub fn render_rgb(figure: &ComparisonFigure, config: &PlotConfig) -> Result<RgbImage> {
    register_fonts()?;
    let (width, height) = config.pixel_size();
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_figure(&root, figure, config).map_err(|e| anyhow!("drawing chart: {e}"))?;
        root.present().map_err(|e| anyhow!("finishing chart: {e}"))?;
    }
    RgbImage::from_raw(width, height, buffer).context("raster buffer has the wrong size")
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("encoding PNG")?;
    Ok(bytes)
}

/// Render and write the chart to `path`, creating parent directories.
pub fn save_png(figure: &ComparisonFigure, config: &PlotConfig, path: &Path) -> Result<()> {
    let image = render_rgb(figure, config)?;
    let bytes = encode_png(&image)?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Make the bundled DejaVu Sans faces the `sans-serif` family. Idempotent.
fn register_fonts() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| {
        register_font("sans-serif", FontStyle::Normal, SANS).is_ok()
            && register_font("sans-serif", FontStyle::Bold, SANS_BOLD).is_ok()
    });
    if ok {
        Ok(())
    } else {
        Err(anyhow!("bundled chart font could not be loaded"))
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

fn font(config: &PlotConfig, points: f64, style: FontStyle) -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, config.pt(points), style)
}

fn px(config: &PlotConfig, points: f64) -> i32 {
    config.pt(points).round().max(1.0) as i32
}

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &ComparisonFigure,
    config: &PlotConfig,
) -> DrawResult<DB> {
    root.fill(&WHITE)?;

    let body = root.titled(&figure.title, font(config, SUPTITLE_PT, FontStyle::Bold).color(&BLACK))?;
    let legend = LegendLayout::measure(&body, figure, config)?;
    let (_, body_height) = body.dim_in_pixel();
    let (panels_area, legend_area) =
        body.split_vertically((body_height as i32 - legend.strip_height()).max(0));

    let cells = panels_area.split_evenly(GRID);
    for (cell, panel) in cells.iter().zip(&figure.panels) {
        draw_panel(&cell.margin(8, 8, 8, 8), figure, panel, config)?;
    }

    draw_legend(&legend_area, figure, &legend, config)
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    figure: &ComparisonFigure,
    panel: &Panel,
    config: &PlotConfig,
) -> DrawResult<DB> {
    let n = figure.file_count().max(1);
    let x_start = -0.5;
    let x_end = n as f64 - 0.5;
    let (y_min, y_max) = figure.y_range;

    let tick_style = font(config, TICK_LABEL_PT, FontStyle::Normal).color(&BLACK);
    let tick_gap = px(config, 3.5);
    let (_, area_height) = area.dim_in_pixel();
    let max_label = ((area_height as f64 * MAX_LABEL_SHARE) as i32 - tick_gap).max(1);
    let mut labels = Vec::with_capacity(figure.x_labels.len());
    let mut label_width = 0;
    for label in &figure.x_labels {
        let fitted = fit_label(label, max_label, |text| {
            area.estimate_text_size(text, &tick_style).map(|(w, _)| w as i32)
        })?;
        label_width = label_width.max(area.estimate_text_size(&fitted, &tick_style)?.0 as i32);
        labels.push(fitted);
    }

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, font(config, PANEL_TITLE_PT, FontStyle::Normal))
        .margin(px(config, 4.0))
        .x_label_area_size(label_width + 2 * tick_gap)
        .y_label_area_size(px(config, 36.0))
        .build_cartesian_2d(x_start..x_end, y_min..y_max)?;

    // With the x range padded by half a step on both sides, `n` ticks land
    // exactly on the integer file positions. Their labels are drawn below.
    chart
        .configure_mesh()
        .x_labels(n)
        .y_labels(9)
        .x_label_formatter(&|_: &f64| String::new())
        .y_label_formatter(&|y: &f64| format!("{y:.1}"))
        .y_desc(Y_AXIS_LABEL)
        .label_style(tick_style.clone())
        .axis_desc_style(font(config, AXIS_DESC_PT, FontStyle::Normal))
        .bold_line_style(BLACK.mix(0.25).stroke_width(px(config, 0.7) as u32))
        .light_line_style(BLACK.mix(0.08).stroke_width(px(config, 0.5) as u32))
        .max_light_lines(4)
        .draw()?;

    // Quarter turn, right-aligned: each label ends just under its tick.
    let rotated = tick_style
        .transform(FontTransform::Rotate270)
        .pos(Pos::new(HPos::Right, VPos::Center));
    let (base_x, base_y) = area.get_base_pixel();
    for (i, label) in labels.iter().enumerate() {
        let (tick_x, axis_y) = chart.backend_coord(&(i as f64, y_min));
        area.draw(&Text::new(
            label.as_str(),
            (tick_x - base_x, axis_y - base_y + tick_gap),
            rotated.clone(),
        ))?;
    }

    for line in [&figure.target, &figure.tolerance] {
        draw_reference_line(&mut chart, line, (x_start, x_end), (y_min, y_max), config)?;
    }

    for marker in &panel.markers {
        draw_error_bar(&mut chart, marker, (y_min, y_max), config)?;
        if (y_min..=y_max).contains(&marker.y) {
            let at = (marker.file_index as f64, marker.y);
            draw_marker(&mut chart, at, marker.style.shape, to_rgb(marker.style.color), config)?;
        }
    }
    Ok(())
}

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn draw_reference_line<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    line: &ReferenceLine,
    (x_start, x_end): (f64, f64),
    (y_min, y_max): (f64, f64),
    config: &PlotConfig,
) -> DrawResult<DB> {
    if line.y < y_min || line.y > y_max {
        return Ok(());
    }
    let style = to_rgb(line.color).stroke_width(px(config, line.width_pt) as u32);
    chart.draw_series(std::iter::once(DashedPathElement::new(
        vec![(x_start, line.y), (x_end, line.y)],
        px(config, DASH_PT),
        px(config, DASH_GAP_PT),
        style,
    )))?;
    Ok(())
}

fn draw_error_bar<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    marker: &Marker,
    (y_min, y_max): (f64, f64),
    config: &PlotConfig,
) -> DrawResult<DB> {
    if !marker.y_err.is_finite() || marker.y_err <= 0.0 {
        return Ok(());
    }
    let x = marker.file_index as f64;
    let lo = marker.y - marker.y_err;
    let hi = marker.y + marker.y_err;
    if hi < y_min || lo > y_max {
        return Ok(());
    }
    let style = to_rgb(marker.style.color).stroke_width(px(config, ERRORBAR_WIDTH_PT) as u32);
    let cap_width = px(config, CAP_WIDTH_PT);

    if lo >= y_min && hi <= y_max {
        chart.draw_series(std::iter::once(ErrorBar::new_vertical(
            x,
            lo,
            marker.y,
            hi,
            style,
            cap_width as u32,
        )))?;
        return Ok(());
    }

    // Crossing the range edge: clipped stem, caps only on ends still inside.
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(x, lo.max(y_min)), (x, hi.min(y_max))],
        style,
    )))?;
    let half = cap_width / 2;
    let caps = [lo, hi]
        .into_iter()
        .filter(|y| (y_min..=y_max).contains(y))
        .map(|y| EmptyElement::at((x, y)) + PathElement::new(vec![(-half, 0), (half, 0)], style));
    chart.draw_series(caps)?;
    Ok(())
}

fn draw_marker<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    at: (f64, f64),
    shape: MarkerShape,
    color: RGBColor,
    config: &PlotConfig,
) -> DrawResult<DB> {
    let r = px(config, MARKER_RADIUS_PT);
    match shape.polygon(r) {
        None => {
            chart.draw_series(std::iter::once(
                EmptyElement::at(at) + Circle::new((0, 0), r, color.filled()),
            ))?;
        }
        Some(points) => {
            chart.draw_series(std::iter::once(
                EmptyElement::at(at) + Polygon::new(points, color.filled()),
            ))?;
        }
    }
    Ok(())
}

/// Shorten `label` with a trailing `..` until `measure` says it fits.
fn fit_label<E>(
    label: &str,
    max_width: i32,
    measure: impl Fn(&str) -> Result<i32, E>,
) -> Result<String, E> {
    if measure(label)? <= max_width {
        return Ok(label.to_string());
    }
    let chars: Vec<char> = label.chars().collect();
    for keep in (1..chars.len()).rev() {
        let candidate = chars[..keep].iter().collect::<String>() + "..";
        if measure(&candidate)? <= max_width {
            return Ok(candidate);
        }
    }
    Ok("..".to_string())
}

// ---------------------------------------------------------------------------
// Legend
// ---------------------------------------------------------------------------

/// Pixel sizes of the legend box.
struct LegendMetrics {
    key_width: i32,
    gap: i32,
    padding: i32,
    margin: i32,
}

impl LegendMetrics {
    fn new(config: &PlotConfig) -> Self {
        Self {
            key_width: px(config, 20.0),
            gap: px(config, 6.0),
            padding: px(config, 8.0),
            margin: px(config, 4.0),
        }
    }
}

/// Legend entries measured and wrapped into rows that fit the canvas width.
struct LegendLayout {
    metrics: LegendMetrics,
    /// Key plus label width of each entry.
    widths: Vec<i32>,
    rows: Vec<Range<usize>>,
    row_height: i32,
    text_height: i32,
}

impl LegendLayout {
    fn measure<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        figure: &ComparisonFigure,
        config: &PlotConfig,
    ) -> Result<Self, DrawingAreaErrorKind<DB::ErrorType>> {
        let metrics = LegendMetrics::new(config);
        let text_style = font(config, LEGEND_PT, FontStyle::Normal).color(&BLACK);

        let mut widths = Vec::with_capacity(figure.legend.len());
        let mut text_height = 0;
        for entry in &figure.legend {
            let (w, h) = area.estimate_text_size(&entry.label, &text_style)?;
            widths.push(metrics.key_width + metrics.gap + w as i32);
            text_height = text_height.max(h as i32);
        }

        let (area_width, _) = area.dim_in_pixel();
        let max_row = area_width as i32 - 2 * (metrics.gap + metrics.margin);
        let rows = wrap_rows(&widths, metrics.padding, max_row);
        Ok(Self {
            row_height: text_height + metrics.gap,
            metrics,
            widths,
            rows,
            text_height,
        })
    }

    fn row_width(&self, row: &Range<usize>) -> i32 {
        self.widths[row.clone()].iter().map(|w| w + self.metrics.padding).sum()
    }

    fn box_width(&self) -> i32 {
        self.rows.iter().map(|r| self.row_width(r)).max().unwrap_or(0)
    }

    fn box_height(&self) -> i32 {
        self.rows.len() as i32 * self.row_height + self.metrics.gap
    }

    /// Height of the strip reserved under the panels.
    fn strip_height(&self) -> i32 {
        self.box_height() + 2 * self.metrics.margin
    }

    /// Top-left corner of every entry inside a strip `area_width` wide.
    fn positions(&self, area_width: i32) -> Vec<(i32, i32)> {
        let m = &self.metrics;
        let mut out = Vec::with_capacity(self.widths.len());
        for (r, row) in self.rows.iter().enumerate() {
            let mut x = (area_width - self.row_width(row)) / 2 + m.padding / 2;
            let y = m.margin + m.gap / 2 + r as i32 * self.row_height;
            for i in row.clone() {
                out.push((x, y));
                x += self.widths[i] + m.padding;
            }
        }
        out
    }
}

/// Greedy row wrapping. Every entry takes its width plus `spacing`; a row
/// only exceeds `max_width` when a single entry does.
fn wrap_rows(widths: &[i32], spacing: i32, max_width: i32) -> Vec<Range<usize>> {
    let mut rows = Vec::new();
    let mut start = 0;
    let mut row_width = 0;
    for (i, w) in widths.iter().enumerate() {
        let needed = w + spacing;
        if i > start && row_width + needed > max_width {
            rows.push(start..i);
            start = i;
            row_width = 0;
        }
        row_width += needed;
    }
    if start < widths.len() {
        rows.push(start..widths.len());
    }
    rows
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    figure: &ComparisonFigure,
    layout: &LegendLayout,
    config: &PlotConfig,
) -> DrawResult<DB> {
    let m = &layout.metrics;
    let text_style = font(config, LEGEND_PT, FontStyle::Normal).color(&BLACK);
    let (area_width, _) = area.dim_in_pixel();
    let area_width = area_width as i32;

    let left = (area_width - layout.box_width()) / 2 - m.gap;
    area.draw(&Rectangle::new(
        [
            (left, m.margin),
            (left + layout.box_width() + 2 * m.gap, m.margin + layout.box_height()),
        ],
        BLACK.mix(0.3).stroke_width(px(config, 0.8) as u32),
    ))?;

    for (entry, (x, y)) in figure.legend.iter().zip(layout.positions(area_width)) {
        let mid_y = y + layout.row_height / 2;
        match &entry.key {
            LegendKey::Marker(style) => {
                let key_centre = (x + m.key_width / 2, mid_y);
                let color = to_rgb(style.color).filled();
                let r = px(config, MARKER_RADIUS_PT);
                match style.shape.polygon(r) {
                    None => area.draw(&(EmptyElement::at(key_centre)
                        + Circle::new((0, 0), r, color)))?,
                    Some(points) => area.draw(&(EmptyElement::at(key_centre)
                        + Polygon::new(points, color)))?,
                }
            }
            LegendKey::DashedLine(color) => {
                let style = to_rgb(*color).stroke_width(px(config, figure.tolerance.width_pt) as u32);
                area.draw(&DashedPathElement::new(
                    vec![(x, mid_y), (x + m.key_width, mid_y)],
                    px(config, DASH_PT),
                    px(config, DASH_GAP_PT),
                    style,
                ))?;
            }
        }
        area.draw(&Text::new(
            entry.label.as_str(),
            (x + m.key_width + m.gap, mid_y - layout.text_height / 2),
            text_style.clone(),
        ))?;
    }
    Ok(())
}
