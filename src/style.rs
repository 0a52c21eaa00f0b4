use eframe::egui::Color32;
use palette::{named, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Marker style palettes
// ---------------------------------------------------------------------------

/// Marker glyph drawn at each data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Square,
    TriangleUp,
    Diamond,
    TriangleDown,
    PlusFilled,
}

pub const MARKERS: [MarkerShape; 6] = [
    MarkerShape::Circle,
    MarkerShape::Square,
    MarkerShape::TriangleUp,
    MarkerShape::Diamond,
    MarkerShape::TriangleDown,
    MarkerShape::PlusFilled,
];

pub const COLORS: [Srgb<u8>; 6] = [
    named::BLUE,
    named::ORANGE,
    named::GREEN,
    named::RED,
    named::PURPLE,
    named::BROWN,
];

pub const TARGET_COLOR: Srgb<u8> = named::GRAY;
pub const TOLERANCE_COLOR: Srgb<u8> = named::RED;

/// Marker style of the file at `index` in the selection; both palettes cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    pub color: Srgb<u8>,
}

impl MarkerStyle {
    pub fn for_index(index: usize) -> Self {
        Self {
            shape: MARKERS[index % MARKERS.len()],
            color: COLORS[index % COLORS.len()],
        }
    }
}

impl MarkerShape {
    /// Outline of the glyph as pixel offsets from its centre, for a marker of
    /// half-size `r`. Circles are drawn natively and return `None`.
    pub fn polygon(self, r: i32) -> Option<Vec<(i32, i32)>> {
        let t = (r / 3).max(1);
        match self {
            MarkerShape::Circle => None,
            MarkerShape::Square => Some(vec![(-r, -r), (r, -r), (r, r), (-r, r)]),
            MarkerShape::TriangleUp => Some(vec![(0, -r), (r, r), (-r, r)]),
            MarkerShape::TriangleDown => Some(vec![(-r, -r), (r, -r), (0, r)]),
            MarkerShape::Diamond => Some(vec![(0, -r), (r, 0), (0, r), (-r, 0)]),
            MarkerShape::PlusFilled => Some(vec![
                (-t, -r),
                (t, -r),
                (t, -t),
                (r, -t),
                (r, t),
                (t, t),
                (t, r),
                (-t, r),
                (-t, t),
                (-r, t),
                (-r, -t),
                (-t, -t),
            ]),
        }
    }
}

// -- Colour conversions for the two drawing surfaces --

pub fn to_rgb(c: Srgb<u8>) -> RGBColor {
    RGBColor(c.red, c.green, c.blue)
}

pub fn to_color32(c: Srgb<u8>) -> Color32 {
    Color32::from_rgb(c.red, c.green, c.blue)
}
