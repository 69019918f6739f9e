//! Inline SVG line charts. Coordinates are computed here so the page needs
//! no JavaScript.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub const WIDTH: u32 = 720;
pub const HEIGHT: u32 = 160;
const PADDING: f64 = 8.0;

/// Polyline `points` attribute for `values`, oldest first.
pub fn polyline_points(values: &[Decimal]) -> String {
    let values: Vec<f64> = values.iter().filter_map(ToPrimitive::to_f64).collect();
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return String::new();
    };

    let width = f64::from(WIDTH) - 2.0 * PADDING;
    let height = f64::from(HEIGHT) - 2.0 * PADDING;
    let step = if values.len() > 1 {
        width / (values.len() - 1) as f64
    } else {
        0.0
    };
    let spread = max - min;

    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = if values.len() > 1 {
                PADDING + step * i as f64
            } else {
                PADDING + width / 2.0
            };
            let y = if spread > 0.0 {
                PADDING + (max - v) / spread * height
            } else {
                PADDING + height / 2.0
            };
            format!("{x:.1},{y:.1}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}
