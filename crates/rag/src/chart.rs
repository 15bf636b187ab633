use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// First numeric token of a line's value, thousands separators included.
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap());

const BAR_WIDTH: u32 = 56;
const BAR_GAP: u32 = 24;
const MARGIN: u32 = 20;
const CHART_HEIGHT: u32 = 240;

static PALETTE: [Rgb<u8>; 6] = [
    Rgb([59, 130, 246]),
    Rgb([16, 185, 129]),
    Rgb([249, 115, 22]),
    Rgb([139, 92, 246]),
    Rgb([236, 72, 153]),
    Rgb([234, 179, 8]),
];

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("no numeric values found in the insights")]
    NoNumericValues,
    #[error("failed to encode chart: {0}")]
    Encode(String),
}

/// Best-effort numeric extraction from `key: value` insight lines: split on
/// the first colon, take the first numeric token of the value, ignoring
/// thousands separators. Lines without a number are skipped.
pub fn extract_metric_values(insights: &str) -> Vec<(String, f64)> {
    insights
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let token = NUMBER_RE.find(value)?;
            let number: f64 = token.as_str().replace(',', "").parse().ok()?;
            Some((key.to_string(), number))
        })
        .collect()
}

/// Renders the values as a PNG bar chart, one bar per metric, heights
/// scaled to the maximum value.
pub fn render_bar_chart(values: &[(String, f64)]) -> Result<Vec<u8>, ChartError> {
    if values.is_empty() {
        return Err(ChartError::NoNumericValues);
    }
    let width = MARGIN * 2 + values.len() as u32 * BAR_WIDTH
        + (values.len() as u32 - 1) * BAR_GAP;
    let mut img = RgbImage::from_pixel(width, CHART_HEIGHT, Rgb([250, 250, 250]));
    let plot_height = CHART_HEIGHT - MARGIN * 2;
    let max = values
        .iter()
        .map(|(_, value)| *value)
        .fold(0.0f64, f64::max);
    for (idx, (_, value)) in values.iter().enumerate() {
        let bar_height = if max > 0.0 && *value > 0.0 {
            ((value / max) * plot_height as f64).round() as u32
        } else {
            0
        };
        let x0 = MARGIN + idx as u32 * (BAR_WIDTH + BAR_GAP);
        let color = PALETTE[idx % PALETTE.len()];
        let top = CHART_HEIGHT - MARGIN - bar_height;
        for x in x0..x0 + BAR_WIDTH {
            for y in top..CHART_HEIGHT - MARGIN {
                img.put_pixel(x, y, color);
            }
        }
    }
    let baseline_y = CHART_HEIGHT - MARGIN;
    for x in MARGIN..width - MARGIN {
        img.put_pixel(x, baseline_y, Rgb([60, 60, 60]));
    }
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|err| ChartError::Encode(err.to_string()))?;
    Ok(png)
}
