use std::io::{self, Write};

use super::glyph;

/// Border drawn around the spectrum when the axis is displayed.
pub const AXIS_BORDER: char = '│';

/// Terminator written between two rendered lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LineFeed {
    /// Carriage return, redraws the line in place.
    #[default]
    #[value(name = "CR")]
    Cr,
    /// Line feed, scrolls like a log.
    #[value(name = "LF")]
    Lf,
    #[value(name = "CRLF")]
    CrLf,
}

impl LineFeed {
    pub fn as_str(self) -> &'static str {
        match self {
            LineFeed::Cr => "\r",
            LineFeed::Lf => "\n",
            LineFeed::CrLf => "\r\n",
        }
    }
}

/// Turns loudness spectra into lines of braille glyphs.
///
/// Each glyph shows two bars, so a line of `width` glyphs has `2 * width`
/// bars. The renderer keeps one smoothed value per bar; it is created at
/// zero, moved towards every new frame in [`draw`](Self::draw) and never
/// reset.
pub struct Renderer {
    width: usize,
    line_feed: LineFeed,
    display_axis: bool,
    ema: Vec<f32>,
    blurred: Vec<f32>,
    first_line: bool,
}

impl Renderer {
    pub fn new(width: usize, line_feed: LineFeed, display_axis: bool) -> Self {
        Self {
            width,
            line_feed,
            display_axis,
            ema: vec![0.0; width * 2],
            blurred: vec![0.0; width * 2],
            first_line: true,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Render one frame and write it to `out`.
    ///
    /// Every line but the first is preceded by the line terminator, so the
    /// cursor stays at the end of the latest spectrum.
    pub fn draw<W: Write>(
        &mut self,
        out: &mut W,
        values: &[f32],
        gaussian_diameter: usize,
        smoothing: f32,
    ) -> io::Result<()> {
        if !self.first_line {
            out.write_all(self.line_feed.as_str().as_bytes())?;
        }
        self.first_line = false;

        let line = self.render_line(values, gaussian_diameter, smoothing);
        if self.display_axis {
            write!(out, "{AXIS_BORDER}{line}{AXIS_BORDER}")?;
        } else {
            out.write_all(line.as_bytes())?;
        }
        out.flush()
    }

    /// Advance the smoothing state with `values` and return exactly
    /// `width` glyphs.
    ///
    /// # Panics
    /// If `smoothing` is outside `(0, 1]`.
    pub fn render_line(&mut self, values: &[f32], gaussian_diameter: usize, smoothing: f32) -> String {
        assert!(
            smoothing > 0.0 && smoothing <= 1.0,
            "smoothing {} is outside (0, 1]",
            smoothing
        );
        let resolution = self.width * 2;
        let unit_bar_width = values.len() / resolution.max(1);

        for (bar, ema) in self.ema.iter_mut().enumerate() {
            let begin = unit_bar_width * bar;
            let end = unit_bar_width * (bar + 1);
            let peak = values[begin..end].iter().fold(0.0f32, |acc, &v| acc.max(v));

            if smoothing == 1.0 {
                *ema = peak;
            } else {
                *ema += (peak - *ema) * smoothing;
            }
        }

        let weights = gaussian_weights(gaussian_diameter, 1.0);
        let half = gaussian_diameter / 2;
        let ema = &self.ema;
        for (bar, blurred) in self.blurred.iter_mut().enumerate() {
            *blurred = weights
                .iter()
                .enumerate()
                .map(|(i, &weight)| {
                    // zero outside the bar range
                    let tap = (bar + i)
                        .checked_sub(half)
                        .and_then(|index| ema.get(index))
                        .copied()
                        .unwrap_or(0.0);
                    tap * weight
                })
                .sum();
        }

        self.blurred
            .chunks_exact(2)
            .map(|pair| glyph::encode(quantize(pair[0]), quantize(pair[1])))
            .collect()
    }

    /// Per-bar values after temporal smoothing.
    pub fn smoothed(&self) -> &[f32] {
        &self.ema
    }

    /// Per-bar values after the Gaussian blur.
    pub fn blurred(&self) -> &[f32] {
        &self.blurred
    }
}

/// Normalized Gaussian kernel of `diameter` taps centred on `diameter / 2`.
pub fn gaussian_weights(diameter: usize, variance: f32) -> Vec<f32> {
    let center = (diameter / 2) as f32;
    let mut weights: Vec<f32> = (0..diameter)
        .map(|i| {
            let x = i as f32 - center;
            (-x * x / (2.0 * variance)).exp() / (2.0 * std::f32::consts::PI * variance).sqrt()
        })
        .collect();

    let sum: f32 = weights.iter().sum();
    for weight in &mut weights {
        *weight /= sum;
    }
    weights
}

/// Level 0..=4 of a bar; each level spans 0.2, lower bound inclusive, so
/// 0.2 is level 1 and anything from 0.8 up is level 4.
pub fn quantize(value: f32) -> u8 {
    (value / 0.2).floor().clamp(0.0, 4.0) as u8
}
