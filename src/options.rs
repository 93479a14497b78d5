use clap::Parser;
use std::path::PathBuf;

use crate::analysis::{Aggregation, DbScale, LevelPolicy};
use crate::error::ConfigError;
use crate::render::LineFeed;

/// Smallest and largest accepted FFT sizes, as powers of two.
const FFT_EXP_MIN: u32 = 4;
const FFT_EXP_MAX: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "brailleviz")]
#[command(about = "A tiny, embeddable command-line sound visualizer", long_about = None)]
pub struct Options {
    /// Draw the spectrum using N characters
    #[arg(short = 'c', long = "chars", value_name = "N", default_value_t = 32)]
    pub chars: usize,

    /// The maximum intensity (dB) of the spectrum to be displayed
    #[arg(short = 't', long = "top_db", value_name = "x", default_value_t = -6.0, allow_negative_numbers = true)]
    pub top_db: f32,

    /// The minimum intensity (dB) of the spectrum to be displayed
    #[arg(short = 'b', long = "bottom_db", value_name = "x", default_value_t = -30.0, allow_negative_numbers = true)]
    pub bottom_db: f32,

    /// Minimum cutoff frequency (Hz)
    #[arg(short = 'l', long = "lower_freq", value_name = "x", default_value_t = 30.0)]
    pub lower_freq: f32,

    /// Maximum cutoff frequency (Hz)
    #[arg(short = 'u', long = "upper_freq", value_name = "x", default_value_t = 5000.0)]
    pub upper_freq: f32,

    /// FFT sample size, a power of two
    #[arg(short = 'f', long = "fft_size", value_name = "N", default_value_t = 8192)]
    pub fft_size: usize,

    /// Input sample size, N <= fft_size
    #[arg(short = 'i', long = "input_size", value_name = "N", default_value_t = 2048)]
    pub input_size: usize,

    /// Blur each spectrum bar with the surrounding N bars
    #[arg(short = 'g', long = "gaussian_diameter", value_name = "N", default_value_t = 1)]
    pub gaussian_diameter: usize,

    /// x in (0.0, 1.0] is the weight of the latest frame; 1.0 always shows the latest value
    #[arg(short = 's', long = "smoothing", value_name = "x", default_value_t = 0.5)]
    pub smoothing: f32,

    /// Display the frequency axis
    #[arg(short = 'a', long = "axis", value_enum, ignore_case = true, default_value = "on")]
    pub axis: Switch,

    /// Logarithm base of the horizontal axis
    #[arg(long = "axis_log_base", value_name = "x", default_value_t = 10.0)]
    pub axis_log_base: f32,

    /// Line terminator written between frames
    #[arg(long = "line_feed", value_enum, ignore_case = true, default_value = "CR")]
    pub line_feed: LineFeed,

    /// Target frames per second
    #[arg(long = "fps", value_name = "N", default_value_t = 60)]
    pub fps: u32,

    /// How the FFT bins of one bar are combined
    #[arg(long = "aggregation", value_enum, default_value = "max")]
    pub aggregation: Aggregation,

    /// Decibel scale: amplitude (20 log10) or power (10 log10)
    #[arg(long = "db_scale", value_enum, default_value = "amplitude")]
    pub db_scale: DbScale,

    /// Replay a WAV file instead of capturing from the audio device
    #[arg(long = "wav", value_name = "FILE")]
    pub wav: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            chars: 32,
            top_db: -6.0,
            bottom_db: -30.0,
            lower_freq: 30.0,
            upper_freq: 5000.0,
            fft_size: 8192,
            input_size: 2048,
            gaussian_diameter: 1,
            smoothing: 0.5,
            axis: Switch::On,
            axis_log_base: 10.0,
            line_feed: LineFeed::Cr,
            fps: 60,
            aggregation: Aggregation::Max,
            db_scale: DbScale::Amplitude,
            wav: None,
        }
    }
}

impl Options {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bottom_db > 0.0 {
            return Err(ConfigError::BottomLevelPositive(self.bottom_db));
        }
        if self.top_db > 0.0 {
            return Err(ConfigError::TopLevelPositive(self.top_db));
        }
        if self.bottom_db >= self.top_db {
            return Err(ConfigError::LevelRangeEmpty {
                bottom: self.bottom_db,
                top: self.top_db,
            });
        }

        let accepted = accepted_fft_sizes();
        if !accepted.contains(&self.fft_size) {
            let list = accepted.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ");
            return Err(ConfigError::FftSize {
                fft_size: self.fft_size,
                expected: format!("one of {{{}}}", list),
            });
        }
        if self.input_size == 0 || self.input_size > self.fft_size {
            return Err(ConfigError::InputSize {
                input_size: self.input_size,
                fft_size: self.fft_size,
            });
        }

        if !(self.lower_freq > 0.0 && self.lower_freq < self.upper_freq) {
            return Err(ConfigError::FrequencyRange {
                lower: self.lower_freq,
                upper: self.upper_freq,
            });
        }
        if self.chars == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if self.gaussian_diameter == 0 {
            return Err(ConfigError::ZeroGaussianDiameter);
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ConfigError::Smoothing(self.smoothing));
        }
        if !(self.axis_log_base > 0.0) {
            return Err(ConfigError::LogBase(self.axis_log_base));
        }
        if self.fps == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }

        Ok(())
    }

    pub fn display_axis(&self) -> bool {
        self.axis == Switch::On
    }

    pub fn level_policy(&self) -> LevelPolicy {
        LevelPolicy {
            aggregation: self.aggregation,
            db_scale: self.db_scale,
        }
    }
}

fn accepted_fft_sizes() -> Vec<usize> {
    (FFT_EXP_MIN..=FFT_EXP_MAX).map(|exp| 1usize << exp).collect()
}
