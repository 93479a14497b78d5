use thiserror::Error;

/// Rejected configuration, reported before the pipeline starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("--bottom_db '{0}' is invalid parameter. bottom_db should be smaller than 0.")]
    BottomLevelPositive(f32),

    #[error("--top_db '{0}' is invalid parameter. top_db should be smaller than 0.")]
    TopLevelPositive(f32),

    #[error("--bottom_db '{bottom}' must be smaller than --top_db '{top}'.")]
    LevelRangeEmpty { bottom: f32, top: f32 },

    #[error("--fft_size '{fft_size}' is invalid parameter. fft_size must be {expected}.")]
    FftSize { fft_size: usize, expected: String },

    #[error("--input_size '{input_size}' is invalid parameter. input_size must be in 1..={fft_size}.")]
    InputSize { input_size: usize, fft_size: usize },

    #[error("--lower_freq '{lower}' and --upper_freq '{upper}' must satisfy 0 < lower_freq < upper_freq.")]
    FrequencyRange { lower: f32, upper: f32 },

    #[error("--chars must be at least 1.")]
    ZeroWidth,

    #[error("--gaussian_diameter must be at least 1.")]
    ZeroGaussianDiameter,

    #[error("--smoothing '{0}' is invalid parameter. smoothing must be in (0.0, 1.0].")]
    Smoothing(f32),

    #[error("--axis_log_base '{0}' is invalid parameter. axis_log_base must be positive.")]
    LogBase(f32),

    #[error("--fps must be at least 1.")]
    ZeroFrameRate,

    #[error("sampling frequency must be positive, got {0}.")]
    SamplingFrequency(u32),
}
