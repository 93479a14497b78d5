/// Logarithmic frequency axis.
///
/// Positions `t` in `[0, 1]` map to frequencies through
/// `freq(t) = (lo + t * (hi - lo))^base` where `lo = freq_min^(1/base)` and
/// `hi = freq_max^(1/base)`. Larger bases spend more of the axis on low
/// frequencies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogFrequencyScale {
    log_base: f32,
    log_freq_min: f32,
    log_freq_max: f32,
}

impl LogFrequencyScale {
    pub fn new(freq_min: f32, freq_max: f32, log_base: f32) -> Self {
        Self {
            log_base,
            log_freq_min: freq_min.powf(1.0 / log_base),
            log_freq_max: freq_max.powf(1.0 / log_base),
        }
    }

    /// Frequency (Hz) at axis position `t`.
    pub fn frequency(&self, t: f32) -> f32 {
        let log_freq = self.log_freq_min + (self.log_freq_max - self.log_freq_min) * t;
        log_freq.powf(self.log_base)
    }

    /// Axis position of `freq`, the inverse of [`frequency`](Self::frequency).
    pub fn abscissa(&self, freq: f32) -> f32 {
        (freq.powf(1.0 / self.log_base) - self.log_freq_min)
            / (self.log_freq_max - self.log_freq_min)
    }
}
