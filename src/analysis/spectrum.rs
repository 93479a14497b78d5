use log::{debug, warn};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::scale::LogFrequencyScale;
use super::weighting::d_weighting;
use crate::error::ConfigError;

/// Frequency of the synthetic tone that defines 0 dB.
pub const CALIBRATION_FREQUENCY: f32 = 1000.0;

/// Axis labels in the order they are tried; earlier entries win when labels
/// would overlap.
const LABEL_FREQUENCIES: [f32; 30] = [
    100.0, 1000.0, 10000.0, 50.0, 500.0, 5000.0, 20.0, 200.0, 2000.0, 20000.0, 30.0, 300.0,
    3000.0, 40.0, 400.0, 4000.0, 60.0, 600.0, 6000.0, 70.0, 700.0, 7000.0, 80.0, 800.0, 8000.0,
    90.0, 900.0, 9000.0, 15000.0, 19000.0,
];

/// How the bins of one bucket are reduced to a single magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Aggregation {
    /// Loudest bin of the bucket.
    #[default]
    Max,
    /// Sum of all bins of the bucket.
    Sum,
}

/// Decibel conversion applied to the weighted magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DbScale {
    /// `20 * log10(x)`
    #[default]
    Amplitude,
    /// `10 * log10(x)`
    Power,
}

impl DbScale {
    fn factor(self) -> f32 {
        match self {
            DbScale::Amplitude => 20.0,
            DbScale::Power => 10.0,
        }
    }
}

/// Level policy of the analyzer. Fixed at construction since the
/// calibration constant depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelPolicy {
    pub aggregation: Aggregation,
    pub db_scale: DbScale,
}

/// Turns a window of samples into a perceptually weighted loudness
/// spectrum on a logarithmic frequency axis.
///
/// Every call to [`update`](Self::update) reads `input_size` samples,
/// applies a Hamming window, zero-pads to `fft_size` and runs a forward FFT.
/// The bins are grouped into `fft_size / 2 - 1` log-spaced buckets, weighted
/// with the D-curve and mapped from decibels to `[0, 1]`.
///
/// Levels are relative to `zero_level`, the loudest weighted bin produced
/// by a full-scale 1 kHz sine. It is measured once in [`new`](Self::new), so
/// the scale follows the gain of the transform itself rather than a fixed
/// physical reference.
pub struct SpectrumAnalyzer {
    input_size: usize,
    fft_size: usize,
    unit_freq: f32,
    policy: LevelPolicy,

    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    input: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,

    spectrum: Vec<f32>,
    zero_level: f32,
}

impl SpectrumAnalyzer {
    pub fn new(
        input_size: usize,
        fft_size: usize,
        sampling_frequency: u32,
        policy: LevelPolicy,
    ) -> Result<Self, ConfigError> {
        if fft_size < 4 || !fft_size.is_power_of_two() {
            return Err(ConfigError::FftSize {
                fft_size,
                expected: "a power of two no smaller than 4".to_string(),
            });
        }
        if input_size == 0 || input_size > fft_size {
            return Err(ConfigError::InputSize { input_size, fft_size });
        }
        if sampling_frequency == 0 {
            return Err(ConfigError::SamplingFrequency(sampling_frequency));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        let mut analyzer = Self {
            input_size,
            fft_size,
            unit_freq: sampling_frequency as f32 / fft_size as f32,
            policy,
            fft,
            window: Self::hamming_window(input_size),
            input: vec![0.0; input_size],
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch,
            magnitudes: vec![0.0; fft_size / 2 + 1],
            spectrum: vec![0.0; fft_size / 2 - 1],
            zero_level: 0.0,
        };

        analyzer.zero_level = analyzer.calibrate(sampling_frequency);
        debug!(
            "Calibrated zero level: {:.3} dB (fft_size={}, input_size={}, {:?})",
            analyzer.zero_level, fft_size, input_size, policy
        );

        Ok(analyzer)
    }

    fn hamming_window(size: usize) -> Vec<f32> {
        let denominator = size.saturating_sub(1).max(1) as f32;
        (0..size)
            .map(|i| {
                let t = i as f32 / denominator;
                0.54 - 0.46 * (2.0 * std::f32::consts::PI * t).cos()
            })
            .collect()
    }

    /// Runs a full-scale 1 kHz sine through the transform and returns the
    /// loudest D-weighted bin in dB.
    fn calibrate(&mut self, sampling_frequency: u32) -> f32 {
        let step = f64::from(CALIBRATION_FREQUENCY) / f64::from(sampling_frequency);
        for (i, sample) in self.input.iter_mut().enumerate() {
            let phase = (step * i as f64).fract();
            *sample = (2.0 * std::f64::consts::PI * phase).sin() as f32;
        }

        self.transform();

        let factor = self.policy.db_scale.factor();
        let zero_level = self
            .magnitudes
            .iter()
            .enumerate()
            .map(|(bin, &magnitude)| d_weighting(bin as f32 * self.unit_freq) * magnitude)
            .filter(|&weighted| weighted > 0.0)
            .map(|weighted| factor * weighted.log10())
            .fold(f32::NEG_INFINITY, f32::max);

        if zero_level.is_finite() {
            zero_level
        } else {
            // a window too short to hold any of the tone
            warn!("Calibration tone produced no energy, using 0 dB as zero level");
            0.0
        }
    }

    /// Analyze the `input_size` samples of `buffer` starting at
    /// `head_index`, wrapping around the end of the buffer.
    ///
    /// # Panics
    /// If `buffer` is shorter than the configured input size.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        buffer: &[f32],
        head_index: usize,
        min_level_db: f32,
        max_level_db: f32,
        freq_min: f32,
        freq_max: f32,
        log_base: f32,
    ) {
        assert!(
            buffer.len() >= self.input_size,
            "sample buffer holds {} samples, analyzer needs {}",
            buffer.len(),
            self.input_size
        );
        debug_assert!(min_level_db < max_level_db);

        let len = buffer.len();
        for (i, sample) in self.input.iter_mut().enumerate() {
            *sample = buffer[(head_index + i) % len];
        }

        self.transform();
        self.update_spectrum(min_level_db, max_level_db, freq_min, freq_max, log_base);
    }

    fn transform(&mut self) {
        let windowed = self.input.iter().zip(&self.window).map(|(&x, &w)| x * w);
        for (slot, value) in self.fft_buffer.iter_mut().zip(windowed) {
            *slot = Complex::new(value, 0.0);
        }
        for slot in &mut self.fft_buffer[self.input_size..] {
            *slot = Complex::new(0.0, 0.0);
        }

        self.fft.process_with_scratch(&mut self.fft_buffer, &mut self.scratch);

        let normalize = 2.0 / (self.fft_size / 2) as f32;
        for (magnitude, bin) in self.magnitudes.iter_mut().zip(&self.fft_buffer) {
            *magnitude = bin.norm() * normalize;
        }
    }

    fn update_spectrum(
        &mut self,
        min_level_db: f32,
        max_level_db: f32,
        freq_min: f32,
        freq_max: f32,
        log_base: f32,
    ) {
        let scale = LogFrequencyScale::new(freq_min, freq_max, log_base);
        let factor = self.policy.db_scale.factor();
        let floor_db = self.zero_level + min_level_db;
        let range = max_level_db - min_level_db;
        let last_bin = self.magnitudes.len() - 1;
        let bars = self.spectrum.len();

        for i in 0..bars {
            let t0 = i as f32 / bars as f32;
            let t1 = (i + 1) as f32 / bars as f32;

            let index0 = self.bin_index(scale.frequency(t0)).min(last_bin);
            let index1 = self.bin_index(scale.frequency(t1)).min(last_bin + 1);
            // inclusive; a collapsed range keeps the single bin index0
            let last = index1.saturating_sub(1).max(index0);

            let bucket = &self.magnitudes[index0..=last];
            let magnitude = match self.policy.aggregation {
                Aggregation::Max => bucket.iter().fold(0.0f32, |acc, &m| acc.max(m)),
                Aggregation::Sum => bucket.iter().sum(),
            };

            let center_freq = (index0 + last) as f32 * 0.5 * self.unit_freq;
            let weighted = d_weighting(center_freq) * magnitude;

            self.spectrum[i] = if weighted > 0.0 {
                let spl = factor * weighted.log10();
                (spl - floor_db).max(0.0).min(range) / range
            } else {
                0.0
            };
        }
    }

    fn bin_index(&self, freq: f32) -> usize {
        (freq / self.unit_freq).floor() as usize
    }

    /// Loudness per bar, each in `[0, 1]`, from the latest `update`.
    pub fn spectrum(&self) -> &[f32] {
        &self.spectrum
    }

    pub fn zero_level(&self) -> f32 {
        self.zero_level
    }

    /// Width of one FFT bin in Hz.
    pub fn unit_freq(&self) -> f32 {
        self.unit_freq
    }

    pub fn bar_count(&self) -> usize {
        self.spectrum.len()
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Axis labels as `(text, position)` pairs.
    ///
    /// The first two entries are always the endpoints at positions 0 and 1.
    /// The rest follow in placement priority and only cover frequencies
    /// strictly between `freq_min` and `freq_max`.
    pub fn labels(freq_min: f32, freq_max: f32, log_base: f32) -> Vec<(String, f32)> {
        let scale = LogFrequencyScale::new(freq_min, freq_max, log_base);

        let mut labels = vec![
            (format_frequency(freq_min), 0.0),
            (format_frequency(freq_max), 1.0),
        ];
        labels.extend(
            LABEL_FREQUENCIES
                .iter()
                .filter(|&&freq| freq_min < freq && freq < freq_max)
                .map(|&freq| (format_frequency(freq), scale.abscissa(freq))),
        );
        labels
    }
}

fn format_frequency(freq: f32) -> String {
    let (value, suffix) = if freq >= 1000.0 {
        (freq / 1000.0, "k")
    } else {
        (freq, "")
    };

    if (value - value.round()).abs() < 1e-3 {
        format!("{:.0}{}", value, suffix)
    } else {
        format!("{:.1}{}", value, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 48000;

    fn sine(freq: f32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    fn noise(len: usize) -> Vec<f32> {
        let mut state: u32 = 0x1234_5678;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
            })
            .collect()
    }

    fn default_analyzer() -> SpectrumAnalyzer {
        SpectrumAnalyzer::new(2048, 8192, SAMPLE_RATE, LevelPolicy::default()).unwrap()
    }

    fn run(analyzer: &mut SpectrumAnalyzer, buffer: &[f32]) -> Vec<f32> {
        analyzer.update(buffer, 0, -30.0, -6.0, 30.0, 5000.0, 10.0);
        analyzer.spectrum().to_vec()
    }

    #[test]
    fn test_rejects_invalid_sizes() {
        let policy = LevelPolicy::default();
        assert!(matches!(
            SpectrumAnalyzer::new(1000, 3000, SAMPLE_RATE, policy),
            Err(ConfigError::FftSize { fft_size: 3000, .. })
        ));
        assert!(matches!(
            SpectrumAnalyzer::new(4096, 2048, SAMPLE_RATE, policy),
            Err(ConfigError::InputSize { input_size: 4096, fft_size: 2048 })
        ));
        assert!(matches!(
            SpectrumAnalyzer::new(0, 2048, SAMPLE_RATE, policy),
            Err(ConfigError::InputSize { .. })
        ));
        assert!(matches!(
            SpectrumAnalyzer::new(1024, 2048, 0, policy),
            Err(ConfigError::SamplingFrequency(0))
        ));
    }

    #[test]
    fn test_spectrum_length_and_range() {
        for (input_size, fft_size) in [(16, 16), (100, 256), (2048, 8192), (4096, 4096)] {
            let mut analyzer =
                SpectrumAnalyzer::new(input_size, fft_size, SAMPLE_RATE, LevelPolicy::default())
                    .unwrap();
            assert_eq!(analyzer.bar_count(), fft_size / 2 - 1);

            let spectrum = run(&mut analyzer, &noise(input_size));
            assert_eq!(spectrum.len(), fft_size / 2 - 1);
            assert!(spectrum.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_silence_is_zero() {
        let mut analyzer = default_analyzer();
        let spectrum = run(&mut analyzer, &vec![0.0; 2048]);
        assert!(spectrum.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_calibration_tone_peaks_at_1khz() {
        let mut analyzer = default_analyzer();
        assert!(analyzer.zero_level().is_finite());

        let spectrum = run(&mut analyzer, &sine(1000.0, 2048, 1.0));
        let scale = LogFrequencyScale::new(30.0, 5000.0, 10.0);
        let bars = spectrum.len();

        let bar_of = |freq: f32| (scale.abscissa(freq) * bars as f32).floor() as usize;
        assert!(spectrum[bar_of(1000.0)] > 0.95, "peak {}", spectrum[bar_of(1000.0)]);

        for (i, &value) in spectrum.iter().enumerate() {
            let freq = scale.frequency(i as f32 / bars as f32);
            if !(500.0..=2000.0).contains(&freq) {
                assert_eq!(value, 0.0, "bar {} at {:.1} Hz", i, freq);
            }
        }
    }

    #[test]
    fn test_quiet_tone_is_attenuated() {
        let mut analyzer = default_analyzer();
        // -18 dB below the calibration tone sits in the middle of [-30, -6]
        let amplitude = 10f32.powf(-18.0 / 20.0);
        let value = peak(&run(&mut analyzer, &sine(1000.0, 2048, amplitude)));
        assert!((value - 0.5).abs() < 0.05, "peak {}", value);
    }

    #[test]
    fn test_head_index_wraps() {
        let mut analyzer = default_analyzer();
        let signal = sine(440.0, 2048, 0.5);

        let expected = run(&mut analyzer, &signal);

        let head = 700;
        let mut rotated = vec![0.0; 2048];
        for (i, &sample) in signal.iter().enumerate() {
            rotated[(head + i) % 2048] = sample;
        }
        analyzer.update(&rotated, head, -30.0, -6.0, 30.0, 5000.0, 10.0);

        assert_eq!(analyzer.spectrum(), expected.as_slice());
    }

    #[test]
    fn test_reads_only_input_size_from_longer_buffer() {
        let mut analyzer = default_analyzer();
        let mut buffer = sine(440.0, 2048, 0.5);
        let expected = run(&mut analyzer, &buffer);

        buffer.extend(noise(2048));
        assert_eq!(run(&mut analyzer, &buffer), expected);
    }

    #[test]
    fn test_deterministic() {
        let mut analyzer = default_analyzer();
        let signal = noise(2048);
        let first = run(&mut analyzer, &signal);
        let second = run(&mut analyzer, &signal);
        assert_eq!(first, second);
    }

    #[test]
    fn test_sum_aggregation_is_never_quieter() {
        let mut max_analyzer = default_analyzer();
        let mut sum_analyzer = SpectrumAnalyzer::new(
            2048,
            8192,
            SAMPLE_RATE,
            LevelPolicy {
                aggregation: Aggregation::Sum,
                db_scale: DbScale::Amplitude,
            },
        )
        .unwrap();
        assert_eq!(max_analyzer.zero_level(), sum_analyzer.zero_level());

        let signal = noise(2048);
        let max_spectrum = run(&mut max_analyzer, &signal);
        let sum_spectrum = run(&mut sum_analyzer, &signal);
        for (m, s) in max_spectrum.iter().zip(&sum_spectrum) {
            assert!(s >= m);
        }
    }

    #[test]
    fn test_power_scale_halves_calibration() {
        let amplitude = default_analyzer().zero_level();
        let power = SpectrumAnalyzer::new(
            2048,
            8192,
            SAMPLE_RATE,
            LevelPolicy {
                aggregation: Aggregation::Max,
                db_scale: DbScale::Power,
            },
        )
        .unwrap()
        .zero_level();
        assert!((amplitude - 2.0 * power).abs() < 1e-3);
    }

    #[test]
    fn test_single_sample_input() {
        let mut analyzer =
            SpectrumAnalyzer::new(1, 16, SAMPLE_RATE, LevelPolicy::default()).unwrap();
        assert!(analyzer.zero_level().is_finite());
        let spectrum = run(&mut analyzer, &[0.5]);
        assert!(spectrum.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    #[should_panic(expected = "analyzer needs 2048")]
    fn test_short_buffer_panics() {
        let mut analyzer = default_analyzer();
        analyzer.update(&[0.0; 1024], 0, -30.0, -6.0, 30.0, 5000.0, 10.0);
    }

    fn peak(spectrum: &[f32]) -> f32 {
        spectrum.iter().fold(0.0f32, |a, &b| a.max(b))
    }

    #[test]
    fn test_power_scale_compresses_levels() {
        let mut analyzer = SpectrumAnalyzer::new(
            2048,
            8192,
            SAMPLE_RATE,
            LevelPolicy {
                aggregation: Aggregation::Max,
                db_scale: DbScale::Power,
            },
        )
        .unwrap();
        // -18 dB in amplitude is -9 dB in power, (30 - 9) / 24 of the way up
        let amplitude = 10f32.powf(-18.0 / 20.0);
        let value = peak(&run(&mut analyzer, &sine(1000.0, 2048, amplitude)));
        assert!((value - 0.875).abs() < 0.03, "peak {}", value);
    }

    #[test]
    fn test_sum_aggregation_adds_bucket_bins() {
        let sum_policy = LevelPolicy {
            aggregation: Aggregation::Sum,
            db_scale: DbScale::Amplitude,
        };
        let mut sum_analyzer = SpectrumAnalyzer::new(16, 16, SAMPLE_RATE, sum_policy).unwrap();
        let mut max_analyzer =
            SpectrumAnalyzer::new(16, 16, SAMPLE_RATE, LevelPolicy::default()).unwrap();
        let signal = noise(16);
        sum_analyzer.update(&signal, 0, -60.0, 0.0, 30.0, 20000.0, 10.0);
        max_analyzer.update(&signal, 0, -60.0, 0.0, 30.0, 20000.0, 10.0);

        // 3 kHz bins; the top bar spans roughly 9.8-20 kHz, bins 3 to 5
        assert_eq!(sum_analyzer.bar_count(), 7);
        let scale = LogFrequencyScale::new(30.0, 20000.0, 10.0);
        assert_eq!((scale.frequency(6.0 / 7.0) / sum_analyzer.unit_freq()).floor(), 3.0);

        let bins = &sum_analyzer.magnitudes[3..=5];
        let total: f32 = bins.iter().sum();
        let spl = 20.0 * (d_weighting(12000.0) * total).log10();
        let expected = (spl - (sum_analyzer.zero_level() - 60.0)).max(0.0).min(60.0) / 60.0;

        let top = sum_analyzer.spectrum()[6];
        assert!(expected > 0.0 && expected < 1.0, "expected {}", expected);
        assert!((top - expected).abs() < 1e-5, "{} vs {}", top, expected);
        assert!(top > max_analyzer.spectrum()[6]);
    }

    #[test]
    fn test_weighting_follows_bucket_frequency() {
        let mut analyzer = default_analyzer();
        let amplitude = 10f32.powf(-24.0 / 20.0);

        let at_1khz = peak(&run(&mut analyzer, &sine(1000.0, 2048, amplitude)));
        let at_3khz = peak(&run(&mut analyzer, &sine(3000.0, 2048, amplitude)));

        // D-weighting lifts 3 kHz by about 11.4 dB
        assert!((at_1khz - 0.25).abs() < 0.03, "1 kHz peak {}", at_1khz);
        assert!((at_3khz - 0.725).abs() < 0.04, "3 kHz peak {}", at_3khz);
    }

    fn label_frequency(text: &str) -> f32 {
        match text.strip_suffix('k') {
            Some(kilo) => kilo.parse::<f32>().unwrap() * 1000.0,
            None => text.parse().unwrap(),
        }
    }

    #[test]
    fn test_labels_endpoints_first() {
        let labels = SpectrumAnalyzer::labels(30.0, 5000.0, 10.0);
        assert_eq!(labels[0], ("30".to_string(), 0.0));
        assert_eq!(labels[1], ("5k".to_string(), 1.0));
        assert_eq!(labels[2].0, "100");
        assert_eq!(labels[3].0, "1k");
        assert!(labels.iter().all(|(text, _)| text != "10k" && text != "20"));
        assert_eq!(labels.iter().filter(|(text, _)| text == "30").count(), 1);
    }

    #[test]
    fn test_label_positions_are_monotonic() {
        for base in [2.0, 10.0, 30.0] {
            let mut labels = SpectrumAnalyzer::labels(20.0, 19500.0, base);
            labels.sort_by(|a, b| label_frequency(&a.0).total_cmp(&label_frequency(&b.0)));

            for pair in labels.windows(2) {
                assert!(pair[0].1 < pair[1].1, "{:?} then {:?}", pair[0], pair[1]);
            }
            assert!(labels.iter().all(|(_, pos)| (0.0..=1.0).contains(pos)));
        }
    }

    #[test]
    fn test_format_frequency() {
        assert_eq!(format_frequency(30.0), "30");
        assert_eq!(format_frequency(1000.0), "1k");
        assert_eq!(format_frequency(1500.0), "1.5k");
        assert_eq!(format_frequency(22.5), "22.5");
    }
}
