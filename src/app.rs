use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use crate::analysis::SpectrumAnalyzer;
use crate::capture::AudioSource;
use crate::error::ConfigError;
use crate::options::Options;
use crate::render::{axis, Renderer};

/// Frame-paced driver tying an audio source to the analyzer and renderer.
pub struct App {
    options: Options,
    analyzer: SpectrumAnalyzer,
    renderer: Renderer,
    last_read_count: u64,
}

impl App {
    pub fn new(mut options: Options, sample_rate: u32) -> Result<Self, ConfigError> {
        options.validate()?;

        let nyquist = sample_rate as f32 / 2.0;
        if options.upper_freq > nyquist {
            warn!(
                "Upper frequency {} Hz is above the Nyquist frequency, clamping to {} Hz",
                options.upper_freq, nyquist
            );
            options.upper_freq = nyquist;
            if options.lower_freq >= options.upper_freq {
                return Err(ConfigError::FrequencyRange {
                    lower: options.lower_freq,
                    upper: options.upper_freq,
                });
            }
        }

        let analyzer = SpectrumAnalyzer::new(
            options.input_size,
            options.fft_size,
            sample_rate,
            options.level_policy(),
        )?;
        let renderer = Renderer::new(options.chars, options.line_feed, options.display_axis());

        info!(
            "Spectrum: {} bars over {}-{} Hz, {} dB to {} dB, {} glyphs",
            analyzer.bar_count(),
            options.lower_freq,
            options.upper_freq,
            options.bottom_db,
            options.top_db,
            options.chars
        );

        Ok(Self {
            options,
            analyzer,
            renderer,
            last_read_count: 0,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn analyzer(&self) -> &SpectrumAnalyzer {
        &self.analyzer
    }

    /// The two axis lines matching the current frequency range.
    pub fn axis(&self) -> String {
        let labels = SpectrumAnalyzer::labels(
            self.options.lower_freq,
            self.options.upper_freq,
            self.options.axis_log_base,
        );
        axis::render(self.options.chars, &labels)
    }

    /// Pull new samples and draw a line if a full frame has arrived since
    /// the last one. Returns whether a line was drawn.
    pub fn step<S: AudioSource, W: Write>(&mut self, source: &mut S, out: &mut W) -> Result<bool> {
        source.update()?;

        let read_count = source.buffer_read_count();
        let fresh = read_count.saturating_sub(self.last_read_count);
        if fresh <= self.options.input_size as u64 {
            debug!("{} new samples, waiting for more than {}", fresh, self.options.input_size);
            return Ok(false);
        }

        self.draw_frame(source, out)?;
        Ok(true)
    }

    fn draw_frame<S: AudioSource, W: Write>(&mut self, source: &S, out: &mut W) -> Result<()> {
        self.analyzer.update(
            source.buffer(),
            source.buffer_head_index(),
            self.options.bottom_db,
            self.options.top_db,
            self.options.lower_freq,
            self.options.upper_freq,
            self.options.axis_log_base,
        );
        self.renderer
            .draw(
                out,
                self.analyzer.spectrum(),
                self.options.gaussian_diameter,
                self.options.smoothing,
            )
            .context("Failed to write spectrum")?;

        self.last_read_count = source.buffer_read_count();
        Ok(())
    }

    /// Run frames until the source is finished.
    ///
    /// Samples that arrived after the last line but never filled a whole
    /// frame are drawn once more before returning, so the end of a file is
    /// always shown.
    pub fn run<S: AudioSource, W: Write>(&mut self, source: &mut S, out: &mut W) -> Result<()> {
        if self.options.display_axis() {
            out.write_all(self.axis().as_bytes())
                .context("Failed to write axis")?;
        }

        let frame_time = Duration::from_secs_f64(1.0 / f64::from(self.options.fps));
        loop {
            let started = Instant::now();
            self.step(source, out)?;

            if source.is_finished() {
                if source.buffer_read_count() > self.last_read_count {
                    self.draw_frame(source, out)?;
                }
                info!("Audio source finished");
                break;
            }

            if let Some(rest) = frame_time.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }

        writeln!(out).context("Failed to write spectrum")?;
        Ok(())
    }
}
