use anyhow::{Context, Result};
use log::info;
use std::path::Path;
use std::time::Instant;

use super::{AudioSource, SampleRing};

/// Replays a WAV file in real time.
///
/// The file is decoded up front and downmixed to mono. Each `update`
/// releases the samples whose playback time has passed since the first
/// call, so the spectrum moves at the speed the file would play.
pub struct WavFileSource {
    samples: Vec<f32>,
    position: usize,
    ring: SampleRing,
    sample_rate: u32,
    started: Option<Instant>,
}

impl WavFileSource {
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        let path = path.as_ref();
        let reader = hound::WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .context("Failed to decode WAV samples")?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|sample| sample.map(|s| s as f32 / scale))
                    .collect::<Result<_, _>>()
                    .context("Failed to decode WAV samples")?
            }
        };

        let samples: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        info!(
            "Loaded {}: {} channels at {} Hz, {:.2} seconds",
            path.display(),
            spec.channels,
            spec.sample_rate,
            samples.len() as f32 / spec.sample_rate.max(1) as f32
        );

        Ok(Self::from_samples(samples, spec.sample_rate, capacity))
    }

    /// Source over already decoded mono samples.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, capacity: usize) -> Self {
        Self {
            samples,
            position: 0,
            ring: SampleRing::new(capacity),
            sample_rate,
            started: None,
        }
    }

    /// Push up to `count` further samples into the ring.
    pub fn release(&mut self, count: usize) {
        let end = (self.position + count).min(self.samples.len());
        self.ring.push_slice(&self.samples[self.position..end]);
        self.position = end;
    }

    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }
}

impl AudioSource for WavFileSource {
    fn update(&mut self) -> Result<()> {
        let started = *self.started.get_or_insert_with(Instant::now);
        let due = (started.elapsed().as_secs_f64() * f64::from(self.sample_rate)) as usize;
        self.release(due.saturating_sub(self.position));
        Ok(())
    }

    fn buffer(&self) -> &[f32] {
        self.ring.samples()
    }

    fn buffer_head_index(&self) -> usize {
        self.ring.head_index()
    }

    fn buffer_read_count(&self) -> u64 {
        self.ring.read_count()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_finished(&self) -> bool {
        self.position >= self.samples.len()
    }
}
