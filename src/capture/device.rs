use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig, SupportedStreamConfig};
use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};

use super::{AudioSource, SampleRing};

/// Live capture from the default audio device.
///
/// On Windows the default output device is opened for capture, which WASAPI
/// serves as a loopback of everything being played. Elsewhere the default
/// input device is used; with PulseAudio or PipeWire, select the monitor of
/// the output sink as the default source to visualize playback.
///
/// The stream callback downmixes to mono and hands chunks over a channel.
/// [`update`](AudioSource::update) drains that channel into the ring on the
/// caller's thread, so the ring is never shared with the callback.
pub struct DeviceCapture {
    #[allow(dead_code)]
    stream: Stream,
    receiver: Receiver<Vec<f32>>,
    ring: SampleRing,
    sample_rate: u32,
}

impl DeviceCapture {
    pub fn new(capacity: usize) -> Result<Self> {
        let host = cpal::default_host();
        let (device, config) = Self::pick_device(&host)?;

        info!("Using audio device: {}", device.name().unwrap_or_else(|_| "Unknown".to_string()));
        info!("Audio config: {:?}", config);

        let sample_rate = config.sample_rate().0;
        let sample_format = config.sample_format();
        let (sender, receiver) = crossbeam_channel::unbounded();

        let stream = Self::create_input_stream(&device, &config.into(), sample_format, sender)?;
        stream.play().context("Failed to start audio stream")?;

        Ok(Self {
            stream,
            receiver,
            ring: SampleRing::new(capacity),
            sample_rate,
        })
    }

    fn pick_device(host: &cpal::Host) -> Result<(Device, SupportedStreamConfig)> {
        if cfg!(target_os = "windows") {
            if let Some(device) = host.default_output_device() {
                match device.default_output_config() {
                    Ok(config) => return Ok((device, config)),
                    Err(e) => warn!("Loopback capture unavailable, falling back to input: {}", e),
                }
            }
        }

        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("No input device available"))?;
        let config = device
            .default_input_config()
            .context("Failed to get default input config")?;
        Ok((device, config))
    }

    fn create_input_stream(
        device: &Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        sender: Sender<Vec<f32>>,
    ) -> Result<Stream> {
        info!(
            "Creating input stream with {} channels at {} Hz ({:?})",
            config.channels, config.sample_rate.0, sample_format
        );

        match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(device, config, sender),
            SampleFormat::F64 => Self::build_stream::<f64>(device, config, sender),
            SampleFormat::I8 => Self::build_stream::<i8>(device, config, sender),
            SampleFormat::I16 => Self::build_stream::<i16>(device, config, sender),
            SampleFormat::I32 => Self::build_stream::<i32>(device, config, sender),
            SampleFormat::I64 => Self::build_stream::<i64>(device, config, sender),
            SampleFormat::U8 => Self::build_stream::<u8>(device, config, sender),
            SampleFormat::U16 => Self::build_stream::<u16>(device, config, sender),
            SampleFormat::U32 => Self::build_stream::<u32>(device, config, sender),
            SampleFormat::U64 => Self::build_stream::<u64>(device, config, sender),
            other => Err(anyhow!("Unsupported sample format: {:?}", other)),
        }
    }

    fn build_stream<T>(device: &Device, config: &StreamConfig, sender: Sender<Vec<f32>>) -> Result<Stream>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let channels = usize::from(config.channels.max(1));

        let stream = device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if sender.send(downmix(data, channels)).is_err() {
                    warn!("Failed to send audio data");
                }
            },
            |err| {
                warn!("Audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}

/// Average interleaved frames of any cpal sample type into mono `f32`.
fn downmix<T>(data: &[T], channels: usize) -> Vec<f32>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    data.chunks(channels.max(1))
        .map(|frame| frame.iter().map(|&s| f32::from_sample(s)).sum::<f32>() / frame.len() as f32)
        .collect()
}

impl AudioSource for DeviceCapture {
    fn update(&mut self) -> Result<()> {
        // a disconnected channel means the stream died; keep the last buffer
        while let Ok(chunk) = self.receiver.try_recv() {
            self.ring.push_slice(&chunk);
        }
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
}
