pub mod device;
pub mod ring;
pub mod wav;

use anyhow::Result;

pub use device::DeviceCapture;
pub use ring::SampleRing;
pub use wav::WavFileSource;

/// A producer of mono samples in `[-1, 1]` stored in a ring buffer.
///
/// The frame loop calls [`update`](Self::update) once per frame and then
/// reads the buffer. Implementations must never block in `update`; when no
/// new samples are available the buffer simply stays as it was.
pub trait AudioSource {
    /// Move pending samples into the ring buffer.
    fn update(&mut self) -> Result<()>;

    /// The whole ring buffer, in storage order.
    fn buffer(&self) -> &[f32];

    /// Index of the next write, which is also the oldest sample once the
    /// buffer has wrapped.
    fn buffer_head_index(&self) -> usize;

    /// Number of samples written since the source was created.
    fn buffer_read_count(&self) -> u64;

    fn sample_rate(&self) -> u32;

    /// True once the source can never produce more samples.
    fn is_finished(&self) -> bool {
        false
    }
}
