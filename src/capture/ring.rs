/// Fixed-capacity circular sample buffer with a cumulative write counter.
pub struct SampleRing {
    samples: Vec<f32>,
    head: usize,
    read_count: u64,
}

impl SampleRing {
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sample ring needs a non-zero capacity");
        Self {
            samples: vec![0.0; capacity],
            head: 0,
            read_count: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.samples[self.head] = sample;
        self.head = (self.head + 1) % self.samples.len();
        self.read_count += 1;
    }

    pub fn push_slice(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.push(sample);
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn head_index(&self) -> usize {
        self.head
    }

    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }
}
