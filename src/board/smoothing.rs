//! # Rolling Average Smoothing
//!
//! Fixed-capacity ring buffer over the most recent per-quadrant weight
//! conversions. The reported weight for a quadrant is the mean of its
//! window. Pushing into a full window evicts the oldest value in O(1);
//! taring clears the window outright.

/// Bounded FIFO of recent weight conversions with O(1) eviction.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    samples: Vec<f32>,
    capacity: usize,
    /// Index of the slot the next push writes to, once the window is full.
    next: usize,
}

impl SmoothingWindow {
    /// Creates a window holding at most `capacity` samples.
    ///
    /// A capacity of zero is clamped to one so the window always reports
    /// the latest value.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    /// Push a sample, evicting the oldest if the window is full.
    pub fn push(&mut self, value: f32) {
        if self.samples.len() < self.capacity {
            self.samples.push(value);
        } else {
            self.samples[self.next] = value;
            self.next = (self.next + 1) % self.capacity;
        }
    }

    /// Mean of the samples currently in the window, or 0 when empty.
    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    /// Number of samples currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop all samples, e.g. after a tare.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.next = 0;
    }
}
