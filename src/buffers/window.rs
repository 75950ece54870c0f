use crate::core::FrameSample;

/// Fixed-capacity FIFO of the most recent samples.
///
/// Storage is allocated once; once full, each push overwrites the oldest slot
/// and advances `head`, so insertion and eviction are O(1).
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    samples: Vec<FrameSample>,
    capacity: usize,
    /// Index of the oldest sample once the window has wrapped
    head: usize,
    /// Running sum of the stored values, resynced once per wrap
    sum: f64,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be non-zero");
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            sum: 0.0,
        }
    }

    /// Append a sample, returning the evicted oldest one when full
    pub fn push(&mut self, sample: FrameSample) -> Option<FrameSample> {
        if self.samples.len() < self.capacity {
            self.sum += sample.value;
            self.samples.push(sample);
            return None;
        }

        let evicted = std::mem::replace(&mut self.samples[self.head], sample);
        self.head = (self.head + 1) % self.capacity;
        if self.head == 0 {
            // Bound the drift of the incremental sum
            self.sum = self.samples.iter().map(|s| s.value).sum();
        } else {
            self.sum += sample.value - evicted.value;
        }
        Some(evicted)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples oldest-first
    pub fn iter(&self) -> impl Iterator<Item = &FrameSample> + '_ {
        let (newer, older) = self.samples.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    pub fn latest(&self) -> Option<&FrameSample> {
        if self.samples.is_empty() {
            return None;
        }
        let idx = (self.head + self.samples.len() - 1) % self.samples.len();
        self.samples.get(idx)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.sum / self.samples.len() as f64)
    }

    /// Values oldest-first, written into a caller-owned buffer
    pub fn copy_values_into(&self, out: &mut Vec<f64>) {
        out.clear();
        out.extend(self.iter().map(|s| s.value));
    }

    pub fn as_sequence(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.samples.len());
        self.copy_values_into(&mut out);
        out
    }
}
