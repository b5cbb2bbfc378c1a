//! Bounded rolling window of samples.

use pulse_core::Sample;
use std::collections::VecDeque;

/// Default number of samples retained.
pub const DEFAULT_WINDOW_CAPACITY: usize = 20;

/// FIFO window holding at most `capacity` samples, oldest first.
///
/// After every mutation exactly the last sample carries `is_newest = true`.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl RollingWindow {
    /// Create an empty window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Replace the window wholesale, keeping only the last `capacity` samples.
    pub fn reset(&mut self, initial: Vec<Sample>) {
        let skip = initial.len().saturating_sub(self.capacity);
        self.samples.clear();
        self.samples.extend(initial.into_iter().skip(skip));
        self.mark_newest();
    }

    /// Append a sample, evicting from the front past capacity.
    pub fn append(&mut self, sample: Sample) {
        if let Some(prev) = self.samples.back_mut() {
            prev.is_newest = false;
        }
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        self.mark_newest();
    }

    /// Snapshot ordered oldest to newest.
    pub fn current(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// The sample before the latest one.
    pub fn previous(&self) -> Option<&Sample> {
        let len = self.samples.len();
        if len < 2 {
            return None;
        }
        self.samples.get(len - 2)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    fn mark_newest(&mut self) {
        let last = self.samples.len().saturating_sub(1);
        for (i, sample) in self.samples.iter_mut().enumerate() {
            sample.is_newest = i == last;
        }
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
