//! Fixed-capacity sample window with a running average.

use std::collections::VecDeque;

/// Ring of the most recent `capacity` samples.
///
/// Pushing into a full buffer evicts the oldest sample. The average is
/// only defined while at least one sample is present; an empty window
/// yields `None`, never zero.
#[derive(Debug)]
pub struct SampleBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleBuffer {
    /// Creates an empty buffer. Capacity must be non-zero; config
    /// validation rejects zero before any buffer is built.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: f64) {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Arithmetic mean of the current contents.
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
