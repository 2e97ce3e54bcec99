//! Per-episode convergence trace

use serde::{Deserialize, Serialize};

/// Mean steps-to-near-goal over all states, recorded after one episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceSample {
    pub episode: usize,
    pub mean_steps: f64,
}

/// Ordered samples, one per completed episode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceTrace {
    samples: Vec<TraceSample>,
}

impl ConvergenceTrace {
    pub fn with_capacity(episodes: usize) -> Self {
        Self {
            samples: Vec::with_capacity(episodes),
        }
    }

    pub fn push(&mut self, episode: usize, mean_steps: f64) {
        self.samples.push(TraceSample {
            episode,
            mean_steps,
        });
    }

    pub fn samples(&self) -> &[TraceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&TraceSample> {
        self.samples.last()
    }

    /// Mean of the last `window` samples
    pub fn tail_mean(&self, window: usize) -> Option<f64> {
        let window = window.min(self.samples.len());
        if window == 0 {
            return None;
        }
        let tail = &self.samples[self.samples.len() - window..];
        Some(tail.iter().map(|s| s.mean_steps).sum::<f64>() / window as f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraceSample> {
        self.samples.iter()
    }
}
