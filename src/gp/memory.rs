//! The fixed-size memory register read and written by `read`/`write` nodes.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What a `write` does to the register.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Push the value into the window, dropping the oldest entry.
    Shift,
    /// Overwrite every slot with the value.
    Fill,
}

/// A sliding window of past written values. Reading yields the window's mean.
#[derive(Clone, Debug, PartialEq)]
pub struct Memory {
    window: VecDeque<f64>,
    policy: WritePolicy,
}

impl Memory {
    /// The window size used when none is configured.
    pub const DEFAULT_CAPACITY: usize = 4;

    /// A zeroed register of the given capacity. A capacity of zero is treated as one.
    pub fn new(capacity: usize, policy: WritePolicy) -> Self {
        let capacity = capacity.max(1);
        let window = std::iter::repeat(0.0).take(capacity).collect();
        Memory { window, policy }
    }

    pub fn capacity(&self) -> usize {
        self.window.len()
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// The mean of the window.
    pub fn read(&self) -> f64 {
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    pub fn write(&mut self, x: f64) {
        match self.policy {
            WritePolicy::Shift => {
                self.window.pop_front();
                self.window.push_back(x);
            }
            WritePolicy::Fill => self.fill(x),
        }
    }

    /// Overwrite every slot with `x`.
    pub fn fill(&mut self, x: f64) {
        for slot in self.window.iter_mut() {
            *slot = x;
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new(Self::DEFAULT_CAPACITY, WritePolicy::Fill)
    }
}
