use serde::{Deserialize, Serialize};

/// Running minimum/maximum over a stream of values.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueExtent {
    pub min: f64,
    pub max: f64,
}

impl ValueExtent {
    /// Extent that contains nothing yet: min at +inf, max at -inf.
    pub fn empty() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn include(&mut self, v: f64) {
        if v < self.min {
            self.min = v;
        }
        if v > self.max {
            self.max = v;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Midpoint of the range (not the average of the included values).
    pub fn midpoint(&self) -> f64 {
        self.min / 2.0 + self.max / 2.0
    }
}

impl Default for ValueExtent {
    fn default() -> Self {
        Self::empty()
    }
}
