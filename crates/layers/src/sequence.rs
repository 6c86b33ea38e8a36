use foundation::AttributeKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    Empty,
    OutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for SequenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceError::Empty => write!(f, "no attributes to step through"),
            SequenceError::OutOfRange { index, len } => {
                write!(f, "attribute index {index} out of range 0..{len}")
            }
        }
    }
}

impl std::error::Error for SequenceError {}

/// Slider position over the ordered attribute keys. Owned by whoever drives
/// the map and handed to the pure functions explicitly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceState {
    current_attribute_index: usize,
    len: usize,
}

impl SequenceState {
    pub fn new(len: usize) -> Result<Self, SequenceError> {
        Self::at(0, len)
    }

    pub fn at(index: usize, len: usize) -> Result<Self, SequenceError> {
        if len == 0 {
            return Err(SequenceError::Empty);
        }
        if index >= len {
            return Err(SequenceError::OutOfRange { index, len });
        }
        Ok(Self {
            current_attribute_index: index,
            len,
        })
    }

    pub fn index(&self) -> usize {
        self.current_attribute_index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Slider input.
    pub fn set_index(&mut self, index: usize) -> Result<(), SequenceError> {
        *self = Self::at(index, self.len)?;
        Ok(())
    }

    /// Wraps from the last attribute back to the first.
    pub fn step_forward(&mut self) -> usize {
        self.current_attribute_index = (self.current_attribute_index + 1) % self.len;
        self.current_attribute_index
    }

    /// Wraps from the first attribute to the last.
    pub fn step_reverse(&mut self) -> usize {
        self.current_attribute_index = match self.current_attribute_index {
            0 => self.len - 1,
            i => i - 1,
        };
        self.current_attribute_index
    }

    pub fn step(&mut self, direction: Direction) -> usize {
        match direction {
            Direction::Forward => self.step_forward(),
            Direction::Reverse => self.step_reverse(),
        }
    }

    pub fn current_attribute<'a>(&self, keys: &'a [AttributeKey]) -> Option<&'a AttributeKey> {
        keys.get(self.current_attribute_index)
    }
}
