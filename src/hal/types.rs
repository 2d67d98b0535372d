use serde::{Deserialize, Serialize};

/// Discriminant carried from the transfer interrupt to the computation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferHalf {
    /// Half-transfer event: the first region is complete
    First = 0,
    /// Transfer-complete event: the second region is complete
    Second = 1,
}

impl BufferHalf {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Region the circular transfer writes after this one.
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}
