//! Enumerations shared by transformation definitions and stores.
//!
//! [`JoinKind`] selects null-extension semantics for a binary join and
//! [`WriteMode`] selects how a result lands in its target table.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a binary equality join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    /// Only rows with a match on both sides.
    #[default]
    Inner,
    /// Every left row, null-extended when the right side has no match.
    Left,
    /// Every right row, null-extended when the left side has no match.
    Right,
    /// Every row from both sides.
    Full,
}

impl JoinKind {
    /// Whether unmatched left rows survive the join.
    #[must_use]
    pub const fn preserves_left(self) -> bool {
        matches!(self, Self::Left | Self::Full)
    }

    /// Whether unmatched right rows survive the join.
    #[must_use]
    pub const fn preserves_right(self) -> bool {
        matches!(self, Self::Right | Self::Full)
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Right => "right",
            Self::Full => "full",
        };
        f.write_str(s)
    }
}

/// How a result is written to its target table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Replace the whole target table (full refresh).
    #[default]
    Overwrite,
    /// Add the result rows after the existing ones.
    Append,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Overwrite => "overwrite",
            Self::Append => "append",
        };
        f.write_str(s)
    }
}
