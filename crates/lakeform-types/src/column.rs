//! Column references in `alias.column` form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reference to a column, optionally qualified by a dataset alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ColumnRef {
    /// Dataset alias, when the reference is qualified.
    pub qualifier: Option<String>,
    /// Column name within the dataset.
    pub name: String,
}

impl ColumnRef {
    /// Create an unqualified reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    /// Create a reference qualified by `alias`.
    pub fn qualified(alias: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(alias.into()),
            name: name.into(),
        }
    }

    /// Parse `"alias.column"` or `"column"`.
    ///
    /// Only the first dot separates the alias, so `"t1.a.b"` refers to
    /// column `a.b` of `t1`.
    ///
    /// # Errors
    ///
    /// Returns a message when the alias or the column part is empty.
    pub fn parse(s: &str) -> Result<Self, String> {
        let trimmed = s.trim();
        match trimmed.split_once('.') {
            Some((alias, name)) => {
                if alias.is_empty() || name.is_empty() {
                    return Err(format!("invalid column reference '{s}'"));
                }
                Ok(Self::qualified(alias, name))
            }
            None if trimmed.is_empty() => Err("empty column reference".to_string()),
            None => Ok(Self::new(trimmed)),
        }
    }

    /// Whether an alias qualifies this reference.
    #[must_use]
    pub const fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(alias) => write!(f, "{alias}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for ColumnRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ColumnRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ColumnRef> for String {
    fn from(value: ColumnRef) -> Self {
        value.to_string()
    }
}
