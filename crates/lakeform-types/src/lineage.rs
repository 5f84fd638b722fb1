//! Reserved lineage columns and their fixed output contract.
//!
//! Every transformation output starts with [`LineageColumn::SourceSystem`],
//! [`LineageColumn::DataLoadTimestampUtc`] and
//! [`LineageColumn::DataLoadTimestampLocal`], followed by
//! [`LineageColumn::SurrogateKey`] for dimension outputs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `chrono` format string for lineage timestamps (`yyyy-MM-dd HH:mm:ss`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Time zone used for `DataLoadTimestampLocal` when none is configured.
pub const DEFAULT_LOCAL_TIMEZONE: &str = "Europe/Copenhagen";

/// First surrogate key of a run when no allocator overrides it.
pub const DEFAULT_SURROGATE_KEY_BASE_OFFSET: i64 = 100_000_000;

/// A reserved lineage column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LineageColumn {
    SourceSystem,
    DataLoadTimestampUtc,
    DataLoadTimestampLocal,
    SurrogateKey,
}

impl LineageColumn {
    /// Lineage prefix of a non-dimension output, in mandated order.
    pub const FACT: [Self; 3] = [
        Self::SourceSystem,
        Self::DataLoadTimestampUtc,
        Self::DataLoadTimestampLocal,
    ];

    /// Lineage prefix of a dimension output, in mandated order.
    pub const DIMENSION: [Self; 4] = [
        Self::SourceSystem,
        Self::DataLoadTimestampUtc,
        Self::DataLoadTimestampLocal,
        Self::SurrogateKey,
    ];

    /// The lineage prefix for an output kind.
    #[must_use]
    pub fn prefix(is_dimension_output: bool) -> &'static [Self] {
        if is_dimension_output {
            &Self::DIMENSION
        } else {
            &Self::FACT
        }
    }

    /// Output column name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SourceSystem => "SourceSystem",
            Self::DataLoadTimestampUtc => "DataLoadTimestampUtc",
            Self::DataLoadTimestampLocal => "DataLoadTimestampLocal",
            Self::SurrogateKey => "SurrogateKey",
        }
    }

    /// Look up a lineage column by its exact (case-sensitive) output name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::DIMENSION.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for LineageColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
