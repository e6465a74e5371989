//! Time-period filter applied to the bounds query.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which events to show, by date. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodFilter {
    /// Events running today.
    #[default]
    Today,
    /// Events running this weekend.
    Weekend,
    /// Every event regardless of date.
    All,
}

impl PeriodFilter {
    /// Returns the wire value used in the `period` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Weekend => "weekend",
            Self::All => "all",
        }
    }
}

impl fmt::Display for PeriodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "weekend" => Ok(Self::Weekend),
            "all" => Ok(Self::All),
            other => Err(format!("unknown period filter: {other}")),
        }
    }
}
