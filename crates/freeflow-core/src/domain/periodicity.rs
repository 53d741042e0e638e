use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Reporting cadence of a cash-flow statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Quarterly,
    Annual,
}

impl Periodicity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }

    /// Length assumed for a period whose start is not known.
    pub const fn nominal_days(self) -> i64 {
        match self {
            Self::Quarterly => 91,
            Self::Annual => 365,
        }
    }

    /// Shortest span a single period may cover before it is taken for a
    /// duplicate or restated record of a neighbouring period.
    pub const fn min_span_days(self) -> i64 {
        match self {
            Self::Quarterly => 80,
            Self::Annual => 330,
        }
    }

    /// Longest span a single period may cover before a reporting gap is assumed.
    ///
    /// Fiscal calendars built on 13/14-week quarters and 52/53-week years stay
    /// well inside these bounds.
    pub const fn max_span_days(self) -> i64 {
        match self {
            Self::Quarterly => 100,
            Self::Annual => 380,
        }
    }
}

impl Display for Periodicity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Periodicity {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quarterly" | "quarter" | "q" => Ok(Self::Quarterly),
            "annual" | "yearly" | "a" => Ok(Self::Annual),
            other => Err(ValidationError::InvalidPeriodicity {
                value: other.to_owned(),
            }),
        }
    }
}
