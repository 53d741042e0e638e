//! Result contract for a derived metric.
//!
//! Internally a result is either a value (optionally annotated with a quality
//! note) or an error, so a note can never sit next to an error. Callers that
//! want the flat `{value, note, error}` shape get it through [`MetricView`] or
//! serde.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize, Serializer};

/// Quality annotation attached to a value produced by a fallback strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FcfNote {
    DerivedFromComponents,
    AnnualFallback,
    AnnualDerived,
}

impl FcfNote {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DerivedFromComponents => {
                "derived from operating cash flow and capital expenditures"
            }
            Self::AnnualFallback => "annual data used; not a true trailing-twelve-month figure",
            Self::AnnualDerived => {
                "annual data used; not a true TTM; derived from operating cash flow and capital expenditures"
            }
        }
    }
}

impl Display for FcfNote {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why no value could be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    /// The statement source could not be read at all.
    ProviderUnreachable { detail: String },
    /// The source answered but no strategy found usable data.
    DataUnavailable,
}

impl MetricError {
    pub fn provider_unreachable(detail: impl Into<String>) -> Self {
        Self::ProviderUnreachable {
            detail: detail.into(),
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::ProviderUnreachable { .. } => "fcf.provider_unreachable",
            Self::DataUnavailable => "fcf.data_unavailable",
        }
    }
}

impl Display for MetricError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProviderUnreachable { detail } => {
                write!(f, "Free Cash Flow provider unreachable: {detail}")
            }
            Self::DataUnavailable => f.write_str("Free Cash Flow data unavailable"),
        }
    }
}

impl std::error::Error for MetricError {}

/// Outcome of one metric computation.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricResult {
    Value { value: f64, note: Option<FcfNote> },
    Unavailable(MetricError),
}

impl MetricResult {
    pub const fn value(value: f64) -> Self {
        Self::Value { value, note: None }
    }

    pub const fn noted(value: f64, note: FcfNote) -> Self {
        Self::Value {
            value,
            note: Some(note),
        }
    }

    pub const fn unavailable(error: MetricError) -> Self {
        Self::Unavailable(error)
    }

    pub const fn as_value(&self) -> Option<f64> {
        match self {
            Self::Value { value, .. } => Some(*value),
            Self::Unavailable(_) => None,
        }
    }

    pub const fn note(&self) -> Option<FcfNote> {
        match self {
            Self::Value { note, .. } => *note,
            Self::Unavailable(_) => None,
        }
    }

    pub const fn error(&self) -> Option<&MetricError> {
        match self {
            Self::Value { .. } => None,
            Self::Unavailable(error) => Some(error),
        }
    }

    pub fn view(&self) -> MetricView {
        match self {
            Self::Value { value, note } => MetricView {
                value: Some(*value),
                note: note.map(|note| note.as_str().to_owned()),
                error: None,
            },
            Self::Unavailable(error) => MetricView {
                value: None,
                note: None,
                error: Some(error.to_string()),
            },
        }
    }
}

impl Serialize for MetricResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.view().serialize(serializer)
    }
}

/// Flat wire shape consumed by presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricView {
    pub value: Option<f64>,
    pub note: Option<String>,
    pub error: Option<String>,
}
