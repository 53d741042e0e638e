use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Periodicity, UtcDateTime, ValidationError};

/// One cash-flow statement exactly as a provider labelled it.
///
/// Field names follow the provider's own taxonomy; values may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStatement {
    pub period_end: UtcDateTime,
    #[serde(default)]
    pub fields: BTreeMap<String, Option<f64>>,
}

impl RawStatement {
    pub fn new(period_end: UtcDateTime) -> Self {
        Self {
            period_end,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Option<f64>>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<f64>) {
        self.fields.insert(name.into(), value);
    }

    /// Present, non-null value of a provider field.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied().flatten()
    }
}

/// A reporting interval reduced to the line items free cash flow needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub start: UtcDateTime,
    pub end: UtcDateTime,
    pub free_cash_flow: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub capital_expenditures: Option<f64>,
}

impl Period {
    pub fn new(
        start: UtcDateTime,
        end: UtcDateTime,
        free_cash_flow: Option<f64>,
        operating_cash_flow: Option<f64>,
        capital_expenditures: Option<f64>,
    ) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvertedPeriod {
                start: start.date_label(),
                end: end.date_label(),
            });
        }

        Ok(Self {
            start,
            end,
            free_cash_flow,
            operating_cash_flow,
            capital_expenditures,
        })
    }

    pub fn span_days(&self) -> i64 {
        self.end.days_since(self.start)
    }

    /// Operating cash flow minus capital expenditures, when both are reported
    /// and the difference is finite.
    pub fn derived_free_cash_flow(&self) -> Option<f64> {
        let derived = self.operating_cash_flow? - self.capital_expenditures?;
        derived.is_finite().then_some(derived)
    }
}

/// Periods of one entity and cadence, most recent first.
///
/// Ends are strictly descending and no two periods overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementSeries {
    periodicity: Periodicity,
    periods: Vec<Period>,
}

impl StatementSeries {
    pub fn new(periodicity: Periodicity, periods: Vec<Period>) -> Result<Self, ValidationError> {
        for pair in periods.windows(2) {
            let (newer, older) = (&pair[0], &pair[1]);
            if newer.end <= older.end {
                return Err(ValidationError::UnorderedPeriods {
                    previous: newer.end.date_label(),
                    next: older.end.date_label(),
                });
            }
            if newer.start < older.end {
                return Err(ValidationError::OverlappingPeriods {
                    newer: newer.end.date_label(),
                    older: older.end.date_label(),
                });
            }
        }

        Ok(Self {
            periodicity,
            periods,
        })
    }

    pub fn empty(periodicity: Periodicity) -> Self {
        Self {
            periodicity,
            periods: Vec::new(),
        }
    }

    pub const fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn latest(&self) -> Option<&Period> {
        self.periods.first()
    }

    /// The `count` most recent periods, provided each spans one full period.
    ///
    /// A span that is too long hides a reporting gap. One that is too short
    /// means two records describe the same fiscal period.
    pub fn contiguous_window(&self, count: usize) -> Option<&[Period]> {
        let window = self.periods.get(..count)?;
        let spans = self.periodicity.min_span_days()..=self.periodicity.max_span_days();
        window
            .iter()
            .all(|period| spans.contains(&period.span_days()))
            .then_some(window)
    }
}
