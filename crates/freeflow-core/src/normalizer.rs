//! Statement normalizer.
//!
//! Reduces provider records to the three line items free cash flow needs. Each
//! logical field is looked up through an ordered alias list ([`AliasTable`]);
//! the first alias that is present with a finite value wins. Nothing here
//! fails: unknown or missing fields simply resolve to `None`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Period, Periodicity, RawStatement, StatementSeries, UtcDateTime, ValidationError};

/// Logical line items extracted from a cash-flow statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    FreeCashFlow,
    OperatingCashFlow,
    CapitalExpenditures,
}

impl LogicalField {
    pub const ALL: [Self; 3] = [
        Self::FreeCashFlow,
        Self::OperatingCashFlow,
        Self::CapitalExpenditures,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FreeCashFlow => "free_cash_flow",
            Self::OperatingCashFlow => "operating_cash_flow",
            Self::CapitalExpenditures => "capital_expenditures",
        }
    }
}

/// Versioned alias configuration, one ordered list per logical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTable {
    pub version: String,
    pub free_cash_flow: Vec<String>,
    pub operating_cash_flow: Vec<String>,
    pub capital_expenditures: Vec<String>,
}

impl AliasTable {
    pub const BUILTIN_VERSION: &'static str = "2024.1";

    /// Loads and validates an alias table from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.trim().is_empty() {
            return Err(ValidationError::EmptyAliasVersion);
        }

        for field in LogicalField::ALL {
            if !self.aliases(field).iter().any(|alias| !alias.trim().is_empty()) {
                return Err(ValidationError::EmptyAliasList {
                    field: field.as_str(),
                });
            }
        }

        Ok(())
    }

    pub fn aliases(&self, field: LogicalField) -> &[String] {
        match field {
            LogicalField::FreeCashFlow => &self.free_cash_flow,
            LogicalField::OperatingCashFlow => &self.operating_cash_flow,
            LogicalField::CapitalExpenditures => &self.capital_expenditures,
        }
    }

    /// First alias present in `raw` with a finite value.
    pub fn probe(&self, raw: &RawStatement, field: LogicalField) -> Option<f64> {
        self.aliases(field)
            .iter()
            .filter_map(|alias| raw.value(alias))
            .find(|value| value.is_finite())
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        fn owned(aliases: &[&str]) -> Vec<String> {
            aliases.iter().map(|alias| (*alias).to_owned()).collect()
        }

        Self {
            version: String::from(Self::BUILTIN_VERSION),
            free_cash_flow: owned(&[
                "FreeCashFlow",
                "Free Cash Flow",
                "freeCashFlow",
                "free_cash_flow",
            ]),
            operating_cash_flow: owned(&[
                "OperatingCashFlow",
                "Operating Cash Flow",
                "operatingCashflow",
                "operatingCashFlow",
                "Total Cash From Operating Activities",
                "CashFlowFromContinuingOperatingActivities",
                "net_cash_flow_from_operating_activities",
            ]),
            capital_expenditures: owned(&[
                "CapitalExpenditure",
                "Capital Expenditure",
                "Capital Expenditures",
                "capitalExpenditures",
                "capital_expenditure",
                "PurchaseOfPPE",
            ]),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct LineItems {
    free_cash_flow: Option<f64>,
    operating_cash_flow: Option<f64>,
    capital_expenditures: Option<f64>,
}

impl LineItems {
    fn extract(aliases: &AliasTable, raw: &RawStatement) -> Self {
        Self {
            free_cash_flow: aliases.probe(raw, LogicalField::FreeCashFlow),
            operating_cash_flow: aliases.probe(raw, LogicalField::OperatingCashFlow),
            // Providers disagree on the sign of capex; spend is kept as a magnitude.
            capital_expenditures: aliases
                .probe(raw, LogicalField::CapitalExpenditures)
                .map(f64::abs),
        }
    }

    fn fill_from(&mut self, other: Self) {
        self.free_cash_flow = self.free_cash_flow.or(other.free_cash_flow);
        self.operating_cash_flow = self.operating_cash_flow.or(other.operating_cash_flow);
        self.capital_expenditures = self.capital_expenditures.or(other.capital_expenditures);
    }
}

/// Normalizes with the built-in alias table.
pub fn normalize(raw_statements: &[RawStatement], periodicity: Periodicity) -> StatementSeries {
    normalize_with(&AliasTable::default(), raw_statements, periodicity)
}

/// Builds a most-recent-first series from provider records.
///
/// Records sharing a period end are merged field by field, earlier records
/// taking precedence. Each period starts where the next older one ended; the
/// oldest period is given the nominal length of its cadence.
pub fn normalize_with(
    aliases: &AliasTable,
    raw_statements: &[RawStatement],
    periodicity: Periodicity,
) -> StatementSeries {
    let mut by_end: BTreeMap<UtcDateTime, LineItems> = BTreeMap::new();
    for raw in raw_statements {
        let items = LineItems::extract(aliases, raw);
        by_end
            .entry(raw.period_end)
            .and_modify(|existing| existing.fill_from(items))
            .or_insert(items);
    }

    let ends: Vec<UtcDateTime> = by_end.keys().rev().copied().collect();
    let periods: Vec<Period> = ends
        .iter()
        .enumerate()
        .map(|(index, end)| {
            let start = ends
                .get(index + 1)
                .copied()
                .unwrap_or_else(|| end.minus_days(periodicity.nominal_days()));
            let items = by_end.get(end).copied().unwrap_or_default();
            Period {
                start,
                end: *end,
                free_cash_flow: items.free_cash_flow,
                operating_cash_flow: items.operating_cash_flow,
                capital_expenditures: items.capital_expenditures,
            }
        })
        .collect();

    tracing::trace!(
        periodicity = periodicity.as_str(),
        records = raw_statements.len(),
        periods = periods.len(),
        "normalized cash-flow statements"
    );

    StatementSeries::new(periodicity, periods).unwrap_or_else(|error| {
        tracing::error!(%error, "normalizer produced an invalid series");
        StatementSeries::empty(periodicity)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str) -> RawStatement {
        RawStatement::new(UtcDateTime::parse(date).expect("valid date"))
    }

    #[test]
    fn builtin_table_is_valid() {
        AliasTable::default().validate().expect("built-in aliases validate");
    }

    #[test]
    fn earlier_alias_wins_over_later_alias() {
        let record = raw("2024-06-30")
            .with_field("Free Cash Flow", 10.0)
            .with_field("FreeCashFlow", 20.0);

        let series = normalize(&[record], Periodicity::Quarterly);
        assert_eq!(series.periods()[0].free_cash_flow, Some(20.0));
    }

    #[test]
    fn null_alias_falls_through_to_next_alias() {
        let record = raw("2024-06-30")
            .with_field("FreeCashFlow", None::<f64>)
            .with_field("Free Cash Flow", 7.0);

        let series = normalize(&[record], Periodicity::Quarterly);
        assert_eq!(series.periods()[0].free_cash_flow, Some(7.0));
    }

    #[test]
    fn non_finite_values_count_as_absent() {
        let record = raw("2024-06-30")
            .with_field("OperatingCashFlow", f64::NAN)
            .with_field("Operating Cash Flow", 42.0)
            .with_field("CapitalExpenditure", f64::INFINITY);

        let period = normalize(&[record], Periodicity::Quarterly).periods()[0];
        assert_eq!(period.operating_cash_flow, Some(42.0));
        assert_eq!(period.capital_expenditures, None);
    }

    #[test]
    fn capital_expenditures_become_a_magnitude() {
        let record = raw("2024-06-30")
            .with_field("OperatingCashFlow", 100.0)
            .with_field("CapitalExpenditure", -30.0);

        let period = normalize(&[record], Periodicity::Quarterly).periods()[0];
        assert_eq!(period.capital_expenditures, Some(30.0));
        assert_eq!(period.derived_free_cash_flow(), Some(70.0));
    }

    #[test]
    fn unknown_fields_are_discarded() {
        let record = raw("2024-06-30").with_field("NetIncome", 5.0);

        let period = normalize(&[record], Periodicity::Quarterly).periods()[0];
        assert_eq!(period.free_cash_flow, None);
        assert_eq!(period.operating_cash_flow, None);
        assert_eq!(period.capital_expenditures, None);
    }

    #[test]
    fn sorts_most_recent_first_and_chains_starts() {
        let records = [raw("2023-12-31"), raw("2024-06-30"), raw("2024-03-31")];

        let series = normalize(&records, Periodicity::Quarterly);
        let ends: Vec<String> = series.periods().iter().map(|p| p.end.date_label()).collect();
        assert_eq!(ends, ["2024-06-30", "2024-03-31", "2023-12-31"]);
        assert_eq!(series.periods()[0].start, series.periods()[1].end);
        assert_eq!(series.periods()[2].span_days(), 91);
    }

    #[test]
    fn duplicate_period_ends_are_merged() {
        let records = [
            raw("2024-06-30").with_field("FreeCashFlow", 5.0),
            raw("2024-06-30")
                .with_field("FreeCashFlow", 9.0)
                .with_field("OperatingCashFlow", 8.0),
        ];

        let series = normalize(&records, Periodicity::Quarterly);
        assert_eq!(series.len(), 1);
        assert_eq!(series.periods()[0].free_cash_flow, Some(5.0));
        assert_eq!(series.periods()[0].operating_cash_flow, Some(8.0));
    }

    #[test]
    fn empty_input_gives_empty_series() {
        let series = normalize(&[], Periodicity::Annual);
        assert!(series.is_empty());
        assert_eq!(series.periodicity(), Periodicity::Annual);
    }

    #[test]
    fn custom_table_rejects_blank_lists() {
        let json = r#"{
            "version": "test",
            "free_cash_flow": ["  "],
            "operating_cash_flow": ["ocf"],
            "capital_expenditures": ["capex"]
        }"#;

        let err = AliasTable::from_json(json).expect_err("must fail");
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::EmptyAliasList { field: "free_cash_flow" })
        ));
    }
}
