//! Fallback ladder for free cash flow TTM.
//!
//! Each [`Strategy`] is a pure function of one [`StatementSeries`]. The resolver
//! walks [`Strategy::LADDER`] in order and keeps the first result; strategies
//! never combine data from different cadences.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::{FcfNote, MetricResult, Period, Periodicity, StatementSeries};

/// Quarters summed into a trailing-twelve-month figure.
pub const TTM_QUARTERS: usize = 4;

/// Named derivation strategies, best quality first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Sum of four reported quarterly free cash flows.
    QuarterlyReported,
    /// Sum of four quarterly operating cash flow minus capex.
    QuarterlyDerived,
    /// Latest reported annual free cash flow.
    AnnualReported,
    /// Latest annual operating cash flow minus capex.
    AnnualDerived,
}

impl Strategy {
    pub const LADDER: [Self; 4] = [
        Self::QuarterlyReported,
        Self::QuarterlyDerived,
        Self::AnnualReported,
        Self::AnnualDerived,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuarterlyReported => "quarterly_reported",
            Self::QuarterlyDerived => "quarterly_derived",
            Self::AnnualReported => "annual_reported",
            Self::AnnualDerived => "annual_derived",
        }
    }

    /// Cadence of the series this strategy reads.
    pub const fn periodicity(self) -> Periodicity {
        match self {
            Self::QuarterlyReported | Self::QuarterlyDerived => Periodicity::Quarterly,
            Self::AnnualReported | Self::AnnualDerived => Periodicity::Annual,
        }
    }

    /// Produces a value from `series`, or `None` when the data does not qualify.
    ///
    /// A series of the wrong cadence never qualifies.
    pub fn apply(self, series: &StatementSeries) -> Option<MetricResult> {
        if series.periodicity() != self.periodicity() {
            return None;
        }

        match self {
            Self::QuarterlyReported => {
                let window = series.contiguous_window(TTM_QUARTERS)?;
                sum_window(window, |period| period.free_cash_flow).map(MetricResult::value)
            }
            Self::QuarterlyDerived => {
                let window = series.contiguous_window(TTM_QUARTERS)?;
                sum_window(window, Period::derived_free_cash_flow)
                    .map(|total| MetricResult::noted(total, FcfNote::DerivedFromComponents))
            }
            Self::AnnualReported => series
                .latest()?
                .free_cash_flow
                .filter(|value| value.is_finite())
                .map(|value| MetricResult::noted(value, FcfNote::AnnualFallback)),
            Self::AnnualDerived => series
                .latest()?
                .derived_free_cash_flow()
                .map(|value| MetricResult::noted(value, FcfNote::AnnualDerived)),
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sums `pick` over every period, most recent first.
///
/// `None` if any period lacks it or the total overflows.
fn sum_window(window: &[Period], pick: impl Fn(&Period) -> Option<f64>) -> Option<f64> {
    window
        .iter()
        .try_fold(0.0, |total, period| Some(total + pick(period)?))
        .filter(|total: &f64| total.is_finite())
}
