//! Free cash flow TTM resolver.
//!
//! Fetches quarterly statements, walks the quarterly half of the strategy
//! ladder, and only then fetches annual statements for the annual half. Every
//! call is an independent computation: the resolver keeps no state between
//! requests and never retries a failed fetch.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::normalizer::{normalize_with, AliasTable};
use crate::{
    MetricError, MetricResult, Periodicity, ProviderId, StatementSeries, StatementSource,
    StatementsRequest, Strategy, Symbol,
};

/// A metric result together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// `None` when the ladder was exhausted or the source failed.
    pub strategy: Option<Strategy>,
    pub result: MetricResult,
}

impl Resolution {
    fn resolved(strategy: Strategy, result: MetricResult) -> Self {
        Self {
            strategy: Some(strategy),
            result,
        }
    }

    fn failed(error: MetricError) -> Self {
        Self {
            strategy: None,
            result: MetricResult::unavailable(error),
        }
    }

    fn exhausted() -> Self {
        Self::failed(MetricError::DataUnavailable)
    }
}

/// First strategy of the series' cadence that yields a value.
fn first_match(series: &StatementSeries) -> Option<Resolution> {
    Strategy::LADDER
        .into_iter()
        .filter(|strategy| strategy.periodicity() == series.periodicity())
        .find_map(|strategy| {
            strategy
                .apply(series)
                .map(|result| Resolution::resolved(strategy, result))
        })
}

/// Runs the full ladder over already-normalized series.
pub fn resolve_statements(quarterly: &StatementSeries, annual: &StatementSeries) -> Resolution {
    first_match(quarterly)
        .or_else(|| first_match(annual))
        .unwrap_or_else(Resolution::exhausted)
}

/// Resolves free cash flow TTM against one statement source.
#[derive(Clone)]
pub struct FcfResolver {
    source: Arc<dyn StatementSource>,
    aliases: Arc<AliasTable>,
    fetch_timeout: Duration,
}

impl FcfResolver {
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(3_000);

    pub fn new(source: Arc<dyn StatementSource>) -> Self {
        Self {
            source,
            aliases: Arc::new(AliasTable::default()),
            fetch_timeout: Self::DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = Arc::new(aliases);
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn source_id(&self) -> ProviderId {
        self.source.id()
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Free cash flow TTM for `symbol`.
    pub async fn resolve(&self, symbol: &Symbol) -> MetricResult {
        self.resolve_detailed(symbol).await.result
    }

    /// Like [`resolve`](Self::resolve), also reporting which strategy won.
    pub async fn resolve_detailed(&self, symbol: &Symbol) -> Resolution {
        let quarterly = match self.load(symbol, Periodicity::Quarterly).await {
            Ok(series) => series,
            Err(error) => return Resolution::failed(error),
        };
        if let Some(resolution) = first_match(&quarterly) {
            self.log_selected(symbol, &resolution);
            return resolution;
        }

        tracing::debug!(
            symbol = symbol.as_str(),
            quarters = quarterly.len(),
            "quarterly data insufficient, falling back to annual statements"
        );

        let annual = match self.load(symbol, Periodicity::Annual).await {
            Ok(series) => series,
            Err(error) => return Resolution::failed(error),
        };
        match first_match(&annual) {
            Some(resolution) => {
                self.log_selected(symbol, &resolution);
                resolution
            }
            None => {
                tracing::debug!(symbol = symbol.as_str(), "no strategy produced a value");
                Resolution::exhausted()
            }
        }
    }

    async fn load(
        &self,
        symbol: &Symbol,
        periodicity: Periodicity,
    ) -> Result<StatementSeries, MetricError> {
        let provider = self.source.id();
        tracing::debug!(
            provider = provider.as_str(),
            symbol = symbol.as_str(),
            periodicity = periodicity.as_str(),
            "fetching cash-flow statements"
        );

        let request = StatementsRequest::new(symbol.clone(), periodicity);
        let fetch = self.source.cash_flow_statements(request);
        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(raw)) => Ok(normalize_with(&self.aliases, &raw, periodicity)),
            Ok(Err(error)) => {
                tracing::warn!(
                    provider = provider.as_str(),
                    symbol = symbol.as_str(),
                    code = error.code(),
                    "statement fetch failed: {}",
                    error.message()
                );
                Err(MetricError::provider_unreachable(error.message()))
            }
            Err(_) => {
                let detail = format!(
                    "{provider} {periodicity} statements timed out after {}ms",
                    self.fetch_timeout.as_millis()
                );
                tracing::warn!(symbol = symbol.as_str(), "{detail}");
                Err(MetricError::provider_unreachable(detail))
            }
        }
    }

    fn log_selected(&self, symbol: &Symbol, resolution: &Resolution) {
        if let Some(strategy) = resolution.strategy {
            tracing::debug!(
                symbol = symbol.as_str(),
                strategy = strategy.as_str(),
                "free cash flow resolved"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize, FcfNote, RawStatement, UtcDateTime};

    fn series(periodicity: Periodicity, rows: &[(&str, &str, f64)]) -> StatementSeries {
        let raw: Vec<RawStatement> = rows
            .iter()
            .map(|(end, field, value)| {
                RawStatement::new(UtcDateTime::parse(end).expect("date")).with_field(*field, *value)
            })
            .collect();
        normalize(&raw, periodicity)
    }

    #[test]
    fn quarterly_beats_annual_when_both_qualify() {
        let quarterly = series(
            Periodicity::Quarterly,
            &[
                ("2024-06-30", "FreeCashFlow", 1.0),
                ("2024-03-31", "FreeCashFlow", 2.0),
                ("2023-12-31", "FreeCashFlow", 3.0),
                ("2023-09-30", "FreeCashFlow", 4.0),
            ],
        );
        let annual = series(Periodicity::Annual, &[("2023-12-31", "FreeCashFlow", 99.0)]);

        let resolution = resolve_statements(&quarterly, &annual);
        assert_eq!(resolution.strategy, Some(Strategy::QuarterlyReported));
        assert_eq!(resolution.result, MetricResult::value(10.0));
    }

    #[test]
    fn short_quarterly_series_falls_to_annual() {
        let quarterly = series(
            Periodicity::Quarterly,
            &[
                ("2024-06-30", "FreeCashFlow", 1.0),
                ("2024-03-31", "FreeCashFlow", 2.0),
            ],
        );
        let annual = series(Periodicity::Annual, &[("2023-12-31", "FreeCashFlow", 500.0)]);

        let resolution = resolve_statements(&quarterly, &annual);
        assert_eq!(resolution.strategy, Some(Strategy::AnnualReported));
        assert_eq!(
            resolution.result,
            MetricResult::noted(500.0, FcfNote::AnnualFallback)
        );
    }

    #[test]
    fn empty_series_exhaust_the_ladder() {
        let resolution = resolve_statements(
            &StatementSeries::empty(Periodicity::Quarterly),
            &StatementSeries::empty(Periodicity::Annual),
        );

        assert_eq!(resolution.strategy, None);
        assert_eq!(
            resolution.result,
            MetricResult::unavailable(MetricError::DataUnavailable)
        );
    }
}
