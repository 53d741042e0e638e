use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data_source::{SourceFuture, StatementSource, StatementsRequest};
use crate::{CoreError, Periodicity, ProviderId, RawStatement, SourceError, Symbol};

/// Statements recorded for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureBook {
    #[serde(default)]
    pub quarterly: Vec<RawStatement>,
    #[serde(default)]
    pub annual: Vec<RawStatement>,
}

impl FixtureBook {
    fn statements(&self, periodicity: Periodicity) -> &[RawStatement] {
        match periodicity {
            Periodicity::Quarterly => &self.quarterly,
            Periodicity::Annual => &self.annual,
        }
    }

    fn statements_mut(&mut self, periodicity: Periodicity) -> &mut Vec<RawStatement> {
        match periodicity {
            Periodicity::Quarterly => &mut self.quarterly,
            Periodicity::Annual => &mut self.annual,
        }
    }
}

/// Offline statement source backed by recorded statements.
///
/// The JSON file format maps tickers to books:
///
/// ```json
/// {"AAPL": {"quarterly": [{"period_end": "2024-06-30", "fields": {"FreeCashFlow": 1.0}}]}}
/// ```
///
/// Unknown tickers answer with no statements. Failures and latency can be
/// injected per cadence, and fetches are counted.
#[derive(Debug, Default)]
pub struct FixtureSource {
    books: BTreeMap<Symbol, FixtureBook>,
    failures: BTreeMap<Periodicity, SourceError>,
    latency: Option<Duration>,
    quarterly_fetches: AtomicUsize,
    annual_fetches: AtomicUsize,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_books(books: BTreeMap<Symbol, FixtureBook>) -> Self {
        Self {
            books,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(Self::from_books(serde_json::from_str(json)?))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_statements(
        mut self,
        symbol: Symbol,
        periodicity: Periodicity,
        statements: Vec<RawStatement>,
    ) -> Self {
        self.books
            .entry(symbol)
            .or_default()
            .statements_mut(periodicity)
            .extend(statements);
        self
    }

    /// Every fetch of `periodicity` fails with `error`.
    pub fn failing_with(mut self, periodicity: Periodicity, error: SourceError) -> Self {
        self.failures.insert(periodicity, error);
        self
    }

    /// Every fetch waits `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn fetch_count(&self, periodicity: Periodicity) -> usize {
        self.counter(periodicity).load(Ordering::SeqCst)
    }

    fn counter(&self, periodicity: Periodicity) -> &AtomicUsize {
        match periodicity {
            Periodicity::Quarterly => &self.quarterly_fetches,
            Periodicity::Annual => &self.annual_fetches,
        }
    }
}

impl StatementSource for FixtureSource {
    fn id(&self) -> ProviderId {
        ProviderId::Fixture
    }

    fn cash_flow_statements<'a>(
        &'a self,
        req: StatementsRequest,
    ) -> SourceFuture<'a, Vec<RawStatement>> {
        Box::pin(async move {
            self.counter(req.periodicity).fetch_add(1, Ordering::SeqCst);

            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }

            if let Some(error) = self.failures.get(&req.periodicity) {
                return Err(error.clone());
            }

            Ok(self
                .books
                .get(&req.symbol)
                .map(|book| book.statements(req.periodicity).to_vec())
                .unwrap_or_default())
        })
    }
}
