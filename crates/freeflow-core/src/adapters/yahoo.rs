use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::fetch_body;
use crate::data_source::{SourceFuture, StatementSource, StatementsRequest};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{Periodicity, ProviderId, RawStatement, SourceError, UtcDateTime};

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Earliest `period1` Yahoo accepts; asks for the full history.
const HISTORY_START: i64 = 493_590_046;

/// Line items requested from the time series endpoint, without cadence prefix.
const LINE_ITEMS: [&str; 3] = ["FreeCashFlow", "OperatingCashFlow", "CapitalExpenditure"];

/// Yahoo Finance fundamentals time series adapter.
///
/// Yahoo reports each line item as its own series keyed by `asOfDate`; the
/// adapter pivots them back into one record per period. Capital expenditure
/// comes back as a negative cash outflow.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::default()))
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: 3_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn endpoint(&self, req: &StatementsRequest) -> String {
        let prefix = series_prefix(req.periodicity);
        let types = LINE_ITEMS
            .iter()
            .map(|item| format!("{prefix}{item}"))
            .collect::<Vec<_>>()
            .join(",");
        let symbol = urlencoding::encode(req.symbol.as_str());

        format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{symbol}?symbol={symbol}&type={}&period1={HISTORY_START}&period2={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&types),
            UtcDateTime::now().unix_timestamp(),
        )
    }

    async fn fetch(&self, req: StatementsRequest) -> Result<Vec<RawStatement>, SourceError> {
        tracing::debug!(
            provider = "yahoo",
            symbol = req.symbol.as_str(),
            periodicity = req.periodicity.as_str(),
            "requesting fundamentals time series"
        );

        let request = HttpRequest::get(self.endpoint(&req))
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        match fetch_body(self.http_client.as_ref(), ProviderId::Yahoo, request).await? {
            Some(body) => parse_timeseries(&body, req.periodicity),
            None => Ok(Vec::new()),
        }
    }
}

impl StatementSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn cash_flow_statements<'a>(
        &'a self,
        req: StatementsRequest,
    ) -> SourceFuture<'a, Vec<RawStatement>> {
        Box::pin(self.fetch(req))
    }
}

const fn series_prefix(periodicity: Periodicity) -> &'static str {
    match periodicity {
        Periodicity::Quarterly => "quarterly",
        Periodicity::Annual => "annual",
    }
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: TimeseriesBody,
}

#[derive(Debug, Deserialize)]
struct TimeseriesBody {
    #[serde(default)]
    result: Option<Vec<TimeseriesResult>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    meta: TimeseriesMeta,
    /// Data points live under a key equal to the series type.
    #[serde(flatten)]
    series: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type", default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesPoint {
    #[serde(rename = "asOfDate")]
    as_of_date: String,
    #[serde(rename = "reportedValue", default)]
    reported_value: Option<ReportedValue>,
}

#[derive(Debug, Deserialize)]
struct ReportedValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn parse_timeseries(body: &str, periodicity: Periodicity) -> Result<Vec<RawStatement>, SourceError> {
    let response: TimeseriesResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo timeseries: {e}")))?;

    if let Some(error) = response.timeseries.error.filter(|error| !error.is_null()) {
        return Err(SourceError::provider(format!("yahoo timeseries error: {error}")));
    }

    let prefix = series_prefix(periodicity);
    let mut by_end: BTreeMap<UtcDateTime, RawStatement> = BTreeMap::new();

    for result in response.timeseries.result.unwrap_or_default() {
        for series_type in &result.meta.types {
            let Some(field) = series_type.strip_prefix(prefix) else {
                continue;
            };
            let Some(points) = result.series.get(series_type) else {
                continue;
            };
            let points: Vec<Option<TimeseriesPoint>> = serde_json::from_value(points.clone())
                .map_err(|e| {
                    SourceError::malformed(format!("invalid yahoo series '{series_type}': {e}"))
                })?;

            for point in points.into_iter().flatten() {
                let Ok(period_end) = UtcDateTime::parse(&point.as_of_date) else {
                    tracing::warn!(
                        provider = "yahoo",
                        as_of_date = point.as_of_date.as_str(),
                        "dropping data point with unparsable period date"
                    );
                    continue;
                };
                let value = point.reported_value.and_then(|reported| reported.raw);
                by_end
                    .entry(period_end)
                    .or_insert_with(|| RawStatement::new(period_end))
                    .insert(field, value);
            }
        }
    }

    Ok(by_end.into_values().rev().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Symbol;

    const QUARTERLY_BODY: &str = r#"{
        "timeseries": {
            "result": [
                {
                    "meta": {"symbol": ["AAPL"], "type": ["quarterlyFreeCashFlow"]},
                    "timestamp": [1711843200, 1719705600],
                    "quarterlyFreeCashFlow": [
                        {"asOfDate": "2024-03-31", "periodType": "3M", "currencyCode": "USD",
                         "reportedValue": {"raw": 20694000000.0, "fmt": "20.69B"}},
                        {"asOfDate": "2024-06-30", "periodType": "3M", "currencyCode": "USD",
                         "reportedValue": {"raw": 26707000000.0, "fmt": "26.71B"}}
                    ]
                },
                {
                    "meta": {"symbol": ["AAPL"], "type": ["quarterlyCapitalExpenditure"]},
                    "timestamp": [1719705600],
                    "quarterlyCapitalExpenditure": [
                        null,
                        {"asOfDate": "2024-06-30", "periodType": "3M", "currencyCode": "USD",
                         "reportedValue": {"raw": -2151000000.0, "fmt": "-2.15B"}}
                    ]
                },
                {
                    "meta": {"symbol": ["AAPL"], "type": ["quarterlyOperatingCashFlow"]}
                }
            ],
            "error": null
        }
    }"#;

    #[test]
    fn pivots_series_into_period_records() {
        let statements =
            parse_timeseries(QUARTERLY_BODY, Periodicity::Quarterly).expect("parses");

        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].period_end.date_label(), "2024-06-30");
        assert_eq!(statements[0].value("FreeCashFlow"), Some(26_707_000_000.0));
        assert_eq!(statements[0].value("CapitalExpenditure"), Some(-2_151_000_000.0));
        assert_eq!(statements[1].value("CapitalExpenditure"), None);
    }

    #[test]
    fn ignores_series_of_other_cadence() {
        let statements = parse_timeseries(QUARTERLY_BODY, Periodicity::Annual).expect("parses");
        assert!(statements.is_empty());
    }

    #[test]
    fn surfaces_provider_error() {
        let body = r#"{"timeseries": {"result": null,
            "error": {"code": "Bad Request", "description": "Invalid type"}}}"#;

        let err = parse_timeseries(body, Periodicity::Quarterly).expect_err("must fail");
        assert_eq!(err.kind(), crate::SourceErrorKind::Provider);
        assert!(err.message().contains("Invalid type"));
    }

    #[test]
    fn rejects_non_json_body() {
        let err = parse_timeseries("<html>", Periodicity::Quarterly).expect_err("must fail");
        assert_eq!(err.kind(), crate::SourceErrorKind::Malformed);
    }

    #[test]
    fn endpoint_requests_all_line_items_for_cadence() {
        let adapter = YahooAdapter::default().with_base_url("https://example.test/");
        let req = StatementsRequest::annual(Symbol::parse("brk.b").expect("symbol"));

        let url = adapter.endpoint(&req);
        assert!(url.starts_with(
            "https://example.test/ws/fundamentals-timeseries/v1/finance/timeseries/BRK.B?"
        ));
        assert!(url.contains("annualFreeCashFlow%2CannualOperatingCashFlow%2CannualCapitalExpenditure"));
    }
}
