use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;

use super::fetch_body;
use crate::data_source::{SourceFuture, StatementSource, StatementsRequest};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::throttling::{QuotaPolicy, RateGate};
use crate::{Periodicity, ProviderId, RawStatement, SourceError, Symbol, UtcDateTime};

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
const API_KEY_ENV: &str = "FREEFLOW_ALPHAVANTAGE_API_KEY";

/// How long a fetched `CASH_FLOW` document keeps answering for its symbol.
const DOCUMENT_TTL: Duration = Duration::from_secs(60);

/// Report keys that are labels rather than line items.
const NON_NUMERIC_KEYS: [&str; 2] = ["fiscalDateEnding", "reportedCurrency"];

/// Alpha Vantage `CASH_FLOW` adapter.
///
/// One `CASH_FLOW` response carries both the quarterly and the annual reports,
/// so the parsed document is kept per symbol for a minute and the second
/// cadence is served without another gated request.
#[derive(Clone)]
pub struct AlphaVantageAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    timeout_ms: u64,
    gate: RateGate,
    documents: Arc<Mutex<BTreeMap<Symbol, CachedDocument>>>,
}

struct CachedDocument {
    fetched_at: Instant,
    document: Arc<CashFlowDocument>,
}

impl Default for AlphaVantageAdapter {
    fn default() -> Self {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_else(|_| String::from("demo"));
        Self::with_http_client(Arc::new(ReqwestHttpClient::default()), api_key)
    }
}

impl AlphaVantageAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: 5_000,
            gate: RateGate::from_policy(&QuotaPolicy::alphavantage_default()),
            documents: Arc::new(Mutex::new(BTreeMap::new())),
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

    pub fn with_quota(mut self, policy: &QuotaPolicy) -> Self {
        self.gate = RateGate::from_policy(policy);
        self
    }

    fn endpoint(&self, req: &StatementsRequest) -> String {
        format!(
            "{}/query?function=CASH_FLOW&symbol={}&apikey={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(req.symbol.as_str()),
            urlencoding::encode(&self.api_key),
        )
    }

    async fn fetch(&self, req: StatementsRequest) -> Result<Vec<RawStatement>, SourceError> {
        if let Some(document) = self.cached(&req.symbol) {
            tracing::debug!(
                provider = "alphavantage",
                symbol = req.symbol.as_str(),
                periodicity = req.periodicity.as_str(),
                "serving CASH_FLOW from the document already fetched"
            );
            return Ok(document.reports(req.periodicity).to_vec());
        }

        if let Err(wait) = self.gate.try_acquire() {
            return Err(SourceError::rate_limited(format!(
                "alphavantage request budget exhausted; next slot in {:.2}s",
                wait.as_secs_f64()
            )));
        }

        tracing::debug!(
            provider = "alphavantage",
            symbol = req.symbol.as_str(),
            periodicity = req.periodicity.as_str(),
            "requesting CASH_FLOW"
        );

        let request = HttpRequest::get(self.endpoint(&req)).with_timeout_ms(self.timeout_ms);
        let document = match fetch_body(self.http_client.as_ref(), ProviderId::Alphavantage, request)
            .await?
        {
            Some(body) => parse_cash_flow(&body)?,
            None => CashFlowDocument::default(),
        };

        let document = Arc::new(document);
        self.remember(req.symbol, Arc::clone(&document));
        Ok(document.reports(req.periodicity).to_vec())
    }

    fn cached(&self, symbol: &Symbol) -> Option<Arc<CashFlowDocument>> {
        let documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        documents
            .get(symbol)
            .filter(|cached| cached.fetched_at.elapsed() < DOCUMENT_TTL)
            .map(|cached| Arc::clone(&cached.document))
    }

    fn remember(&self, symbol: Symbol, document: Arc<CashFlowDocument>) {
        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        documents.retain(|_, cached| cached.fetched_at.elapsed() < DOCUMENT_TTL);
        documents.insert(
            symbol,
            CachedDocument {
                fetched_at: Instant::now(),
                document,
            },
        );
    }
}

impl StatementSource for AlphaVantageAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Alphavantage
    }

    fn cash_flow_statements<'a>(
        &'a self,
        req: StatementsRequest,
    ) -> SourceFuture<'a, Vec<RawStatement>> {
        Box::pin(self.fetch(req))
    }
}

#[derive(Debug, Deserialize)]
struct CashFlowResponse {
    #[serde(rename = "annualReports", default)]
    annual_reports: Vec<BTreeMap<String, Value>>,
    #[serde(rename = "quarterlyReports", default)]
    quarterly_reports: Vec<BTreeMap<String, Value>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// Both cadences of one `CASH_FLOW` response.
#[derive(Debug, Default)]
struct CashFlowDocument {
    quarterly: Vec<RawStatement>,
    annual: Vec<RawStatement>,
}

impl CashFlowDocument {
    fn reports(&self, periodicity: Periodicity) -> &[RawStatement] {
        match periodicity {
            Periodicity::Quarterly => &self.quarterly,
            Periodicity::Annual => &self.annual,
        }
    }
}

fn parse_cash_flow(body: &str) -> Result<CashFlowDocument, SourceError> {
    let response: CashFlowResponse = serde_json::from_str(body).map_err(|e| {
        SourceError::malformed(format!("failed to parse alphavantage cash flow: {e}"))
    })?;

    if let Some(message) = response.error_message {
        return Err(SourceError::provider(format!("alphavantage: {message}")));
    }
    if let Some(notice) = response.note.or(response.information) {
        return Err(SourceError::rate_limited(format!("alphavantage: {notice}")));
    }

    Ok(CashFlowDocument {
        quarterly: to_statements(response.quarterly_reports),
        annual: to_statements(response.annual_reports),
    })
}

fn to_statements(reports: Vec<BTreeMap<String, Value>>) -> Vec<RawStatement> {
    reports
        .into_iter()
        .filter_map(|report| {
            let fiscal_end = report.get("fiscalDateEnding").and_then(Value::as_str)?;
            let Ok(period_end) = UtcDateTime::parse(fiscal_end) else {
                tracing::warn!(
                    provider = "alphavantage",
                    fiscal_date_ending = fiscal_end,
                    "dropping report with unparsable period date"
                );
                return None;
            };

            let mut statement = RawStatement::new(period_end);
            for (name, value) in &report {
                if !NON_NUMERIC_KEYS.contains(&name.as_str()) {
                    statement.insert(name.as_str(), parse_amount(value));
                }
            }
            Some(statement)
        })
        .collect()
}

/// Alpha Vantage sends amounts as strings and uses `"None"` for missing values.
fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "symbol": "IBM",
        "annualReports": [
            {"fiscalDateEnding": "2023-12-31", "reportedCurrency": "USD",
             "operatingCashflow": "13931000000", "capitalExpenditures": "1245000000"}
        ],
        "quarterlyReports": [
            {"fiscalDateEnding": "2024-06-30", "reportedCurrency": "USD",
             "operatingCashflow": "2065000000", "capitalExpenditures": "None"},
            {"fiscalDateEnding": "not-a-date", "operatingCashflow": "1"}
        ]
    }"#;

    #[test]
    fn one_document_carries_both_cadences() {
        let document = parse_cash_flow(BODY).expect("parses");
        let annual = document.reports(Periodicity::Annual);

        assert_eq!(annual.len(), 1);
        assert_eq!(annual[0].value("operatingCashflow"), Some(13_931_000_000.0));
        assert_eq!(annual[0].value("capitalExpenditures"), Some(1_245_000_000.0));
        assert!(!annual[0].fields.contains_key("reportedCurrency"));
        assert_eq!(document.reports(Periodicity::Quarterly).len(), 1);
    }

    #[test]
    fn none_strings_and_bad_dates_are_dropped() {
        let document = parse_cash_flow(BODY).expect("parses");
        let quarterly = document.reports(Periodicity::Quarterly);

        assert_eq!(quarterly.len(), 1);
        assert_eq!(quarterly[0].value("capitalExpenditures"), None);
        assert!(quarterly[0].fields.contains_key("capitalExpenditures"));
    }

    #[test]
    fn quota_notice_is_rate_limited() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;

        let err = parse_cash_flow(body).expect_err("must fail");
        assert_eq!(err.kind(), crate::SourceErrorKind::RateLimited);
    }

    #[test]
    fn error_message_is_provider_error() {
        let body = r#"{"Error Message": "Invalid API call."}"#;

        let err = parse_cash_flow(body).expect_err("must fail");
        assert_eq!(err.kind(), crate::SourceErrorKind::Provider);
        assert_eq!(err.message(), "alphavantage: Invalid API call.");
    }

    #[test]
    fn unknown_ticker_yields_no_statements() {
        let document = parse_cash_flow("{}").expect("parses");
        assert!(document.reports(Periodicity::Quarterly).is_empty());
        assert!(document.reports(Periodicity::Annual).is_empty());
    }
}
