use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use freeflow_core::{
    AlphaVantageAdapter, FcfResolver, HttpClient, HttpError, HttpErrorKind, HttpRequest,
    FcfNote, HttpResponse, MetricError, MetricResult, ProviderId, QuotaPolicy,
    SourceErrorKind, StatementSource, StatementsRequest, Symbol, YahooAdapter,
};

/// HTTP double that replays canned replies and records every request.
#[derive(Default)]
struct ScriptedHttpClient {
    replies: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    fn replying(replies: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests.lock().expect("requests lock").push(request);
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::new(HttpErrorKind::Connect, "no scripted reply")));
        Box::pin(async move { reply })
    }
}

fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

fn yahoo_with(client: &Arc<ScriptedHttpClient>) -> YahooAdapter {
    YahooAdapter::with_http_client(client.clone()).with_base_url("https://yahoo.test")
}

fn alphavantage_with(client: &Arc<ScriptedHttpClient>) -> AlphaVantageAdapter {
    AlphaVantageAdapter::with_http_client(client.clone(), "test-key")
        .with_base_url("https://alphavantage.test")
}

fn yahoo_quarterly_fcf(values: [(&str, f64); 4]) -> String {
    let points: Vec<String> = values
        .iter()
        .map(|(date, value)| {
            format!(r#"{{"asOfDate": "{date}", "periodType": "3M", "reportedValue": {{"raw": {value}}}}}"#)
        })
        .collect();
    format!(
        r#"{{"timeseries": {{"result": [{{"meta": {{"type": ["quarterlyFreeCashFlow"]}}, "quarterlyFreeCashFlow": [{}]}}], "error": null}}}}"#,
        points.join(",")
    )
}

/// One reported quarter, which is too few for TTM, plus a full annual report.
fn alphavantage_single_quarter_body() -> &'static str {
    r#"{"symbol": "IBM",
        "quarterlyReports": [
            {"fiscalDateEnding": "2024-06-30", "operatingCashflow": "210", "capitalExpenditures": "60"}
        ],
        "annualReports": [
            {"fiscalDateEnding": "2023-12-31", "operatingCashflow": "800", "capitalExpenditures": "300"}
        ]}"#
}

// =============================================================================
// Yahoo: Status Mapping
// =============================================================================

#[tokio::test]
async fn yahoo_decodes_success_and_sends_json_accept_header() {
    let client = ScriptedHttpClient::replying(vec![Ok(HttpResponse::ok_json(yahoo_quarterly_fcf([
        ("2023-09-30", 19.0),
        ("2023-12-31", 37.0),
        ("2024-03-31", 20.0),
        ("2024-06-30", 26.0),
    ])))]);
    let adapter = yahoo_with(&client);

    let statements = adapter
        .cash_flow_statements(StatementsRequest::quarterly(symbol("AAPL")))
        .await
        .expect("success decodes");

    assert_eq!(adapter.id(), ProviderId::Yahoo);
    assert_eq!(statements.len(), 4);
    assert_eq!(statements[0].period_end.date_label(), "2024-06-30");

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.contains("/timeseries/AAPL?"));
    assert_eq!(requests[0].headers.get("accept").map(String::as_str), Some("application/json"));
}

#[tokio::test]
async fn yahoo_not_found_means_no_statements() {
    let client = ScriptedHttpClient::replying(vec![Ok(HttpResponse::with_status(404, "Not Found"))]);

    let statements = yahoo_with(&client)
        .cash_flow_statements(StatementsRequest::annual(symbol("ZZZZ")))
        .await
        .expect("404 is not a failure");

    assert!(statements.is_empty());
}

#[tokio::test]
async fn yahoo_failures_map_to_source_error_kinds() {
    let cases = [
        (Ok(HttpResponse::with_status(429, "")), SourceErrorKind::RateLimited),
        (Ok(HttpResponse::with_status(503, "")), SourceErrorKind::Unavailable),
        (
            Err(HttpError::new(HttpErrorKind::Timeout, "operation timed out")),
            SourceErrorKind::Timeout,
        ),
        (
            Err(HttpError::new(HttpErrorKind::Connect, "dns error")),
            SourceErrorKind::Unavailable,
        ),
        (Ok(HttpResponse::ok_json("<html></html>")), SourceErrorKind::Malformed),
    ];

    for (reply, expected) in cases {
        let client = ScriptedHttpClient::replying(vec![reply]);

        let error = yahoo_with(&client)
            .cash_flow_statements(StatementsRequest::quarterly(symbol("AAPL")))
            .await
            .expect_err("must fail");

        assert_eq!(error.kind(), expected, "unexpected kind for {error}");
        assert!(error.code().starts_with("source."));
    }
}

// =============================================================================
// Alpha Vantage: Request Shape and Quota
// =============================================================================

#[tokio::test]
async fn alphavantage_requests_cash_flow_with_api_key() {
    let body = r#"{"symbol": "IBM", "quarterlyReports": [
        {"fiscalDateEnding": "2024-06-30", "operatingCashflow": "2065000000", "capitalExpenditures": "392000000"}
    ]}"#;
    let client = ScriptedHttpClient::replying(vec![Ok(HttpResponse::ok_json(body))]);
    let adapter = alphavantage_with(&client);

    let statements = adapter
        .cash_flow_statements(StatementsRequest::quarterly(symbol("IBM")))
        .await
        .expect("success decodes");

    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].value("operatingCashflow"), Some(2_065_000_000.0));
    let requests = client.requests();
    let url = &requests[0].url;
    assert!(url.starts_with("https://alphavantage.test/query?function=CASH_FLOW&symbol=IBM"));
    assert!(url.ends_with("apikey=test-key"));
}

#[tokio::test]
async fn alphavantage_gate_refuses_requests_beyond_quota() {
    let client = ScriptedHttpClient::replying(vec![
        Ok(HttpResponse::ok_json("{}")),
        Ok(HttpResponse::ok_json("{}")),
    ]);
    let adapter = alphavantage_with(&client).with_quota(&QuotaPolicy {
        provider_id: ProviderId::Alphavantage,
        window: Duration::from_secs(60),
        limit: 1,
    });

    let first = adapter
        .cash_flow_statements(StatementsRequest::quarterly(symbol("IBM")))
        .await;
    let second = adapter
        .cash_flow_statements(StatementsRequest::annual(symbol("KO")))
        .await;

    assert!(first.is_ok());
    assert_eq!(
        second.expect_err("over quota").kind(),
        SourceErrorKind::RateLimited
    );
    assert_eq!(client.requests().len(), 1, "refused request must not hit the network");
}

#[tokio::test]
async fn alphavantage_serves_both_cadences_from_one_response() {
    let client = ScriptedHttpClient::replying(vec![Ok(HttpResponse::ok_json(
        alphavantage_single_quarter_body(),
    ))]);
    let adapter = alphavantage_with(&client);

    let quarterly = adapter
        .cash_flow_statements(StatementsRequest::quarterly(symbol("IBM")))
        .await
        .expect("quarterly decodes");
    let annual = adapter
        .cash_flow_statements(StatementsRequest::annual(symbol("ibm")))
        .await
        .expect("annual served from the same document");

    assert_eq!(quarterly.len(), 1);
    assert_eq!(annual.len(), 1);
    assert_eq!(annual[0].value("operatingCashflow"), Some(800.0));
    assert_eq!(client.requests().len(), 1);
}

// =============================================================================
// Resolver over HTTP adapters
// =============================================================================

#[tokio::test]
async fn resolver_over_yahoo_sums_reported_quarters() {
    let client = ScriptedHttpClient::replying(vec![Ok(HttpResponse::ok_json(yahoo_quarterly_fcf([
        ("2023-09-30", 110.0),
        ("2023-12-31", 90.0),
        ("2024-03-31", 120.0),
        ("2024-06-30", 100.0),
    ])))]);
    let resolver = FcfResolver::new(Arc::new(yahoo_with(&client)));

    let result = resolver.resolve(&symbol("AAPL")).await;

    assert_eq!(result, MetricResult::value(420.0));
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn resolver_over_failing_yahoo_reports_status_verbatim() {
    let client = ScriptedHttpClient::replying(vec![Ok(HttpResponse::with_status(503, ""))]);
    let resolver = FcfResolver::new(Arc::new(yahoo_with(&client)));

    let result = resolver.resolve(&symbol("AAPL")).await;

    assert_eq!(
        result,
        MetricResult::unavailable(MetricError::provider_unreachable(
            "yahoo returned status 503"
        ))
    );
}

#[tokio::test]
async fn resolver_annual_fallback_over_alphavantage_costs_one_request() {
    let client = ScriptedHttpClient::replying(vec![Ok(HttpResponse::ok_json(
        alphavantage_single_quarter_body(),
    ))]);
    let resolver = FcfResolver::new(Arc::new(alphavantage_with(&client)));

    let result = resolver.resolve(&symbol("IBM")).await;

    assert_eq!(result, MetricResult::noted(500.0, FcfNote::AnnualDerived));
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn resolver_batch_of_fallbacks_fits_default_alphavantage_quota() {
    let body = alphavantage_single_quarter_body();
    let client = ScriptedHttpClient::replying(vec![
        Ok(HttpResponse::ok_json(body)),
        Ok(HttpResponse::ok_json(body)),
        Ok(HttpResponse::ok_json(body)),
    ]);
    let resolver = FcfResolver::new(Arc::new(alphavantage_with(&client)));

    for ticker in ["IBM", "KO", "PEP"] {
        let result = resolver.resolve(&symbol(ticker)).await;
        assert_eq!(
            result,
            MetricResult::noted(500.0, FcfNote::AnnualDerived),
            "unexpected result for {ticker}"
        );
    }

    assert_eq!(client.requests().len(), 3);
}
