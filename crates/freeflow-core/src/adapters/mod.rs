//! Statement source implementations.
//!
//! | Adapter | Provider | Notes |
//! |---------|----------|-------|
//! | [`YahooAdapter`] | Yahoo Finance fundamentals time series | no API key |
//! | [`AlphaVantageAdapter`] | Alpha Vantage `CASH_FLOW` | API key, 5 req/min |
//! | [`FixtureSource`] | in-memory / JSON file | offline runs and tests |

mod alphavantage;
mod fixture;
mod yahoo;

pub use alphavantage::AlphaVantageAdapter;
pub use fixture::{FixtureBook, FixtureSource};
pub use yahoo::YahooAdapter;

use crate::http_client::{HttpClient, HttpErrorKind, HttpRequest};
use crate::{ProviderId, SourceError};

/// Executes `request` and returns the body of a successful response.
///
/// `Ok(None)` means the provider answered 404: it is reachable but knows
/// nothing about the ticker.
async fn fetch_body(
    client: &dyn HttpClient,
    provider: ProviderId,
    request: HttpRequest,
) -> Result<Option<String>, SourceError> {
    let response = client.execute(request).await.map_err(|error| match error.kind() {
        HttpErrorKind::Timeout => SourceError::timeout(format!("{provider}: {}", error.message())),
        HttpErrorKind::Connect | HttpErrorKind::Transport => {
            SourceError::unavailable(format!("{provider}: {}", error.message()))
        }
    })?;

    match response.status {
        _ if response.is_success() => Ok(Some(response.body)),
        404 => Ok(None),
        429 => Err(SourceError::rate_limited(format!(
            "{provider} returned status 429"
        ))),
        status => Err(SourceError::unavailable(format!(
            "{provider} returned status {status}"
        ))),
    }
}
