//! Statement source contract and its error type.
//!
//! Every provider adapter implements [`StatementSource`]: given a ticker and a
//! periodicity it returns the provider's cash-flow statements untouched apart
//! from decoding. Field naming, missing values and ordering are left to the
//! normalizer.
//!
//! An `Ok` with an empty list means the provider answered but has nothing for
//! the ticker. Anything that stops the provider from answering is a
//! [`SourceError`].

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{Periodicity, ProviderId, RawStatement, Symbol};

/// Boxed future returned by statement sources.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Transport failure or non-success status.
    Unavailable,
    Timeout,
    RateLimited,
    /// The provider answered with a payload that could not be decoded.
    Malformed,
    /// The provider answered with an explicit error message.
    Provider,
}

/// Structured source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    fn build(kind: SourceErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::build(SourceErrorKind::Unavailable, message, true)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::build(SourceErrorKind::Timeout, message, true)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::build(SourceErrorKind::RateLimited, message, true)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::build(SourceErrorKind::Malformed, message, false)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::build(SourceErrorKind::Provider, message, false)
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Hint for callers that choose to retry; the core never does.
    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::Provider => "source.provider",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for cash-flow statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementsRequest {
    pub symbol: Symbol,
    pub periodicity: Periodicity,
}

impl StatementsRequest {
    pub fn new(symbol: Symbol, periodicity: Periodicity) -> Self {
        Self {
            symbol,
            periodicity,
        }
    }

    pub fn quarterly(symbol: Symbol) -> Self {
        Self::new(symbol, Periodicity::Quarterly)
    }

    pub fn annual(symbol: Symbol) -> Self {
        Self::new(symbol, Periodicity::Annual)
    }
}

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`: one source is shared by every
/// concurrent resolution.
pub trait StatementSource: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches the raw cash-flow statements for one ticker and cadence.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the provider cannot be reached, rejects the
    /// request, or answers with something that is not a statement payload.
    fn cash_flow_statements<'a>(
        &'a self,
        req: StatementsRequest,
    ) -> SourceFuture<'a, Vec<RawStatement>>;
}
