//! Core contracts for freeflow.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - Provider identifiers and the statement source contract
//! - HTTP-backed provider adapters and an offline fixture source
//! - The statement normalizer and its alias table
//! - The free cash flow TTM strategy ladder and resolver
//!
//! ```text
//! StatementSource ──raw statements──▶ normalizer ──StatementSeries──▶ Strategy ladder
//!      (yahoo, alphavantage, fixture)     (AliasTable)                      │
//!                                                                           ▼
//!                                                              FcfResolver ─▶ MetricResult
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use freeflow_core::{FcfResolver, Symbol, YahooAdapter};
//!
//! # async fn run() -> Result<(), freeflow_core::ValidationError> {
//! let resolver = FcfResolver::new(Arc::new(YahooAdapter::default()));
//! let result = resolver.resolve(&Symbol::parse("AAPL")?).await;
//! println!("{}", serde_json::to_string(&result).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod metric;
pub mod normalizer;
pub mod resolver;
pub mod source;
pub mod strategy;
pub mod throttling;

pub use adapters::{AlphaVantageAdapter, FixtureBook, FixtureSource, YahooAdapter};
pub use data_source::{
    SourceError, SourceErrorKind, SourceFuture, StatementSource, StatementsRequest,
};
pub use domain::{Period, Periodicity, RawStatement, StatementSeries, Symbol, UtcDateTime};
pub use error::{CoreError, ValidationError};
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use metric::{FcfNote, MetricError, MetricResult, MetricView};
pub use normalizer::{normalize, normalize_with, AliasTable, LogicalField};
pub use resolver::{resolve_statements, FcfResolver, Resolution};
pub use source::ProviderId;
pub use strategy::{Strategy, TTM_QUARTERS};
pub use throttling::{QuotaPolicy, RateGate};
