//! # Domain Models
//!
//! Canonical types shared by statement sources, the normalizer and the resolver.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker |
//! | [`UtcDateTime`] | UTC timestamp, accepts fiscal `YYYY-MM-DD` dates |
//! | [`Periodicity`] | Quarterly or annual reporting cadence |
//! | [`RawStatement`] | Provider record keyed by provider field names |
//! | [`Period`] | Reporting interval with the three cash-flow line items |
//! | [`StatementSeries`] | Non-overlapping periods, most recent first |
//!
//! Raw statements are whatever a provider returned; only the normalizer turns
//! them into [`StatementSeries`]. Everything downstream of the normalizer can
//! rely on the series ordering invariant.

mod periodicity;
mod statement;
mod symbol;
mod timestamp;

pub use periodicity::Periodicity;
pub use statement::{Period, RawStatement, StatementSeries};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
