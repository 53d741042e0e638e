use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::ProviderId;

/// Request budget published by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub provider_id: ProviderId,
    pub window: Duration,
    pub limit: u32,
}

impl QuotaPolicy {
    /// Alpha Vantage free tier: 5 requests per minute.
    pub fn alphavantage_default() -> Self {
        Self {
            provider_id: ProviderId::Alphavantage,
            window: Duration::from_secs(60),
            limit: 5,
        }
    }

    pub fn default_for(provider_id: ProviderId) -> Option<Self> {
        match provider_id {
            ProviderId::Alphavantage => Some(Self::alphavantage_default()),
            ProviderId::Yahoo | ProviderId::Fixture => None,
        }
    }
}

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Non-blocking gate in front of a quota-limited provider.
///
/// A request either fits the budget now or is refused with the wait the caller
/// would need; the gate never sleeps on the caller's behalf.
#[derive(Clone)]
pub struct RateGate {
    limiter: Arc<DirectRateLimiter>,
    clock: DefaultClock,
}

impl RateGate {
    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(window, limit))),
            clock: DefaultClock::default(),
        }
    }

    pub fn from_policy(policy: &QuotaPolicy) -> Self {
        Self::new(policy.window, policy.limit)
    }

    /// Takes one unit of budget, or returns how long until one frees up.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

fn quota_from_window(window: Duration, limit: u32) -> Quota {
    let burst = NonZeroU32::new(limit.max(1)).unwrap_or(NonZeroU32::MIN);
    let seconds_per_cell = (window.as_secs_f64() / f64::from(burst.get())).max(0.001);

    Quota::with_period(Duration::from_secs_f64(seconds_per_cell))
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}
