use std::fmt::{Display, Formatter};

use freeflow_core::ProviderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::EnvelopeMeta;

pub const SCHEMA_VERSION: &str = "v1.0.0";

/// Request identifier (UUID v4) for end-to-end request tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Command metadata collected while a command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub request_id: RequestId,
    pub source: ProviderId,
    pub latency_ms: u64,
    pub warnings: Vec<String>,
}

impl Metadata {
    pub fn new(source: ProviderId, latency_ms: u64) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            source,
            latency_ms,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn into_envelope_meta(self) -> EnvelopeMeta {
        let mut meta = EnvelopeMeta::new(
            self.request_id.to_string(),
            SCHEMA_VERSION,
            self.source,
            self.latency_ms,
        );
        for warning in self.warnings {
            meta.push_warning(warning);
        }
        meta
    }
}
