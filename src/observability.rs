//! Correlation identifiers and per-operation context

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

/// Correlation ID tying together every log line of one client operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Context created at the start of each write operation
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub correlation_id: CorrelationId,
    pub operation: &'static str,
    started: Instant,
}

impl OperationContext {
    pub fn new(operation: &'static str) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            operation,
            started: Instant::now(),
        }
    }

    /// Milliseconds since the operation started
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
