//! Confirmation polling
//!
//! Polls the signature status with exponential backoff plus jitter until the
//! transaction is confirmed, fails, runs out of attempts, or hits the
//! deadline. Running out is reported as [`ConfirmationOutcome::Unknown`],
//! never as failure: the transaction may still land.

use super::{LedgerRpc, SignatureStatus};
use solana_sdk::{signature::Signature, transaction::TransactionError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Backoff schedule for confirmation polling
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationPolicy {
    /// Maximum number of status queries
    pub max_attempts: u32,

    /// Delay after the first query
    pub base_delay_ms: u64,

    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff
    pub multiplier: f64,

    /// Jitter factor (0.0 - 1.0)
    pub jitter_factor: f64,

    /// Hard limit on total polling time
    pub deadline: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            base_delay_ms: 500,
            max_delay_ms: 4_000,
            multiplier: 1.5,
            jitter_factor: 0.1,
            deadline: Duration::from_secs(60),
        }
    }
}

impl ConfirmationPolicy {
    /// Delay to wait after query number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = (self.base_delay_ms as f64 * self.multiplier.powi(exponent)).min(self.max_delay_ms as f64);

        // Add jitter to prevent thundering herd
        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * self.jitter_factor;
        let jittered = (delay_ms * (1.0 + jitter)).max(0.0) as u64;
        Duration::from_millis(jittered)
    }

    /// Fast schedule for local validators and tests
    pub fn fast() -> Self {
        Self {
            max_attempts: 10,
            base_delay_ms: 100,
            max_delay_ms: 500,
            multiplier: 1.5,
            jitter_factor: 0.0,
            deadline: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed { attempts: u32 },
    Failed { error: TransactionError, attempts: u32 },
    /// Attempts or deadline exhausted without a verdict
    Unknown { attempts: u32, last_error: Option<String> },
}

/// Poll until the signature reaches a verdict or the policy is exhausted
///
/// Status query errors do not abort polling; they count as an attempt and
/// are reported in `last_error` if no verdict is reached.
pub async fn await_confirmation(
    rpc: &dyn LedgerRpc,
    signature: &Signature,
    policy: &ConfirmationPolicy,
) -> ConfirmationOutcome {
    let started = Instant::now();
    let mut last_error = None;
    let mut attempts = 0;

    while attempts < policy.max_attempts {
        let Some(remaining) = policy.deadline.checked_sub(started.elapsed()) else {
            break;
        };
        attempts += 1;

        match tokio::time::timeout(remaining, rpc.get_signature_status(signature)).await {
            Ok(Ok(SignatureStatus::Confirmed)) => return ConfirmationOutcome::Confirmed { attempts },
            Ok(Ok(SignatureStatus::Failed(error))) => return ConfirmationOutcome::Failed { error, attempts },
            Ok(Ok(SignatureStatus::Pending)) => {
                debug!(signature = %signature, attempts, "Transaction not yet confirmed");
            }
            Ok(Err(err)) => {
                warn!(signature = %signature, attempts, error = %err, "Signature status query failed");
                last_error = Some(err.to_string());
            }
            Err(_) => {
                last_error = Some("status query exceeded confirmation deadline".to_string());
                break;
            }
        }

        if attempts >= policy.max_attempts {
            break;
        }
        let delay = policy.delay_for(attempts - 1);
        if started.elapsed() + delay > policy.deadline {
            break;
        }
        tokio::time::sleep(delay).await;
    }

    ConfirmationOutcome::Unknown {
        attempts,
        last_error,
    }
}
