//! Structured log events for client operations

use crate::observability::OperationContext;
use solana_sdk::{pubkey::Pubkey, signature::Signature};

/// Emits one `tracing` event per stage of a write operation
#[derive(Debug, Clone)]
pub struct OperationLogger {
    ctx: OperationContext,
}

impl OperationLogger {
    pub fn new(ctx: OperationContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &OperationContext {
        &self.ctx
    }

    pub fn log_start(&self, payer: &Pubkey, target: &Pubkey) {
        tracing::debug!(
            operation = self.ctx.operation,
            correlation_id = %self.ctx.correlation_id,
            payer = %payer,
            target = %target,
            "Building registry transaction"
        );
    }

    pub fn log_submitted(&self, signature: &Signature) {
        tracing::info!(
            operation = self.ctx.operation,
            correlation_id = %self.ctx.correlation_id,
            signature = %signature,
            elapsed_ms = self.ctx.elapsed_ms(),
            "Transaction submitted"
        );
    }

    pub fn log_confirmed(&self, signature: &Signature, attempts: u32) {
        tracing::info!(
            operation = self.ctx.operation,
            correlation_id = %self.ctx.correlation_id,
            signature = %signature,
            attempts,
            elapsed_ms = self.ctx.elapsed_ms(),
            "Transaction confirmed"
        );
    }

    pub fn log_failed(&self, signature: &Signature, error: &str) {
        tracing::warn!(
            operation = self.ctx.operation,
            correlation_id = %self.ctx.correlation_id,
            signature = %signature,
            error = %error,
            elapsed_ms = self.ctx.elapsed_ms(),
            "Transaction failed"
        );
    }

    pub fn log_reconciled(&self, signature: &Signature, account: &Pubkey, observed: bool) {
        if observed {
            tracing::info!(
                operation = self.ctx.operation,
                correlation_id = %self.ctx.correlation_id,
                signature = %signature,
                account = %account,
                "Confirmation timed out but expected state is on chain"
            );
        } else {
            tracing::warn!(
                operation = self.ctx.operation,
                correlation_id = %self.ctx.correlation_id,
                signature = %signature,
                account = %account,
                elapsed_ms = self.ctx.elapsed_ms(),
                "Outcome unknown; do not resubmit before re-checking the account"
            );
        }
    }
}
