use crate::accounts::DecodeError;
use crate::config::ConfigError;
use crate::program_errors::ProgramErrorCode;
use crate::rpc::RpcError;
use crate::signer::SignerError;
use crate::tx_builder::BuilderError;
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::TransactionError};
use thiserror::Error;

/// Everything a [`RegistryClient`](crate::client::RegistryClient) call can fail with
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Rejected before any network access
    #[error("Invalid arguments: {0}")]
    Builder(#[from] BuilderError),

    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Account decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The ledger executed or simulated the transaction and rejected it
    #[error("Transaction {signature} failed: {error}{}", .program_error.map(|c| format!(" [{c}]")).unwrap_or_default())]
    TransactionFailed {
        signature: Signature,
        error: TransactionError,
        program_error: Option<ProgramErrorCode>,
    },

    /// Neither confirmed nor failed within the polling budget, and the
    /// expected state of `account` was not observed afterwards
    #[error("Outcome of {signature} unknown after {attempts} status checks; re-check {account} before resubmitting")]
    ConfirmationUnknown {
        signature: Signature,
        account: Pubkey,
        attempts: u32,
    },
}

impl RegistryError {
    pub(crate) fn transaction_failed(signature: Signature, error: TransactionError) -> Self {
        let program_error = ProgramErrorCode::from_transaction_error(&error);
        Self::TransactionFailed {
            signature,
            error,
            program_error,
        }
    }

    /// Program error code, when the program itself rejected the transaction
    pub fn program_error(&self) -> Option<ProgramErrorCode> {
        match self {
            Self::TransactionFailed { program_error, .. } => *program_error,
            _ => None,
        }
    }

    /// Whether a fresh attempt could succeed without changing the inputs
    ///
    /// `ConfirmationUnknown` is never retryable: the first
    /// submission may still land.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rpc(err) => err.is_retryable(),
            Self::Signer(err) => err.is_retryable(),
            _ => false,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Builder(_) => "validation",
            Self::Signer(_) => "signer",
            Self::Rpc(_) => "rpc",
            Self::Decode(_) => "decode",
            Self::Config(_) => "config",
            Self::TransactionFailed { .. } => "transaction_failed",
            Self::ConfirmationUnknown { .. } => "confirmation_unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::instruction::InstructionError;

    #[test]
    fn test_transaction_failed_decodes_program_error() {
        let err = RegistryError::transaction_failed(
            Signature::default(),
            TransactionError::InstructionError(0, InstructionError::Custom(6006)),
        );
        assert_eq!(err.program_error(), Some(ProgramErrorCode::AgentNotActive));
        assert!(err.to_string().contains("Agent is not active"));
        assert_eq!(err.category(), "transaction_failed");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_builder_errors_are_validation() {
        let err: RegistryError = BuilderError::InvalidRating(6).into();
        assert_eq!(err.category(), "validation");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unknown_is_not_retryable() {
        let err = RegistryError::ConfirmationUnknown {
            signature: Signature::default(),
            account: Pubkey::new_unique(),
            attempts: 30,
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("before resubmitting"));
    }

    #[test]
    fn test_rpc_retryability_passes_through() {
        let err: RegistryError = RpcError::Timeout {
            endpoint: "e".to_string(),
            timeout_ms: 10,
        }
        .into();
        assert!(err.is_retryable());
    }
}
