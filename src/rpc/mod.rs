//! Ledger access used by the registry client
//!
//! - **errors**: classified node failures
//! - **solana**: [`LedgerRpc`] over the nonblocking JSON-RPC client
//! - **confirm**: bounded confirmation polling with backoff and a deadline

pub mod confirm;
pub mod errors;
pub mod solana;

pub use confirm::{await_confirmation, ConfirmationOutcome, ConfirmationPolicy};
pub use errors::RpcError;
pub use solana::SolanaLedgerRpc;

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction,
    transaction::TransactionError,
};

/// Raw account as returned by the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAccount {
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

/// Where a submitted transaction stands at the configured commitment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Not seen yet, or seen below the commitment level
    Pending,
    Confirmed,
    Failed(TransactionError),
}

/// The ledger operations the client depends on
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// `Ok(None)` when no account exists at `address`
    async fn get_account(&self, address: &Pubkey) -> Result<Option<FetchedAccount>, RpcError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError>;

    /// Submit once; implementations must not resubmit on their own
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError>;

    async fn get_signature_status(&self, signature: &Signature) -> Result<SignatureStatus, RpcError>;

    /// Log messages of a landed transaction, when the node still has them
    async fn get_transaction_logs(&self, _signature: &Signature) -> Result<Option<Vec<String>>, RpcError> {
        Ok(None)
    }
}
