use super::{FetchedAccount, LedgerRpc, RpcError, SignatureStatus};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcSendTransactionConfig, RpcTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::UiTransactionEncoding;
use std::time::Duration;
use tracing::debug;

/// [`LedgerRpc`] backed by a JSON-RPC endpoint
pub struct SolanaLedgerRpc {
    client: RpcClient,
    endpoint: String,
    commitment: CommitmentConfig,
}

impl SolanaLedgerRpc {
    pub fn new(endpoint: impl Into<String>, commitment: CommitmentConfig, timeout: Duration) -> Self {
        let endpoint = endpoint.into();
        let client = RpcClient::new_with_timeout_and_commitment(endpoint.clone(), timeout, commitment);
        Self {
            client,
            endpoint,
            commitment,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify(&self, err: solana_client::client_error::ClientError) -> RpcError {
        RpcError::from_client_error(err, &self.endpoint)
    }
}

#[async_trait]
impl LedgerRpc for SolanaLedgerRpc {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<FetchedAccount>, RpcError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(|e| self.classify(e))?;

        Ok(response.value.map(|account| FetchedAccount {
            owner: account.owner,
            lamports: account.lamports,
            data: account.data,
        }))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        let (blockhash, _last_valid_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .map_err(|e| self.classify(e))?;
        Ok(blockhash)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(self.commitment.commitment),
            ..RpcSendTransactionConfig::default()
        };
        let signature = self
            .client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(|e| self.classify(e))?;
        debug!(endpoint = %self.endpoint, signature = %signature, "Transaction accepted by node");
        Ok(signature)
    }

    async fn get_signature_status(&self, signature: &Signature) -> Result<SignatureStatus, RpcError> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| self.classify(e))?;

        let status = response
            .value
            .into_iter()
            .next()
            .ok_or_else(|| RpcError::InvalidResponse("empty signature status list".to_string()))?;

        Ok(match status {
            None => SignatureStatus::Pending,
            Some(status) => match status.err {
                Some(err) => SignatureStatus::Failed(err),
                None if status.satisfies_commitment(self.commitment) => SignatureStatus::Confirmed,
                None => SignatureStatus::Pending,
            },
        })
    }

    async fn get_transaction_logs(&self, signature: &Signature) -> Result<Option<Vec<String>>, RpcError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };
        let tx = self
            .client
            .get_transaction_with_config(signature, config)
            .await
            .map_err(|e| self.classify(e))?;

        Ok(match tx.transaction.meta.map(|meta| meta.log_messages) {
            Some(OptionSerializer::Some(logs)) => Some(logs),
            _ => None,
        })
    }
}
