//! Signer abstraction for registry transactions
//!
//! - [`LocalSigner`]: in-process keypair, signs immediately
//! - [`DelegatedSigner`]: hands the transaction to an external party (wallet
//!   extension, approval UI, remote service) over a channel and waits for it
//!   to come back signed
//!
//! The client holds an `Arc<dyn SignerService>` chosen at construction. The
//! signer is always the fee payer and the only required signature.

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer, SignerError as SdkSignerError},
    transaction::Transaction,
};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Signing request rejected: {0}")]
    Rejected(String),

    #[error("No approval within {0:?}")]
    ApprovalTimeout(Duration),

    #[error("Signing channel closed")]
    ChannelClosed,

    #[error("Signer {0} is not a required signer of the transaction")]
    NotASigner(Pubkey),

    #[error("Signed transaction does not match the request")]
    MessageTampered,

    #[error("Missing or invalid signature for {0}")]
    InvalidSignature(Pubkey),
}

impl SignerError {
    pub fn from_signer_error(err: SdkSignerError) -> Self {
        Self::Signing(err.to_string())
    }

    /// Only an unanswered approval may be worth asking for again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ApprovalTimeout(_))
    }
}

/// Something that can produce the fee payer's signature
#[async_trait]
pub trait SignerService: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Sign a transaction whose blockhash is already set
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, SignerError>;
}

/// Keypair held in process memory
pub struct LocalSigner {
    keypair: Keypair,
}

impl LocalSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        crate::wallet::load_keypair(path).map(Self::new)
    }
}

#[async_trait]
impl SignerService for LocalSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(&self, mut transaction: Transaction) -> Result<Transaction, SignerError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[&self.keypair], blockhash)
            .map_err(SignerError::from_signer_error)?;
        Ok(transaction)
    }
}

/// A transaction waiting for an external party to sign it
///
/// Dropping the request without answering is treated as a rejection.
#[derive(Debug)]
pub struct SigningRequest {
    pub transaction: Transaction,
    pub signer: Pubkey,
    respond_to: oneshot::Sender<Result<Transaction, String>>,
}

impl SigningRequest {
    /// Serialized message the signer must sign
    pub fn message_data(&self) -> Vec<u8> {
        self.transaction.message_data()
    }

    pub fn approve(self, signed: Transaction) {
        // Requester may have timed out already
        let _ = self.respond_to.send(Ok(signed));
    }

    pub fn reject(self, reason: impl Into<String>) {
        let _ = self.respond_to.send(Err(reason.into()));
    }
}

/// Signer that forwards every transaction over a channel
#[derive(Clone)]
pub struct DelegatedSigner {
    pubkey: Pubkey,
    requests: mpsc::Sender<SigningRequest>,
    approval_timeout: Option<Duration>,
}

impl DelegatedSigner {
    /// Create the signer and the receiving end the external party listens on
    pub fn channel(pubkey: Pubkey, capacity: usize) -> (Self, mpsc::Receiver<SigningRequest>) {
        let (requests, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                pubkey,
                requests,
                approval_timeout: None,
            },
            receiver,
        )
    }

    /// Give up on an approval after `timeout` instead of waiting forever
    pub fn with_approval_timeout(mut self, timeout: Duration) -> Self {
        self.approval_timeout = Some(timeout);
        self
    }

    fn verify(&self, original: &Transaction, signed: &Transaction) -> Result<(), SignerError> {
        if signed.message != original.message {
            return Err(SignerError::MessageTampered);
        }
        let index = signer_index(signed, &self.pubkey).ok_or(SignerError::NotASigner(self.pubkey))?;
        let message = signed.message_data();
        match signed.signatures.get(index) {
            Some(sig) if sig.verify(self.pubkey.as_ref(), &message) => Ok(()),
            _ => Err(SignerError::InvalidSignature(self.pubkey)),
        }
    }
}

#[async_trait]
impl SignerService for DelegatedSigner {
    fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, SignerError> {
        if signer_index(&transaction, &self.pubkey).is_none() {
            return Err(SignerError::NotASigner(self.pubkey));
        }

        let (respond_to, response) = oneshot::channel();
        let request = SigningRequest {
            transaction: transaction.clone(),
            signer: self.pubkey,
            respond_to,
        };
        self.requests
            .send(request)
            .await
            .map_err(|_| SignerError::ChannelClosed)?;
        debug!(signer = %self.pubkey, "Signing request delivered, awaiting approval");

        let reply = match self.approval_timeout {
            Some(limit) => tokio::time::timeout(limit, response)
                .await
                .map_err(|_| SignerError::ApprovalTimeout(limit))?,
            None => response.await,
        };

        let signed = match reply {
            Ok(Ok(signed)) => signed,
            Ok(Err(reason)) => return Err(SignerError::Rejected(reason)),
            Err(_) => return Err(SignerError::Rejected("request dropped".to_string())),
        };

        if let Err(err) = self.verify(&transaction, &signed) {
            warn!(signer = %self.pubkey, error = %err, "Discarding delegated signature");
            return Err(err);
        }
        Ok(signed)
    }
}

fn signer_index(transaction: &Transaction, pubkey: &Pubkey) -> Option<usize> {
    let required = usize::from(transaction.message.header.num_required_signatures);
    transaction
        .message
        .account_keys
        .iter()
        .take(required)
        .position(|key| key == pubkey)
}
