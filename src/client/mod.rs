//! Registry client: one async call per registry operation
//!
//! Write path: derive → build → snapshot the affected account → fetch
//! blockhash → sign → submit once → poll confirmation. When polling runs out
//! without a verdict the client fetches the account again and succeeds only
//! if it moved from the snapshot into the state the operation produces;
//! otherwise it returns
//! [`RegistryError::ConfirmationUnknown`]. It never resubmits.
//!
//! Read path: derive → fetch → decode → [`AccountFetch`].

mod expectation;

use crate::accounts::{AccountFetch, AgentProfile, AgentStatus, DecodeError, TaskEscrow, TaskStatus};
use crate::config::Config;
use crate::discriminator::InstructionTags;
use crate::errors::RegistryError;
use crate::events::{parse_logs, RegistryEvent};
use crate::observability::OperationContext;
use crate::rpc::{await_confirmation, ConfirmationOutcome, ConfirmationPolicy, FetchedAccount, LedgerRpc, SolanaLedgerRpc};
use crate::signer::SignerService;
use crate::structured_logging::OperationLogger;
use crate::tx_builder::{AgentUpdate, BuilderError, RegistryInstructionBuilder};
use expectation::{Expectation, PostState};
use solana_sdk::{
    instruction::Instruction, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};
use std::sync::Arc;
use tracing::debug;

/// Async client for the agent registry program
///
/// Immutable after construction and cheap to share behind an `Arc`.
pub struct RegistryClient {
    rpc: Arc<dyn LedgerRpc>,
    signer: Arc<dyn SignerService>,
    program_id: Pubkey,
    tags: &'static InstructionTags,
    confirmation: ConfirmationPolicy,
}

impl RegistryClient {
    pub fn new(rpc: Arc<dyn LedgerRpc>, signer: Arc<dyn SignerService>, program_id: Pubkey) -> Self {
        Self {
            rpc,
            signer,
            program_id,
            tags: InstructionTags::shared(),
            confirmation: ConfirmationPolicy::default(),
        }
    }

    /// Client over JSON-RPC with endpoint, program and polling taken from `config`
    pub fn from_config(config: &Config, signer: Arc<dyn SignerService>) -> Result<Self, RegistryError> {
        config.validate()?;
        let rpc = SolanaLedgerRpc::new(config.rpc.url.clone(), config.commitment()?, config.rpc_timeout());
        Ok(Self::new(Arc::new(rpc), signer, config.program_id()?)
            .with_confirmation(config.confirmation_policy()))
    }

    pub fn with_confirmation(mut self, policy: ConfirmationPolicy) -> Self {
        self.confirmation = policy;
        self
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// The fee payer and signing identity for every write
    pub fn signer_pubkey(&self) -> Pubkey {
        self.signer.pubkey()
    }

    pub fn builder(&self) -> RegistryInstructionBuilder<'static> {
        RegistryInstructionBuilder::new(self.program_id, self.tags)
    }

    pub fn agent_profile_address(&self, owner: &Pubkey) -> Result<Pubkey, BuilderError> {
        self.builder().agent_profile_address(owner)
    }

    pub fn task_escrow_address(&self, client: &Pubkey, task_id: &str) -> Result<Pubkey, BuilderError> {
        self.builder().task_escrow_address(client, task_id)
    }

    /// Register the signer as an agent
    pub async fn register_agent<S: AsRef<str>>(
        &self,
        name: &str,
        capabilities: &[S],
        pricing_lamports: u64,
        metadata_uri: &str,
    ) -> Result<Signature, RegistryError> {
        let owner = self.signer.pubkey();
        let ix = self
            .builder()
            .register_agent(&owner, name, capabilities, pricing_lamports, metadata_uri)?;
        let profile = self.agent_profile_address(&owner)?;
        let post = PostState::new(
            profile,
            Expectation::ProfileRegistered {
                owner,
                name: name.to_string(),
            },
        );
        self.submit("register_agent", ix, post).await
    }

    /// Change any subset of the signer's profile fields
    pub async fn update_agent(&self, update: &AgentUpdate) -> Result<Signature, RegistryError> {
        let owner = self.signer.pubkey();
        let ix = self.builder().update_agent(&owner, update)?;
        let post = PostState::new(
            self.agent_profile_address(&owner)?,
            Expectation::ProfileMatches(update.clone()),
        );
        self.submit("update_agent", ix, post).await
    }

    pub async fn deactivate_agent(&self) -> Result<Signature, RegistryError> {
        let owner = self.signer.pubkey();
        let ix = self.builder().deactivate_agent(&owner)?;
        let post = PostState::new(
            self.agent_profile_address(&owner)?,
            Expectation::ProfileStatus(AgentStatus::Inactive),
        );
        self.submit("deactivate_agent", ix, post).await
    }

    pub async fn activate_agent(&self) -> Result<Signature, RegistryError> {
        let owner = self.signer.pubkey();
        let ix = self.builder().activate_agent(&owner)?;
        let post = PostState::new(
            self.agent_profile_address(&owner)?,
            Expectation::ProfileStatus(AgentStatus::Active),
        );
        self.submit("activate_agent", ix, post).await
    }

    /// Fund an escrow from the signer for work by the agent at `agent_profile`
    pub async fn create_task(
        &self,
        agent_profile: &Pubkey,
        task_id: &str,
        amount_lamports: u64,
    ) -> Result<Signature, RegistryError> {
        let client = self.signer.pubkey();
        let ix = self
            .builder()
            .create_task(&client, agent_profile, task_id, amount_lamports)?;
        let post = PostState::new(
            self.task_escrow_address(&client, task_id)?,
            Expectation::EscrowCreated {
                client,
                agent: *agent_profile,
                task_id: task_id.to_string(),
                amount: amount_lamports,
            },
        );
        self.submit("create_task", ix, post).await
    }

    /// Accept a funded task as the signer's agent
    pub async fn accept_task(&self, escrow: &Pubkey) -> Result<Signature, RegistryError> {
        let agent_owner = self.signer.pubkey();
        let agent_profile = self.agent_profile_address(&agent_owner)?;
        let ix = self.builder().accept_task(escrow, &agent_profile, &agent_owner);
        let post = PostState::new(*escrow, Expectation::EscrowReached(TaskStatus::InProgress));
        self.submit("accept_task", ix, post).await
    }

    /// Mark the task done and release the escrow to the signer
    pub async fn complete_task(&self, escrow: &Pubkey) -> Result<Signature, RegistryError> {
        let agent_owner = self.signer.pubkey();
        let agent_profile = self.agent_profile_address(&agent_owner)?;
        let ix = self.builder().complete_task(escrow, &agent_profile, &agent_owner);
        let post = PostState::new(*escrow, Expectation::EscrowReached(TaskStatus::Completed));
        self.submit("complete_task", ix, post).await
    }

    /// Rate the agent behind a completed escrow funded by the signer
    pub async fn rate_agent(
        &self,
        escrow: &Pubkey,
        agent_profile: &Pubkey,
        rating: u8,
    ) -> Result<Signature, RegistryError> {
        let client = self.signer.pubkey();
        let ix = self.builder().rate_agent(escrow, agent_profile, &client, rating)?;
        // Ratings leave no trace on the escrow; the profile's counters move instead
        let post = PostState::new(*agent_profile, Expectation::Rated(rating));
        self.submit("rate_agent", ix, post).await
    }

    pub async fn fetch_agent_profile(&self, owner: &Pubkey) -> Result<AccountFetch<AgentProfile>, RegistryError> {
        let address = self.agent_profile_address(owner)?;
        self.fetch_agent_profile_at(&address).await
    }

    pub async fn fetch_agent_profile_at(&self, address: &Pubkey) -> Result<AccountFetch<AgentProfile>, RegistryError> {
        let account = self.rpc.get_account(address).await?;
        Ok(self.classify(account, AgentProfile::decode))
    }

    pub async fn fetch_task_escrow(
        &self,
        client: &Pubkey,
        task_id: &str,
    ) -> Result<AccountFetch<TaskEscrow>, RegistryError> {
        let address = self.task_escrow_address(client, task_id)?;
        self.fetch_task_escrow_at(&address).await
    }

    pub async fn fetch_task_escrow_at(&self, address: &Pubkey) -> Result<AccountFetch<TaskEscrow>, RegistryError> {
        let account = self.rpc.get_account(address).await?;
        Ok(self.classify(account, TaskEscrow::decode))
    }

    /// Registry events emitted by a landed transaction
    pub async fn fetch_events(&self, signature: &Signature) -> Result<Vec<RegistryEvent>, RegistryError> {
        let logs = self.rpc.get_transaction_logs(signature).await?;
        Ok(logs.map(|logs| parse_logs(&logs)).unwrap_or_default())
    }

    fn classify<T>(
        &self,
        account: Option<FetchedAccount>,
        decode: fn(&[u8]) -> Result<T, DecodeError>,
    ) -> AccountFetch<T> {
        match account {
            None => AccountFetch::NotFound,
            Some(account) if account.owner != self.program_id => {
                AccountFetch::from_decoded(Err(DecodeError::WrongOwner(account.owner)))
            }
            Some(account) => AccountFetch::from_program_account(decode(&account.data)),
        }
    }

    async fn submit(
        &self,
        operation: &'static str,
        instruction: Instruction,
        post: PostState,
    ) -> Result<Signature, RegistryError> {
        let logger = OperationLogger::new(OperationContext::new(operation));
        let payer = self.signer.pubkey();
        logger.log_start(&payer, &post.account);

        // Reconciliation compares against the account as it was before submission
        let before = self.rpc.get_account(&post.account).await?;
        let post = post.with_snapshot(before);

        let mut transaction = Transaction::new_with_payer(&[instruction], Some(&payer));
        transaction.message.recent_blockhash = self.rpc.get_latest_blockhash().await?;
        let signed = self.signer.sign_transaction(transaction).await?;
        // Payer signs first; this is the id the ledger will report
        let local_signature = signed.signatures.first().copied().unwrap_or_default();

        let signature = match self.rpc.send_transaction(&signed).await {
            Ok(signature) => signature,
            Err(err) => {
                if let Some(tx_err) = err.transaction_error() {
                    logger.log_failed(&local_signature, &err.to_string());
                    return Err(RegistryError::transaction_failed(local_signature, tx_err.clone()));
                }
                return Err(err.into());
            }
        };
        logger.log_submitted(&signature);

        match await_confirmation(self.rpc.as_ref(), &signature, &self.confirmation).await {
            ConfirmationOutcome::Confirmed { attempts } => {
                logger.log_confirmed(&signature, attempts);
                Ok(signature)
            }
            ConfirmationOutcome::Failed { error, .. } => {
                logger.log_failed(&signature, &error.to_string());
                Err(RegistryError::transaction_failed(signature, error))
            }
            ConfirmationOutcome::Unknown { attempts, .. } => {
                if post.held_before(&self.program_id) {
                    debug!(
                        signature = %signature,
                        account = %post.account,
                        "Target state predates submission, not evidence of landing"
                    );
                }
                let observed = match self.rpc.get_account(&post.account).await {
                    Ok(account) => post.observed_in(account.as_ref(), &self.program_id),
                    Err(_) => false,
                };
                logger.log_reconciled(&signature, &post.account, observed);
                if observed {
                    Ok(signature)
                } else {
                    Err(RegistryError::ConfirmationUnknown {
                        signature,
                        account: post.account,
                        attempts,
                    })
                }
            }
        }
    }
}
