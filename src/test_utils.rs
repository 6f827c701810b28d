//! Test Utilities Module
//!
//! In-memory ledger and account fixtures for deterministic client tests.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use crate::accounts::{AgentProfile, TaskEscrow};
use crate::codec::{encode_i64, encode_pubkey, encode_text, encode_text_sequence, encode_u64, encode_u8};
use crate::constants::{AGENT_PROFILE_SIZE, TASK_ESCROW_SIZE};
use crate::discriminator::{AGENT_PROFILE_DISCRIMINATOR, TASK_ESCROW_DISCRIMINATOR};
use crate::accounts::{AgentStatus, TaskStatus};
use crate::rpc::{FetchedAccount, LedgerRpc, RpcError, SignatureStatus};
use async_trait::async_trait;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Profile used across tests: "CodeAgent Pro" with three capabilities
pub fn sample_agent_profile(owner: Pubkey) -> AgentProfile {
    AgentProfile {
        owner,
        name: "CodeAgent Pro".to_string(),
        capabilities: vec!["coding".to_string(), "debugging".to_string(), "testing".to_string()],
        pricing_lamports: 50_000_000,
        status: AgentStatus::Active,
        reputation_score: 0,
        tasks_completed: 0,
        total_ratings: 0,
        rating_sum: 0,
        metadata_uri: "https://example.com/agent.json".to_string(),
        bump: 254,
    }
}

pub fn sample_task_escrow(client: Pubkey, agent: Pubkey) -> TaskEscrow {
    TaskEscrow {
        client,
        agent,
        amount: 1_000_000,
        status: TaskStatus::Funded,
        task_id: "task-42".to_string(),
        created_at: 1_700_000_000,
        bump: 253,
    }
}

/// Serialize a profile the way the program stores it, padded to its allocation
pub fn encode_agent_profile(profile: &AgentProfile) -> Vec<u8> {
    let mut data = AGENT_PROFILE_DISCRIMINATOR.to_vec();
    encode_pubkey(&mut data, &profile.owner);
    encode_text(&mut data, &profile.name).expect("fixture name fits");
    encode_text_sequence(&mut data, &profile.capabilities).expect("fixture capabilities fit");
    encode_u64(&mut data, profile.pricing_lamports);
    encode_u8(&mut data, profile.status.as_byte());
    encode_u64(&mut data, profile.reputation_score);
    encode_u64(&mut data, profile.tasks_completed);
    encode_u64(&mut data, profile.total_ratings);
    encode_u64(&mut data, profile.rating_sum);
    encode_text(&mut data, &profile.metadata_uri).expect("fixture uri fits");
    encode_u8(&mut data, profile.bump);
    data.resize(data.len().max(AGENT_PROFILE_SIZE), 0);
    data
}

pub fn encode_task_escrow(escrow: &TaskEscrow) -> Vec<u8> {
    let mut data = TASK_ESCROW_DISCRIMINATOR.to_vec();
    encode_pubkey(&mut data, &escrow.client);
    encode_pubkey(&mut data, &escrow.agent);
    encode_u64(&mut data, escrow.amount);
    encode_u8(&mut data, escrow.status.as_byte());
    encode_text(&mut data, &escrow.task_id).expect("fixture task id fits");
    encode_i64(&mut data, escrow.created_at);
    encode_u8(&mut data, escrow.bump);
    data.resize(data.len().max(TASK_ESCROW_SIZE), 0);
    data
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Pubkey, FetchedAccount>,
    statuses: HashMap<Signature, VecDeque<SignatureStatus>>,
    logs: HashMap<Signature, Vec<String>>,
    next_submission: Option<VecDeque<SignatureStatus>>,
    next_logs: Option<Vec<String>>,
    land_on_send: Vec<(Pubkey, FetchedAccount)>,
    send_errors: VecDeque<RpcError>,
    failing_status_queries: u32,
    blockhash_requests: u32,
    sent: Vec<Transaction>,
    calls: Vec<&'static str>,
}

/// In-memory [`LedgerRpc`]
///
/// Unscripted signatures stay `Pending` forever. A script's last status
/// repeats once the earlier ones have been served.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_account(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.state().accounts.insert(
            address,
            FetchedAccount {
                owner,
                lamports: 1_000_000,
                data,
            },
        );
    }

    pub fn set_agent_profile(&self, program_id: Pubkey, address: Pubkey, profile: &AgentProfile) {
        self.set_account(address, program_id, encode_agent_profile(profile));
    }

    pub fn set_task_escrow(&self, program_id: Pubkey, address: Pubkey, escrow: &TaskEscrow) {
        self.set_account(address, program_id, encode_task_escrow(escrow));
    }

    pub fn script_statuses(&self, signature: &Signature, statuses: Vec<SignatureStatus>) {
        self.state().statuses.insert(*signature, statuses.into());
    }

    /// Status script for whatever the next submitted transaction is
    pub fn script_next_submission(&self, statuses: Vec<SignatureStatus>) {
        self.state().next_submission = Some(statuses.into());
    }

    /// Log lines attached to the next submitted transaction
    pub fn logs_on_send(&self, logs: Vec<String>) {
        self.state().next_logs = Some(logs);
    }

    /// Account state written when the next transaction is submitted
    pub fn land_on_send(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.state().land_on_send.push((
            address,
            FetchedAccount {
                owner,
                lamports: 1_000_000,
                data,
            },
        ));
    }

    pub fn fail_next_send(&self, error: RpcError) {
        self.state().send_errors.push_back(error);
    }

    pub fn fail_status_queries(&self, count: u32) {
        self.state().failing_status_queries = count;
    }

    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.state().sent.clone()
    }

    pub fn blockhash_requests(&self) -> u32 {
        self.state().blockhash_requests
    }

    /// Names of ledger calls in the order they were made
    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<FetchedAccount>, RpcError> {
        let mut state = self.state();
        state.calls.push("get_account");
        Ok(state.accounts.get(address).cloned())
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        let mut state = self.state();
        state.calls.push("get_latest_blockhash");
        state.blockhash_requests += 1;
        Ok(Hash::new_from_array([u8::try_from(state.blockhash_requests % 256).unwrap_or(0); 32]))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        let mut state = self.state();
        state.calls.push("send_transaction");
        if let Some(err) = state.send_errors.pop_front() {
            return Err(err);
        }
        if transaction.verify().is_err() {
            return Err(RpcError::RpcResponse {
                endpoint: "mock".to_string(),
                message: "Transaction signature verification failure".to_string(),
                code: Some(-32003),
            });
        }

        let signature = transaction.signatures[0];
        if let Some(script) = state.next_submission.take() {
            state.statuses.insert(signature, script);
        }
        if let Some(logs) = state.next_logs.take() {
            state.logs.insert(signature, logs);
        }
        let landed: Vec<_> = state.land_on_send.drain(..).collect();
        state.accounts.extend(landed);
        state.sent.push(transaction.clone());
        Ok(signature)
    }

    async fn get_signature_status(&self, signature: &Signature) -> Result<SignatureStatus, RpcError> {
        let mut state = self.state();
        state.calls.push("get_signature_status");
        if state.failing_status_queries > 0 {
            state.failing_status_queries -= 1;
            return Err(RpcError::Transport {
                endpoint: "mock".to_string(),
                message: "connection reset".to_string(),
            });
        }

        let Some(script) = state.statuses.get_mut(signature) else {
            return Ok(SignatureStatus::Pending);
        };
        let status = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        Ok(status.unwrap_or(SignatureStatus::Pending))
    }

    async fn get_transaction_logs(&self, signature: &Signature) -> Result<Option<Vec<String>>, RpcError> {
        Ok(self.state().logs.get(signature).cloned())
    }
}
