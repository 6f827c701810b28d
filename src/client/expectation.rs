//! Post-state checks used when confirmation polling gives no verdict
//!
//! An operation counts as landed only when the account moved from a state
//! the operation would change into the state it produces. The account as it
//! was before submission is recorded for that comparison; a state that
//! already held before submission proves nothing.

use crate::accounts::{AgentProfile, AgentStatus, TaskEscrow, TaskStatus};
use crate::rpc::FetchedAccount;
use crate::tx_builder::AgentUpdate;
use solana_sdk::pubkey::Pubkey;

/// What `account` must look like once the operation has landed
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PostState {
    pub account: Pubkey,
    pub expectation: Expectation,
    before: Option<FetchedAccount>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expectation {
    /// No profile before, this owner and name after
    ProfileRegistered { owner: Pubkey, name: String },
    ProfileMatches(AgentUpdate),
    ProfileStatus(AgentStatus),
    /// Exactly one more rating, carrying this value
    Rated(u8),
    EscrowCreated {
        client: Pubkey,
        agent: Pubkey,
        task_id: String,
        amount: u64,
    },
    EscrowReached(TaskStatus),
}

impl PostState {
    pub fn new(account: Pubkey, expectation: Expectation) -> Self {
        Self {
            account,
            expectation,
            before: None,
        }
    }

    /// Record the account as fetched before submission
    pub fn with_snapshot(mut self, before: Option<FetchedAccount>) -> Self {
        self.before = before;
        self
    }

    /// Whether the operation's target state already held before submission
    pub fn held_before(&self, program_id: &Pubkey) -> bool {
        self.holds(self.before.as_ref(), program_id)
    }

    /// Whether the fetched account shows this operation's transition
    pub fn observed_in(&self, account: Option<&FetchedAccount>, program_id: &Pubkey) -> bool {
        let before = self.before.as_ref();
        match &self.expectation {
            Expectation::ProfileRegistered { .. } => {
                profile(before, program_id).is_none() && self.holds(account, program_id)
            }
            Expectation::EscrowCreated { .. } => {
                escrow(before, program_id).is_none() && self.holds(account, program_id)
            }
            Expectation::ProfileMatches(_) | Expectation::ProfileStatus(_) => {
                profile(before, program_id).is_some()
                    && !self.holds(before, program_id)
                    && self.holds(account, program_id)
            }
            Expectation::EscrowReached(_) => {
                escrow(before, program_id).is_some()
                    && !self.holds(before, program_id)
                    && self.holds(account, program_id)
            }
            Expectation::Rated(rating) => {
                let (Some(prior), Some(now)) = (profile(before, program_id), profile(account, program_id)) else {
                    return false;
                };
                prior.total_ratings.checked_add(1) == Some(now.total_ratings)
                    && prior.rating_sum.checked_add(u64::from(*rating)) == Some(now.rating_sum)
            }
        }
    }

    // Target state, ignoring how the account got there
    fn holds(&self, account: Option<&FetchedAccount>, program_id: &Pubkey) -> bool {
        match &self.expectation {
            Expectation::ProfileRegistered { owner, name } => {
                profile(account, program_id).is_some_and(|p| &p.owner == owner && &p.name == name)
            }
            Expectation::ProfileMatches(update) => profile(account, program_id).is_some_and(|p| applies(update, &p)),
            Expectation::ProfileStatus(status) => profile(account, program_id).is_some_and(|p| p.status == *status),
            Expectation::Rated(_) => false,
            Expectation::EscrowCreated {
                client,
                agent,
                task_id,
                amount,
            } => escrow(account, program_id).is_some_and(|e| {
                &e.client == client && &e.agent == agent && &e.task_id == task_id && e.amount == *amount
            }),
            Expectation::EscrowReached(status) => {
                escrow(account, program_id).is_some_and(|e| e.status.has_reached(*status))
            }
        }
    }
}

fn profile(account: Option<&FetchedAccount>, program_id: &Pubkey) -> Option<AgentProfile> {
    account
        .filter(|a| &a.owner == program_id)
        .and_then(|a| AgentProfile::try_decode(&a.data))
}

fn escrow(account: Option<&FetchedAccount>, program_id: &Pubkey) -> Option<TaskEscrow> {
    account
        .filter(|a| &a.owner == program_id)
        .and_then(|a| TaskEscrow::try_decode(&a.data))
}

fn applies(update: &AgentUpdate, profile: &AgentProfile) -> bool {
    update.name.as_ref().map_or(true, |n| n == &profile.name)
        && update
            .capabilities
            .as_ref()
            .map_or(true, |c| c == &profile.capabilities)
        && update.pricing_lamports.map_or(true, |p| p == profile.pricing_lamports)
        && update
            .metadata_uri
            .as_ref()
            .map_or(true, |u| u == &profile.metadata_uri)
}
