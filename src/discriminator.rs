//! Instruction, account and event discriminators
//!
//! The program prefixes every instruction payload, account body and emitted
//! event with the first 8 bytes of `sha256("<namespace>:<name>")`:
//! - instructions: `global:<snake_case_name>`
//! - accounts: `account:<TypeName>`
//! - events: `event:<EventName>`
//!
//! The instruction table is computed once per process and handed to the
//! builders by reference.

use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of every discriminator/tag
pub const DISCRIMINATOR_LEN: usize = 8;

pub type Discriminator = [u8; DISCRIMINATOR_LEN];

/// First 8 bytes of `sha256("{namespace}:{name}")`
pub fn sighash(namespace: &str, name: &str) -> Discriminator {
    let digest = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut tag = [0u8; DISCRIMINATOR_LEN];
    tag.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    tag
}

/// The eight operations exposed by the registry program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryInstruction {
    RegisterAgent,
    UpdateAgent,
    DeactivateAgent,
    ActivateAgent,
    CreateTask,
    AcceptTask,
    CompleteTask,
    RateAgent,
}

impl RegistryInstruction {
    pub const ALL: [RegistryInstruction; 8] = [
        Self::RegisterAgent,
        Self::UpdateAgent,
        Self::DeactivateAgent,
        Self::ActivateAgent,
        Self::CreateTask,
        Self::AcceptTask,
        Self::CompleteTask,
        Self::RateAgent,
    ];

    /// Method name as declared by the program
    pub fn name(self) -> &'static str {
        match self {
            Self::RegisterAgent => "register_agent",
            Self::UpdateAgent => "update_agent",
            Self::DeactivateAgent => "deactivate_agent",
            Self::ActivateAgent => "activate_agent",
            Self::CreateTask => "create_task",
            Self::AcceptTask => "accept_task",
            Self::CompleteTask => "complete_task",
            Self::RateAgent => "rate_agent",
        }
    }

    /// Whether a successful call moves lamports in or out of an escrow
    pub fn moves_funds(self) -> bool {
        matches!(self, Self::CreateTask | Self::CompleteTask)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RegistryInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only mapping from operation to its 8-byte tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionTags {
    tags: [Discriminator; 8],
}

static INSTRUCTION_TAGS: Lazy<InstructionTags> = Lazy::new(InstructionTags::derive);

impl InstructionTags {
    /// Compute every tag from its method name
    pub fn derive() -> Self {
        let mut tags = [[0u8; DISCRIMINATOR_LEN]; 8];
        for ix in RegistryInstruction::ALL {
            tags[ix.index()] = sighash("global", ix.name());
        }
        Self { tags }
    }

    /// Process-wide table, derived on first use
    pub fn shared() -> &'static InstructionTags {
        &INSTRUCTION_TAGS
    }

    pub fn tag(&self, ix: RegistryInstruction) -> Discriminator {
        self.tags[ix.index()]
    }

    /// Reverse lookup, used when inspecting raw instruction data
    pub fn identify(&self, data: &[u8]) -> Option<RegistryInstruction> {
        let prefix = data.get(..DISCRIMINATOR_LEN)?;
        RegistryInstruction::ALL
            .into_iter()
            .find(|ix| self.tags[ix.index()] == prefix)
    }
}

pub static AGENT_PROFILE_DISCRIMINATOR: Lazy<Discriminator> =
    Lazy::new(|| sighash("account", "AgentProfile"));

pub static TASK_ESCROW_DISCRIMINATOR: Lazy<Discriminator> =
    Lazy::new(|| sighash("account", "TaskEscrow"));
