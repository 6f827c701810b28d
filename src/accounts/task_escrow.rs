use super::{open, serialize_pubkey, DecodeError};
use crate::constants::MAX_TASK_ID_LEN;
use crate::discriminator::TASK_ESCROW_DISCRIMINATOR;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

/// Escrow lifecycle: Funded -> InProgress -> Completed | Disputed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Funded,
    InProgress,
    Completed,
    Disputed,
}

impl TaskStatus {
    /// Unknown bytes map to `Funded`, the status every escrow starts in
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::InProgress,
            2 => Self::Completed,
            3 => Self::Disputed,
            _ => Self::Funded,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Funded => 0,
            Self::InProgress => 1,
            Self::Completed => 2,
            Self::Disputed => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Disputed)
    }

    /// Whether the program allows moving from `self` to `next`
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Funded, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Disputed)
        )
    }

    /// `self` is `target` or a later stage on the same path
    pub fn has_reached(self, target: TaskStatus) -> bool {
        match target {
            Self::Funded => true,
            Self::InProgress => self != Self::Funded,
            Self::Completed | Self::Disputed => self == target,
        }
    }
}

/// Snapshot of an on-chain task escrow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskEscrow {
    #[serde(serialize_with = "serialize_pubkey")]
    pub client: Pubkey,
    /// Agent profile address, not the agent owner's wallet
    #[serde(serialize_with = "serialize_pubkey")]
    pub agent: Pubkey,
    pub amount: u64,
    pub status: TaskStatus,
    pub task_id: String,
    /// Unix timestamp (seconds) at creation
    pub created_at: i64,
    pub bump: u8,
}

impl TaskEscrow {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = open(data, &TASK_ESCROW_DISCRIMINATOR)?;
        Ok(Self {
            client: reader.read_pubkey("client")?,
            agent: reader.read_pubkey("agent")?,
            amount: reader.read_u64("amount")?,
            status: TaskStatus::from_byte(reader.read_u8("status")?),
            task_id: reader.read_text("task_id", MAX_TASK_ID_LEN)?,
            created_at: reader.read_i64("created_at")?,
            bump: reader.read_u8("bump")?,
        })
    }

    pub fn try_decode(data: &[u8]) -> Option<Self> {
        Self::decode(data).ok()
    }
}
