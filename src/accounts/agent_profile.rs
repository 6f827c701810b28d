use super::{open, serialize_pubkey, DecodeError};
use crate::constants::{MAX_CAPABILITIES, MAX_CAPABILITY_LEN, MAX_METADATA_URI_LEN, MAX_NAME_LEN};
use crate::discriminator::AGENT_PROFILE_DISCRIMINATOR;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

/// Whether an agent currently accepts tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Inactive,
}

impl AgentStatus {
    /// Unknown bytes map to `Active`, the status every profile starts in
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::Inactive,
            _ => Self::Active,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Inactive => 1,
        }
    }
}

/// Snapshot of an on-chain agent profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentProfile {
    #[serde(serialize_with = "serialize_pubkey")]
    pub owner: Pubkey,
    pub name: String,
    pub capabilities: Vec<String>,
    pub pricing_lamports: u64,
    pub status: AgentStatus,
    /// Average rating scaled by 100 (0..=500)
    pub reputation_score: u64,
    pub tasks_completed: u64,
    pub total_ratings: u64,
    pub rating_sum: u64,
    pub metadata_uri: String,
    pub bump: u8,
}

impl AgentProfile {
    /// Decode raw account data, discriminator included
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = open(data, &AGENT_PROFILE_DISCRIMINATOR)?;
        Ok(Self {
            owner: reader.read_pubkey("owner")?,
            name: reader.read_text("name", MAX_NAME_LEN)?,
            capabilities: reader.read_text_sequence("capabilities", MAX_CAPABILITIES, MAX_CAPABILITY_LEN)?,
            pricing_lamports: reader.read_u64("pricing_lamports")?,
            status: AgentStatus::from_byte(reader.read_u8("status")?),
            reputation_score: reader.read_u64("reputation_score")?,
            tasks_completed: reader.read_u64("tasks_completed")?,
            total_ratings: reader.read_u64("total_ratings")?,
            rating_sum: reader.read_u64("rating_sum")?,
            metadata_uri: reader.read_text("metadata_uri", MAX_METADATA_URI_LEN)?,
            bump: reader.read_u8("bump")?,
        })
    }

    /// `decode` with every failure collapsed to `None`
    pub fn try_decode(data: &[u8]) -> Option<Self> {
        Self::decode(data).ok()
    }

    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }

    /// `round(rating_sum / total_ratings * 100)`, or 0 with no ratings
    pub fn expected_reputation(&self) -> u64 {
        if self.total_ratings == 0 {
            return 0;
        }
        let scaled = u128::from(self.rating_sum) * 100;
        let total = u128::from(self.total_ratings);
        let rounded = (scaled + total / 2) / total;
        u64::try_from(rounded).unwrap_or(u64::MAX)
    }

    /// Mean rating on the 1..=5 scale
    pub fn average_rating(&self) -> Option<f64> {
        (self.total_ratings > 0).then(|| self.rating_sum as f64 / self.total_ratings as f64)
    }

    /// Whether this profile advertises `capability` (case-insensitive)
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(capability))
    }
}
