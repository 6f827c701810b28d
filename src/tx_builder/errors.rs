//! Error types for the instruction builders
//!
//! Every variant is raised before any network access. Builders never clamp
//! or truncate an argument to make it fit; they reject it here instead.

use crate::codec::CodecError;
use crate::pda::PdaError;
use thiserror::Error;

/// Rejection of an instruction's arguments
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    /// Agent name is longer than the account can store
    #[error("name is {len} bytes, maximum is {max}")]
    NameTooLong { len: usize, max: usize },

    #[error("{count} capabilities supplied, maximum is {max}")]
    TooManyCapabilities { count: usize, max: usize },

    /// One capability tag is longer than the account can store
    #[error("capability #{index} is {len} bytes, maximum is {max}")]
    CapabilityTooLong { index: usize, len: usize, max: usize },

    #[error("metadata URI is {len} bytes, maximum is {max}")]
    MetadataUriTooLong { len: usize, max: usize },

    /// Price per task must be non-zero
    #[error("pricing must be greater than 0 lamports")]
    InvalidPricing,

    #[error("task id must not be empty")]
    EmptyTaskId,

    #[error("task id is {len} bytes, maximum is {max}")]
    TaskIdTooLong { len: usize, max: usize },

    /// Escrowed amount must be non-zero
    #[error("escrow amount must be greater than 0 lamports")]
    InvalidAmount,

    #[error("rating {0} is outside 1..=5")]
    InvalidRating(u8),

    /// Address derivation failed for the supplied seeds
    #[error("address derivation failed: {0}")]
    Derivation(#[from] PdaError),

    /// A value could not be encoded on the wire
    #[error("encoding failed: {0}")]
    Encoding(#[from] CodecError),
}

impl BuilderError {
    /// Name of the argument that was rejected, for API responses
    pub fn field(&self) -> &'static str {
        match self {
            Self::NameTooLong { .. } => "name",
            Self::TooManyCapabilities { .. } | Self::CapabilityTooLong { .. } => "capabilities",
            Self::MetadataUriTooLong { .. } => "metadata_uri",
            Self::InvalidPricing => "pricing_lamports",
            Self::EmptyTaskId | Self::TaskIdTooLong { .. } => "task_id",
            Self::InvalidAmount => "amount",
            Self::InvalidRating(_) => "rating",
            Self::Derivation(_) => "seeds",
            Self::Encoding(_) => "payload",
        }
    }
}
