//! Custom error codes returned by the registry program
//!
//! The program numbers its errors from 6000 in declaration order. A failed
//! transaction reports them as `InstructionError(index, Custom(code))`.

use serde::Serialize;
use solana_sdk::instruction::InstructionError;
use solana_sdk::transaction::TransactionError;
use std::fmt;

/// First custom error code assigned by the program framework
pub const CUSTOM_ERROR_OFFSET: u32 = 6000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramErrorCode {
    NameTooLong,
    TooManyCapabilities,
    CapabilityTooLong,
    MetadataUriTooLong,
    InvalidPricing,
    InvalidTaskStatus,
    AgentNotActive,
    InvalidAmount,
    InvalidRating,
    Unauthorized,
    AgentMismatch,
    TaskIdTooLong,
}

impl ProgramErrorCode {
    pub const ALL: [ProgramErrorCode; 12] = [
        Self::NameTooLong,
        Self::TooManyCapabilities,
        Self::CapabilityTooLong,
        Self::MetadataUriTooLong,
        Self::InvalidPricing,
        Self::InvalidTaskStatus,
        Self::AgentNotActive,
        Self::InvalidAmount,
        Self::InvalidRating,
        Self::Unauthorized,
        Self::AgentMismatch,
        Self::TaskIdTooLong,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        let index = code.checked_sub(CUSTOM_ERROR_OFFSET)?;
        Self::ALL.get(index as usize).copied()
    }

    pub fn code(self) -> u32 {
        // ALL is declared in discriminant order
        CUSTOM_ERROR_OFFSET + self as u32
    }

    /// Extract the program error from a failed transaction, if it is one
    pub fn from_transaction_error(err: &TransactionError) -> Option<Self> {
        match err {
            TransactionError::InstructionError(_, InstructionError::Custom(code)) => Self::from_code(*code),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::NameTooLong => "Name exceeds maximum length of 64 characters",
            Self::TooManyCapabilities => "Too many capabilities (max 8)",
            Self::CapabilityTooLong => "Capability name exceeds 32 characters",
            Self::MetadataUriTooLong => "Metadata URI exceeds 200 characters",
            Self::InvalidPricing => "Pricing must be greater than 0",
            Self::InvalidTaskStatus => "Invalid task status for this operation",
            Self::AgentNotActive => "Agent is not active",
            Self::InvalidAmount => "Amount must be greater than 0",
            Self::InvalidRating => "Rating must be between 1 and 5",
            Self::Unauthorized => "Unauthorized: signer is not the owner",
            Self::AgentMismatch => "Agent profile does not match escrow",
            Self::TaskIdTooLong => "Task ID exceeds 64 characters",
        }
    }

    /// The caller's input was rejected, as opposed to the on-chain state
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            Self::NameTooLong
                | Self::TooManyCapabilities
                | Self::CapabilityTooLong
                | Self::MetadataUriTooLong
                | Self::InvalidPricing
                | Self::InvalidAmount
                | Self::InvalidRating
                | Self::TaskIdTooLong
        )
    }
}

impl fmt::Display for ProgramErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_declaration_order() {
        assert_eq!(ProgramErrorCode::NameTooLong.code(), 6000);
        assert_eq!(ProgramErrorCode::InvalidRating.code(), 6008);
        assert_eq!(ProgramErrorCode::TaskIdTooLong.code(), 6011);
        for code in ProgramErrorCode::ALL {
            assert_eq!(ProgramErrorCode::from_code(code.code()), Some(code));
        }
    }

    #[test]
    fn test_out_of_range_codes() {
        assert_eq!(ProgramErrorCode::from_code(0), None);
        assert_eq!(ProgramErrorCode::from_code(5999), None);
        assert_eq!(ProgramErrorCode::from_code(6012), None);
    }

    #[test]
    fn test_from_transaction_error() {
        let err = TransactionError::InstructionError(0, InstructionError::Custom(6009));
        assert_eq!(
            ProgramErrorCode::from_transaction_error(&err),
            Some(ProgramErrorCode::Unauthorized)
        );

        let other = TransactionError::InstructionError(0, InstructionError::InsufficientFunds);
        assert_eq!(ProgramErrorCode::from_transaction_error(&other), None);
        assert_eq!(
            ProgramErrorCode::from_transaction_error(&TransactionError::BlockhashNotFound),
            None
        );
    }

    #[test]
    fn test_display_includes_code() {
        let text = ProgramErrorCode::AgentNotActive.to_string();
        assert!(text.contains("Agent is not active"));
        assert!(text.contains("6006"));
        assert!(!ProgramErrorCode::AgentNotActive.is_validation());
        assert!(ProgramErrorCode::InvalidRating.is_validation());
    }
}
