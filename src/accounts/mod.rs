//! Typed views over registry program accounts
//!
//! Decoding is strict about structure and lenient about one thing only:
//! unknown status bytes fall back to the type's initial status. Everything
//! else (short buffer, wrong discriminator, a length over its bound, bad
//! UTF-8) makes the whole buffer undecodable. There is no partial record.

mod agent_profile;
mod task_escrow;

pub use agent_profile::{AgentProfile, AgentStatus};
pub use task_escrow::{TaskEscrow, TaskStatus};

use crate::codec::{AccountReader, CodecError};
use crate::discriminator::{Discriminator, DISCRIMINATOR_LEN};
use serde::Serializer;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Why a buffer does not decode to the requested account type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("account data is {len} bytes, shorter than the discriminator")]
    TooShort { len: usize },

    #[error("discriminator {found:?} does not match {expected:?}")]
    WrongDiscriminator {
        expected: Discriminator,
        found: Discriminator,
    },

    #[error("account is owned by {0}, not the registry program")]
    WrongOwner(Pubkey),

    #[error("corrupt account data: {0}")]
    Corrupt(#[from] CodecError),
}

impl DecodeError {
    /// The bytes belong to some other account type
    pub fn is_wrong_type(&self) -> bool {
        matches!(
            self,
            Self::TooShort { .. } | Self::WrongDiscriminator { .. } | Self::WrongOwner(_)
        )
    }
}

/// Outcome of fetching and decoding one account
///
/// Separates "nothing at this address" from "something else lives here" and
/// "this type, but damaged". Use [`AccountFetch::into_option`] when the
/// distinction does not matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFetch<T> {
    Found(T),
    NotFound,
    WrongType,
    Corrupt(CodecError),
}

impl<T> AccountFetch<T> {
    /// Classify a decode result
    pub fn from_decoded(result: Result<T, DecodeError>) -> Self {
        match result {
            Ok(value) => Self::Found(value),
            Err(DecodeError::Corrupt(err)) => Self::Corrupt(err),
            Err(_) => Self::WrongType,
        }
    }

    /// Classify a decode result for an account already known to be owned
    /// by the registry program
    ///
    /// A buffer too short for a discriminator cannot be another program
    /// type here, so it counts as damaged rather than foreign.
    pub fn from_program_account(result: Result<T, DecodeError>) -> Self {
        match result {
            Err(DecodeError::TooShort { len }) => Self::Corrupt(CodecError::UnexpectedEof {
                field: "discriminator",
                needed: DISCRIMINATOR_LEN,
                remaining: len,
            }),
            other => Self::from_decoded(other),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Short label for logs and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::NotFound => "not_found",
            Self::WrongType => "wrong_type",
            Self::Corrupt(_) => "corrupt",
        }
    }
}

/// Check the leading discriminator and return a reader positioned after it
pub(crate) fn open<'a>(data: &'a [u8], expected: &Discriminator) -> Result<AccountReader<'a>, DecodeError> {
    if data.len() < DISCRIMINATOR_LEN {
        return Err(DecodeError::TooShort { len: data.len() });
    }
    let mut reader = AccountReader::new(data);
    let found = reader.read_tag("discriminator")?;
    if &found != expected {
        return Err(DecodeError::WrongDiscriminator {
            expected: *expected,
            found,
        });
    }
    Ok(reader)
}

/// Serialize a public key as its base58 string
pub(crate) fn serialize_pubkey<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}
