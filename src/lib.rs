//! Agent Registry Client Library
//!
//! Client-side toolkit for the on-chain agent registry program: wire codec,
//! instruction tags, program address derivation, instruction builders,
//! account decoders, signers and an async client that ties them together.

pub mod accounts;
pub mod client;
pub mod codec;
pub mod config;
pub mod constants;
pub mod discriminator;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pda;
pub mod program_errors;
pub mod rpc;
pub mod signer;
pub mod structured_logging;
pub mod tx_builder;
pub mod wallet;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;


pub use accounts::{AccountFetch, AgentProfile, AgentStatus, DecodeError, TaskEscrow, TaskStatus};
pub use client::RegistryClient;
pub use config::{Config, ConfigError};
pub use discriminator::{InstructionTags, RegistryInstruction};
pub use errors::RegistryError;
pub use events::RegistryEvent;
pub use program_errors::ProgramErrorCode;
pub use rpc::{ConfirmationPolicy, LedgerRpc, RpcError};
pub use signer::{DelegatedSigner, LocalSigner, SignerError, SignerService, SigningRequest};
pub use tx_builder::{AgentUpdate, BuilderError, RegistryInstructionBuilder};

// Re-export commonly used types
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
