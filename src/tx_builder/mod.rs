//! Instruction builders for the agent registry program
//!
//! ## Architecture
//!
//! - **errors**: argument validation failures, raised before any network call
//! - **instructions**: one pure builder per program instruction
//!
//! Builders borrow the process-wide [`InstructionTags`] table instead of
//! recomputing tags, and derive any program addresses they need themselves.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use agent_registry_client::discriminator::InstructionTags;
//! use agent_registry_client::tx_builder::RegistryInstructionBuilder;
//! use solana_sdk::pubkey::Pubkey;
//!
//! # fn example(program_id: Pubkey, owner: Pubkey) -> Result<(), Box<dyn std::error::Error>> {
//! let builder = RegistryInstructionBuilder::new(program_id, InstructionTags::shared());
//! let ix = builder.register_agent(
//!     &owner,
//!     "CodeAgent Pro",
//!     &["coding", "debugging"],
//!     50_000_000,
//!     "",
//! )?;
//! assert_eq!(ix.accounts.len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! [`InstructionTags`]: crate::discriminator::InstructionTags

pub mod errors;
pub mod instructions;

pub use errors::BuilderError;
pub use instructions::{
    validate_amount, validate_capabilities, validate_metadata_uri, validate_name, validate_pricing,
    validate_rating, validate_task_id, AgentUpdate, RegistryInstructionBuilder,
};
