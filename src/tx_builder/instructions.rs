//! Instruction builders for the registry program
//!
//! Each builder validates its arguments, encodes `tag ‖ args` and lists the
//! accounts in the exact positions the program declares them. Builders are
//! pure: no RPC, no signing, no clock.
//!
//! Account order per instruction:
//!
//! | instruction | accounts |
//! |---|---|
//! | `register_agent` | agent_profile (w), owner (s, w), system_program |
//! | `update_agent` / `deactivate_agent` / `activate_agent` | agent_profile (w), owner (s) |
//! | `create_task` | task_escrow (w), agent_profile, client (s, w), system_program |
//! | `accept_task` | task_escrow (w), agent_profile, agent_owner (s) |
//! | `complete_task` | task_escrow (w), agent_profile (w), agent_owner (s, w) |
//! | `rate_agent` | task_escrow, agent_profile (w), client (s) |

use crate::codec::{
    encode_optional_text, encode_optional_text_sequence, encode_optional_u64, encode_text,
    encode_text_sequence, encode_u64, encode_u8,
};
use crate::constants::{
    MAX_CAPABILITIES, MAX_CAPABILITY_LEN, MAX_METADATA_URI_LEN, MAX_NAME_LEN, MAX_RATING,
    MAX_TASK_ID_LEN, MIN_RATING,
};
use crate::discriminator::{InstructionTags, RegistryInstruction};
use crate::pda;
use crate::tx_builder::errors::BuilderError;
use serde::{Deserialize, Serialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

/// Partial set of agent profile fields; `None` leaves the stored value as is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
    #[serde(default)]
    pub pricing_lamports: Option<u64>,
    #[serde(default)]
    pub metadata_uri: Option<String>,
}

impl AgentUpdate {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.capabilities.is_none()
            && self.pricing_lamports.is_none()
            && self.metadata_uri.is_none()
    }

    pub fn validate(&self) -> Result<(), BuilderError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(capabilities) = &self.capabilities {
            validate_capabilities(capabilities)?;
        }
        if let Some(pricing) = self.pricing_lamports {
            validate_pricing(pricing)?;
        }
        if let Some(uri) = &self.metadata_uri {
            validate_metadata_uri(uri)?;
        }
        Ok(())
    }
}

pub fn validate_name(name: &str) -> Result<(), BuilderError> {
    if name.len() > MAX_NAME_LEN {
        return Err(BuilderError::NameTooLong {
            len: name.len(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

pub fn validate_capabilities<S: AsRef<str>>(capabilities: &[S]) -> Result<(), BuilderError> {
    if capabilities.len() > MAX_CAPABILITIES {
        return Err(BuilderError::TooManyCapabilities {
            count: capabilities.len(),
            max: MAX_CAPABILITIES,
        });
    }
    for (index, capability) in capabilities.iter().enumerate() {
        let len = capability.as_ref().len();
        if len > MAX_CAPABILITY_LEN {
            return Err(BuilderError::CapabilityTooLong {
                index,
                len,
                max: MAX_CAPABILITY_LEN,
            });
        }
    }
    Ok(())
}

pub fn validate_metadata_uri(uri: &str) -> Result<(), BuilderError> {
    if uri.len() > MAX_METADATA_URI_LEN {
        return Err(BuilderError::MetadataUriTooLong {
            len: uri.len(),
            max: MAX_METADATA_URI_LEN,
        });
    }
    Ok(())
}

pub fn validate_pricing(pricing_lamports: u64) -> Result<(), BuilderError> {
    if pricing_lamports == 0 {
        return Err(BuilderError::InvalidPricing);
    }
    Ok(())
}

pub fn validate_task_id(task_id: &str) -> Result<(), BuilderError> {
    if task_id.is_empty() {
        return Err(BuilderError::EmptyTaskId);
    }
    if task_id.len() > MAX_TASK_ID_LEN {
        return Err(BuilderError::TaskIdTooLong {
            len: task_id.len(),
            max: MAX_TASK_ID_LEN,
        });
    }
    Ok(())
}

pub fn validate_amount(amount_lamports: u64) -> Result<(), BuilderError> {
    if amount_lamports == 0 {
        return Err(BuilderError::InvalidAmount);
    }
    Ok(())
}

pub fn validate_rating(rating: u8) -> Result<(), BuilderError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(BuilderError::InvalidRating(rating));
    }
    Ok(())
}

/// Builds registry instructions for one program id
///
/// Holds a borrowed tag table so the table is derived once and shared by
/// every builder in the process.
#[derive(Debug, Clone, Copy)]
pub struct RegistryInstructionBuilder<'a> {
    program_id: Pubkey,
    tags: &'a InstructionTags,
}

impl<'a> RegistryInstructionBuilder<'a> {
    pub fn new(program_id: Pubkey, tags: &'a InstructionTags) -> Self {
        Self { program_id, tags }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    fn payload(&self, ix: RegistryInstruction) -> Vec<u8> {
        self.tags.tag(ix).to_vec()
    }

    fn instruction(&self, data: Vec<u8>, accounts: Vec<AccountMeta>) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts,
            data,
        }
    }

    /// Address of the agent profile owned by `owner`
    pub fn agent_profile_address(&self, owner: &Pubkey) -> Result<Pubkey, BuilderError> {
        Ok(pda::agent_profile_address(&self.program_id, owner)?.0)
    }

    /// Address of the escrow for `(client, task_id)`
    pub fn task_escrow_address(&self, client: &Pubkey, task_id: &str) -> Result<Pubkey, BuilderError> {
        Ok(pda::task_escrow_address(&self.program_id, client, task_id)?.0)
    }

    pub fn register_agent<S: AsRef<str>>(
        &self,
        owner: &Pubkey,
        name: &str,
        capabilities: &[S],
        pricing_lamports: u64,
        metadata_uri: &str,
    ) -> Result<Instruction, BuilderError> {
        validate_name(name)?;
        validate_capabilities(capabilities)?;
        validate_pricing(pricing_lamports)?;
        validate_metadata_uri(metadata_uri)?;

        let agent_profile = self.agent_profile_address(owner)?;

        let mut data = self.payload(RegistryInstruction::RegisterAgent);
        encode_text(&mut data, name)?;
        encode_text_sequence(&mut data, capabilities)?;
        encode_u64(&mut data, pricing_lamports);
        encode_text(&mut data, metadata_uri)?;

        Ok(self.instruction(
            data,
            vec![
                AccountMeta::new(agent_profile, false),
                AccountMeta::new(*owner, true),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
        ))
    }

    pub fn update_agent(&self, owner: &Pubkey, update: &AgentUpdate) -> Result<Instruction, BuilderError> {
        update.validate()?;

        let mut data = self.payload(RegistryInstruction::UpdateAgent);
        encode_optional_text(&mut data, update.name.as_deref())?;
        encode_optional_text_sequence(&mut data, update.capabilities.as_deref())?;
        encode_optional_u64(&mut data, update.pricing_lamports);
        encode_optional_text(&mut data, update.metadata_uri.as_deref())?;

        self.owner_instruction(owner, data)
    }

    pub fn deactivate_agent(&self, owner: &Pubkey) -> Result<Instruction, BuilderError> {
        self.owner_instruction(owner, self.payload(RegistryInstruction::DeactivateAgent))
    }

    pub fn activate_agent(&self, owner: &Pubkey) -> Result<Instruction, BuilderError> {
        self.owner_instruction(owner, self.payload(RegistryInstruction::ActivateAgent))
    }

    // update/deactivate/activate share the owner-gated account list
    fn owner_instruction(&self, owner: &Pubkey, data: Vec<u8>) -> Result<Instruction, BuilderError> {
        let agent_profile = self.agent_profile_address(owner)?;
        Ok(self.instruction(
            data,
            vec![
                AccountMeta::new(agent_profile, false),
                AccountMeta::new_readonly(*owner, true),
            ],
        ))
    }

    /// Fund a new escrow for `task_id`; the escrow address is derived here
    pub fn create_task(
        &self,
        client: &Pubkey,
        agent_profile: &Pubkey,
        task_id: &str,
        amount_lamports: u64,
    ) -> Result<Instruction, BuilderError> {
        validate_task_id(task_id)?;
        validate_amount(amount_lamports)?;

        let task_escrow = self.task_escrow_address(client, task_id)?;

        let mut data = self.payload(RegistryInstruction::CreateTask);
        encode_text(&mut data, task_id)?;
        encode_u64(&mut data, amount_lamports);

        Ok(self.instruction(
            data,
            vec![
                AccountMeta::new(task_escrow, false),
                AccountMeta::new_readonly(*agent_profile, false),
                AccountMeta::new(*client, true),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
        ))
    }

    pub fn accept_task(&self, escrow: &Pubkey, agent_profile: &Pubkey, agent_owner: &Pubkey) -> Instruction {
        self.instruction(
            self.payload(RegistryInstruction::AcceptTask),
            vec![
                AccountMeta::new(*escrow, false),
                AccountMeta::new_readonly(*agent_profile, false),
                AccountMeta::new_readonly(*agent_owner, true),
            ],
        )
    }

    /// Release the escrow to the agent owner, who must be writable to receive lamports
    pub fn complete_task(&self, escrow: &Pubkey, agent_profile: &Pubkey, agent_owner: &Pubkey) -> Instruction {
        self.instruction(
            self.payload(RegistryInstruction::CompleteTask),
            vec![
                AccountMeta::new(*escrow, false),
                AccountMeta::new(*agent_profile, false),
                AccountMeta::new(*agent_owner, true),
            ],
        )
    }

    pub fn rate_agent(
        &self,
        escrow: &Pubkey,
        agent_profile: &Pubkey,
        client: &Pubkey,
        rating: u8,
    ) -> Result<Instruction, BuilderError> {
        validate_rating(rating)?;

        let mut data = self.payload(RegistryInstruction::RateAgent);
        encode_u8(&mut data, rating);

        Ok(self.instruction(
            data,
            vec![
                AccountMeta::new_readonly(*escrow, false),
                AccountMeta::new(*agent_profile, false),
                AccountMeta::new_readonly(*client, true),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::AccountReader;
    use crate::constants::DEFAULT_PROGRAM_ID;

    fn builder() -> RegistryInstructionBuilder<'static> {
        RegistryInstructionBuilder::new(DEFAULT_PROGRAM_ID.parse().unwrap(), InstructionTags::shared())
    }

    fn tag(ix: RegistryInstruction) -> [u8; 8] {
        InstructionTags::shared().tag(ix)
    }

    #[test]
    fn test_register_agent_name_boundary() {
        let owner = Pubkey::new_unique();
        let caps: [&str; 0] = [];
        assert!(builder()
            .register_agent(&owner, &"n".repeat(64), &caps, 1, "")
            .is_ok());
        assert_eq!(
            builder()
                .register_agent(&owner, &"n".repeat(65), &caps, 1, "")
                .unwrap_err(),
            BuilderError::NameTooLong { len: 65, max: 64 }
        );
    }

    #[test]
    fn test_register_agent_capability_limits() {
        let owner = Pubkey::new_unique();
        let nine: Vec<String> = (0..9).map(|i| format!("cap{i}")).collect();
        assert!(matches!(
            builder().register_agent(&owner, "a", &nine, 1, ""),
            Err(BuilderError::TooManyCapabilities { count: 9, max: 8 })
        ));

        let long = vec!["ok".to_string(), "c".repeat(33)];
        assert!(matches!(
            builder().register_agent(&owner, "a", &long, 1, ""),
            Err(BuilderError::CapabilityTooLong { index: 1, len: 33, max: 32 })
        ));
    }

    #[test]
    fn test_register_agent_rejects_zero_price_and_long_uri() {
        let owner = Pubkey::new_unique();
        assert_eq!(
            builder().register_agent(&owner, "a", &["x"], 0, "").unwrap_err(),
            BuilderError::InvalidPricing
        );
        assert!(matches!(
            builder().register_agent(&owner, "a", &["x"], 1, &"u".repeat(201)),
            Err(BuilderError::MetadataUriTooLong { len: 201, .. })
        ));
    }

    #[test]
    fn test_register_agent_accounts() {
        let owner = Pubkey::new_unique();
        let ix = builder().register_agent(&owner, "a", &["x"], 1, "").unwrap();
        let profile = builder().agent_profile_address(&owner).unwrap();

        assert_eq!(ix.accounts.len(), 3);
        assert_eq!(ix.accounts[0], AccountMeta::new(profile, false));
        assert_eq!(ix.accounts[1], AccountMeta::new(owner, true));
        assert_eq!(ix.accounts[2], AccountMeta::new_readonly(system_program::id(), false));
    }

    #[test]
    fn test_update_agent_encodes_absent_fields() {
        let owner = Pubkey::new_unique();
        let update = AgentUpdate {
            pricing_lamports: Some(42),
            ..Default::default()
        };
        let ix = builder().update_agent(&owner, &update).unwrap();

        let mut expected = tag(RegistryInstruction::UpdateAgent).to_vec();
        expected.extend_from_slice(&[0, 0, 1]);
        expected.extend_from_slice(&42u64.to_le_bytes());
        expected.push(0);
        assert_eq!(ix.data, expected);

        assert_eq!(ix.accounts.len(), 2);
        assert!(ix.accounts[0].is_writable && !ix.accounts[0].is_signer);
        assert!(ix.accounts[1].is_signer && !ix.accounts[1].is_writable);
    }

    #[test]
    fn test_update_agent_round_trips_present_fields() {
        let owner = Pubkey::new_unique();
        let update = AgentUpdate {
            name: Some("renamed".into()),
            capabilities: Some(vec!["a".into(), "b".into()]),
            pricing_lamports: None,
            metadata_uri: Some("ipfs://x".into()),
        };
        let ix = builder().update_agent(&owner, &update).unwrap();

        let mut reader = AccountReader::new(&ix.data[8..]);
        assert_eq!(reader.read_optional_text("name", 64).unwrap(), update.name);
        assert_eq!(
            reader.read_optional_text_sequence("capabilities", 8, 32).unwrap(),
            update.capabilities
        );
        assert_eq!(reader.read_optional_u64("pricing").unwrap(), None);
        assert_eq!(reader.read_optional_text("uri", 200).unwrap(), update.metadata_uri);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_update_agent_validates_present_fields() {
        let owner = Pubkey::new_unique();
        let update = AgentUpdate {
            pricing_lamports: Some(0),
            ..Default::default()
        };
        assert_eq!(
            builder().update_agent(&owner, &update).unwrap_err(),
            BuilderError::InvalidPricing
        );
        assert!(AgentUpdate::default().is_empty());
    }

    #[test]
    fn test_status_toggles_are_tag_only() {
        let owner = Pubkey::new_unique();
        let deactivate = builder().deactivate_agent(&owner).unwrap();
        let activate = builder().activate_agent(&owner).unwrap();
        assert_eq!(deactivate.data, tag(RegistryInstruction::DeactivateAgent));
        assert_eq!(activate.data, tag(RegistryInstruction::ActivateAgent));
        assert_eq!(deactivate.accounts, activate.accounts);
    }

    #[test]
    fn test_create_task_derives_escrow() {
        let client = Pubkey::new_unique();
        let profile = Pubkey::new_unique();
        let ix = builder().create_task(&client, &profile, "job-1", 1_000).unwrap();
        let escrow = builder().task_escrow_address(&client, "job-1").unwrap();

        assert_eq!(ix.accounts[0], AccountMeta::new(escrow, false));
        assert_eq!(ix.accounts[1], AccountMeta::new_readonly(profile, false));
        assert_eq!(ix.accounts[2], AccountMeta::new(client, true));
        assert_eq!(ix.accounts[3], AccountMeta::new_readonly(system_program::id(), false));

        let mut expected = tag(RegistryInstruction::CreateTask).to_vec();
        expected.extend_from_slice(&[5, 0, 0, 0]);
        expected.extend_from_slice(b"job-1");
        expected.extend_from_slice(&1_000u64.to_le_bytes());
        assert_eq!(ix.data, expected);
    }

    #[test]
    fn test_create_task_validation() {
        let client = Pubkey::new_unique();
        let profile = Pubkey::new_unique();
        assert_eq!(
            builder().create_task(&client, &profile, "", 1).unwrap_err(),
            BuilderError::EmptyTaskId
        );
        assert_eq!(
            builder().create_task(&client, &profile, &"t".repeat(65), 1).unwrap_err(),
            BuilderError::TaskIdTooLong { len: 65, max: 64 }
        );
        assert_eq!(
            builder().create_task(&client, &profile, "t", 0).unwrap_err(),
            BuilderError::InvalidAmount
        );
        assert!(matches!(
            builder().create_task(&client, &profile, &"t".repeat(40), 1),
            Err(BuilderError::Derivation(_))
        ));
    }

    #[test]
    fn test_accept_and_complete_account_order() {
        let escrow = Pubkey::new_unique();
        let profile = Pubkey::new_unique();
        let owner = Pubkey::new_unique();

        let accept = builder().accept_task(&escrow, &profile, &owner);
        assert_eq!(accept.data, tag(RegistryInstruction::AcceptTask));
        assert_eq!(
            accept.accounts,
            vec![
                AccountMeta::new(escrow, false),
                AccountMeta::new_readonly(profile, false),
                AccountMeta::new_readonly(owner, true),
            ]
        );

        let complete = builder().complete_task(&escrow, &profile, &owner);
        assert_eq!(complete.data, tag(RegistryInstruction::CompleteTask));
        assert_eq!(
            complete.accounts,
            vec![
                AccountMeta::new(escrow, false),
                AccountMeta::new(profile, false),
                AccountMeta::new(owner, true),
            ]
        );
    }

    #[test]
    fn test_rate_agent_range() {
        let escrow = Pubkey::new_unique();
        let profile = Pubkey::new_unique();
        let client = Pubkey::new_unique();

        for rating in [0u8, 6, 255] {
            assert_eq!(
                builder().rate_agent(&escrow, &profile, &client, rating).unwrap_err(),
                BuilderError::InvalidRating(rating)
            );
        }
        for rating in 1..=5u8 {
            let ix = builder().rate_agent(&escrow, &profile, &client, rating).unwrap();
            let mut expected = tag(RegistryInstruction::RateAgent).to_vec();
            expected.push(rating);
            assert_eq!(ix.data, expected);
        }
    }

    #[test]
    fn test_rate_agent_accounts() {
        let escrow = Pubkey::new_unique();
        let profile = Pubkey::new_unique();
        let client = Pubkey::new_unique();
        let ix = builder().rate_agent(&escrow, &profile, &client, 4).unwrap();
        assert_eq!(
            ix.accounts,
            vec![
                AccountMeta::new_readonly(escrow, false),
                AccountMeta::new(profile, false),
                AccountMeta::new_readonly(client, true),
            ]
        );
    }
}
