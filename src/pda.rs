//! Program-derived address derivation
//!
//! Mirrors the runtime's `find_program_address`: walk bump values from 255
//! down to 0 and take the first candidate that lands off the ed25519 curve.
//! The walk is bounded by the bump range; if no candidate qualifies the
//! caller gets [`PdaError::NoViableBump`] instead of a loop.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Seed prefix for agent profile accounts
pub const AGENT_SEED: &[u8] = b"agent";
/// Seed prefix for task escrow accounts
pub const ESCROW_SEED: &[u8] = b"escrow";

/// Maximum length of a single seed accepted by the runtime
pub const MAX_SEED_LEN: usize = 32;
/// Maximum number of seeds including the bump
pub const MAX_SEEDS: usize = 16;
/// Upper bound on candidates tried during the bump search
pub const MAX_BUMP_ATTEMPTS: usize = u8::MAX as usize + 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PdaError {
    #[error("seed {index} is {len} bytes, maximum is 32")]
    SeedTooLong { index: usize, len: usize },

    #[error("{0} seeds supplied, at most 15 allowed before the bump")]
    TooManySeeds(usize),

    #[error("no bump in 0..=255 yields an off-curve address after {attempts} attempts")]
    NoViableBump { attempts: usize },
}

fn check_seeds(seeds: &[&[u8]]) -> Result<(), PdaError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(PdaError::TooManySeeds(seeds.len()));
    }
    if let Some((index, seed)) = seeds.iter().enumerate().find(|(_, s)| s.len() > MAX_SEED_LEN) {
        return Err(PdaError::SeedTooLong { index, len: seed.len() });
    }
    Ok(())
}

/// Find the canonical address and bump for `seeds` under `program_id`
pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8), PdaError> {
    find_program_address_with(seeds, program_id, |candidate_seeds, program_id| {
        Pubkey::create_program_address(candidate_seeds, program_id).ok()
    })
}

/// Bump search with a pluggable candidate check
///
/// `create` returns `Some(address)` when the candidate is valid. Split out so
/// the exhaustion path can be exercised without finding a real seed set that
/// has no off-curve bump.
pub(crate) fn find_program_address_with<F>(
    seeds: &[&[u8]],
    program_id: &Pubkey,
    mut create: F,
) -> Result<(Pubkey, u8), PdaError>
where
    F: FnMut(&[&[u8]], &Pubkey) -> Option<Pubkey>,
{
    check_seeds(seeds)?;

    let mut attempts = 0;
    for bump in (0..=u8::MAX).rev() {
        attempts += 1;
        let bump_seed = [bump];
        let mut candidate_seeds: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
        candidate_seeds.extend_from_slice(seeds);
        candidate_seeds.push(&bump_seed);
        if let Some(address) = create(&candidate_seeds, program_id) {
            return Ok((address, bump));
        }
    }

    debug_assert!(attempts <= MAX_BUMP_ATTEMPTS);
    Err(PdaError::NoViableBump { attempts })
}

/// Agent profile address: seeds `("agent", owner)`
pub fn agent_profile_address(program_id: &Pubkey, owner: &Pubkey) -> Result<(Pubkey, u8), PdaError> {
    find_program_address(&[AGENT_SEED, owner.as_ref()], program_id)
}

/// Task escrow address: seeds `("escrow", client, task_id)`
///
/// The runtime caps each seed at 32 bytes, so task ids longer than that have
/// no escrow address even though the program stores up to 64 bytes.
pub fn task_escrow_address(
    program_id: &Pubkey,
    client: &Pubkey,
    task_id: &str,
) -> Result<(Pubkey, u8), PdaError> {
    find_program_address(&[ESCROW_SEED, client.as_ref(), task_id.as_bytes()], program_id)
}
