//! Protocol constants shared by the builders and decoders

/// Deployed registry program id
pub const DEFAULT_PROGRAM_ID: &str = "4vmpwCEGczDTDnJm8WSUTNYui2WuVQuVNYCJQnUAtJAY";

/// Maximum encoded length of an agent's display name
pub const MAX_NAME_LEN: usize = 64;
/// Maximum number of capability tags per agent
pub const MAX_CAPABILITIES: usize = 8;
/// Maximum encoded length of one capability tag
pub const MAX_CAPABILITY_LEN: usize = 32;
/// Maximum encoded length of the metadata URI
pub const MAX_METADATA_URI_LEN: usize = 200;
/// Maximum encoded length of a task identifier
pub const MAX_TASK_ID_LEN: usize = 64;

/// Lowest and highest accepted rating
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Allocated size of an agent profile account
pub const AGENT_PROFILE_SIZE: usize = 8
    + 32
    + (4 + MAX_NAME_LEN)
    + (4 + MAX_CAPABILITIES * (4 + MAX_CAPABILITY_LEN))
    + 8
    + 1
    + 8
    + 8
    + 8
    + 8
    + (4 + MAX_METADATA_URI_LEN)
    + 1;

/// Allocated size of a task escrow account
pub const TASK_ESCROW_SIZE: usize = 8 + 32 + 32 + 8 + 1 + (4 + MAX_TASK_ID_LEN) + 8 + 1;
