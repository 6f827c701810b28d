//! Decoding of registry events from transaction logs
//!
//! The program emits each event as a `Program data: <base64>` log line whose
//! payload is `sighash("event", Name) ‖ fields`. Lines that are not program
//! data, do not decode as base64, or carry an unknown tag are skipped.

use crate::codec::{AccountReader, CodecError};
use crate::constants::{MAX_CAPABILITIES, MAX_CAPABILITY_LEN, MAX_METADATA_URI_LEN, MAX_NAME_LEN, MAX_TASK_ID_LEN};
use crate::discriminator::{sighash, Discriminator, DISCRIMINATOR_LEN};
use crate::accounts::serialize_pubkey;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tracing::trace;

const PROGRAM_DATA_PREFIX: &str = "Program data: ";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("event payload shorter than its tag")]
    TooShort,

    #[error("unknown event tag {0:?}")]
    UnknownTag(Discriminator),

    #[error("invalid base64 in program data")]
    InvalidBase64,

    #[error("corrupt event payload: {0}")]
    Corrupt(#[from] CodecError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AgentRegistered,
    AgentUpdated,
    AgentDeactivated,
    AgentActivated,
    TaskCreated,
    TaskAccepted,
    TaskCompleted,
    AgentRated,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        Self::AgentRegistered,
        Self::AgentUpdated,
        Self::AgentDeactivated,
        Self::AgentActivated,
        Self::TaskCreated,
        Self::TaskAccepted,
        Self::TaskCompleted,
        Self::AgentRated,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::AgentRegistered => "AgentRegistered",
            Self::AgentUpdated => "AgentUpdated",
            Self::AgentDeactivated => "AgentDeactivated",
            Self::AgentActivated => "AgentActivated",
            Self::TaskCreated => "TaskCreated",
            Self::TaskAccepted => "TaskAccepted",
            Self::TaskCompleted => "TaskCompleted",
            Self::AgentRated => "AgentRated",
        }
    }

    pub fn tag(self) -> Discriminator {
        EVENT_TAGS[self as usize]
    }

    fn from_tag(tag: &Discriminator) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| &kind.tag() == tag)
    }
}

static EVENT_TAGS: Lazy<[Discriminator; 8]> =
    Lazy::new(|| EventKind::ALL.map(|kind| sighash("event", kind.name())));

/// An event emitted by the registry program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    AgentRegistered {
        #[serde(serialize_with = "serialize_pubkey")]
        agent: Pubkey,
        #[serde(serialize_with = "serialize_pubkey")]
        owner: Pubkey,
        name: String,
        capabilities: Vec<String>,
        pricing_lamports: u64,
        metadata_uri: String,
    },
    AgentUpdated {
        #[serde(serialize_with = "serialize_pubkey")]
        agent: Pubkey,
        #[serde(serialize_with = "serialize_pubkey")]
        owner: Pubkey,
    },
    AgentDeactivated {
        #[serde(serialize_with = "serialize_pubkey")]
        agent: Pubkey,
        #[serde(serialize_with = "serialize_pubkey")]
        owner: Pubkey,
    },
    AgentActivated {
        #[serde(serialize_with = "serialize_pubkey")]
        agent: Pubkey,
        #[serde(serialize_with = "serialize_pubkey")]
        owner: Pubkey,
    },
    TaskCreated {
        #[serde(serialize_with = "serialize_pubkey")]
        escrow: Pubkey,
        #[serde(serialize_with = "serialize_pubkey")]
        client: Pubkey,
        #[serde(serialize_with = "serialize_pubkey")]
        agent: Pubkey,
        task_id: String,
        amount: u64,
    },
    TaskAccepted {
        #[serde(serialize_with = "serialize_pubkey")]
        escrow: Pubkey,
        #[serde(serialize_with = "serialize_pubkey")]
        agent: Pubkey,
    },
    TaskCompleted {
        #[serde(serialize_with = "serialize_pubkey")]
        escrow: Pubkey,
        #[serde(serialize_with = "serialize_pubkey")]
        agent: Pubkey,
        amount: u64,
    },
    AgentRated {
        #[serde(serialize_with = "serialize_pubkey")]
        agent: Pubkey,
        rating: u8,
        new_reputation: u64,
    },
}

impl RegistryEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AgentRegistered { .. } => EventKind::AgentRegistered,
            Self::AgentUpdated { .. } => EventKind::AgentUpdated,
            Self::AgentDeactivated { .. } => EventKind::AgentDeactivated,
            Self::AgentActivated { .. } => EventKind::AgentActivated,
            Self::TaskCreated { .. } => EventKind::TaskCreated,
            Self::TaskAccepted { .. } => EventKind::TaskAccepted,
            Self::TaskCompleted { .. } => EventKind::TaskCompleted,
            Self::AgentRated { .. } => EventKind::AgentRated,
        }
    }

    /// Decode a raw event payload, tag included
    pub fn decode(data: &[u8]) -> Result<Self, EventError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(EventError::TooShort);
        }
        let mut r = AccountReader::new(data);
        let tag = r.read_tag("event_tag")?;
        let kind = EventKind::from_tag(&tag).ok_or(EventError::UnknownTag(tag))?;

        let event = match kind {
            EventKind::AgentRegistered => Self::AgentRegistered {
                agent: r.read_pubkey("agent")?,
                owner: r.read_pubkey("owner")?,
                name: r.read_text("name", MAX_NAME_LEN)?,
                capabilities: r.read_text_sequence("capabilities", MAX_CAPABILITIES, MAX_CAPABILITY_LEN)?,
                pricing_lamports: r.read_u64("pricing_lamports")?,
                metadata_uri: r.read_text("metadata_uri", MAX_METADATA_URI_LEN)?,
            },
            EventKind::AgentUpdated => Self::AgentUpdated {
                agent: r.read_pubkey("agent")?,
                owner: r.read_pubkey("owner")?,
            },
            EventKind::AgentDeactivated => Self::AgentDeactivated {
                agent: r.read_pubkey("agent")?,
                owner: r.read_pubkey("owner")?,
            },
            EventKind::AgentActivated => Self::AgentActivated {
                agent: r.read_pubkey("agent")?,
                owner: r.read_pubkey("owner")?,
            },
            EventKind::TaskCreated => Self::TaskCreated {
                escrow: r.read_pubkey("escrow")?,
                client: r.read_pubkey("client")?,
                agent: r.read_pubkey("agent")?,
                task_id: r.read_text("task_id", MAX_TASK_ID_LEN)?,
                amount: r.read_u64("amount")?,
            },
            EventKind::TaskAccepted => Self::TaskAccepted {
                escrow: r.read_pubkey("escrow")?,
                agent: r.read_pubkey("agent")?,
            },
            EventKind::TaskCompleted => Self::TaskCompleted {
                escrow: r.read_pubkey("escrow")?,
                agent: r.read_pubkey("agent")?,
                amount: r.read_u64("amount")?,
            },
            EventKind::AgentRated => Self::AgentRated {
                agent: r.read_pubkey("agent")?,
                rating: r.read_u8("rating")?,
                new_reputation: r.read_u64("new_reputation")?,
            },
        };
        Ok(event)
    }

    /// Decode one log line; `None` when the line is not a program data line
    pub fn from_log_line(line: &str) -> Option<Result<Self, EventError>> {
        let encoded = line.strip_prefix(PROGRAM_DATA_PREFIX)?;
        Some(
            STANDARD
                .decode(encoded.trim())
                .map_err(|_| EventError::InvalidBase64)
                .and_then(|bytes| Self::decode(&bytes)),
        )
    }
}

/// Collect every registry event from a transaction's log messages
pub fn parse_logs<S: AsRef<str>>(logs: &[S]) -> Vec<RegistryEvent> {
    logs.iter()
        .filter_map(|line| match RegistryEvent::from_log_line(line.as_ref())? {
            Ok(event) => Some(event),
            Err(err) => {
                trace!(error = %err, "Skipping undecodable program data line");
                None
            }
        })
        .collect()
}
