//! agent-registry - command line front end for the registry client
//!
//! Reads need only an RPC endpoint and program id. Writes also load the
//! signer keypair from the configured path.

#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use agent_registry_client::pda;
use agent_registry_client::{
    AgentUpdate, Config, LocalSigner, Pubkey, RegistryClient, Signature, SignerService,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use solana_sdk::signature::Keypair;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "agent-registry", author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "AGENT_REGISTRY_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the profile address for an owner
    DeriveAgent { owner: Pubkey },
    /// Print the escrow address for a client and task id
    DeriveEscrow { client: Pubkey, task_id: String },
    /// Fetch and decode an agent profile by owner
    FetchAgent { owner: Pubkey },
    /// Fetch and decode a task escrow by client and task id
    FetchTask { client: Pubkey, task_id: String },
    /// List registry events emitted by a transaction
    Events { signature: Signature },
    /// Register the signer as an agent
    Register {
        #[arg(long)]
        name: String,
        /// Comma separated capability tags
        #[arg(long, value_delimiter = ',')]
        capabilities: Vec<String>,
        #[arg(long)]
        price: u64,
        #[arg(long, default_value = "")]
        metadata_uri: String,
    },
    /// Update any subset of the signer's profile
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_delimiter = ',')]
        capabilities: Option<Vec<String>>,
        #[arg(long)]
        price: Option<u64>,
        #[arg(long)]
        metadata_uri: Option<String>,
    },
    Activate,
    Deactivate,
    /// Fund an escrow for the agent owned by `agent_owner`
    CreateTask {
        agent_owner: Pubkey,
        task_id: String,
        amount: u64,
    },
    AcceptTask { escrow: Pubkey },
    CompleteTask { escrow: Pubkey },
    /// Rate the agent owned by `agent_owner` for a completed escrow
    Rate {
        escrow: Pubkey,
        agent_owner: Pubkey,
        rating: u8,
    },
}

impl Command {
    fn signs(&self) -> bool {
        !matches!(
            self,
            Self::DeriveAgent { .. }
                | Self::DeriveEscrow { .. }
                | Self::FetchAgent { .. }
                | Self::FetchTask { .. }
                | Self::Events { .. }
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.json_logs);

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    debug!(rpc = %config.rpc.url, program_id = %config.program.program_id, "Configuration loaded");

    let output = run(&config, args.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(config: &Config, command: Command) -> Result<serde_json::Value> {
    let signer = if command.signs() {
        let signer = LocalSigner::from_file(&config.wallet.keypair_path)
            .with_context(|| format!("Failed to load signer from {}", config.wallet.keypair_path))?;
        info!(signer = %signer.pubkey(), "Signer loaded");
        signer
    } else {
        // Reads and derivations never sign
        LocalSigner::new(Keypair::new())
    };
    let client = RegistryClient::from_config(config, Arc::new(signer))?;
    let program_id = *client.program_id();

    let value = match command {
        Command::DeriveAgent { owner } => {
            let (address, bump) = pda::agent_profile_address(&program_id, &owner)?;
            json!({ "address": address.to_string(), "bump": bump })
        }
        Command::DeriveEscrow { client: funder, task_id } => {
            let (address, bump) = pda::task_escrow_address(&program_id, &funder, &task_id)?;
            json!({ "address": address.to_string(), "bump": bump })
        }
        Command::FetchAgent { owner } => {
            let fetched = client.fetch_agent_profile(&owner).await?;
            json!({ "result": fetched.label(), "profile": fetched.as_ref() })
        }
        Command::FetchTask { client: funder, task_id } => {
            let fetched = client.fetch_task_escrow(&funder, &task_id).await?;
            json!({ "result": fetched.label(), "escrow": fetched.as_ref() })
        }
        Command::Events { signature } => json!(client.fetch_events(&signature).await?),
        Command::Register {
            name,
            capabilities,
            price,
            metadata_uri,
        } => submitted(client.register_agent(&name, &capabilities, price, &metadata_uri).await?),
        Command::Update {
            name,
            capabilities,
            price,
            metadata_uri,
        } => {
            let update = AgentUpdate {
                name,
                capabilities,
                pricing_lamports: price,
                metadata_uri,
            };
            submitted(client.update_agent(&update).await?)
        }
        Command::Activate => submitted(client.activate_agent().await?),
        Command::Deactivate => submitted(client.deactivate_agent().await?),
        Command::CreateTask {
            agent_owner,
            task_id,
            amount,
        } => {
            let agent_profile = client.agent_profile_address(&agent_owner)?;
            let escrow = client.task_escrow_address(&client.signer_pubkey(), &task_id)?;
            let signature = client.create_task(&agent_profile, &task_id, amount).await?;
            json!({ "signature": signature.to_string(), "escrow": escrow.to_string() })
        }
        Command::AcceptTask { escrow } => submitted(client.accept_task(&escrow).await?),
        Command::CompleteTask { escrow } => submitted(client.complete_task(&escrow).await?),
        Command::Rate {
            escrow,
            agent_owner,
            rating,
        } => {
            let agent_profile = client.agent_profile_address(&agent_owner)?;
            submitted(client.rate_agent(&escrow, &agent_profile, rating).await?)
        }
    };
    Ok(value)
}

fn submitted(signature: Signature) -> serde_json::Value {
    json!({ "signature": signature.to_string() })
}

fn init_logging(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "agent_registry_client=debug,agent_registry=debug,info"
    } else {
        "agent_registry_client=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so stdout stays machine readable
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
