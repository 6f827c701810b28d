//! Write-path tests: ordering, validation, failure mapping

use super::test_helpers::{harness, harness_with_signer};
use crate::discriminator::{InstructionTags, RegistryInstruction};
use crate::errors::RegistryError;
use crate::program_errors::ProgramErrorCode;
use crate::rpc::{RpcError, SignatureStatus};
use crate::signer::{DelegatedSigner, SignerError};
use crate::tx_builder::{AgentUpdate, BuilderError};
use solana_sdk::instruction::InstructionError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::TransactionError;
use std::sync::Arc;

fn tag(ix: RegistryInstruction) -> [u8; 8] {
    InstructionTags::shared().tag(ix)
}

#[tokio::test(start_paused = true)]
async fn test_register_agent_submits_once_and_confirms() {
    let h = harness();
    h.ledger
        .script_next_submission(vec![SignatureStatus::Pending, SignatureStatus::Confirmed]);

    let signature = h
        .client
        .register_agent("CodeAgent Pro", &["coding", "debugging", "testing"], 50_000_000, "")
        .await
        .unwrap();

    let sent = h.ledger.sent_transactions();
    assert_eq!(sent.len(), 1);
    let tx = &sent[0];
    assert_eq!(tx.signatures[0], signature);
    assert!(tx.verify().is_ok());
    assert_eq!(tx.message.account_keys[0], h.signer);

    let ix = &tx.message.instructions[0];
    assert_eq!(ix.data[..8], tag(RegistryInstruction::RegisterAgent));
    assert_eq!(tx.message.account_keys[ix.program_id_index as usize], h.program_id);

    assert_eq!(
        h.ledger.calls(),
        vec![
            "get_account",
            "get_latest_blockhash",
            "send_transaction",
            "get_signature_status",
            "get_signature_status"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_validation_failures_touch_no_network() {
    let h = harness();

    let err = h
        .client
        .register_agent(&"x".repeat(65), &["coding"], 1, "")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Builder(BuilderError::NameTooLong { len: 65, max: 64 })
    ));

    for rating in [0u8, 6] {
        let err = h
            .client
            .rate_agent(&Pubkey::new_unique(), &Pubkey::new_unique(), rating)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Builder(BuilderError::InvalidRating(r)) if r == rating));
    }

    let err = h
        .client
        .create_task(&Pubkey::new_unique(), "task-1", 0)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Builder(BuilderError::InvalidAmount)));

    assert!(h.ledger.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_program_error_on_confirmation() {
    let h = harness();
    h.ledger.script_next_submission(vec![SignatureStatus::Failed(
        TransactionError::InstructionError(0, InstructionError::Custom(6006)),
    )]);

    let agent_profile = Pubkey::new_unique();
    let err = h
        .client
        .create_task(&agent_profile, "task-9", 1_000)
        .await
        .unwrap_err();

    assert_eq!(err.program_error(), Some(ProgramErrorCode::AgentNotActive));
    match err {
        RegistryError::TransactionFailed { signature, .. } => {
            assert_eq!(signature, h.ledger.sent_transactions()[0].signatures[0]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_preflight_rejection_is_not_polled() {
    let h = harness();
    h.ledger.fail_next_send(RpcError::TransactionRejected {
        endpoint: "mock".to_string(),
        error: TransactionError::InstructionError(0, InstructionError::Custom(6009)),
    });

    let err = h.client.deactivate_agent().await.unwrap_err();
    assert_eq!(err.program_error(), Some(ProgramErrorCode::Unauthorized));
    assert!(!h.ledger.calls().contains(&"get_signature_status"));
    assert!(h.ledger.sent_transactions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_surfaces_unmodified() {
    let h = harness();
    let transport = RpcError::Transport {
        endpoint: "mock".to_string(),
        message: "connection refused".to_string(),
    };
    h.ledger.fail_next_send(transport.clone());

    let err = h.client.activate_agent().await.unwrap_err();
    match err {
        RegistryError::Rpc(inner) => assert_eq!(inner, transport),
        other => panic!("unexpected {other:?}"),
    }
    // Exactly one submission attempt
    assert_eq!(
        h.ledger.calls().iter().filter(|c| **c == "send_transaction").count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_delegated_rejection_stops_before_submit() {
    let (signer, mut requests) = DelegatedSigner::channel(Pubkey::new_unique(), 1);
    let h = harness_with_signer(Arc::new(signer));
    tokio::spawn(async move {
        if let Some(request) = requests.recv().await {
            request.reject("declined in wallet");
        }
    });

    let err = h.client.deactivate_agent().await.unwrap_err();
    assert!(matches!(err, RegistryError::Signer(SignerError::Rejected(_))));
    assert_eq!(h.ledger.calls(), vec!["get_account", "get_latest_blockhash"]);
}

#[tokio::test(start_paused = true)]
async fn test_update_and_task_account_lists() {
    let h = harness();
    h.ledger.script_next_submission(vec![SignatureStatus::Confirmed]);
    let update = AgentUpdate {
        pricing_lamports: Some(75_000_000),
        ..AgentUpdate::default()
    };
    h.client.update_agent(&update).await.unwrap();

    h.ledger.script_next_submission(vec![SignatureStatus::Confirmed]);
    let agent_profile = Pubkey::new_unique();
    h.client.create_task(&agent_profile, "task-77", 5_000).await.unwrap();

    let sent = h.ledger.sent_transactions();
    let profile = h.client.agent_profile_address(&h.signer).unwrap();
    let update_tx = &sent[0];
    let update_ix = &update_tx.message.instructions[0];
    assert_eq!(update_ix.data[..8], tag(RegistryInstruction::UpdateAgent));
    assert_eq!(update_tx.message.account_keys[update_ix.accounts[0] as usize], profile);

    let escrow = h.client.task_escrow_address(&h.signer, "task-77").unwrap();
    let create_tx = &sent[1];
    let create_ix = &create_tx.message.instructions[0];
    let keys: Vec<Pubkey> = create_ix
        .accounts
        .iter()
        .map(|i| create_tx.message.account_keys[*i as usize])
        .collect();
    assert_eq!(keys[0], escrow);
    assert_eq!(keys[1], agent_profile);
    assert_eq!(keys[2], h.signer);
    assert_eq!(keys[3], solana_sdk::system_program::id());
}

#[tokio::test(start_paused = true)]
async fn test_fresh_blockhash_per_operation() {
    let h = harness();
    h.ledger.script_next_submission(vec![SignatureStatus::Confirmed]);
    h.client.activate_agent().await.unwrap();
    h.ledger.script_next_submission(vec![SignatureStatus::Confirmed]);
    h.client.deactivate_agent().await.unwrap();

    let sent = h.ledger.sent_transactions();
    assert_eq!(h.ledger.blockhash_requests(), 2);
    assert_ne!(sent[0].message.recent_blockhash, sent[1].message.recent_blockhash);
}
