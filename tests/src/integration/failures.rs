//! Failure semantics: what may be released, what must stay claimed,
//! and how reorganizations revoke proofs.

#[cfg(test)]
mod tests {
    use crate::support::{pipeline, seed_sequenced, test_config};
    use anchor_engine::adapters::CommitScript;
    use anchor_engine::{
        AnchorApi, BatchStatus, BatchStore, CommitKnowledge, EligibilityFilter, FormationOutcome,
    };
    use shared_bus::AnchorEvent;
    use shared_types::{BatchId, OwnerId};

    async fn formed_batch_id(p: &crate::support::Pipeline) -> BatchId {
        match p
            .service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap()
        {
            FormationOutcome::Formed { batch_id, .. } => batch_id,
            other => panic!("expected a formed batch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ambiguous_failure_keeps_members_claimed() {
        let p = pipeline(test_config());
        let records = seed_sequenced(&p.store, OwnerId::new(), 2);
        let batch_id = formed_batch_id(&p).await;

        // Both attempts time out and nothing ever lands, but a timeout
        // proves nothing: the commit could still surface later.
        p.ledger.enqueue_all(vec![CommitScript::Timeout, CommitScript::Timeout]);
        let report = p.service.submit_pending().await.unwrap();
        assert_eq!(report.failed, 1);

        let batch = p.store.batch(batch_id).await.unwrap().unwrap();
        assert_eq!(batch.status, BatchStatus::Failed);
        assert_eq!(
            batch.failure.as_ref().map(|f| f.knowledge),
            Some(CommitKnowledge::Ambiguous)
        );

        // Members remain claimed and unanchored for an operator to settle.
        for record in &records {
            let stored = p.store.record(record.id).unwrap();
            assert_eq!(stored.claimed_batch, Some(batch_id));
            assert!(!stored.is_anchored);
        }

        let events = p.notifier.events();
        assert!(events.iter().any(|e| matches!(
            e,
            AnchorEvent::BatchFailed {
                members_released: false,
                ..
            }
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, AnchorEvent::OperatorAlert { .. })));
        assert!(!events
            .iter()
            .any(|e| matches!(e, AnchorEvent::TransactionsReleased { .. })));
    }

    #[tokio::test]
    async fn test_rejection_releases_members_for_a_later_batch() {
        let p = pipeline(test_config());
        let records = seed_sequenced(&p.store, OwnerId::new(), 2);
        let first_batch = formed_batch_id(&p).await;

        p.ledger.enqueue(CommitScript::Reject {
            reason: "unsupported root format".to_string(),
        });
        let report = p.service.submit_pending().await.unwrap();
        assert_eq!(report.failed, 1);

        // Rejection proves non-commitment; claims are cleared.
        for record in &records {
            let stored = p.store.record(record.id).unwrap();
            assert_eq!(stored.claimed_batch, None);
            assert!(!stored.is_anchored);
        }
        let events = p.notifier.events();
        assert!(events
            .iter()
            .any(|e| matches!(e, AnchorEvent::TransactionsReleased { .. })));

        // The released records anchor transparently in a later batch.
        let second_batch = formed_batch_id(&p).await;
        assert_ne!(first_batch, second_batch);
        p.service.submit_pending().await.unwrap();
        p.ledger.advance_tip(test_config().confirmation_depth);
        p.service.poll_confirmations().await.unwrap();

        for record in &records {
            let stored = p.store.record(record.id).unwrap();
            assert!(stored.is_anchored);
            assert_eq!(stored.claimed_batch, Some(second_batch));
        }
    }

    #[tokio::test]
    async fn test_reorg_fails_batch_and_revokes_proofs() {
        let mut config = test_config();
        config.confirmation_depth = 5;
        let p = pipeline(config);
        let records = seed_sequenced(&p.store, OwnerId::new(), 3);
        let batch_id = formed_batch_id(&p).await;

        p.service.submit_pending().await.unwrap();
        // First poll sees the commitment at depth 1 and advances.
        let report = p.service.poll_confirmations().await.unwrap();
        assert_eq!(report.advanced, 1);
        let batch = p.store.batch(batch_id).await.unwrap().unwrap();
        assert_eq!(batch.status, BatchStatus::Anchored);

        // A proof is available while anchored...
        let proof = p.service.prove_inclusion(records[0].id).await.unwrap();
        assert_eq!(proof.batch_id, batch_id);

        // ...then the containing block is reorganized away.
        let tx_ref = batch.ledger_tx_ref.expect("anchored batch has a ref");
        p.ledger.simulate_reorg(&tx_ref);
        let report = p.service.poll_confirmations().await.unwrap();
        assert_eq!(report.failed, 1);

        let batch = p.store.batch(batch_id).await.unwrap().unwrap();
        assert_eq!(batch.status, BatchStatus::Failed);
        assert_eq!(
            batch.failure.as_ref().map(|f| f.knowledge),
            Some(CommitKnowledge::ReorgedOut)
        );

        // Members are released for re-anchoring and proofs revoked.
        for record in &records {
            let stored = p.store.record(record.id).unwrap();
            assert_eq!(stored.claimed_batch, None);
            assert!(!stored.is_anchored);
        }
        let events = p.notifier.events();
        assert!(events.iter().any(|e| matches!(
            e,
            AnchorEvent::ProofsRevoked { batch_id: b, .. } if *b == batch_id
        )));

        // No proof can be issued against the dead batch anymore.
        assert!(p.service.prove_inclusion(records[0].id).await.is_err());
    }

    #[tokio::test]
    async fn test_dropped_commitment_is_proven_absent_and_released() {
        let mut config = test_config();
        config.confirmation_depth = 5;
        config.drop_patience_secs = 0;
        let p = pipeline(config);
        let records = seed_sequenced(&p.store, OwnerId::new(), 2);
        let batch_id = formed_batch_id(&p).await;

        p.service.submit_pending().await.unwrap();
        let batch = p.store.batch(batch_id).await.unwrap().unwrap();
        let tx_ref = batch.ledger_tx_ref.expect("submitted batch has a ref");

        // The ledger loses the commitment entirely; past the patience
        // window a negative key lookup settles the question.
        p.ledger.forget(&tx_ref);
        let report = p.service.poll_confirmations().await.unwrap();
        assert_eq!(report.failed, 1);

        let batch = p.store.batch(batch_id).await.unwrap().unwrap();
        assert_eq!(batch.status, BatchStatus::Failed);
        assert_eq!(
            batch.failure.as_ref().map(|f| f.knowledge),
            Some(CommitKnowledge::ProvenAbsent)
        );
        for record in &records {
            let stored = p.store.record(record.id).unwrap();
            assert_eq!(stored.claimed_batch, None);
        }
    }

    #[tokio::test]
    async fn test_status_machine_rejects_skipping_states() {
        // The domain rule...
        assert!(!BatchStatus::Pending.can_transition_to(BatchStatus::Confirmed));
        assert!(!BatchStatus::Pending.can_transition_to(BatchStatus::Anchored));
        assert!(!BatchStatus::Confirmed.can_transition_to(BatchStatus::Failed));
        assert!(!BatchStatus::Failed.can_transition_to(BatchStatus::Pending));

        // ...and the store CAS both refuse the jump.
        let p = pipeline(test_config());
        seed_sequenced(&p.store, OwnerId::new(), 2);
        let batch_id = formed_batch_id(&p).await;

        let result = p
            .store
            .try_transition(batch_id, BatchStatus::Pending, BatchStatus::Confirmed)
            .await;
        assert!(result.is_err());

        // The batch is untouched and still submits normally.
        let batch = p.store.batch(batch_id).await.unwrap().unwrap();
        assert_eq!(batch.status, BatchStatus::Pending);
        assert_eq!(p.service.submit_pending().await.unwrap().committed, 1);
    }

    #[tokio::test]
    async fn test_provisional_category_never_enters_a_batch() {
        let p = pipeline(test_config());
        let owner = OwnerId::new();
        seed_sequenced(&p.store, owner, 2);

        let mut provisional = crate::support::sequenced_record(owner, 10, "Unreviewed Vendor");
        provisional.category_state = shared_types::CategoryState::Provisional;
        let provisional_id = provisional.id;
        p.store.insert_record(provisional);

        let batch_id = formed_batch_id(&p).await;
        let batch = p.store.batch(batch_id).await.unwrap().unwrap();
        assert_eq!(batch.leaf_count, 2);
        assert!(!batch.members.contains(&provisional_id));
    }
}
