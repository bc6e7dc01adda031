//! Happy-path pipeline behavior: formation, claims, submission
//! idempotency, confirmation fan-out, and the status view.

#[cfg(test)]
mod tests {
    use crate::support::{pipeline, seed_sequenced, test_config};
    use anchor_engine::adapters::CommitScript;
    use anchor_engine::{AnchorApi, AnchorConfig, EligibilityFilter, FormationOutcome};
    use anchor_merkle::verify_record;
    use shared_bus::AnchorEvent;
    use shared_types::OwnerId;

    #[tokio::test]
    async fn test_full_pipeline_form_submit_confirm_prove() {
        let p = pipeline(test_config());
        let owner = OwnerId::new();
        let records = seed_sequenced(&p.store, owner, 4);

        let outcome = p
            .service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap();
        let FormationOutcome::Formed {
            batch_id,
            root_hash,
            leaf_count,
        } = outcome
        else {
            panic!("expected a formed batch, got {outcome:?}");
        };
        assert_eq!(leaf_count, 4);

        // Every member is claimed by exactly this batch, none anchored yet.
        for record in &records {
            let stored = p.store.record(record.id).unwrap();
            assert_eq!(stored.claimed_batch, Some(batch_id));
            assert!(!stored.is_anchored);
        }

        assert_eq!(p.service.submit_pending().await.unwrap().committed, 1);
        p.ledger.advance_tip(test_config().confirmation_depth);
        assert_eq!(p.service.poll_confirmations().await.unwrap().confirmed, 1);

        // Confirmation flags every member under the batch root atomically.
        for record in &records {
            let stored = p.store.record(record.id).unwrap();
            assert!(stored.is_anchored);
            assert_eq!(stored.batch_root, Some(root_hash));
        }

        // The proof path verifies offline against the committed root.
        let proof = p.service.prove_inclusion(records[2].id).await.unwrap();
        assert_eq!(proof.batch_id, batch_id);
        assert_eq!(proof.leaf_index, 2);
        assert!(verify_record(&records[2], &proof, &root_hash));

        // The root on the ledger matches what the proof folds up to.
        use anchor_engine::BatchStore;
        let stored = p.store.batch(batch_id).await.unwrap().unwrap();
        let tx_ref = stored.ledger_tx_ref.expect("confirmed batch has a ledger ref");
        assert_eq!(p.ledger.root_for(&tx_ref), Some(root_hash));
    }

    #[tokio::test]
    async fn test_formation_below_minimum_is_a_noop() {
        let mut config = test_config();
        config.min_batch_size = 3;
        let p = pipeline(config);
        seed_sequenced(&p.store, OwnerId::new(), 2);

        let outcome = p
            .service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap();
        assert_eq!(outcome, FormationOutcome::NotEnoughEligible { available: 2 });
        assert_eq!(p.service.status().await.unwrap().pending_batches, 0);
    }

    #[tokio::test]
    async fn test_no_record_claimed_by_two_batches() {
        let mut config = test_config();
        config.max_batch_size = 3;
        let p = pipeline(config);
        seed_sequenced(&p.store, OwnerId::new(), 6);

        // Two consecutive formations must select disjoint members.
        let first = p
            .service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap();
        let second = p
            .service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap();

        let (FormationOutcome::Formed { batch_id: a, .. }, FormationOutcome::Formed { batch_id: b, .. }) =
            (first, second)
        else {
            panic!("both formations should produce a batch");
        };
        assert_ne!(a, b);

        // Across the full claim history every record names at most one batch.
        let mut seen = std::collections::HashMap::new();
        for batch_id in [a, b] {
            for member in member_ids(&p, batch_id).await {
                assert!(
                    seen.insert(member, batch_id).is_none(),
                    "record {member} claimed twice"
                );
            }
        }
        assert_eq!(seen.len(), 6);
    }

    async fn member_ids(
        p: &crate::support::Pipeline,
        batch_id: shared_types::BatchId,
    ) -> Vec<shared_types::TransactionId> {
        use anchor_engine::BatchStore;
        p.store.batch(batch_id).await.unwrap().unwrap().members
    }

    #[tokio::test]
    async fn test_owner_filter_restricts_selection() {
        let p = pipeline(test_config());
        let alice = OwnerId::new();
        let bob = OwnerId::new();
        let alices = seed_sequenced(&p.store, alice, 3);
        seed_sequenced(&p.store, bob, 2);

        let outcome = p
            .service
            .form_batch(&EligibilityFilter::for_owner(alice))
            .await
            .unwrap();
        let FormationOutcome::Formed {
            batch_id,
            leaf_count,
            ..
        } = outcome
        else {
            panic!("expected a formed batch");
        };
        assert_eq!(leaf_count, 3);

        let members = member_ids(&p, batch_id).await;
        let expected: Vec<_> = alices.iter().map(|r| r.id).collect();
        assert_eq!(members, expected);
    }

    #[tokio::test]
    async fn test_duplicate_submission_yields_one_ledger_commitment() {
        let p = pipeline(test_config());
        seed_sequenced(&p.store, OwnerId::new(), 2);
        p.service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap();

        // Two submission cycles racing over the same pending batch.
        let (first, second) =
            futures::join!(p.service.submit_pending(), p.service.submit_pending());
        let committed = first.unwrap().committed + second.unwrap().committed;

        assert_eq!(committed, 1);
        assert_eq!(p.ledger.committed_count(), 1);
    }

    #[tokio::test]
    async fn test_commit_replay_after_timeout_does_not_double_commit() {
        let p = pipeline(test_config());
        seed_sequenced(&p.store, OwnerId::new(), 2);
        p.service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap();

        // The first commit lands but the response is lost; the retry
        // must find it via the idempotency key instead of re-writing.
        p.ledger.enqueue(CommitScript::AcceptButTimeout);
        let report = p.service.submit_pending().await.unwrap();

        assert_eq!(report.committed, 1);
        assert_eq!(p.ledger.committed_count(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_batch_is_deferred_then_picked_up() {
        let p = pipeline(test_config());
        seed_sequenced(&p.store, OwnerId::new(), 2);
        p.service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap();

        p.ledger.enqueue(CommitScript::RateLimited);
        let report = p.service.submit_pending().await.unwrap();
        assert_eq!(report.deferred, 1);
        assert_eq!(report.failed, 0);

        // Next cycle finds the stalled submission and completes it.
        let report = p.service.submit_pending().await.unwrap();
        assert_eq!(report.committed, 1);
        assert_eq!(p.ledger.committed_count(), 1);
    }

    #[tokio::test]
    async fn test_status_counts_track_the_pipeline() {
        let p = pipeline(test_config());
        seed_sequenced(&p.store, OwnerId::new(), 3);

        let status = p.service.status().await.unwrap();
        assert_eq!(status.unanchored_transactions, 3);
        assert_eq!(status.pending_batches, 0);

        p.service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap();
        assert_eq!(p.service.status().await.unwrap().pending_batches, 1);

        p.service.submit_pending().await.unwrap();
        p.ledger.advance_tip(AnchorConfig::for_testing().confirmation_depth);
        p.service.poll_confirmations().await.unwrap();

        let status = p.service.status().await.unwrap();
        assert_eq!(status.confirmed_batches, 1);
        assert_eq!(status.unanchored_transactions, 0);
    }

    #[tokio::test]
    async fn test_events_trace_the_lifecycle_in_order() {
        let p = pipeline(test_config());
        seed_sequenced(&p.store, OwnerId::new(), 2);

        p.service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap();
        p.service.submit_pending().await.unwrap();
        p.ledger.advance_tip(test_config().confirmation_depth);
        p.service.poll_confirmations().await.unwrap();

        let kinds: Vec<&'static str> = p.notifier.events().iter().map(AnchorEvent::kind).collect();
        let formed = kinds.iter().position(|k| *k == "batch_formed").unwrap();
        let submitted = kinds.iter().position(|k| *k == "batch_submitted").unwrap();
        let confirmed = kinds.iter().position(|k| *k == "batch_confirmed").unwrap();
        assert!(formed < submitted && submitted < confirmed);
        assert_eq!(
            kinds.iter().filter(|k| **k == "batch_confirmed").count(),
            1
        );
    }
}
