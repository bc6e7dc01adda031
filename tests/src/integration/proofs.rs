//! Proof correctness against known vectors, plus the service-level
//! refusal rules.

#[cfg(test)]
mod tests {
    use crate::support::{pipeline, seed_sequenced, sequenced_record, test_config};
    use anchor_engine::{
        AnchorApi, AnchorError, BatchStore, EligibilityFilter, FormationOutcome,
    };
    use anchor_merkle::{
        leaf_hash, node_hash, verify_inclusion, verify_record, MerkleTree, Position,
    };
    use rand::Rng;
    use shared_types::{Amount, Hash, OwnerId, TransactionId};

    /// Drive a fresh pipeline to a confirmed five-record batch and
    /// return the records in leaf order plus the root.
    async fn confirmed_five(p: &crate::support::Pipeline) -> (Vec<shared_types::TransactionRecord>, Hash) {
        let records = seed_sequenced(&p.store, OwnerId::new(), 5);
        let FormationOutcome::Formed { root_hash, .. } = p
            .service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap()
        else {
            panic!("expected a formed batch");
        };
        p.service.submit_pending().await.unwrap();
        p.ledger.advance_tip(test_config().confirmation_depth);
        p.service.poll_confirmations().await.unwrap();
        (records, root_hash)
    }

    #[tokio::test]
    async fn test_five_leaf_root_matches_hand_built_tree() {
        let p = pipeline(test_config());
        let (records, root) = confirmed_five(&p).await;

        let h: Vec<Hash> = records.iter().map(leaf_hash).collect();
        // root = H(H(H(h1,h2), H(h3,h4)), H(h5,h5))
        let expected = node_hash(
            &node_hash(&node_hash(&h[0], &h[1]), &node_hash(&h[2], &h[3])),
            &node_hash(&h[4], &h[4]),
        );
        assert_eq!(
            hex::encode(root),
            hex::encode(expected),
            "pipeline root differs from the hand-built tree"
        );
    }

    #[tokio::test]
    async fn test_third_leaf_proof_path_is_the_expected_vector() {
        let p = pipeline(test_config());
        let (records, root) = confirmed_five(&p).await;
        let h: Vec<Hash> = records.iter().map(leaf_hash).collect();

        let proof = p.service.prove_inclusion(records[2].id).await.unwrap();
        assert_eq!(proof.leaf_index, 2);
        assert_eq!(proof.leaf_hash, h[2]);
        assert_eq!(proof.root_hash, root);

        // Path for t3: [h4 right, H(h1,h2) left, H(h5,h5) right]
        assert_eq!(proof.path.len(), 3);
        assert_eq!(proof.path[0].hash, h[3]);
        assert_eq!(proof.path[0].position, Position::Right);
        assert_eq!(proof.path[1].hash, node_hash(&h[0], &h[1]));
        assert_eq!(proof.path[1].position, Position::Left);
        assert_eq!(proof.path[2].hash, node_hash(&h[4], &h[4]));
        assert_eq!(proof.path[2].position, Position::Right);

        assert!(verify_inclusion(&h[2], &proof.path, &root));
        assert!(verify_record(&records[2], &proof, &root));
    }

    #[tokio::test]
    async fn test_single_byte_mutation_breaks_verification() {
        let p = pipeline(test_config());
        let (records, root) = confirmed_five(&p).await;
        let proof = p.service.prove_inclusion(records[1].id).await.unwrap();
        assert!(verify_record(&records[1], &proof, &root));

        // One minor unit off; every content field is covered the same way.
        let mut altered = records[1].clone();
        altered.amount = Amount::from_minor_units(altered.amount.minor_units() + 1);
        assert!(!verify_record(&altered, &proof, &root));

        let mut renamed = records[1].clone();
        renamed.merchant.push('X');
        assert!(!verify_record(&renamed, &proof, &root));

        // A wrong root fails even with intact content.
        assert!(!verify_record(&records[1], &proof, &[0u8; 32]));
    }

    #[tokio::test]
    async fn test_single_leaf_batch_root_is_the_leaf() {
        let p = pipeline(test_config());
        let record = sequenced_record(OwnerId::new(), 0, "Solo Vendor");
        p.store.insert_record(record.clone());

        let FormationOutcome::Formed { root_hash, leaf_count, .. } = p
            .service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap()
        else {
            panic!("expected a formed batch");
        };
        assert_eq!(leaf_count, 1);
        assert_eq!(root_hash, leaf_hash(&record));

        p.service.submit_pending().await.unwrap();
        p.ledger.advance_tip(test_config().confirmation_depth);
        p.service.poll_confirmations().await.unwrap();

        let proof = p.service.prove_inclusion(record.id).await.unwrap();
        assert!(proof.path.is_empty());
        assert!(verify_record(&record, &proof, &root_hash));
    }

    #[tokio::test]
    async fn test_same_leaves_build_the_same_root() {
        let leaves: Vec<Hash> = (1..=5u8)
            .map(|n| {
                let mut h = [0u8; 32];
                h[0] = n;
                h
            })
            .collect();
        let first = MerkleTree::build(&leaves).unwrap();
        let second = MerkleTree::build(&leaves).unwrap();
        assert_eq!(first.root(), second.root());
        assert_eq!(first.levels(), second.levels());
    }

    #[tokio::test]
    async fn test_snapshot_reproduces_the_committed_root() {
        let p = pipeline(test_config());
        let (_, root) = confirmed_five(&p).await;

        let batch = p
            .store
            .list_by_status(anchor_engine::BatchStatus::Confirmed)
            .await
            .unwrap()
            .pop()
            .unwrap();
        let snapshot = p.store.snapshot(batch.id).await.unwrap().unwrap();

        // leaf_count == member count == snapshot leaf level
        assert_eq!(batch.leaf_count, batch.members.len());
        assert_eq!(batch.leaf_count, snapshot.leaves().len());

        let rebuilt = MerkleTree::from_snapshot(&snapshot).unwrap();
        assert_eq!(rebuilt.root(), root);
        assert_eq!(rebuilt.root(), batch.root_hash);
    }

    #[tokio::test]
    async fn test_refusals_not_found_and_not_yet_anchored() {
        let p = pipeline(test_config());
        seed_sequenced(&p.store, OwnerId::new(), 3);

        // Unknown id.
        let missing = TransactionId::new();
        assert!(matches!(
            p.service.prove_inclusion(missing).await,
            Err(AnchorError::TransactionNotFound { .. })
        ));

        // Known but unbatched.
        let record = sequenced_record(OwnerId::new(), 9, "Late Arrival");
        p.store.insert_record(record.clone());
        assert!(matches!(
            p.service.prove_inclusion(record.id).await,
            Err(AnchorError::NotYetAnchored { .. })
        ));

        // Batched but only pending.
        let FormationOutcome::Formed { batch_id, .. } = p
            .service
            .form_batch(&EligibilityFilter::default())
            .await
            .unwrap()
        else {
            panic!("expected a formed batch");
        };
        let member = p.store.batch(batch_id).await.unwrap().unwrap().members[0];
        assert!(matches!(
            p.service.prove_inclusion(member).await,
            Err(AnchorError::NotYetAnchored { .. })
        ));
    }

    #[tokio::test]
    async fn test_random_shapes_every_leaf_verifies() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let count = rng.gen_range(1..=40usize);
            let leaves: Vec<Hash> = (0..count).map(|_| rng.gen::<[u8; 32]>()).collect();
            let tree = MerkleTree::build(&leaves).unwrap();
            let root = tree.root();

            let index = rng.gen_range(0..count);
            let path = tree.proof_path(index).unwrap();
            assert!(verify_inclusion(&leaves[index], &path, &root));

            // The path never verifies a different leaf.
            if count > 1 {
                let other = (index + 1) % count;
                assert!(!verify_inclusion(&leaves[other], &path, &root));
            }
        }
    }
}
