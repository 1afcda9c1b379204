//! End-to-end ledger tests against a real sled database.

use chaintrack_chain::{Ledger, LedgerConfig, LedgerError, MineOutcome};
use chaintrack_consensus::ViolationKind;
use chaintrack_core::{hash_hex, Block, NewTransaction};
use chaintrack_storage::{Storage, StorageError};
use std::collections::HashSet;

fn mined(outcome: MineOutcome) -> Block {
    match outcome {
        MineOutcome::Mined(block) => block,
        other => panic!("expected a mined block, got {other:?}"),
    }
}

#[test]
fn test_single_transfer_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig::with_difficulty(1);

    let block = {
        let storage = Storage::open(dir.path()).unwrap();
        let ledger = Ledger::new(&storage, &config);

        ledger
            .submit_transaction(NewTransaction::new("A", "B", 10.0))
            .unwrap();
        let block = mined(ledger.mine_block(None).unwrap());

        let preimage = format!("A->B:10.00|{}", block.nonce);
        assert_eq!(block.hash, hash_hex(preimage.as_bytes()));
        assert!(block.hash.starts_with('0'));
        assert_eq!(block.previous_hash, "");

        storage.flush().unwrap();
        block
    };

    // reopen and validate from disk
    let storage = Storage::open(dir.path()).unwrap();
    let ledger = Ledger::new(&storage, &config);
    assert!(ledger.validate_chain().unwrap().is_valid());

    let reloaded = ledger.get_block(block.id).unwrap().unwrap();
    assert_eq!(reloaded.hash, block.hash);
    assert_eq!(reloaded.transactions.len(), 1);
    assert!(reloaded.transactions[0].is_mined);

    ledger.tamper(block.id, None, 1010.0).unwrap();
    let report = ledger.validate_chain().unwrap();
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, ViolationKind::HashMismatch);
    assert_ne!(report.violations[0].expected_hash, report.violations[0].stored_hash);
}

#[test]
fn test_tamper_in_middle_of_chain() {
    let storage = Storage::open_temporary().unwrap();
    let ledger = Ledger::new(&storage, &LedgerConfig::with_difficulty(1));

    let mut blocks = Vec::new();
    for i in 0..4 {
        ledger
            .submit_transaction(NewTransaction::new(format!("s{i}"), "r", 1.0 + i as f64))
            .unwrap();
        ledger
            .submit_transaction(NewTransaction::new("r", format!("s{i}"), 0.5))
            .unwrap();
        blocks.push(mined(ledger.mine_block(None).unwrap()));
    }
    assert!(ledger.validate_chain().unwrap().is_valid());

    let target = &blocks[2];
    let second_tx = target.transactions[1].id;
    ledger.tamper(target.id, Some(second_tx), 99.0).unwrap();

    let report = ledger.validate_chain().unwrap();
    assert_eq!(report.blocks_checked, 4);
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].block_id, target.id);
}

#[test]
fn test_strict_linkage_accepts_mined_chain() {
    let storage = Storage::open_temporary().unwrap();
    let mut config = LedgerConfig::with_difficulty(1);
    config.strict_linkage = true;
    let ledger = Ledger::new(&storage, &config);

    for i in 0..3 {
        ledger
            .submit_transaction(NewTransaction::new("a", "b", 1.0 + i as f64))
            .unwrap();
        mined(ledger.mine_block(None).unwrap());
    }

    assert!(ledger.validate_chain().unwrap().is_valid());
}

#[test]
fn test_difficulty_mismatch_is_reported() {
    let storage = Storage::open_temporary().unwrap();
    let easy = Ledger::new(&storage, &LedgerConfig::with_difficulty(0));

    easy.submit_transaction(NewTransaction::new("a", "b", 1.0))
        .unwrap();
    let block = mined(easy.mine_block(None).unwrap());
    assert_eq!(block.nonce, 0);

    // a validator configured for more work than the block carries
    let hard = Ledger::new(&storage, &LedgerConfig::with_difficulty(8));
    let report = hard.validate_chain().unwrap();
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, ViolationKind::InsufficientWork);
}

#[test]
fn test_concurrent_miners_never_share_transactions() {
    let storage = Storage::open_temporary().unwrap();
    let config = LedgerConfig::with_difficulty(1);

    {
        let ledger = Ledger::new(&storage, &config);
        for i in 0..5 {
            ledger
                .submit_transaction(NewTransaction::new("a", "b", 1.0 + i as f64))
                .unwrap();
        }
    }

    let results: Vec<Result<MineOutcome, LedgerError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| scope.spawn(|| Ledger::new(&storage, &config).mine_block(None)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut successes = 0;
    for result in results {
        match result {
            Ok(MineOutcome::Mined(_)) => successes += 1,
            Err(LedgerError::NothingToMine)
            | Err(LedgerError::Storage(StorageError::AlreadyMined { .. })) => {}
            other => panic!("unexpected mining result: {other:?}"),
        }
    }
    assert!(successes >= 1);

    let ledger = Ledger::new(&storage, &config);
    assert!(ledger.pending_transactions().unwrap().is_empty());

    let mut seen = HashSet::new();
    for block in ledger.blocks().unwrap() {
        for tx in &block.transactions {
            assert!(seen.insert(tx.id), "transaction {} claimed twice", tx.id);
            assert_eq!(tx.block_id, Some(block.id));
        }
    }
    assert_eq!(seen.len(), 5);
}
