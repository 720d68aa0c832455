//!
//! Block reception and fork resolution through the block processor
//!

mod common;

use common::{TestNode, resign};
use dpos_consensus::{
    errors::BlockProcessError,
    model::stores::{blocks::BlockStoreReader, round_snapshots::RoundSnapshotsStoreReader},
    processes::fork_resolver::BlockOutcome,
};
use dpos_consensus_core::{api::RoundScheduleProvider, errors::block::RuleError, fork::ForkCause, round::RoundSnapshot};
use futures_util::future::join_all;

#[tokio::test]
async fn test_round_boundary_block_sums_round() {
    let node = TestNode::new();
    node.add_blocks(2).await;
    assert_eq!(node.tip().height, 3);
    node.capture.clear();

    let block = node.generator.next_block(&node.tip());
    assert_eq!(block.height, 4);
    assert_eq!(node.on_receive_block(block.clone()).await.unwrap(), BlockOutcome::Accepted);

    let summing = node.capture.position("Summing round").unwrap();
    let tick = node.capture.position("Performing forward tick").unwrap();
    assert!(summing < tick);
    assert_eq!(node.tip().id, block.id);
    assert_eq!(node.tip().height, 4);
    assert_eq!(node.schedule.summed_rounds(), vec![1]);
}

#[tokio::test]
async fn test_earlier_sibling_replaces_tip() {
    let node = TestNode::new();
    let genesis = node.tip();
    let late = node.generator.block_at_slot(&genesis, 2, vec![]);
    node.on_receive_block(late.clone()).await.unwrap();

    let early = node.generator.block_at_slot(&genesis, 1, vec![]);
    assert_ne!(early.generator_public_key, late.generator_public_key);
    node.capture.clear();

    assert_eq!(node.on_receive_block(early.clone()).await.unwrap(), BlockOutcome::ForkRecovered { undone: 1 });
    assert!(node.capture.contains("Last block loses"));
    assert!(!node.capture.contains("Delegate forging on multiple nodes"));
    assert_eq!(node.tip().id, early.id);
    assert!(!node.storage().block_store.read().has(&late.id));
    assert_eq!(node.fork_count(ForkCause::CompetingSibling), 1);

    assert_eq!(node.capture.count_exact("Fork"), 1);
    let fork = node.capture.find_exact("Fork").unwrap();
    let payload = fork.payload.unwrap();
    assert_eq!(payload["cause"], 5);
    assert_eq!(payload["delegate"], early.generator_public_key.as_str());
    assert_eq!(payload["block"]["id"], early.id.as_str());
    assert_eq!(payload["block"]["previousBlock"], genesis.id.as_str());
}

#[tokio::test]
async fn test_wrong_slot_generator_is_rejected_without_mutation() {
    let node = TestNode::new();
    let tx = node.generator.transfer(7);
    node.add_block(vec![tx]).await;
    let tip = node.tip();
    let applied = node.executor.applied();
    node.capture.clear();

    let block = node.generator.block_by_other(&tip, node.generator.next_slot(&tip));
    let err = node.on_receive_block(block).await.unwrap_err();
    assert!(matches!(err, BlockProcessError::Rule(RuleError::SlotMismatch { slot: 2, .. })));
    assert_eq!(err.to_string(), "Failed to verify slot: 2");

    assert_eq!(node.tip().id, tip.id);
    assert_eq!(node.executor.applied(), applied);
    assert_eq!(node.fork_count(ForkCause::WrongSlotGenerator), 1);
    assert!(node.capture.contains("Expected generator: "));
    assert!(!node.capture.contains("Performing forward tick"));
}

#[tokio::test]
async fn test_invalid_fork_winner_leaves_chain_untouched() {
    let node = TestNode::new();
    let genesis = node.tip();
    let b2 = node.generator.block_at_slot(&genesis, 1, vec![]);
    node.on_receive_block(b2.clone()).await.unwrap();
    let b3 = node.generator.block_at_slot(&b2, 3, vec![]);
    node.on_receive_block(b3.clone()).await.unwrap();
    node.capture.clear();

    // a divergent height-4 block at an earlier slot, whose signature no longer covers its height
    let mut divergent = node.generator.block_at_slot(&b2, 2, vec![]);
    divergent.height = 4;
    let err = node.on_receive_block(divergent).await.unwrap_err();

    assert!(err.is_fork_recovery());
    assert_eq!(err.rule(), Some(&RuleError::InvalidSignature));
    assert_eq!(err.to_string(), "Failed to verify block signature");
    assert_eq!(node.tip().id, b3.id);
    assert!(node.capture.contains("Last block and parent loses"));
    assert!(node.capture.contains("Fork recovery failed"));
    assert!(!node.capture.contains("Performing backward tick"));
    assert_eq!(node.fork_count(ForkCause::DivergentSuccessor), 1);
}

#[tokio::test]
async fn test_resubmitted_tip_is_a_no_op() {
    let node = TestNode::new();
    let tx = node.generator.transfer(3);
    let block = node.add_block(vec![tx]).await;
    let applied = node.executor.applied();
    node.capture.clear();

    assert_eq!(node.on_receive_block((*block).clone()).await.unwrap(), BlockOutcome::AlreadyProcessed);
    assert_eq!(node.on_receive_block((*block).clone()).await.unwrap(), BlockOutcome::AlreadyProcessed);
    assert_eq!(node.tip().id, block.id);
    assert_eq!(node.executor.applied(), applied);
    assert_eq!(node.capture.count("Block already processed"), 2);
    assert_eq!(node.capture.find("Block already processed").unwrap().payload, Some(serde_json::json!(block.id)));
    assert!(node.fork_stats().is_empty());
}

#[tokio::test]
async fn test_divergent_successor_undoes_one_block_when_generator_matches() {
    let node = TestNode::new();
    let genesis = node.tip();
    // with four delegates, slots 1 and 5 belong to the same delegate
    let b2 = node.generator.block_at_slot(&genesis, 1, vec![]);
    node.on_receive_block(b2.clone()).await.unwrap();
    let b3 = node.generator.block_at_slot(&b2, 6, vec![]);
    node.on_receive_block(b3.clone()).await.unwrap();

    let mut divergent = node.generator.block_at_slot(&b2, 5, vec![]);
    divergent.height = 4;
    let divergent = resign(divergent);
    assert_eq!(divergent.generator_public_key, b2.generator_public_key);

    assert_eq!(node.on_receive_block(divergent.clone()).await.unwrap(), BlockOutcome::ForkRecovered { undone: 1 });
    assert_eq!(node.tip().id, divergent.id);
    let store = node.storage().block_store.read();
    assert!(store.has(&b2.id));
    assert!(!store.has(&b3.id));
}

#[tokio::test]
async fn test_divergent_successor_undoes_at_most_two_blocks() {
    let node = TestNode::new();
    let genesis = node.tip();
    let b2 = node.generator.block_at_slot(&genesis, 1, vec![]);
    node.on_receive_block(b2.clone()).await.unwrap();
    let b3 = node.generator.block_at_slot(&b2, 3, vec![]);
    node.on_receive_block(b3.clone()).await.unwrap();

    let mut divergent = node.generator.block_at_slot(&b2, 2, vec![]);
    divergent.height = 4;
    let divergent = resign(divergent);
    node.capture.clear();

    assert_eq!(node.on_receive_block(divergent.clone()).await.unwrap(), BlockOutcome::ForkRecovered { undone: 2 });
    assert!(node.capture.contains("Last block and parent loses"));
    assert_eq!(node.capture.count("Performing backward tick"), 2);
    assert_eq!(node.tip().id, divergent.id);
    let store = node.storage().block_store.read();
    assert!(!store.has(&b2.id));
    assert!(!store.has(&b3.id));
    assert!(store.has(&genesis.id));
}

#[tokio::test]
async fn test_later_competitors_do_not_replace_tip() {
    let node = TestNode::new();
    let genesis = node.tip();
    let b2 = node.generator.block_at_slot(&genesis, 1, vec![]);
    node.on_receive_block(b2.clone()).await.unwrap();

    // a sibling at a later slot
    let sibling = node.generator.block_at_slot(&genesis, 3, vec![]);
    assert_eq!(node.on_receive_block(sibling).await.unwrap(), BlockOutcome::LastBlockStands);

    // a divergent successor at a later slot
    let mut divergent = node.generator.block_at_slot(&genesis, 2, vec![]);
    divergent.height = 3;
    let divergent = resign(divergent);
    assert_eq!(node.on_receive_block(divergent).await.unwrap(), BlockOutcome::LastBlockStands);

    assert_eq!(node.tip().id, b2.id);
    assert_eq!(node.capture.count("Last block stands"), 2);
    assert_eq!(node.fork_count(ForkCause::CompetingSibling), 1);
    assert_eq!(node.fork_count(ForkCause::DivergentSuccessor), 1);
}

#[tokio::test]
async fn test_timestamp_tie_goes_to_lower_id() {
    let node = TestNode::new();
    let genesis = node.tip();
    let tip = node.generator.block_at_slot(&genesis, 1, vec![]);
    node.on_receive_block(tip.clone()).await.unwrap();

    // Same slot and parent, forged by a delegate not scheduled for it
    let sibling = node.generator.block_by_other(&genesis, 1);
    assert_eq!(sibling.timestamp, tip.timestamp);
    let result = node.on_receive_block(sibling.clone()).await;
    if sibling.id > tip.id {
        assert_eq!(result.unwrap(), BlockOutcome::LastBlockStands);
    } else {
        // the sibling wins the tie-break but fails the slot check before anything is undone
        let err = result.unwrap_err();
        assert!(err.is_fork_recovery());
        assert!(matches!(err.rule(), Some(RuleError::SlotMismatch { .. })));
        assert_eq!(node.fork_count(ForkCause::WrongSlotGenerator), 0);
    }
    assert_eq!(node.tip().id, tip.id);
    assert_eq!(node.fork_count(ForkCause::CompetingSibling), 1);
}

#[tokio::test]
async fn test_same_delegate_sibling_is_reported() {
    let node = TestNode::new();
    let genesis = node.tip();
    let first = node.generator.block_at_slot(&genesis, 1, vec![]);
    node.on_receive_block(first.clone()).await.unwrap();

    let tx = node.generator.transfer(1);
    let second = node.generator.block_at_slot(&genesis, 1, vec![tx]);
    let outcome = node.on_receive_block(second.clone()).await.unwrap();

    let warning = node.capture.find("Delegate forging on multiple nodes").unwrap();
    assert_eq!(warning.payload, Some(serde_json::json!(first.generator_public_key)));
    let winner = if second.id < first.id { &second } else { &first };
    assert_eq!(node.tip().id, winner.id);
    match second.id < first.id {
        true => assert_eq!(outcome, BlockOutcome::ForkRecovered { undone: 1 }),
        false => assert_eq!(outcome, BlockOutcome::LastBlockStands),
    }
}

#[tokio::test]
async fn test_unrelated_block_is_discarded() {
    let node = TestNode::new();
    let blocks = node.generator.chain(&node.tip(), 2);
    assert_eq!(node.on_receive_block(blocks[1].clone()).await.unwrap(), BlockOutcome::Discarded);
    assert_eq!(node.tip().height, 1);
    assert!(node.capture.contains("Discarded block that does not match with current chain: "));
    assert!(node.fork_stats().is_empty());
}

#[tokio::test]
async fn test_blocks_are_processed_in_submission_order() {
    let node = TestNode::new();
    let blocks = node.generator.chain(&node.tip(), 6);
    let futures: Vec<_> = blocks.iter().map(|b| node.on_receive_block(b.clone())).collect();
    let outcomes = join_all(futures).await;

    assert!(outcomes.into_iter().all(|o| matches!(o, Ok(BlockOutcome::Accepted))));
    assert_eq!(node.tip().id, blocks[5].id);
    let counters = node.processing_counters().snapshot();
    assert_eq!(counters.operations_submitted, 6);
    assert_eq!(counters.operations_completed, 6);
    assert_eq!(counters.blocks_applied, 6);
}

#[tokio::test]
async fn test_sibling_across_round_boundary_restores_round() {
    let node = TestNode::new();
    node.add_blocks(2).await;
    let b3 = node.tip();
    let b4 = node.generator.block_at_slot(&b3, 4, vec![]);
    node.on_receive_block(b4.clone()).await.unwrap();
    assert!(node.storage().round_snapshots_store.read().has(2));
    node.capture.clear();

    let sibling = node.generator.block_at_slot(&b3, 3, vec![]);
    assert_eq!(node.on_receive_block(sibling.clone()).await.unwrap(), BlockOutcome::ForkRecovered { undone: 1 });

    assert_eq!(node.tip().id, sibling.id);
    assert_eq!(node.schedule.summed_rounds(), vec![1, 1]);
    assert_eq!(node.schedule.restores(), 1);
    assert!(node.storage().round_snapshots_store.read().has(2));
    let messages = node.capture.messages();
    let restore = messages.iter().position(|m| m == "Restoring mem_round snapshot...").unwrap();
    let summing = messages.iter().position(|m| m == "Summing round").unwrap();
    assert!(restore < summing);
}

#[tokio::test]
async fn test_votes_reorder_the_next_round() {
    let node = TestNode::new();
    let initial = node.schedule.delegates();
    let favourite = initial[3].clone();
    let vote = node.generator.vote(vec![format!("+{}", favourite)]);
    node.add_block(vec![vote]).await;
    node.add_blocks(1).await;
    // ranking only changes once the round is summed
    assert_eq!(node.schedule.delegates(), initial);

    node.add_blocks(1).await;
    assert_eq!(node.tip().height, 4);
    assert_eq!(node.schedule.delegates()[0], favourite);
    let entered: RoundSnapshot = node.storage().round_snapshots_store.read().get(2).unwrap();
    assert_eq!(entered.delegates, initial);

    // the new order drives slot validation
    node.add_blocks(4).await;
    assert_eq!(node.tip().height, 8);
    let next = node.generator.next_slot(&node.tip());
    let expected = node.schedule.expected_generator(node.config().slot_time(next)).unwrap();
    assert_eq!(expected, node.schedule.delegates()[(next % 4) as usize]);
}
