use clap::Parser;
use dpos_consensus::{
    consensus::storage::ChainStorage,
    errors::BlockProcessResult,
    model::stores::blocks::{BlockStore, BlockStoreReader},
    testutils::MemoryPeer,
};
use dpos_consensus_core::config::{Config, ConfigBuilder, params::DEVNET_PARAMS};
use dpos_core::{error, info, time::Stopwatch};
use futures_util::future::join_all;
use secp256k1::Keypair;
use simulator::{
    network::{DposNetworkSimulator, SimulationStats},
    node::SimNode,
};
use std::{process, sync::Arc};

pub mod simulator;

/// DPoS chain simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of active delegates
    #[arg(short, long, default_value_t = 11, value_parser = clap::value_parser!(u64).range(2..=200))]
    delegates: u64,

    /// Number of rounds to forge
    #[arg(short, long, default_value_t = 20)]
    rounds: u64,

    /// Probability of injecting competing traffic around a forged block
    #[arg(short, long, default_value_t = 0.2)]
    fork_rate: f64,

    /// Probability of a forged block carrying a vote
    #[arg(long, default_value_t = 0.1)]
    vote_rate: f64,

    /// Maximum transfers per block
    #[arg(short, long, default_value_t = 5)]
    tpb: usize,

    /// Seed of the simulation randomness
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Replay batch size used when validating the produced chain
    #[arg(short, long, default_value_t = 100)]
    batch: u64,

    /// Logging level for all subsystems {off, error, warn, info, debug, trace}
    #[arg(long = "loglevel", default_value = "info")]
    log_level: String,

    /// Avoid verbose simulation information
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(err) = dpos_core::log::init_logger(None, &args.log_level) {
        eprintln!("Failed to initialize logging: {err}");
        process::exit(1);
    }
    dpos_core::panic::configure_panic();

    for (name, rate) in [("fork-rate", args.fork_rate), ("vote-rate", args.vote_rate)] {
        if !(0.0..=1.0).contains(&rate) {
            error!("--{} must be within [0, 1], got {}", name, rate);
            process::exit(1);
        }
    }

    let config = Arc::new(
        ConfigBuilder::new(DEVNET_PARAMS).edit_consensus_params(|p| p.active_delegates = args.delegates).enable_sanity_checks().build(),
    );
    let mut sim = DposNetworkSimulator::new(config.clone(), args.seed, args.fork_rate, args.vote_rate, args.tpb, !args.quiet);
    let (producer, stats) = match simulate(&mut sim, args.rounds) {
        Ok(result) => result,
        Err(err) => {
            error!("Simulation failed: {}", err);
            process::exit(1);
        }
    };
    print_stats(&config, &producer, &stats);

    if let Err(err) = validate(&config, sim.delegates(), &producer, args.batch) {
        error!("Validation failed: {}", err);
        process::exit(1);
    }
    producer.shutdown();
}

#[tokio::main]
async fn simulate(sim: &mut DposNetworkSimulator, rounds: u64) -> BlockProcessResult<(SimNode, SimulationStats)> {
    sim.run(rounds).await
}

/// Rebuilds the produced chain twice: by replaying the producer's blocks from storage, and by
/// syncing from the producer acting as a peer
#[tokio::main]
async fn validate(config: &Arc<Config>, delegates: &[Keypair], producer: &SimNode, batch: u64) -> BlockProcessResult<()> {
    let tip = producer.last_block()?;
    let blocks: Vec<_> = producer.storage().block_store.read().range(1, tip.height).iter().map(|b| (**b).clone()).collect();
    eprintln!("Validating {} blocks", blocks.len());

    let storage = ChainStorage::new();
    for block in blocks.iter() {
        storage.block_store.write().insert(Arc::new(block.clone()))?;
    }
    let replayer = SimNode::new("replayer", config, delegates, storage)?;
    let _sw = Stopwatch::<2000>::with_threshold("replay");
    let offsets: Vec<u64> = (1..=tip.height).step_by(batch.max(1) as usize).collect();
    let batches = join_all(offsets.into_iter().map(|offset| replayer.load_blocks_offset(offset, batch.max(1), true))).await;
    for loaded in batches {
        if let Some(err) = loaded?.error {
            return Err(err);
        }
    }
    assert_eq!(replayer.last_block()?.id, tip.id, "replayed chain ends at a different tip");
    assert_eq!(replayer.executor.applied(), producer.executor.applied());
    replayer.shutdown();

    let peer = MemoryPeer::new("127.0.0.1:7000", blocks);
    let syncer = SimNode::new("syncer", config, delegates, ChainStorage::new())?;
    loop {
        let height = syncer.last_block()?.height;
        let loaded = syncer.load_blocks_from_peer(&peer).await?;
        if let Some(err) = loaded.error {
            return Err(err);
        }
        if loaded.last_block.id == tip.id {
            break;
        }
        assert!(loaded.last_block.height > height, "peer sync stalled at height {}", height);
    }
    let common = syncer.get_common_block(&peer, tip.height).await?;
    assert_eq!(common.id, tip.id);
    syncer.shutdown();

    info!("Validated {} blocks by replay and peer sync", tip.height);
    Ok(())
}

fn print_stats(config: &Config, producer: &SimNode, stats: &SimulationStats) {
    let counters = producer.processing_counters().snapshot();
    let rounds = producer.schedule.summed_rounds();
    println!("[DELEGATES={}, BLOCK TIME={}s]", config.active_delegates, config.block_time);
    println!(
        "[Produced chain] blocks: {}, transactions: {}, rounds summed: {}, operations: {}",
        stats.blocks_forged,
        stats.transactions,
        rounds.len(),
        counters.operations_completed
    );
    let injections = stats.injections.iter().map(|(kind, count)| format!("{:?}: {}", kind, count)).collect::<Vec<_>>().join(", ");
    let forks = stats.forks.iter().map(|(cause, count)| format!("{}: {}", cause, count)).collect::<Vec<_>>().join(", ");
    println!(
        "[Follower] injections: [{}], forks by cause: [{}], recoveries: {}, unexpected outcomes: {}",
        injections, forks, stats.recoveries, stats.unexpected_outcomes
    );
}
