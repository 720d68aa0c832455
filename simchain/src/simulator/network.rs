use super::forger::{Forger, Injection};
use super::node::SimNode;

use dpos_consensus::{
    consensus::storage::ChainStorage,
    errors::BlockProcessResult,
    processes::fork_resolver::BlockOutcome,
    testutils::ChainGenerator,
};
use dpos_consensus_core::{block::Block, config::Config, fork::ForkCause};
use dpos_core::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use secp256k1::Keypair;
use std::{collections::BTreeMap, sync::Arc};

#[derive(Debug, Default)]
pub struct SimulationStats {
    pub blocks_forged: u64,
    pub transactions: u64,
    pub injections: BTreeMap<Injection, u64>,
    pub unexpected_outcomes: u64,
    pub recoveries: u64,
    pub forks: BTreeMap<ForkCause, u64>,
}

/// Runs a producer node forging every slot and a follower receiving its blocks together with
/// injected competing traffic
pub struct DposNetworkSimulator {
    config: Arc<Config>,
    delegates: Vec<Keypair>,
    forger: Forger,
    verbose: bool,
}

impl DposNetworkSimulator {
    pub fn new(config: Arc<Config>, seed: u64, fork_rate: f64, vote_rate: f64, tpb: usize, verbose: bool) -> Self {
        let delegates = ChainGenerator::delegate_keypairs(config.active_delegates as usize);
        let forger = Forger::new(ChaCha8Rng::seed_from_u64(seed), fork_rate, vote_rate, tpb);
        Self { config, delegates, forger, verbose }
    }

    pub fn delegates(&self) -> &[Keypair] {
        &self.delegates
    }

    /// Forges `rounds` full rounds. Returns the producer, still running, and the collected stats.
    pub async fn run(&mut self, rounds: u64) -> BlockProcessResult<(SimNode, SimulationStats)> {
        let producer = SimNode::new("producer", &self.config, &self.delegates, ChainStorage::new())?;
        let follower = SimNode::new("follower", &self.config, &self.delegates, ChainStorage::new())?;
        let generator = ChainGenerator::new(&self.config, producer.schedule.clone(), self.delegates.clone());
        let mut stats = SimulationStats::default();

        let slots = rounds * self.config.active_delegates;
        for slot in 1..=slots {
            let parent = producer.last_block()?;
            let keypair = *generator.scheduled_keypair(slot);
            // An early sibling at a boundary height would re-rank the follower's schedule before the
            // honest block's slot is checked
            let injection =
                self.forger.injection().filter(|i| *i != Injection::EarlySibling || !self.config.is_round_boundary(parent.height + 1));
            let competing = injection.and_then(|injection| self.forger.competing_block(injection, &generator, &parent, slot));
            let transactions = self.forger.transactions(&generator, &producer.schedule.delegates());
            stats.transactions += transactions.len() as u64;

            let honest = producer.generate_block(&keypair, self.config.slot_time(slot), transactions).await?;
            stats.blocks_forged += 1;

            if let Some(injection) = injection.filter(|i| i.precedes_honest_block()) {
                self.deliver_competing(&follower, injection, competing.clone(), &mut stats).await;
            }
            let outcome = follower.on_receive_block((*honest).clone()).await?;
            if let BlockOutcome::ForkRecovered { .. } = outcome {
                stats.recoveries += 1;
            }
            if let Some(injection) = injection.filter(|i| !i.precedes_honest_block()) {
                let block = competing.clone().or_else(|| Some((*honest).clone()));
                self.deliver_competing(&follower, injection, block, &mut stats).await;
            }

            if self.verbose && self.config.is_round_boundary(honest.height) {
                info!("Round {} forged, tip height {}", self.config.round_of(honest.height), honest.height);
            }
        }

        let (producer_tip, follower_tip) = (producer.last_block()?, follower.last_block()?);
        assert_eq!(producer_tip.id, follower_tip.id, "{} diverged from {}", follower.name, producer.name);
        assert_eq!(producer.executor.applied(), follower.executor.applied());
        for event in follower.fork_stats() {
            *stats.forks.entry(event.cause).or_default() += 1;
        }
        follower.shutdown();
        Ok((producer, stats))
    }

    async fn deliver_competing(&self, follower: &SimNode, injection: Injection, block: Option<Block>, stats: &mut SimulationStats) {
        let Some(block) = block else { return };
        *stats.injections.entry(injection).or_default() += 1;
        let result = follower.on_receive_block(block).await;
        if !injection.is_expected(&result) {
            stats.unexpected_outcomes += 1;
            warn!("Unexpected outcome for {:?} injection: {:?}", injection, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpos_consensus_core::config::{ConfigBuilder, params::DEVNET_PARAMS};

    #[tokio::test]
    async fn test_follower_tracks_producer_under_injected_forks() {
        let config = Arc::new(ConfigBuilder::new(DEVNET_PARAMS).edit_consensus_params(|p| p.active_delegates = 4).build());
        let mut sim = DposNetworkSimulator::new(config, 3, 1.0, 0.3, 2, false);
        let (producer, stats) = sim.run(4).await.unwrap();

        assert_eq!(stats.blocks_forged, 16);
        assert_eq!(producer.last_block().unwrap().height, 17);
        assert_eq!(stats.unexpected_outcomes, 0);
        assert_eq!(stats.recoveries, stats.injections.get(&Injection::EarlySibling).copied().unwrap_or_default());
        assert_eq!(producer.schedule.summed_rounds(), vec![1, 2, 3, 4]);
        producer.shutdown();
    }
}
