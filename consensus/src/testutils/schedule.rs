use dpos_consensus_core::{
    PublicKeyHex,
    api::RoundScheduleProvider,
    config::params::Params,
    errors::schedule::{ScheduleError, ScheduleResult},
    round::RoundSnapshot,
    sign::public_key_hex,
};
use parking_lot::RwLock;
use secp256k1::Keypair;
use std::collections::BTreeMap;

#[derive(Default)]
struct ScheduleState {
    delegates: Vec<PublicKeyHex>,
    votes: BTreeMap<PublicKeyHex, u64>,
    summed_rounds: Vec<u64>,
    restores: usize,
    fail_summing: bool,
}

impl ScheduleState {
    /// Orders delegates by vote weight, descending, breaking ties by public key
    fn rank(&mut self) {
        let votes = &self.votes;
        self.delegates.sort_by(|a, b| votes.get(b).cmp(&votes.get(a)).then_with(|| a.cmp(b)));
    }
}

/// A round schedule over a fixed delegate set. Slots are assigned round-robin in ranking order,
/// and the ranking is recomputed from vote weights each time a round is summed.
pub struct MemoryRoundSchedule {
    block_time: u64,
    active_delegates: u64,
    state: RwLock<ScheduleState>,
}

impl MemoryRoundSchedule {
    pub fn new(params: &Params, delegates: Vec<PublicKeyHex>) -> Self {
        let votes = delegates.iter().map(|d| (d.clone(), 0)).collect();
        let mut state = ScheduleState { delegates, votes, ..Default::default() };
        state.rank();
        Self { block_time: params.block_time, active_delegates: params.active_delegates, state: RwLock::new(state) }
    }

    pub fn from_keypairs(params: &Params, keypairs: &[Keypair]) -> Self {
        Self::new(params, keypairs.iter().map(public_key_hex).collect())
    }

    /// Current forging order
    pub fn delegates(&self) -> Vec<PublicKeyHex> {
        self.state.read().delegates.clone()
    }

    pub fn votes_of(&self, delegate: &str) -> u64 {
        self.state.read().votes.get(delegate).copied().unwrap_or_default()
    }

    pub fn set_votes(&self, delegate: &str, votes: u64) {
        self.state.write().votes.insert(delegate.to_string(), votes);
    }

    /// Adds `delta` to the vote weight of a known delegate. Unknown keys are ignored.
    pub fn add_votes(&self, delegate: &str, delta: i64) {
        if let Some(weight) = self.state.write().votes.get_mut(delegate) {
            *weight = weight.saturating_add_signed(delta);
        }
    }

    pub fn summed_rounds(&self) -> Vec<u64> {
        self.state.read().summed_rounds.clone()
    }

    /// Number of successful `restore_round` calls
    pub fn restores(&self) -> usize {
        self.state.read().restores
    }

    pub fn set_fail_summing(&self, fail: bool) {
        self.state.write().fail_summing = fail;
    }
}

impl RoundScheduleProvider for MemoryRoundSchedule {
    fn expected_generator(&self, timestamp: u64) -> ScheduleResult<PublicKeyHex> {
        let state = self.state.read();
        if state.delegates.is_empty() {
            return Err(ScheduleError::NoDelegates);
        }
        let slot = timestamp / self.block_time;
        Ok(state.delegates[(slot % state.delegates.len() as u64) as usize].clone())
    }

    fn is_round_boundary(&self, height: u64) -> bool {
        height % self.active_delegates == 0
    }

    fn summarize_round(&self, round: u64) -> ScheduleResult<()> {
        let mut state = self.state.write();
        if state.fail_summing {
            return Err(ScheduleError::SummingFailed(round, "round summing is disabled".to_string()));
        }
        state.rank();
        state.summed_rounds.push(round);
        Ok(())
    }

    fn snapshot_round(&self) -> RoundSnapshot {
        let state = self.state.read();
        RoundSnapshot { delegates: state.delegates.clone(), votes: state.votes.clone() }
    }

    fn restore_round(&self, snapshot: RoundSnapshot) -> ScheduleResult<()> {
        if snapshot.delegates.is_empty() {
            return Err(ScheduleError::NoDelegates);
        }
        let mut state = self.state.write();
        state.delegates = snapshot.delegates;
        state.votes = snapshot.votes;
        state.restores += 1;
        Ok(())
    }
}
