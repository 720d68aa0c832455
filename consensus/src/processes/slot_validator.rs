use crate::errors::BlockProcessResult;
use dpos_consensus_core::{
    PublicKeyHex, api::RoundScheduleProvider, block::Block, config::params::Params, errors::block::RuleError,
    errors::schedule::ScheduleResult,
};
use dpos_core::log::Logger;
use std::sync::Arc;

/// Checks that a block was forged by the delegate scheduled for its slot
#[derive(Clone)]
pub struct SlotValidator {
    params: Params,
    schedule: Arc<dyn RoundScheduleProvider>,
    log: Logger,
}

impl SlotValidator {
    pub fn new(params: &Params, schedule: Arc<dyn RoundScheduleProvider>, log: Logger) -> Self {
        Self { params: params.clone(), schedule, log }
    }

    pub fn expected_generator(&self, timestamp: u64) -> ScheduleResult<PublicKeyHex> {
        self.schedule.expected_generator(timestamp)
    }

    pub fn verify_slot(&self, block: &Block) -> BlockProcessResult<()> {
        let expected = self.expected_generator(block.timestamp)?;
        if expected == block.generator_public_key {
            return Ok(());
        }
        self.log.error(format_args!("Expected generator: {} Received generator: {}", expected, block.generator_public_key));
        Err(RuleError::SlotMismatch {
            slot: self.params.slot_of(block.timestamp),
            expected,
            received: block.generator_public_key.clone(),
        }
        .into())
    }
}
