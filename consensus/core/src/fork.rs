use crate::{
    PublicKeyHex,
    block::{Block, BlockSnapshot},
};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt::Display;

/// Reason a fork was observed. Serialized as its numeric code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ForkCause {
    /// The incoming block is at the next height but does not build on the tip
    DivergentSuccessor = 1,
    /// The incoming block was forged by a delegate not scheduled for its slot
    WrongSlotGenerator = 3,
    /// The incoming block competes with the tip for the same height and parent
    CompetingSibling = 5,
}

impl ForkCause {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl Display for ForkCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Observational record of a fork, emitted for logs and statistics only
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkEvent {
    pub cause: ForkCause,
    pub delegate: PublicKeyHex,
    pub block: BlockSnapshot,
}

impl ForkEvent {
    pub fn new(cause: ForkCause, block: &Block) -> Self {
        Self { cause, delegate: block.generator_public_key.clone(), block: block.snapshot() }
    }
}
