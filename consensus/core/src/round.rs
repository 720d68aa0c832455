use crate::PublicKeyHex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vote and delegate-order state captured when a round is entered, and restored when the
/// block that entered it is undone
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Forging order of the round being entered
    pub delegates: Vec<PublicKeyHex>,
    /// Vote weight per delegate
    pub votes: BTreeMap<PublicKeyHex, u64>,
}
