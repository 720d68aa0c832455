pub mod api;
pub mod block;
pub mod config;
pub mod errors;
pub mod fork;
pub mod hashing;
pub mod round;
pub mod sign;
pub mod tx;

/// Blocks and transactions are identified by the decimal rendering of a 64-bit digest prefix
pub type BlockId = String;

/// Hex-encoded 32-byte x-only public key of a delegate
pub type PublicKeyHex = String;
