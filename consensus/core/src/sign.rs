use crate::{
    PublicKeyHex,
    block::Block,
    hashing::{self, decode_hex},
};
use faster_hex::hex_string;
use secp256k1::{Keypair, Message, XOnlyPublicKey, schnorr};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("secret key is invalid")]
    InvalidSecretKey,

    #[error("generator public key is not a valid x-only key")]
    InvalidPublicKey,

    #[error("block signature is not a valid schnorr signature encoding")]
    InvalidSignatureEncoding,

    #[error("signature verification failed")]
    VerificationFailed,
}

pub type SignResult<T> = std::result::Result<T, SignError>;

/// Builds a delegate key pair from a raw 32-byte secret
pub fn keypair_from_secret(secret: &[u8; 32]) -> SignResult<Keypair> {
    Keypair::from_seckey_slice(secp256k1::SECP256K1, secret).map_err(|_| SignError::InvalidSecretKey)
}

pub fn public_key_hex(keypair: &Keypair) -> PublicKeyHex {
    hex_string(&keypair.x_only_public_key().0.serialize())
}

/// Signs the block with the given key pair and derives its id. The generator key of the block
/// is set to the key pair's public key before signing.
pub fn sign_block(block: &mut Block, keypair: &Keypair) {
    block.generator_public_key = public_key_hex(keypair);
    let msg = Message::from_digest(hashing::block::signing_hash(block));
    let sig = keypair.sign_schnorr(msg);
    block.block_signature = hex_string(&sig.serialize());
    block.id = hashing::block::block_id(block);
}

/// Verifies the block signature against the generator public key carried by the block
pub fn verify_block_signature(block: &Block) -> SignResult<()> {
    let pk = decode_hex(&block.generator_public_key)
        .and_then(|bytes| XOnlyPublicKey::from_slice(&bytes).ok())
        .ok_or(SignError::InvalidPublicKey)?;
    let sig = decode_hex(&block.block_signature)
        .and_then(|bytes| schnorr::Signature::from_slice(&bytes).ok())
        .ok_or(SignError::InvalidSignatureEncoding)?;
    let msg = Message::from_digest(hashing::block::signing_hash(block));
    sig.verify(&msg, &pk).map_err(|_| SignError::VerificationFailed)
}
