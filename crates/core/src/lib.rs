//! Core primitives for authseal.
//!
//! This crate provides the types shared by signers and verifiers:
//! - Blake3 hashing, including the domain-separated header hash
//! - secp256k1 keys, addresses and attached block signatures
//! - Strict DER encoding for ECDSA signatures
//! - Block headers

pub mod block;
pub mod crypto;
pub mod der;
pub mod hash;

// Re-export commonly used types at the crate root
pub use block::BlockHeader;
pub use crypto::{Address, BlockSignature, CryptoError, Keypair, PublicKey};
pub use der::{DerError, EcdsaSignature};
pub use hash::{hash, Hash, H256};
