//! Proof of Authority header authentication for authseal.
//!
//! This crate provides:
//! - [`HeaderSignatureValidator`]: signs headers and checks attached
//!   signatures (presence, strict DER, low-S, ECDSA over secp256k1)
//! - Authority management and round-robin turn checks
//! - Header proposing and signing
//!
//! # Example
//!
//! ```rust
//! use authseal_consensus::HeaderSignatureValidator;
//! use authseal_core::{BlockHeader, Keypair};
//!
//! let keypair = Keypair::generate();
//! let mut header = BlockHeader::genesis(keypair.address());
//!
//! let validator = HeaderSignatureValidator::new();
//! validator.sign(&keypair, &mut header).unwrap();
//!
//! assert!(validator.verify_signature(&keypair.public_key, &header));
//! assert!(!validator.verify_signature(&Keypair::generate().public_key, &header));
//! ```

pub mod error;
pub mod poa;
pub mod signature;

// Re-export commonly used types
pub use error::{ConsensusError, Result};
pub use poa::{Authority, BlockProposer, PoAConfig};
pub use signature::{
    HeaderSignatureValidator, NoopObserver, RejectionObserver, SignatureRejection, SignedHeader,
    TracingObserver,
};
