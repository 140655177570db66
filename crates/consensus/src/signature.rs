//! Signing and verification of PoA header signatures.
//!
//! A header is accepted only when its attached signature passes, in order:
//!
//! 1. presence: a non-empty signature is attached
//! 2. encoding: the bytes are strict DER
//! 3. canonical form: `s` is low-S
//! 4. the ECDSA equation over the header hash and the given public key
//!
//! [`HeaderSignatureValidator::verify_signature`] collapses every failure to
//! `false`. The reason is only reported to the injected [`RejectionObserver`]
//! and through [`HeaderSignatureValidator::check_signature`].

use crate::error::Result;
use authseal_core::der::{self, DerError, EcdsaSignature};
use authseal_core::{BlockHeader, BlockSignature, Hash, Keypair, PublicKey};
use thiserror::Error;
use tracing::{debug, trace};

/// A header that can carry an authority signature.
pub trait SignedHeader {
    /// Hash the signature commits to. Must not depend on the signature itself.
    fn signing_hash(&self) -> Hash;

    /// The attached signature, if any.
    fn block_signature(&self) -> Option<&BlockSignature>;

    /// Attach a signature, replacing any previous one.
    fn set_block_signature(&mut self, signature: BlockSignature);
}

impl SignedHeader for BlockHeader {
    fn signing_hash(&self) -> Hash {
        self.hash()
    }

    fn block_signature(&self) -> Option<&BlockSignature> {
        self.signature.as_ref()
    }

    fn set_block_signature(&mut self, signature: BlockSignature) {
        self.signature = Some(signature);
    }
}

/// Why a header signature was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureRejection {
    #[error("header carries no signature")]
    MissingSignature,

    #[error("signature is not strict DER: {0}")]
    MalformedEncoding(DerError),

    #[error("signature is not in canonical low-S form")]
    NonCanonicalSignature,

    #[error("signature does not match the header hash and public key")]
    CryptographicMismatch,
}

impl SignatureRejection {
    /// Short stable tag for log lines.
    pub fn tag(&self) -> &'static str {
        match self {
            SignatureRejection::MissingSignature => "NO_SIGNATURE",
            SignatureRejection::MalformedEncoding(_) => "INVALID_DER",
            SignatureRejection::NonCanonicalSignature => "NOT_CANONICAL",
            SignatureRejection::CryptographicMismatch => "INVALID_SIGNATURE",
        }
    }
}

/// Receives the reason whenever a header signature is rejected.
pub trait RejectionObserver {
    fn on_rejection(&self, header_hash: &Hash, reason: &SignatureRejection);
}

/// Emits a `trace` event per rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RejectionObserver for TracingObserver {
    fn on_rejection(&self, header_hash: &Hash, reason: &SignatureRejection) {
        trace!(hash = %header_hash, tag = reason.tag(), "(-)[{}] {}", reason.tag(), reason);
    }
}

/// Discards rejections.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RejectionObserver for NoopObserver {
    fn on_rejection(&self, _header_hash: &Hash, _reason: &SignatureRejection) {}
}

impl<F> RejectionObserver for F
where
    F: Fn(&Hash, &SignatureRejection),
{
    fn on_rejection(&self, header_hash: &Hash, reason: &SignatureRejection) {
        self(header_hash, reason)
    }
}

/// Signs headers and checks their attached signatures.
///
/// The validator holds no state besides its observer, so one instance can be
/// shared between threads checking different headers.
#[derive(Debug, Clone, Default)]
pub struct HeaderSignatureValidator<O = TracingObserver> {
    observer: O,
}

impl HeaderSignatureValidator {
    /// Create a validator that reports rejections through `tracing`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: RejectionObserver> HeaderSignatureValidator<O> {
    /// Create a validator with a custom rejection observer.
    pub fn with_observer(observer: O) -> Self {
        Self { observer }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Sign the header's hash and attach the DER encoded signature.
    ///
    /// Signing failures are returned, never replaced by an empty signature.
    pub fn sign<H: SignedHeader>(&self, keypair: &Keypair, header: &mut H) -> Result<()> {
        let hash = header.signing_hash();
        let signature = keypair.sign_hash(&hash)?;
        header.set_block_signature(BlockSignature::from_ecdsa(&signature));

        debug!(hash = %hash, author = %keypair.address(), "signed header");
        Ok(())
    }

    /// Verify that the header's signature was made by `public_key`.
    ///
    /// Returns `true` only when all checks pass.
    pub fn verify_signature<H: SignedHeader>(&self, public_key: &PublicKey, header: &H) -> bool {
        let hash = header.signing_hash();
        match check_signature(public_key, &hash, header.block_signature()) {
            Ok(()) => true,
            Err(reason) => {
                self.observer.on_rejection(&hash, &reason);
                false
            }
        }
    }

    /// Like [`verify_signature`](Self::verify_signature) but reports the
    /// first failing check. The observer is not notified.
    pub fn check_signature<H: SignedHeader>(
        &self,
        public_key: &PublicKey,
        header: &H,
    ) -> std::result::Result<(), SignatureRejection> {
        check_signature(public_key, &header.signing_hash(), header.block_signature())
    }
}

fn check_signature(
    public_key: &PublicKey,
    hash: &Hash,
    attached: Option<&BlockSignature>,
) -> std::result::Result<(), SignatureRejection> {
    let attached = present(attached)?;
    let signature = decode(attached)?;
    canonical(&signature)?;

    public_key
        .verify_hash(hash, &signature)
        .map_err(|_| SignatureRejection::CryptographicMismatch)
}

fn present(
    signature: Option<&BlockSignature>,
) -> std::result::Result<&BlockSignature, SignatureRejection> {
    signature
        .filter(|sig| !sig.is_empty())
        .ok_or(SignatureRejection::MissingSignature)
}

fn decode(signature: &BlockSignature) -> std::result::Result<EcdsaSignature, SignatureRejection> {
    der::decode_strict(signature.as_bytes()).map_err(SignatureRejection::MalformedEncoding)
}

fn canonical(signature: &EcdsaSignature) -> std::result::Result<(), SignatureRejection> {
    if der::is_low_s(signature) {
        Ok(())
    } else {
        Err(SignatureRejection::NonCanonicalSignature)
    }
}
