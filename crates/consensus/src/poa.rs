//! Proof of Authority (PoA) rules around the header signature check.
//!
//! A fixed set of pre-approved authorities take turns producing blocks in
//! round-robin order. Which key must have signed a header is decided here;
//! whether the signature is good is delegated to [`HeaderSignatureValidator`].

use crate::error::{ConsensusError, Result};
use crate::signature::{HeaderSignatureValidator, RejectionObserver, TracingObserver};
use authseal_core::{Address, BlockHeader, Hash, Keypair, PublicKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Proof of Authority configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoAConfig {
    /// List of authority addresses that can produce blocks.
    pub authorities: Vec<Address>,
    /// Block time target in seconds (e.g., 5 seconds per block).
    pub block_time: u64,
    /// Maximum allowed clock drift in seconds (e.g., 30 seconds).
    #[serde(default = "default_clock_drift")]
    pub max_clock_drift: u64,
}

fn default_clock_drift() -> u64 {
    30
}

impl Default for PoAConfig {
    fn default() -> Self {
        Self {
            authorities: Vec::new(),
            block_time: 5,
            max_clock_drift: default_clock_drift(),
        }
    }
}

impl PoAConfig {
    /// Create a new PoA configuration with the given authorities.
    pub fn new(authorities: Vec<Address>, block_time: u64) -> Self {
        Self {
            authorities,
            block_time,
            max_clock_drift: default_clock_drift(),
        }
    }

    /// Check if an address is an authority.
    pub fn is_authority(&self, address: &Address) -> bool {
        self.authorities.contains(address)
    }

    /// Get the number of authorities.
    pub fn authority_count(&self) -> usize {
        self.authorities.len()
    }

    /// Calculate which authority should produce a block at a given height.
    /// Uses round-robin selection: height % authority_count.
    pub fn authority_at_height(&self, height: u64) -> Result<Address> {
        if self.authorities.is_empty() {
            return Err(ConsensusError::NoAuthorities);
        }
        let index = (height % self.authorities.len() as u64) as usize;
        Ok(self.authorities[index])
    }
}

/// Authority management for PoA consensus.
pub struct Authority<O = TracingObserver> {
    /// PoA configuration.
    config: PoAConfig,
    /// Map from address to public key for signature verification.
    public_keys: HashMap<Address, PublicKey>,
    validator: HeaderSignatureValidator<O>,
}

impl Authority {
    /// Create a new Authority with the given configuration.
    pub fn new(config: PoAConfig) -> Self {
        Self::with_validator(config, HeaderSignatureValidator::new())
    }
}

impl<O: RejectionObserver> Authority<O> {
    /// Create an Authority that checks signatures with `validator`.
    pub fn with_validator(config: PoAConfig, validator: HeaderSignatureValidator<O>) -> Self {
        Self {
            config,
            public_keys: HashMap::new(),
            validator,
        }
    }

    /// Register a public key for an authority address.
    pub fn register_public_key(&mut self, address: Address, public_key: PublicKey) {
        self.public_keys.insert(address, public_key);
    }

    /// Get the public key for an authority address.
    pub fn get_public_key(&self, address: &Address) -> Option<&PublicKey> {
        self.public_keys.get(address)
    }

    /// Get the configuration.
    pub fn config(&self) -> &PoAConfig {
        &self.config
    }

    /// Check if an address is an authority.
    pub fn is_authority(&self, address: &Address) -> bool {
        self.config.is_authority(address)
    }

    /// Verify that a header was produced by the correct authority.
    pub fn verify_header_authority(&self, header: &BlockHeader) -> Result<()> {
        let author = &header.author;

        if !self.is_authority(author) {
            return Err(ConsensusError::UnauthorizedAuthority(*author));
        }

        let expected = self.config.authority_at_height(header.height)?;
        if expected != *author {
            return Err(ConsensusError::NotTurn {
                expected,
                got: *author,
            });
        }

        Ok(())
    }

    /// Verify the header signature against the author's registered key.
    pub fn verify_header_signature(&self, header: &BlockHeader) -> Result<()> {
        let author = &header.author;
        let public_key = self
            .get_public_key(author)
            .ok_or(ConsensusError::UnauthorizedAuthority(*author))?;

        if !self.validator.verify_signature(public_key, header) {
            return Err(ConsensusError::InvalidSignature);
        }

        Ok(())
    }

    /// Verify the header timestamp is valid.
    pub fn verify_header_timestamp(
        &self,
        header: &BlockHeader,
        parent_timestamp: u64,
        now: u64,
    ) -> Result<()> {
        if header.timestamp <= parent_timestamp {
            return Err(ConsensusError::TimestampTooEarly);
        }

        if header.timestamp > now.saturating_add(self.config.max_clock_drift) {
            return Err(ConsensusError::TimestampTooFuture);
        }

        Ok(())
    }

    /// Verify all consensus rules for a header.
    pub fn verify_header(&self, header: &BlockHeader, parent_timestamp: u64) -> Result<()> {
        let now = BlockHeader::current_timestamp();

        self.verify_header_authority(header)?;
        self.verify_header_signature(header)?;
        self.verify_header_timestamp(header, parent_timestamp, now)?;

        debug!(hash = %header.hash(), height = header.height, "header accepted");
        Ok(())
    }
}

/// Header proposer for authorities.
pub struct BlockProposer {
    /// Authority keypair for signing headers.
    keypair: Keypair,
    /// Authority configuration.
    config: PoAConfig,
    validator: HeaderSignatureValidator,
}

impl BlockProposer {
    /// Create a new proposer with the given keypair and config.
    pub fn new(keypair: Keypair, config: PoAConfig) -> Self {
        Self {
            keypair,
            config,
            validator: HeaderSignatureValidator::new(),
        }
    }

    /// Get the proposer's address.
    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    /// Check if this proposer can produce a block at the given height.
    pub fn can_propose_at_height(&self, height: u64) -> Result<bool> {
        let expected = self.config.authority_at_height(height)?;
        Ok(expected == self.address())
    }

    /// Propose a new header (creates and signs it).
    pub fn propose_header(
        &self,
        height: u64,
        prev_hash: Hash,
        payload_root: Hash,
        state_root: Hash,
    ) -> Result<BlockHeader> {
        let expected = self.config.authority_at_height(height)?;
        if expected != self.address() {
            return Err(ConsensusError::NotTurn {
                expected,
                got: self.address(),
            });
        }

        let mut header =
            BlockHeader::new(height, prev_hash, payload_root, state_root, self.address());
        self.validator.sign(&self.keypair, &mut header)?;

        Ok(header)
    }
}
