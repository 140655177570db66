//! Block header structure and its signing hash.

use crate::crypto::{Address, BlockSignature};
use crate::hash::{header_hash, Hash};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// The header of a block, including the authority's attached signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block height (0 for genesis).
    pub height: u64,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Hash of the previous block.
    pub prev_hash: Hash,
    /// Commitment to the block body, computed by the block builder.
    pub payload_root: Hash,
    /// Root hash of the world state after applying this block.
    pub state_root: Hash,
    /// Address of the block author (PoA authority).
    pub author: Address,
    /// DER signature over [`BlockHeader::hash`]. Not part of the hash.
    #[serde(default)]
    pub signature: Option<BlockSignature>,
}

/// The hashed part of a header: every field except the signature.
#[derive(Serialize)]
struct UnsignedHeader<'a> {
    height: u64,
    timestamp: u64,
    prev_hash: &'a Hash,
    payload_root: &'a Hash,
    state_root: &'a Hash,
    author: &'a Address,
}

impl BlockHeader {
    /// Create a new unsigned header stamped with the current time.
    pub fn new(
        height: u64,
        prev_hash: Hash,
        payload_root: Hash,
        state_root: Hash,
        author: Address,
    ) -> Self {
        Self {
            height,
            timestamp: Self::current_timestamp(),
            prev_hash,
            payload_root,
            state_root,
            author,
            signature: None,
        }
    }

    /// Create the genesis header.
    pub fn genesis(authority: Address) -> Self {
        Self::new(0, Hash::ZERO, Hash::ZERO, Hash::ZERO, authority)
    }

    /// Calculate the signing hash of this header.
    ///
    /// The attached signature is excluded, so signing does not change the hash.
    pub fn hash(&self) -> Hash {
        let unsigned = UnsignedHeader {
            height: self.height,
            timestamp: self.timestamp,
            prev_hash: &self.prev_hash,
            payload_root: &self.payload_root,
            state_root: &self.state_root,
            author: &self.author,
        };
        let encoded = bincode::serialize(&unsigned).expect("serialization should not fail");
        header_hash(&encoded)
    }

    /// Whether a non-empty signature is attached.
    pub fn is_signed(&self) -> bool {
        self.signature.as_ref().is_some_and(|sig| !sig.is_empty())
    }

    /// Check if this is the genesis header.
    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.prev_hash == Hash::ZERO
    }

    /// Get the current Unix timestamp.
    pub fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> BlockHeader {
        BlockHeader {
            height: 7,
            timestamp: 1_700_000_000,
            prev_hash: Hash([1u8; 32]),
            payload_root: Hash([2u8; 32]),
            state_root: Hash([3u8; 32]),
            author: Address::from_bytes([4u8; 20]),
            signature: None,
        }
    }

    #[test]
    fn test_genesis_header() {
        let authority = Address::from_bytes([1u8; 20]);
        let genesis = BlockHeader::genesis(authority);

        assert!(genesis.is_genesis());
        assert_eq!(genesis.author, authority);
        assert!(!genesis.is_signed());
    }

    #[test]
    fn test_hash_deterministic() {
        let h = header();
        assert_eq!(h.hash(), h.clone().hash());
    }

    #[test]
    fn test_hash_ignores_signature() {
        let unsigned = header();
        let mut signed = header();
        signed.signature = Some(BlockSignature::from_bytes(vec![0x30, 0x00]));
        assert_eq!(unsigned.hash(), signed.hash());
    }

    #[test]
    fn test_every_field_changes_hash() {
        let base = header().hash();
        let mutations: [fn(&mut BlockHeader); 6] = [
            |h: &mut BlockHeader| h.height += 1,
            |h: &mut BlockHeader| h.timestamp += 1,
            |h: &mut BlockHeader| h.prev_hash.0[31] ^= 1,
            |h: &mut BlockHeader| h.payload_root.0[0] ^= 1,
            |h: &mut BlockHeader| h.state_root.0[15] ^= 0x80,
            |h: &mut BlockHeader| h.author.0[19] ^= 1,
        ];
        for mutate in mutations {
            let mut h = header();
            mutate(&mut h);
            assert_ne!(h.hash(), base);
        }
    }

    #[test]
    fn test_empty_signature_is_not_signed() {
        let mut h = header();
        h.signature = Some(BlockSignature::default());
        assert!(!h.is_signed());
        h.signature = Some(BlockSignature::from_bytes(vec![1]));
        assert!(h.is_signed());
    }

    #[test]
    fn test_json_roundtrip_keeps_signature_bytes() {
        let mut h = header();
        h.signature = Some(BlockSignature::from_bytes(vec![0x30, 0x44, 0x02]));
        let json = serde_json::to_string(&h).unwrap();
        let back: BlockHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_missing_signature_field_deserializes_as_none() {
        let mut value = serde_json::to_value(header()).unwrap();
        value.as_object_mut().unwrap().remove("signature");
        let back: BlockHeader = serde_json::from_value(value).unwrap();
        assert_eq!(back.signature, None);
    }
}
