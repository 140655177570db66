//! Data directory layout shared by the commands.
//!
//! ```text
//! <data_dir>/config.json      authorities, block time, clock drift
//! <data_dir>/keys/<name>.json keypair files
//! ```

use anyhow::{bail, Context, Result};
use authseal_consensus::{Authority, PoAConfig};
use authseal_core::{BlockHeader, Keypair, PublicKey};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Authority set as stored in `config.json`.
///
/// `public_keys[i]` is the registered key of `consensus.authorities[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(flatten)]
    pub consensus: PoAConfig,
    pub public_keys: Vec<PublicKey>,
}

impl ChainConfig {
    /// Configuration whose authorities are the owners of `public_keys`, in order.
    pub fn new(public_keys: Vec<PublicKey>, block_time: u64) -> Self {
        let authorities = public_keys.iter().map(PublicKey::to_address).collect();
        Self {
            consensus: PoAConfig::new(authorities, block_time),
            public_keys,
        }
    }

    /// Check that every authority has exactly one key and that it owns it.
    pub fn validate(&self) -> Result<()> {
        let authorities = &self.consensus.authorities;
        if authorities.len() != self.public_keys.len() {
            bail!(
                "Config lists {} authorities but {} public keys",
                authorities.len(),
                self.public_keys.len()
            );
        }
        for (address, public_key) in authorities.iter().zip(&self.public_keys) {
            if public_key.to_address() != *address {
                bail!("Public key does not belong to authority {}", address);
            }
        }
        Ok(())
    }

    /// Build the authority checker for this configuration.
    pub fn authority(&self) -> Authority {
        let mut authority = Authority::new(self.consensus.clone());
        for (address, public_key) in self.consensus.authorities.iter().zip(&self.public_keys) {
            authority.register_public_key(*address, public_key.clone());
        }
        authority
    }
}

pub fn keys_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("keys")
}

pub fn save_keypair(data_dir: &Path, name: &str, keypair: &Keypair) -> Result<PathBuf> {
    let keys_dir = keys_dir(data_dir);
    fs::create_dir_all(&keys_dir)
        .with_context(|| format!("Failed to create keys directory: {:?}", keys_dir))?;

    let key_file = keys_dir.join(format!("{}.json", name));
    let key_json = serde_json::json!({
        "address": keypair.address().to_hex(),
        "public_key": hex::encode(keypair.public_key.to_bytes()),
        "private_key": hex::encode(keypair.private_key()),
    });

    fs::write(&key_file, serde_json::to_string_pretty(&key_json)?)?;
    Ok(key_file)
}

pub fn load_keypair(data_dir: &Path, name: &str) -> Result<Keypair> {
    let key_file = keys_dir(data_dir).join(format!("{}.json", name));
    if !key_file.exists() {
        bail!(
            "Keypair file not found: {}. Use 'authseal key new' to create one.",
            key_file.display()
        );
    }

    let contents = fs::read_to_string(&key_file)?;
    let json: serde_json::Value = serde_json::from_str(&contents)?;

    let private_key_hex = json
        .get("private_key")
        .and_then(|v| v.as_str())
        .context("Missing private_key in keypair file")?;

    let mut private_key = [0u8; 32];
    hex::decode_to_slice(private_key_hex, &mut private_key)
        .context("Invalid private key: expected 32 hex-encoded bytes")?;

    Keypair::from_private_key(&private_key).context("Failed to create keypair from private key")
}

pub fn save_config(data_dir: &Path, config: &ChainConfig) -> Result<PathBuf> {
    let config_file = data_dir.join("config.json");
    fs::write(&config_file, serde_json::to_string_pretty(config)?)
        .with_context(|| format!("Failed to write config: {}", config_file.display()))?;
    Ok(config_file)
}

pub fn load_config(data_dir: &Path) -> Result<ChainConfig> {
    let config_file = data_dir.join("config.json");
    let contents = fs::read_to_string(&config_file)
        .context("Failed to read config.json. Did you run 'authseal init'?")?;

    let config: ChainConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid config file: {}", config_file.display()))?;
    config.validate()?;

    debug!(
        authorities = config.consensus.authority_count(),
        block_time = config.consensus.block_time,
        max_clock_drift = config.consensus.max_clock_drift,
        "loaded chain config"
    );
    Ok(config)
}

pub fn read_header(path: &Path) -> Result<BlockHeader> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read header file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid header file: {}", path.display()))
}

pub fn write_header(path: &Path, header: &BlockHeader) -> Result<()> {
    debug!(hash = %header.hash(), file = %path.display(), "writing header");
    fs::write(path, serde_json::to_string_pretty(header)?)
        .with_context(|| format!("Failed to write header file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use authseal_core::{Address, BlockSignature};

    #[test]
    fn test_keypair_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let keypair = Keypair::generate();

        let path = save_keypair(dir.path(), "alice", &keypair).unwrap();
        assert!(path.ends_with("keys/alice.json"));

        let loaded = load_keypair(dir.path(), "alice").unwrap();
        assert_eq!(loaded.address(), keypair.address());
    }

    #[test]
    fn test_missing_keypair_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_keypair(dir.path(), "nobody").is_err());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let keypairs = [Keypair::generate(), Keypair::generate()];
        let config = ChainConfig::new(
            keypairs.iter().map(|kp| kp.public_key.clone()).collect(),
            7,
        );

        save_config(dir.path(), &config).unwrap();
        let loaded = load_config(dir.path()).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(
            loaded.consensus.authorities,
            vec![keypairs[0].address(), keypairs[1].address()]
        );
        assert!(loaded.authority().get_public_key(&keypairs[1].address()).is_some());
    }

    #[test]
    fn test_config_rejects_mismatched_public_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ChainConfig::new(vec![Keypair::generate().public_key], 5);
        config.consensus.authorities[0] = Address::from_bytes([1u8; 20]);

        save_config(dir.path(), &config).unwrap();
        assert!(load_config(dir.path()).is_err());
    }

    #[test]
    fn test_config_rejects_missing_public_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ChainConfig::new(vec![Keypair::generate().public_key], 5);
        config.public_keys.clear();

        save_config(dir.path(), &config).unwrap();
        assert!(load_config(dir.path()).is_err());
    }

    fn write_config_json(dir: &Path, block_time: serde_json::Value) {
        let keypair = Keypair::generate();
        let json = serde_json::json!({
            "authorities": [keypair.address()],
            "block_time": block_time,
            "public_keys": [keypair.public_key],
        });
        fs::write(dir.join("config.json"), json.to_string()).unwrap();
    }

    #[test]
    fn test_config_rejects_malformed_block_time() {
        let dir = tempfile::tempdir().unwrap();

        write_config_json(dir.path(), serde_json::json!("abc"));
        assert!(load_config(dir.path()).is_err());

        write_config_json(dir.path(), serde_json::json!(-5));
        assert!(load_config(dir.path()).is_err());
    }

    #[test]
    fn test_config_defaults_clock_drift() {
        let dir = tempfile::tempdir().unwrap();
        write_config_json(dir.path(), serde_json::json!(9));

        let loaded = load_config(dir.path()).unwrap();
        assert_eq!(loaded.consensus.block_time, 9);
        assert_eq!(loaded.consensus.max_clock_drift, 30);
    }

    #[test]
    fn test_header_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("header.json");
        let mut header = BlockHeader::genesis(Address::from_bytes([5u8; 20]));
        header.signature = Some(BlockSignature::from_bytes(vec![0x30, 0x06]));

        write_header(&path, &header).unwrap();
        assert_eq!(read_header(&path).unwrap(), header);
    }
}
