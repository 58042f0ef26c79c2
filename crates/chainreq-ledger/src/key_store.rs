//! Signing keys and where they are kept
//!
//! Keys are text of the form `ed25519:<base58>`. The secret form holds either
//! the 32-byte seed or the 64-byte seed-plus-public-key encoding; the public
//! form holds the 32-byte verifying key.

use crate::error::LedgerError;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use parking_lot::RwLock;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const ED25519_PREFIX: &str = "ed25519:";

/// ed25519 key pair
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Fresh random key pair
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Key pair from a 32-byte seed
    #[must_use]
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Verifying key
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Raw public key bytes
    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key().to_bytes()
    }

    /// `ed25519:<base58>` public key
    #[must_use]
    pub fn public_key_string(&self) -> String {
        format!("{ED25519_PREFIX}{}", bs58::encode(self.public_key_bytes()).into_string())
    }

    /// `ed25519:<base58>` secret key in the 64-byte form
    #[must_use]
    pub fn secret_key_string(&self) -> String {
        format!(
            "{ED25519_PREFIX}{}",
            bs58::encode(self.signing_key.to_keypair_bytes()).into_string()
        )
    }

    /// Sign a message
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_string())
            .finish_non_exhaustive()
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for KeyPair {}

impl FromStr for KeyPair {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s
            .trim()
            .strip_prefix(ED25519_PREFIX)
            .ok_or_else(|| LedgerError::InvalidKey(format!("expected {ED25519_PREFIX} prefix")))?;
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| LedgerError::InvalidKey(e.to_string()))?;
        match bytes.len() {
            32 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(&bytes);
                Ok(Self::from_seed(&seed))
            }
            64 => {
                let mut pair = [0u8; 64];
                pair.copy_from_slice(&bytes);
                SigningKey::from_keypair_bytes(&pair)
                    .map(|signing_key| Self { signing_key })
                    .map_err(|e| LedgerError::InvalidKey(e.to_string()))
            }
            n => Err(LedgerError::InvalidKey(format!("unexpected key length {n}"))),
        }
    }
}

/// Decode an `ed25519:<base58>` public key
///
/// # Errors
/// `LedgerError::InvalidKey` on a bad prefix, bad base58 or wrong length
pub fn parse_public_key(text: &str) -> Result<[u8; 32], LedgerError> {
    let encoded = text
        .trim()
        .strip_prefix(ED25519_PREFIX)
        .ok_or_else(|| LedgerError::InvalidKey(format!("expected {ED25519_PREFIX} prefix")))?;
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| LedgerError::InvalidKey(e.to_string()))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| LedgerError::InvalidKey(format!("unexpected key length {}", bytes.len())))
}

/// Where signing keys are kept, per network and account
pub trait KeyStore: Send + Sync {
    /// Key of an account, if stored
    ///
    /// # Errors
    /// Storage or key decoding failure
    fn get_key(&self, network_id: &str, account_id: &str) -> Result<Option<KeyPair>, LedgerError>;

    /// Store or replace a key
    ///
    /// # Errors
    /// Storage failure
    fn set_key(&self, network_id: &str, account_id: &str, key: KeyPair) -> Result<(), LedgerError>;

    /// Remove a key; removing a missing key is not an error
    ///
    /// # Errors
    /// Storage failure
    fn remove_key(&self, network_id: &str, account_id: &str) -> Result<(), LedgerError>;

    /// Accounts with a stored key on a network, sorted
    ///
    /// # Errors
    /// Storage failure
    fn accounts(&self, network_id: &str) -> Result<Vec<String>, LedgerError>;
}

/// Process-local key store
#[derive(Debug, Default)]
pub struct InMemoryKeyStore {
    keys: RwLock<HashMap<(String, String), KeyPair>>,
}

impl InMemoryKeyStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for InMemoryKeyStore {
    fn get_key(&self, network_id: &str, account_id: &str) -> Result<Option<KeyPair>, LedgerError> {
        Ok(self
            .keys
            .read()
            .get(&(network_id.to_string(), account_id.to_string()))
            .cloned())
    }

    fn set_key(&self, network_id: &str, account_id: &str, key: KeyPair) -> Result<(), LedgerError> {
        self.keys
            .write()
            .insert((network_id.to_string(), account_id.to_string()), key);
        Ok(())
    }

    fn remove_key(&self, network_id: &str, account_id: &str) -> Result<(), LedgerError> {
        self.keys
            .write()
            .remove(&(network_id.to_string(), account_id.to_string()));
        Ok(())
    }

    fn accounts(&self, network_id: &str) -> Result<Vec<String>, LedgerError> {
        let mut accounts: Vec<String> = self
            .keys
            .read()
            .keys()
            .filter(|(network, _)| network == network_id)
            .map(|(_, account)| account.clone())
            .collect();
        accounts.sort();
        Ok(accounts)
    }
}

/// On-disk credential file
#[derive(Debug, Serialize, Deserialize)]
struct CredentialFile {
    account_id: String,
    public_key: String,
    #[serde(alias = "secret_key")]
    private_key: String,
}

/// Credentials directory laid out as `<dir>/<network>/<account>.json`
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    root: PathBuf,
}

impl FileKeyStore {
    /// Store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, network_id: &str, account_id: &str) -> PathBuf {
        self.root.join(network_id).join(format!("{account_id}.json"))
    }
}

impl KeyStore for FileKeyStore {
    fn get_key(&self, network_id: &str, account_id: &str) -> Result<Option<KeyPair>, LedgerError> {
        let path = self.key_path(network_id, account_id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file: CredentialFile = serde_json::from_str(&text)?;
        file.private_key.parse().map(Some)
    }

    fn set_key(&self, network_id: &str, account_id: &str, key: KeyPair) -> Result<(), LedgerError> {
        let path = self.key_path(network_id, account_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = CredentialFile {
            account_id: account_id.to_string(),
            public_key: key.public_key_string(),
            private_key: key.secret_key_string(),
        };
        fs::write(&path, serde_json::to_vec_pretty(&file)?)?;
        tracing::debug!(network_id, account_id, "Stored signing key");
        Ok(())
    }

    fn remove_key(&self, network_id: &str, account_id: &str) -> Result<(), LedgerError> {
        match fs::remove_file(self.key_path(network_id, account_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn accounts(&self, network_id: &str) -> Result<Vec<String>, LedgerError> {
        let dir = self.root.join(network_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut accounts = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    accounts.push(stem.to_string());
                }
            }
        }
        accounts.sort();
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;

    #[test]
    fn key_text_round_trip() {
        let key = KeyPair::generate();
        let parsed: KeyPair = key.secret_key_string().parse().unwrap();
        assert_eq!(parsed, key);
        assert_eq!(
            parse_public_key(&key.public_key_string()).unwrap(),
            key.public_key_bytes()
        );
    }

    #[test]
    fn seed_form_is_accepted() {
        let seed = [7u8; 32];
        let text = format!("ed25519:{}", bs58::encode(seed).into_string());
        let key: KeyPair = text.parse().unwrap();
        assert_eq!(key, KeyPair::from_seed(&seed));
    }

    #[test]
    fn rejects_bad_keys() {
        assert!("secp256k1:abc".parse::<KeyPair>().is_err());
        assert!("ed25519:0OIl".parse::<KeyPair>().is_err());
        assert!("ed25519:abc".parse::<KeyPair>().is_err());
    }

    #[test]
    fn signatures_verify() {
        let key = KeyPair::generate();
        let sig = key.sign(b"payload");
        assert!(key.verifying_key().verify(b"payload", &sig).is_ok());
    }

    #[test]
    fn debug_hides_secret() {
        let key = KeyPair::generate();
        let debug = format!("{key:?}");
        assert!(!debug.contains(&key.secret_key_string()));
    }

    #[test]
    fn in_memory_store() {
        let store = InMemoryKeyStore::new();
        let key = KeyPair::generate();
        store.set_key("testnet", "b.testnet", key.clone()).unwrap();
        store.set_key("testnet", "a.testnet", KeyPair::generate()).unwrap();
        store.set_key("mainnet", "c.near", KeyPair::generate()).unwrap();

        assert_eq!(store.get_key("testnet", "b.testnet").unwrap(), Some(key));
        assert_eq!(store.accounts("testnet").unwrap(), vec!["a.testnet", "b.testnet"]);

        store.remove_key("testnet", "b.testnet").unwrap();
        store.remove_key("testnet", "b.testnet").unwrap();
        assert_eq!(store.get_key("testnet", "b.testnet").unwrap(), None);
    }

    #[test]
    fn file_store_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        let key = KeyPair::generate();

        assert_eq!(store.get_key("testnet", "alice.testnet").unwrap(), None);
        assert!(store.accounts("testnet").unwrap().is_empty());

        store.set_key("testnet", "alice.testnet", key.clone()).unwrap();
        assert!(dir.path().join("testnet").join("alice.testnet.json").exists());
        assert_eq!(store.get_key("testnet", "alice.testnet").unwrap(), Some(key));
        assert_eq!(store.accounts("testnet").unwrap(), vec!["alice.testnet"]);

        store.remove_key("testnet", "alice.testnet").unwrap();
        assert_eq!(store.get_key("testnet", "alice.testnet").unwrap(), None);
    }

    #[test]
    fn file_store_reads_secret_key_alias() {
        let dir = tempfile::tempdir().unwrap();
        let key = KeyPair::generate();
        fs::create_dir_all(dir.path().join("testnet")).unwrap();
        fs::write(
            dir.path().join("testnet").join("bob.testnet.json"),
            format!(
                r#"{{"account_id":"bob.testnet","public_key":"{}","secret_key":"{}"}}"#,
                key.public_key_string(),
                key.secret_key_string()
            ),
        )
        .unwrap();
        let store = FileKeyStore::new(dir.path());
        assert_eq!(store.get_key("testnet", "bob.testnet").unwrap(), Some(key));
    }
}
