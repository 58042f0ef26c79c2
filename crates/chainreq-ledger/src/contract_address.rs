//! Persisted target contract address

use crate::error::LedgerError;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Key under which the current contract address is stored
pub const CONTRACT_ADDRESS_KEY: &str = "contract_address";

/// Plain string key-value storage
pub trait KeyValueStore: Send + Sync {
    /// Value of `key`
    ///
    /// # Errors
    /// Storage failure
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError>;

    /// Store `value` under `key`
    ///
    /// # Errors
    /// Storage failure
    fn set(&self, key: &str, value: &str) -> Result<(), LedgerError>;

    /// Remove `key`; removing a missing key is not an error
    ///
    /// # Errors
    /// Storage failure
    fn remove(&self, key: &str) -> Result<(), LedgerError>;
}

/// Process-local storage
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LedgerError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Storage in one JSON object file, rewritten on every change
#[derive(Debug)]
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileKeyValueStore {
    /// Store backed by `path`; the file is created on first write
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, LedgerError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Current target contract address
#[derive(Clone)]
pub struct ContractAddressStore {
    store: Arc<dyn KeyValueStore>,
}

impl ContractAddressStore {
    /// Address store over key-value storage
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Address store kept in memory
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    /// Record the current address
    ///
    /// # Errors
    /// Storage failure
    pub fn set_current_contract_address(&self, address: &str) -> Result<(), LedgerError> {
        tracing::debug!(address, "Setting current contract address");
        self.store.set(CONTRACT_ADDRESS_KEY, address)
    }

    /// Forget the current address
    ///
    /// # Errors
    /// Storage failure
    pub fn clear_current_contract_address(&self) -> Result<(), LedgerError> {
        self.store.remove(CONTRACT_ADDRESS_KEY)
    }

    /// Current address, empty when unset
    ///
    /// # Errors
    /// Storage failure
    pub fn current_contract_address(&self) -> Result<String, LedgerError> {
        Ok(self.store.get(CONTRACT_ADDRESS_KEY)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_read_clear() {
        let store = ContractAddressStore::in_memory();
        assert_eq!(store.current_contract_address().unwrap(), "");

        store.set_current_contract_address("c.testnet").unwrap();
        assert_eq!(store.current_contract_address().unwrap(), "c.testnet");

        store.clear_current_contract_address().unwrap();
        store.clear_current_contract_address().unwrap();
        assert_eq!(store.current_contract_address().unwrap(), "");
    }

    #[test]
    fn json_file_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("local.json");

        let first = ContractAddressStore::new(Arc::new(JsonFileKeyValueStore::new(&path)));
        first.set_current_contract_address("dev-1.testnet").unwrap();

        let second = ContractAddressStore::new(Arc::new(JsonFileKeyValueStore::new(&path)));
        assert_eq!(second.current_contract_address().unwrap(), "dev-1.testnet");

        second.clear_current_contract_address().unwrap();
        assert_eq!(first.current_contract_address().unwrap(), "");
    }

    #[test]
    fn json_file_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let kv = JsonFileKeyValueStore::new(dir.path().join("kv.json"));
        kv.set("theme", "dark").unwrap();
        kv.set(CONTRACT_ADDRESS_KEY, "x").unwrap();
        kv.remove(CONTRACT_ADDRESS_KEY).unwrap();
        assert_eq!(kv.get("theme").unwrap().as_deref(), Some("dark"));
    }
}
