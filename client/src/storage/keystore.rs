//! Key stores: where signers look up the key for `(network, account)`.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use parking_lot::{Mutex, RwLock};

use super::document::DocumentFile;
use crate::errors::ClientResult;
use crate::keys::KeyPair;

const ENTRY_PREFIX: &str = "keystore";

/// Storage of key pairs keyed by network and account.
pub trait KeyStore: Send + Sync + fmt::Debug {
    fn set_key(&self, network_id: &str, account_id: &str, key: KeyPair) -> ClientResult<()>;
    fn get_key(&self, network_id: &str, account_id: &str) -> ClientResult<Option<KeyPair>>;
    fn remove_key(&self, network_id: &str, account_id: &str) -> ClientResult<()>;
    fn clear(&self) -> ClientResult<()>;
    /// Accounts holding a key on `network_id`, sorted.
    fn accounts(&self, network_id: &str) -> ClientResult<Vec<String>>;
}

/// Process-local key store; contents vanish with the process.
#[derive(Default)]
pub struct InMemoryKeyStore {
    keys: RwLock<HashMap<(String, String), KeyPair>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for InMemoryKeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryKeyStore")
            .field("entries", &self.keys.read().len())
            .finish()
    }
}

impl KeyStore for InMemoryKeyStore {
    fn set_key(&self, network_id: &str, account_id: &str, key: KeyPair) -> ClientResult<()> {
        self.keys
            .write()
            .insert((network_id.to_string(), account_id.to_string()), key);
        Ok(())
    }

    fn get_key(&self, network_id: &str, account_id: &str) -> ClientResult<Option<KeyPair>> {
        Ok(self
            .keys
            .read()
            .get(&(network_id.to_string(), account_id.to_string()))
            .cloned())
    }

    fn remove_key(&self, network_id: &str, account_id: &str) -> ClientResult<()> {
        self.keys
            .write()
            .remove(&(network_id.to_string(), account_id.to_string()));
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        self.keys.write().clear();
        Ok(())
    }

    fn accounts(&self, network_id: &str) -> ClientResult<Vec<String>> {
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

/// Key store persisted to disk, surviving restarts like browser local storage.
pub struct FileKeyStore {
    document: DocumentFile,
    lock: Mutex<()>,
}

impl FileKeyStore {
    pub fn open(path: impl AsRef<Path>) -> ClientResult<Self> {
        let document = DocumentFile::new(path);
        // Surface tampering or version mismatches at open time.
        document.load()?;
        Ok(Self {
            document,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        self.document.path()
    }
}

impl fmt::Debug for FileKeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileKeyStore")
            .field("path", &self.document.path())
            .finish()
    }
}

fn entry_key(network_id: &str, account_id: &str) -> String {
    format!("{}:{}:{}", ENTRY_PREFIX, account_id, network_id)
}

fn parse_entry_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix(ENTRY_PREFIX)?.strip_prefix(':')?;
    let (account, network) = rest.rsplit_once(':')?;
    Some((account, network))
}

impl KeyStore for FileKeyStore {
    fn set_key(&self, network_id: &str, account_id: &str, key: KeyPair) -> ClientResult<()> {
        let _guard = self.lock.lock();
        let secret = key.to_secret_string();
        self.document.update(|entries| {
            entries.insert(entry_key(network_id, account_id), secret.to_string());
        })
    }

    fn get_key(&self, network_id: &str, account_id: &str) -> ClientResult<Option<KeyPair>> {
        let _guard = self.lock.lock();
        let entries = self.document.load()?;
        entries
            .get(&entry_key(network_id, account_id))
            .map(|secret| KeyPair::from_secret_str(secret))
            .transpose()
    }

    fn remove_key(&self, network_id: &str, account_id: &str) -> ClientResult<()> {
        let _guard = self.lock.lock();
        self.document.update(|entries| {
            entries.remove(&entry_key(network_id, account_id));
        })
    }

    fn clear(&self) -> ClientResult<()> {
        let _guard = self.lock.lock();
        self.document.update(|entries| {
            entries.retain(|key, _| parse_entry_key(key).is_none());
        })
    }

    fn accounts(&self, network_id: &str) -> ClientResult<Vec<String>> {
        let _guard = self.lock.lock();
        let entries = self.document.load()?;
        Ok(entries
            .keys()
            .filter_map(|key| parse_entry_key(key))
            .filter(|(_, network)| *network == network_id)
            .map(|(account, _)| account.to_string())
            .collect())
    }
}
