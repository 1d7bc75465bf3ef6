use std::path::Path;

use parking_lot::{Mutex, RwLock};

use super::document::{DocumentFile, Entries};
use crate::errors::ClientResult;

#[derive(Debug)]
enum Backend {
    Memory(RwLock<Entries>),
    File { document: DocumentFile, lock: Mutex<()> },
}

/// Small string key-value storage for wallet auth data.
#[derive(Debug)]
pub struct LocalStorage {
    backend: Backend,
}

impl LocalStorage {
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(RwLock::new(Entries::new())),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> ClientResult<Self> {
        let document = DocumentFile::new(path);
        document.load()?;
        Ok(Self {
            backend: Backend::File {
                document,
                lock: Mutex::new(()),
            },
        })
    }

    pub fn get_item(&self, key: &str) -> ClientResult<Option<String>> {
        match &self.backend {
            Backend::Memory(entries) => Ok(entries.read().get(key).cloned()),
            Backend::File { document, lock } => {
                let _guard = lock.lock();
                Ok(document.load()?.get(key).cloned())
            }
        }
    }

    pub fn set_item(&self, key: &str, value: &str) -> ClientResult<()> {
        match &self.backend {
            Backend::Memory(entries) => {
                entries.write().insert(key.to_string(), value.to_string());
                Ok(())
            }
            Backend::File { document, lock } => {
                let _guard = lock.lock();
                document.update(|entries| {
                    entries.insert(key.to_string(), value.to_string());
                })
            }
        }
    }

    pub fn remove_item(&self, key: &str) -> ClientResult<()> {
        match &self.backend {
            Backend::Memory(entries) => {
                entries.write().remove(key);
                Ok(())
            }
            Backend::File { document, lock } => {
                let _guard = lock.lock();
                document.update(|entries| {
                    entries.remove(key);
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_items() {
        let storage = LocalStorage::in_memory();
        assert_eq!(storage.get_item("k").unwrap(), None);
        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn file_items_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("local.json");
        LocalStorage::open(&path)
            .unwrap()
            .set_item("Aerx_wallet_auth_key", "{}")
            .unwrap();
        let reopened = LocalStorage::open(&path).unwrap();
        assert_eq!(
            reopened.get_item("Aerx_wallet_auth_key").unwrap().as_deref(),
            Some("{}")
        );
    }
}
