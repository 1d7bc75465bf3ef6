use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{ClientError, ClientResult};

/// Manages filesystem paths used by the persisted session state.
#[derive(Debug, Clone)]
pub struct ClientPaths {
    /// Root directory for client data.
    root_dir: PathBuf,
    /// Key store holding wallet-delegated access keys.
    keystore_file: PathBuf,
    /// Key-value document standing in for browser local storage.
    local_storage_file: PathBuf,
}

impl ClientPaths {
    /// Default key store file name used on disk.
    pub const DEFAULT_KEYSTORE_FILENAME: &'static str = "keystore.json";
    /// Default local storage file name used on disk.
    pub const DEFAULT_LOCAL_STORAGE_FILENAME: &'static str = "local_storage.json";

    /// Create a new path manager rooted at the provided directory.
    pub fn new(root: impl AsRef<Path>) -> ClientResult<Self> {
        let root_dir = root.as_ref().to_path_buf();
        if root_dir.as_os_str().is_empty() {
            return Err(ClientError::StorageError(
                "Client data directory cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            keystore_file: root_dir.join(Self::DEFAULT_KEYSTORE_FILENAME),
            local_storage_file: root_dir.join(Self::DEFAULT_LOCAL_STORAGE_FILENAME),
            root_dir,
        })
    }

    /// Ensure the directory structure exists, creating missing folders.
    pub fn ensure_directories(&self) -> ClientResult<()> {
        fs::create_dir_all(&self.root_dir)?;
        Ok(())
    }

    pub fn keystore_file(&self) -> &Path {
        &self.keystore_file
    }

    pub fn local_storage_file(&self) -> &Path {
        &self.local_storage_file
    }

    /// Root directory for all client-managed data.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }
}
