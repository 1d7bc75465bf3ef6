use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use blake3::Hasher as Blake3;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{ClientError, ClientResult};

const DOCUMENT_VERSION: u16 = 1;

pub(crate) type Entries = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentEnvelope {
    version: u16,
    checksum: [u8; 32],
    entries: Entries,
    modified_at_unix: i64,
}

/// String map persisted as JSON with integrity checks and atomic replacement.
#[derive(Debug, Clone)]
pub(crate) struct DocumentFile {
    path: PathBuf,
}

impl DocumentFile {
    pub(crate) fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load entries; a missing file reads as empty.
    pub(crate) fn load(&self) -> ClientResult<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let bytes = fs::read(&self.path)?;
        let envelope: DocumentEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version != DOCUMENT_VERSION {
            return Err(ClientError::StorageError(format!(
                "Unsupported document version {} in {}",
                envelope.version,
                self.path.display()
            )));
        }

        if checksum(&envelope.entries)? != envelope.checksum {
            return Err(ClientError::StorageError(format!(
                "Integrity verification failed for {}",
                self.path.display()
            )));
        }

        Ok(envelope.entries)
    }

    pub(crate) fn save(&self, entries: &Entries) -> ClientResult<()> {
        let envelope = DocumentEnvelope {
            version: DOCUMENT_VERSION,
            checksum: checksum(entries)?,
            entries: entries.clone(),
            modified_at_unix: Utc::now().timestamp(),
        };

        let serialized = serde_json::to_vec_pretty(&envelope)?;
        let tmp_path = self.path.with_extension("new");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        {
            let mut file = File::create(&tmp_path)?;
            restrict_permissions(&file)?;
            file.write_all(&serialized)?;
            file.sync_all()?;
        }
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }

    /// Load, apply `updater`, then save.
    pub(crate) fn update<F, T>(&self, updater: F) -> ClientResult<T>
    where
        F: FnOnce(&mut Entries) -> T,
    {
        let mut entries = self.load()?;
        let result = updater(&mut entries);
        self.save(&entries)?;
        Ok(result)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

fn checksum(entries: &Entries) -> ClientResult<[u8; 32]> {
    let mut hasher = Blake3::new();
    let encoded = serde_json::to_vec(entries)?;
    hasher.update(&encoded);
    let mut output = [0u8; 32];
    output.copy_from_slice(hasher.finalize().as_bytes());
    Ok(output)
}

#[cfg(unix)]
fn restrict_permissions(file: &File) -> ClientResult<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File) -> ClientResult<()> {
    Ok(())
}
