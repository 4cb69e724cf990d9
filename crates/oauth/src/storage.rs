use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use {
    anyhow::{Context, Result},
    tempfile::NamedTempFile,
    tracing::debug,
};

use crate::{config_dir::tokenrelay_config_dir, types::CredentialRecord};

/// Serializes read-modify-write cycles on store files within this process.
static STORE_LOCK: Mutex<()> = Mutex::new(());

/// File-based credential storage, `~/.config/tokenrelay/credentials.json` by default.
///
/// The file is a JSON object mapping credential name to [`CredentialRecord`].
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at the configured `[store] path`, or the default location.
    pub fn new() -> Self {
        let config = tokenrelay_config::discover_and_load();
        let path = config
            .store
            .path
            .unwrap_or_else(|| tokenrelay_config_dir().join("credentials.json"));
        Self { path }
    }

    /// Create a store at a specific path (useful for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, name: &str) -> Result<Option<CredentialRecord>> {
        let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(name))
    }

    pub fn save(&self, name: &str, record: &CredentialRecord) -> Result<()> {
        let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_all()?;
        map.insert(name.to_string(), record.clone());
        self.write_all(&map)?;
        debug!(credential = name, path = %self.path.display(), "saved credential");
        Ok(())
    }

    /// Remove a credential. Returns `false` if it was not stored.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_all()?;
        if map.remove(name).is_none() {
            return Ok(false);
        }
        self.write_all(&map)?;
        Ok(true)
    }

    /// Credential names in sorted order.
    pub fn list(&self) -> Result<Vec<String>> {
        let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.into_keys().collect())
    }

    /// A missing file is an empty store; an unreadable one is an error so it is
    /// never silently overwritten.
    fn read_all(&self) -> Result<BTreeMap<String, CredentialRecord>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()));
            },
        };
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    /// Write to a sibling temp file and rename it over the store, so readers in
    /// other processes see either the old or the new map.
    fn write_all(&self, map: &BTreeMap<String, CredentialRecord>) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut file = NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
        serde_json::to_writer_pretty(&mut file, map)?;
        file.flush()?;

        // Set file permissions to 0600 on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600))?;
        }

        file.persist(&self.path)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
