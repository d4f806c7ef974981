//! Server configuration, loaded from a TOML context file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Server configuration.
///
/// ```toml
/// [storage]
/// data_dir = "/var/lib/subhub"
/// # sqlite_path = "/var/lib/subhub/crm.sqlite"   # optional override
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the database and any future on-disk state.
    pub data_dir: String,

    /// Explicit database path; defaults to `{data_dir}/crm.sqlite`.
    #[serde(default)]
    pub sqlite_path: Option<String>,
}

impl ServerConfig {
    /// Resolve a context name to `/etc/subhub/<name>.toml`. Anything
    /// containing a `/` or `.` is used as a literal path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/subhub/{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Refuse to start on a config that cannot hold data.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            anyhow::bail!("Storage data_dir is empty in configuration.");
        }
        Ok(())
    }

    /// Resolve the database path, falling back to `{data_dir}/crm.sqlite`.
    pub fn resolve_sqlite_path(&self) -> PathBuf {
        match &self.storage.sqlite_path {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from(&self.storage.data_dir).join("crm.sqlite"),
        }
    }
}
