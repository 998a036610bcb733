//! core::config
//!
//! Local config document loading and persistence.
//!
//! # Locations
//!
//! Searched in order:
//! 1. An explicit path (the `--config` flag)
//! 2. `$THREEPORT_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/threeport/config.toml` if it exists
//! 4. `~/.threeport/config.toml` (canonical location)
//!
//! # Persistence
//!
//! Every mutation rewrites the whole document atomically (write to a temp
//! file in the same directory, fsync, rename). Concurrent invocations are
//! not coordinated; the last writer wins.
//!
//! # Example
//!
//! ```no_run
//! use tptctl::core::config::ConfigStore;
//!
//! let path = ConfigStore::discover_path(None).unwrap();
//! let mut store = ConfigStore::load(&path).unwrap();
//! if store.document().entry("prod").is_some() {
//!     store.set_current("prod").unwrap();
//! }
//! ```

pub mod schema;

pub use schema::{ControlPlaneConfigEntry, Credential, ThreeportConfigDocument};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the config location.
pub const CONFIG_ENV_VAR: &str = "THREEPORT_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file '{path}' not found")]
    NotFound { path: PathBuf },

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

impl ConfigError {
    /// Whether the file is simply absent (as opposed to unreadable or broken).
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. })
    }
}

/// A loaded config document bound to the file it came from.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    document: ThreeportConfigDocument,
}

impl ConfigStore {
    /// Resolve the config file location.
    ///
    /// `explicit` (the `--config` flag) wins over every other source.
    pub fn discover_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("threeport/config.toml");
            if path.exists() {
                return Ok(path);
            }
        }

        Self::canonical_path()
    }

    /// The canonical write location, `~/.threeport/config.toml`.
    pub fn canonical_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".threeport/config.toml"))
    }

    /// Read, parse and validate the document at `path`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the file does not exist, `ParseError` if it cannot be
    /// parsed or fails validation, `ReadError` for other I/O failures.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => {
                return Err(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let document: ThreeportConfigDocument =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        document.validate().map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::debug!(
            path = %path.display(),
            control_planes = document.control_planes.len(),
            "loaded config"
        );

        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    /// Bind an in-memory document to `path` without touching the disk.
    pub fn new(path: impl Into<PathBuf>, document: ThreeportConfigDocument) -> Self {
        Self {
            path: path.into(),
            document,
        }
    }

    /// The file this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current document.
    pub fn document(&self) -> &ThreeportConfigDocument {
        &self.document
    }

    /// Point `current_control_plane` at `name` and persist.
    ///
    /// Existence is not checked here; callers only pass names they have
    /// just matched or upserted.
    pub fn set_current(&mut self, name: &str) -> Result<(), ConfigError> {
        self.document.current_control_plane = Some(name.to_string());
        debug_assert!(
            self.document.entry(name).is_some(),
            "current control plane '{}' has no entry",
            name
        );
        self.persist()
    }

    /// Insert or replace the entry with `entry.name` and persist.
    pub fn upsert(&mut self, entry: ControlPlaneConfigEntry) -> Result<(), ConfigError> {
        entry.validate()?;
        tracing::info!(control_plane = %entry.name, "writing control plane config");
        self.document.upsert(entry);
        self.persist()
    }

    /// Remove the entry named `name` and persist.
    ///
    /// Returns the removed entry, or `None` (and writes nothing) if no
    /// entry has that name.
    pub fn remove(&mut self, name: &str) -> Result<Option<ControlPlaneConfigEntry>, ConfigError> {
        let removed = self.document.remove(name);
        if removed.is_some() {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Write the whole document atomically.
    pub fn persist(&self) -> Result<(), ConfigError> {
        write_config_atomic(&self.path, &self.document)
    }
}

/// Write a config file atomically.
fn write_config_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    // Temp file in the same directory so the rename stays on one filesystem
    let temp_path = path.with_extension("toml.tmp");
    let written = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(ConfigError::WriteError {
            path: temp_path,
            source: e,
        });
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TWO_PLANES: &str = r#"
        current_control_plane = "prod"

        [[control_planes]]
        name = "prod"
        api_server = "http://prod.local:1323"
        infra_provider = "kind"
        genesis = true

        [[control_planes]]
        name = "staging"
        api_server = "http://staging.local:1323"
        infra_provider = "kind"
    "#;

    fn write(temp: &TempDir, contents: &str) -> PathBuf {
        let path = temp.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_document() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, TWO_PLANES);

        let store = ConfigStore::load(&path).unwrap();
        let doc = store.document();

        assert_eq!(doc.control_planes.len(), 2);
        assert_eq!(doc.current_entry().unwrap().name, "prod");
        assert_eq!(doc.genesis_entry().unwrap().name, "prod");
    }

    #[test]
    fn missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = ConfigStore::load(&temp.path().join("nope.toml")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn garbage_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "this is = = not toml");
        let err = ConfigStore::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn invalid_document_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            r#"
            [[control_planes]]
            name = "prod"
            api_server = "https://prod"
            auth_enabled = true
            "#,
        );
        let err = ConfigStore::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn set_current_persists() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, TWO_PLANES);

        let mut store = ConfigStore::load(&path).unwrap();
        store.set_current("staging").unwrap();

        let reloaded = ConfigStore::load(&path).unwrap();
        assert_eq!(
            reloaded.document().current_control_plane.as_deref(),
            Some("staging")
        );
        assert!(!temp.path().join("config.toml.tmp").exists());
    }

    #[test]
    fn upsert_persists_and_preserves_order() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, TWO_PLANES);

        let mut store = ConfigStore::load(&path).unwrap();
        store
            .upsert(ControlPlaneConfigEntry {
                name: "dev".to_string(),
                api_server: "http://dev.local:1323".to_string(),
                infra_provider: "kind".to_string(),
                ..Default::default()
            })
            .unwrap();
        store
            .upsert(ControlPlaneConfigEntry {
                name: "prod".to_string(),
                api_server: "http://prod2.local:1323".to_string(),
                infra_provider: "eks".to_string(),
                genesis: true,
                ..Default::default()
            })
            .unwrap();

        let reloaded = ConfigStore::load(&path).unwrap();
        let names: Vec<_> = reloaded
            .document()
            .control_planes
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, ["prod", "staging", "dev"]);
        assert_eq!(
            reloaded.document().entry("prod").unwrap().api_server,
            "http://prod2.local:1323"
        );
    }

    #[test]
    fn upsert_rejects_invalid_entry_without_writing() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, TWO_PLANES);
        let before = fs::read_to_string(&path).unwrap();

        let mut store = ConfigStore::load(&path).unwrap();
        let result = store.upsert(ControlPlaneConfigEntry {
            name: "broken".to_string(),
            api_server: "https://broken".to_string(),
            auth_enabled: true,
            ..Default::default()
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn persist_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/config.toml");

        let store = ConfigStore::new(&path, ThreeportConfigDocument::default());
        store.persist().unwrap();

        assert!(path.exists());
        assert!(ConfigStore::load(&path).is_ok());
    }

    #[test]
    fn failed_persist_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        // A non-empty directory in the way makes the final rename fail
        let path = temp.path().join("config.toml");
        fs::create_dir_all(path.join("occupied")).unwrap();

        let store = ConfigStore::new(&path, ThreeportConfigDocument::default());
        let err = store.persist().unwrap_err();

        assert!(matches!(err, ConfigError::WriteError { .. }));
        assert!(!temp.path().join("config.toml.tmp").exists());
    }

    #[test]
    fn remove_unknown_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut store = ConfigStore::new(&path, ThreeportConfigDocument::default());
        assert!(store.remove("ghost").unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn explicit_path_wins() {
        let explicit = PathBuf::from("/tmp/explicit.toml");
        assert_eq!(
            ConfigStore::discover_path(Some(&explicit)).unwrap(),
            explicit
        );
    }
}
