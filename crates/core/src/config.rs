//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Nothing in this crate reads environment variables while handling a request; binaries read
//! them in `main` and feed the raw values through the `*_from_env_value` helpers below.

use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_MAX_COMMENT_LEN, MAX_COMMENT_LEN_CEILING};
use crate::error::{WorkflowError, WorkflowResult};
use crate::store::{InMemoryRequestStore, JsonFileRequestStore, RequestStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which [`RequestStore`] implementation backs the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File { data_dir: PathBuf },
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    store: StoreBackend,
    actors_file: PathBuf,
    seed_file: Option<PathBuf>,
    max_comment_len: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidInput`] if `max_comment_len` is zero or above the
    /// ceiling, or if `actors_file` is empty.
    pub fn new(
        store: StoreBackend,
        actors_file: PathBuf,
        seed_file: Option<PathBuf>,
        max_comment_len: usize,
    ) -> WorkflowResult<Self> {
        let max_comment_len = bounded_max_comment_len(max_comment_len)?;
        if actors_file.as_os_str().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "actors file path cannot be empty".into(),
            ));
        }

        Ok(Self {
            store,
            actors_file,
            seed_file,
            max_comment_len,
        })
    }

    pub fn store(&self) -> &StoreBackend {
        &self.store
    }

    pub fn actors_file(&self) -> &Path {
        &self.actors_file
    }

    pub fn seed_file(&self) -> Option<&Path> {
        self.seed_file.as_deref()
    }

    pub fn max_comment_len(&self) -> usize {
        self.max_comment_len
    }

    /// Build the configured store.
    pub fn open_store(&self) -> WorkflowResult<Arc<dyn RequestStore>> {
        Ok(match &self.store {
            StoreBackend::Memory => Arc::new(InMemoryRequestStore::new()),
            StoreBackend::File { data_dir } => Arc::new(JsonFileRequestStore::open(data_dir)?),
        })
    }
}

/// Parse the store backend from optional raw values.
///
/// `kind` is `memory` or `file` (default `file`); `data_dir` defaults to
/// [`DEFAULT_DATA_DIR`] and is ignored for the memory backend.
pub fn store_backend_from_env_value(
    kind: Option<String>,
    data_dir: Option<String>,
) -> WorkflowResult<StoreBackend> {
    let kind = kind
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "file".into());

    match kind.as_str() {
        "memory" => Ok(StoreBackend::Memory),
        "file" => {
            let data_dir = data_dir
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_DATA_DIR.into());
            Ok(StoreBackend::File {
                data_dir: PathBuf::from(data_dir),
            })
        }
        other => Err(WorkflowError::InvalidInput(format!(
            "unknown store backend '{other}' (expected 'memory' or 'file')"
        ))),
    }
}

/// Check a maximum comment length against the allowed range `1..=MAX_COMMENT_LEN_CEILING`.
pub fn bounded_max_comment_len(max_comment_len: usize) -> WorkflowResult<usize> {
    if max_comment_len == 0 || max_comment_len > MAX_COMMENT_LEN_CEILING {
        return Err(WorkflowError::InvalidInput(format!(
            "max comment length must be between 1 and {MAX_COMMENT_LEN_CEILING}"
        )));
    }
    Ok(max_comment_len)
}

/// Parse the maximum comment length. Missing or blank means the default.
pub fn max_comment_len_from_env_value(value: Option<String>) -> WorkflowResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    match value {
        None => Ok(DEFAULT_MAX_COMMENT_LEN),
        Some(v) => v.parse::<usize>().map_err(|_| {
            WorkflowError::InvalidInput(format!("max comment length is not a number: {v}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_defaults_to_file_store() {
        assert_eq!(
            store_backend_from_env_value(None, None).unwrap(),
            StoreBackend::File {
                data_dir: PathBuf::from(DEFAULT_DATA_DIR)
            }
        );
        assert_eq!(
            store_backend_from_env_value(Some(" MEMORY ".into()), Some("ignored".into())).unwrap(),
            StoreBackend::Memory
        );
        assert!(store_backend_from_env_value(Some("postgres".into()), None).is_err());
    }

    #[test]
    fn max_comment_len_parsing() {
        assert_eq!(
            max_comment_len_from_env_value(Some("  ".into())).unwrap(),
            DEFAULT_MAX_COMMENT_LEN
        );
        assert_eq!(max_comment_len_from_env_value(Some("50".into())).unwrap(), 50);
        assert!(max_comment_len_from_env_value(Some("lots".into())).is_err());
    }

    #[test]
    fn comment_len_bounds() {
        assert_eq!(bounded_max_comment_len(1).unwrap(), 1);
        assert_eq!(
            bounded_max_comment_len(MAX_COMMENT_LEN_CEILING).unwrap(),
            MAX_COMMENT_LEN_CEILING
        );
        assert!(bounded_max_comment_len(0).is_err());
        assert!(bounded_max_comment_len(MAX_COMMENT_LEN_CEILING + 1).is_err());
    }

    #[test]
    fn config_rejects_out_of_range_comment_len() {
        let actors = PathBuf::from("actors.yaml");
        assert!(CoreConfig::new(StoreBackend::Memory, actors.clone(), None, 0).is_err());
        assert!(CoreConfig::new(
            StoreBackend::Memory,
            actors.clone(),
            None,
            MAX_COMMENT_LEN_CEILING + 1
        )
        .is_err());
        assert!(CoreConfig::new(StoreBackend::Memory, actors, None, 10).is_ok());
    }

    #[test]
    fn open_store_creates_data_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let data_dir = temp.path().join("nested");
        let cfg = CoreConfig::new(
            StoreBackend::File {
                data_dir: data_dir.clone(),
            },
            PathBuf::from("actors.yaml"),
            None,
            100,
        )
        .unwrap();

        let store = cfg.open_store().unwrap();
        assert!(store.query(&|_| true).unwrap().is_empty());
        assert!(data_dir.join("requests").is_dir());
    }
}
