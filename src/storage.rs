//! Reading keystroke logs and writing pipeline artifacts.
//!
//! Input is one JSON object mapping session id to its raw events, plain
//! or zstd-compressed (`.zst`). Output is one directory of pretty JSON
//! artifacts:
//!
//! ```text
//! <out>/
//!   level_1_actions_per_session.json
//!   level_2_actions_per_session.json
//!   level_3_actions_per_session.json
//!   action_type_with_priority_per_session.json
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::Serialize;
use tracing::{info, warn};

use crate::model::{ActionsBySession, RawEvent, SessionLogs};

pub const LEVEL_1_FILE: &str = "level_1_actions_per_session.json";
pub const LEVEL_2_FILE: &str = "level_2_actions_per_session.json";
pub const LEVEL_3_FILE: &str = "level_3_actions_per_session.json";
pub const PRIORITY_FILE: &str = "action_type_with_priority_per_session.json";

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Load raw event logs from a JSON file, decompressing `.zst` files first.
///
/// The top level must be an object. A session whose events do not
/// deserialize is logged and kept with no events.
pub fn load_sessions(path: &Path) -> Result<SessionLogs> {
    let bytes = read_input(path)?;
    let raw: BTreeMap<String, serde_json::Value> =
        serde_json::from_slice(&bytes).map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let sessions: SessionLogs = raw
        .into_iter()
        .map(|(session, value)| {
            let events = serde_json::from_value::<Vec<RawEvent>>(value).unwrap_or_else(|e| {
                warn!(%session, error = %e, "malformed session, treating as empty");
                Vec::new()
            });
            (session, events)
        })
        .collect();

    info!(path = %path.display(), sessions = sessions.len(), "loaded sessions");
    Ok(sessions)
}

/// Load a previously written actions artifact.
pub fn load_actions(path: &Path) -> Result<ActionsBySession> {
    let bytes = read_input(path)?;
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };
    let bytes = fs::read(path).map_err(io_err)?;
    if path.extension().is_some_and(|ext| ext == "zst") {
        zstd::decode_all(bytes.as_slice()).map_err(io_err)
    } else {
        Ok(bytes)
    }
}

/// An output directory for pipeline artifacts.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write all four artifacts, returning their paths in stage order.
    pub fn write_artifacts(
        &self,
        level_1: &ActionsBySession,
        level_2: &ActionsBySession,
        level_3: &ActionsBySession,
        prioritized: &ActionsBySession,
    ) -> Result<Vec<PathBuf>> {
        [
            (LEVEL_1_FILE, level_1),
            (LEVEL_2_FILE, level_2),
            (LEVEL_3_FILE, level_3),
            (PRIORITY_FILE, prioritized),
        ]
        .into_iter()
        .map(|(name, sessions)| self.write_json(name, sessions))
        .collect()
    }

    fn write_json(&self, name: &str, value: &impl Serialize) -> Result<PathBuf> {
        let path = self.root.join(name);
        let json = serde_json::to_string_pretty(value).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "wrote artifact");
        Ok(path)
    }
}
