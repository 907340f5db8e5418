//! Session persistence.
//!
//! The browser version of this game kept its identity in a cookie and a
//! handful of `cheers_*` storage keys; here the same snapshot lives in
//! one JSON file so a restarted client can pick the session back up
//! between polls. Storage failures are silent: a lost session only
//! costs a re-join.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use cheers_core::rules::GameMode;

use crate::state::SeatedPlayer;

/// Everything the client owns across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub player_id: String,
    pub player_name: String,
    pub mode: GameMode,
    #[serde(default)]
    pub players: Vec<SeatedPlayer>,
    #[serde(default)]
    pub round: u32,
    #[serde(default)]
    pub turn_index: usize,
    /// Unix millis of the last fresh game start, arming the new-game
    /// buffer after a reload.
    #[serde(default)]
    pub new_game_timestamp: Option<u64>,
}

/// Abstraction over session storage so the controller stays testable.
pub trait SessionStore {
    /// Persist the session so it survives a restart.
    fn save(&self, session: &StoredSession);
    /// Load a previously saved session, if any.
    fn load(&self) -> Option<StoredSession>;
    /// Clear the saved session.
    fn clear(&self);
}

/// File-backed [`SessionStore`].
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> FileStore {
        FileStore { path }
    }

    /// Default session path: the home directory when available,
    /// otherwise the system temp dir.
    pub fn default_path() -> PathBuf {
        std::env::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".cheers-session.json")
    }
}

impl SessionStore for FileStore {
    fn save(&self, session: &StoredSession) {
        match serde_json::to_vec_pretty(session) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&self.path, bytes) {
                    debug!(path = %self.path.display(), error = %e, "session save failed");
                }
            }
            Err(e) => debug!(error = %e, "session serialize failed"),
        }
    }

    fn load(&self) -> Option<StoredSession> {
        let bytes = std::fs::read(&self.path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "session parse failed");
                None
            }
        }
    }

    fn clear(&self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// In-memory [`SessionStore`] for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    slot: std::sync::Mutex<Option<StoredSession>>,
}

impl SessionStore for MemoryStore {
    fn save(&self, session: &StoredSession) {
        *self.slot.lock().unwrap() = Some(session.clone());
    }

    fn load(&self) -> Option<StoredSession> {
        self.slot.lock().unwrap().clone()
    }

    fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }
}
