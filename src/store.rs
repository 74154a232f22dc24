use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{BEST_SCORE_KEY_PREFIX, SUSPEND_KEY};
use crate::engine::GameState;
use crate::persistence::{from_json, to_json, PersistenceError};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        (**self).remove(key)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .trim()
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Err(error) if error.kind() != ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PersistenceNotice {
    SaveFailed { key: String, message: String },
    LoadFailed { key: String, message: String },
    ClearFailed { key: String, message: String },
}

impl PersistenceNotice {
    fn save_failed(key: &str, error: &PersistenceError) -> Self {
        Self::SaveFailed {
            key: key.to_string(),
            message: error.to_string(),
        }
    }

    fn load_failed(key: &str, error: &PersistenceError) -> Self {
        Self::LoadFailed {
            key: key.to_string(),
            message: error.to_string(),
        }
    }

    fn clear_failed(key: &str, error: &PersistenceError) -> Self {
        Self::ClearFailed {
            key: key.to_string(),
            message: error.to_string(),
        }
    }
}

pub struct SuspendSlot<S: KeyValueStore> {
    store: S,
    notices: Vec<PersistenceNotice>,
}

impl<S: KeyValueStore> SuspendSlot<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            notices: Vec::new(),
        }
    }

    pub fn save(&mut self, state: &GameState) -> bool {
        let result = to_json(state).and_then(|text| self.store.set(SUSPEND_KEY, &text));
        match result {
            Ok(()) => true,
            Err(error) => {
                warn!(key = SUSPEND_KEY, %error, "failed to save suspended run");
                self.notices
                    .push(PersistenceNotice::save_failed(SUSPEND_KEY, &error));
                false
            }
        }
    }

    /// A missing, unreadable or undecodable slot all read as "no run".
    pub fn load(&mut self) -> Option<GameState> {
        let result = self
            .store
            .get(SUSPEND_KEY)
            .and_then(|text| text.map(|text| from_json(&text)).transpose());
        match result {
            Ok(state) => state,
            Err(error) => {
                warn!(key = SUSPEND_KEY, %error, "failed to load suspended run");
                self.notices
                    .push(PersistenceNotice::load_failed(SUSPEND_KEY, &error));
                None
            }
        }
    }

    pub fn clear(&mut self) {
        if let Err(error) = self.store.remove(SUSPEND_KEY) {
            warn!(key = SUSPEND_KEY, %error, "failed to clear suspended run");
            self.notices
                .push(PersistenceNotice::clear_failed(SUSPEND_KEY, &error));
        }
    }

    pub fn take_notices(&mut self) -> Vec<PersistenceNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub stage: u32,
    pub steps: u32,
    pub bumps: u32,
}

impl Score {
    pub fn of_run(state: &GameState) -> Self {
        Self {
            stage: state.stage,
            steps: state.total_steps,
            bumps: state.total_bumps,
        }
    }

    /// Later stage first, then fewer steps, then fewer bumps.
    pub fn is_better_than(&self, other: &Score) -> bool {
        match self.stage.cmp(&other.stage) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => (self.steps, self.bumps) < (other.steps, other.bumps),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredScore {
    #[serde(flatten)]
    score: Score,
    #[serde(rename = "updatedAt", default)]
    updated_at: String,
}

pub struct BestScoreStore<S: KeyValueStore> {
    store: S,
    notices: Vec<PersistenceNotice>,
}

impl<S: KeyValueStore> BestScoreStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            notices: Vec::new(),
        }
    }

    pub fn best(&mut self, level_id: &str) -> Option<Score> {
        let key = score_key(level_id);
        let result = self.store.get(&key).and_then(|text| {
            text.map(|text| serde_json::from_str::<StoredScore>(&text).map_err(PersistenceError::from))
                .transpose()
        });
        match result {
            Ok(Some(stored)) if stored.score.stage == 0 => {
                warn!(%key, "discarding best score with stage 0");
                None
            }
            Ok(stored) => stored.map(|stored| stored.score),
            Err(error) => {
                warn!(%key, %error, "failed to load best score");
                self.notices
                    .push(PersistenceNotice::load_failed(&key, &error));
                None
            }
        }
    }

    pub fn record(&mut self, level_id: &str, candidate: Score) -> bool {
        if let Some(current) = self.best(level_id) {
            if !candidate.is_better_than(&current) {
                return false;
            }
        }
        let key = score_key(level_id);
        let stored = StoredScore {
            score: candidate,
            updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        let result = serde_json::to_string(&stored)
            .map_err(PersistenceError::from)
            .and_then(|text| self.store.set(&key, &text));
        match result {
            Ok(()) => true,
            Err(error) => {
                warn!(%key, %error, "failed to save best score");
                self.notices
                    .push(PersistenceNotice::save_failed(&key, &error));
                false
            }
        }
    }

    pub fn take_notices(&mut self) -> Vec<PersistenceNotice> {
        std::mem::take(&mut self.notices)
    }
}

fn score_key(level_id: &str) -> String {
    format!("{BEST_SCORE_KEY_PREFIX}_{}", level_id.trim().to_lowercase())
}
