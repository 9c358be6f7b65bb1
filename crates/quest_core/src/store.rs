//! Durable storage for the plan and progress documents.
//!
//! ```text
//! <root>/.quest/
//!   plan.json      # Curriculum (Plan)
//!   state.json     # Learner progress (State)
//!   config.toml    # Local configuration
//! ```

use crate::config::Config;
use crate::error::{QuestError, Result};
use crate::types::{Plan, State};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the progress directory inside the working root.
pub const QUEST_DIR: &str = ".quest";
/// Plan document file name.
pub const PLAN_FILE: &str = "plan.json";
/// State document file name.
pub const STATE_FILE: &str = "state.json";

/// Handle on the `.quest` directory of a working root.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    /// Learner's project root (parent of `.quest`).
    root: PathBuf,
    /// Path to `.quest`.
    dir: PathBuf,
}

impl ProgressStore {
    /// Returns a handle without checking that anything exists on disk.
    pub fn at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let dir = root.join(QUEST_DIR);
        Self { root, dir }
    }

    /// Opens an existing progress directory.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::NotInitialized`] if `.quest` does not exist.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let store = Self::at(root);
        if !store.dir.is_dir() {
            return Err(QuestError::NotInitialized {
                root: store.root.clone(),
            });
        }
        Ok(store)
    }

    /// Creates the progress directory and writes a default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::SessionExists`] if `.quest` already exists.
    pub fn init(root: impl AsRef<Path>) -> Result<Self> {
        let store = Self::at(root);
        if store.dir.exists() {
            return Err(QuestError::SessionExists {
                path: store.dir.clone(),
            });
        }
        fs::create_dir_all(&store.dir).map_err(|e| QuestError::io(&store.dir, e))?;
        Config::default().save(&store.dir)?;
        Ok(store)
    }

    /// Working root the store belongs to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the `.quest` directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn plan_path(&self) -> PathBuf {
        self.dir.join(PLAN_FILE)
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    /// True if the `.quest` directory exists.
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Loads the local configuration, falling back to defaults.
    pub fn config(&self) -> Result<Config> {
        Config::load(&self.dir)
    }

    pub fn load_plan(&self) -> Result<Plan> {
        read_json(&self.plan_path())
    }

    pub fn load_state(&self) -> Result<State> {
        read_json(&self.state_path())
    }

    /// Loads both documents, state first.
    pub fn load(&self) -> Result<(State, Plan)> {
        let state = self.load_state()?;
        let plan = self.load_plan()?;
        Ok((state, plan))
    }

    /// Persists the plan, recomputing its cached task count first.
    pub fn save_plan(&self, plan: &mut Plan) -> Result<()> {
        plan.normalize();
        write_json(&self.plan_path(), plan)
    }

    pub fn save_state(&self, state: &State) -> Result<()> {
        write_json(&self.state_path(), state)
    }

    /// Persists state then plan. A failed state write leaves the plan untouched.
    pub fn save(&self, state: &State, plan: &mut Plan) -> Result<()> {
        self.save_state(state)?;
        self.save_plan(plan)
    }

    /// Removes the whole `.quest` directory.
    pub fn destroy(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(QuestError::io(&self.dir, e)),
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(QuestError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(QuestError::io(path, e)),
    };
    serde_json::from_str(&data).map_err(|source| QuestError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| QuestError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, json.as_bytes()).map_err(|e| QuestError::io(path, e))?;
    debug!(path = %path.display(), bytes = json.len(), "wrote document");
    Ok(())
}

/// Writes via a sibling temp file and rename.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;

    #[cfg(unix)]
    {
        if let Some(parent) = path.parent() {
            if let Ok(dir_file) = File::open(parent) {
                let _ = dir_file.sync_all();
            }
        }
    }

    Ok(())
}
