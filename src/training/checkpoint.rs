//! On-disk checkpoints.
//!
//! A store is a directory. Each named agent checkpoint is a subdirectory with
//! three co-addressed artifacts:
//!
//! ```text
//! <dir>/<name>/weights.bin    bincode Vec<f32>
//! <dir>/<name>/replay.bin     bincode ReplaySnapshot
//! <dir>/<name>/agent.json     scalar agent state
//! <dir>/<name>.progress.json  trainer progress
//! ```
//!
//! Agent checkpoints are written to `<name>.tmp`, synced, and renamed into
//! place. The previous save is first moved aside to `<name>.old` and removed
//! only after the new one is in place; a load that finds no `<name>` falls
//! back to `<name>.old`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::training::replay::ReplaySnapshot;
use crate::training::stats::Tally;

const WEIGHTS_FILE: &str = "weights.bin";
const REPLAY_FILE: &str = "replay.bin";
const AGENT_FILE: &str = "agent.json";

/// Everything saved for one agent.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentArtifacts<S> {
    pub weights: Vec<f32>,
    pub replay: ReplaySnapshot,
    pub state: S,
}

/// Resumable trainer position.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingProgress {
    /// Index of the next episode to run.
    pub next_episode: u64,
    /// Index of the next scheduler round to run.
    pub next_round: u64,
    /// Episodes of round `next_round` already played, counted across
    /// matchups in schedule order.
    pub round_episodes: u64,
    /// Cumulative results over all episodes so far.
    pub tally: Tally,
    /// Cumulative results per matchup label.
    pub matchups: FxHashMap<String, Tally>,
}

/// Directory-backed checkpoint storage.
#[derive(Clone, Debug)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn agent_dir(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn old_dir(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.old"))
    }

    /// The directory holding the newest complete save, if any.
    fn live_dir(&self, name: &str) -> Option<PathBuf> {
        [self.agent_dir(name), self.old_dir(name)]
            .into_iter()
            .find(|dir| dir.join(WEIGHTS_FILE).is_file())
    }

    fn progress_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.progress.json"))
    }

    /// Does a checkpoint with weights exist under `name`?
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.live_dir(name).is_some()
    }

    /// Write all three artifacts under `name`, replacing any previous save.
    pub fn save_agent<S: Serialize>(
        &self,
        name: &str,
        artifacts: &AgentArtifacts<S>,
    ) -> Result<PathBuf, PersistenceError> {
        let final_dir = self.agent_dir(name);
        let tmp_dir = self.dir.join(format!("{name}.tmp"));
        let old_dir = self.old_dir(name);

        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir).map_err(|e| PersistenceError::io(&tmp_dir, e))?;
        }
        fs::create_dir_all(&tmp_dir).map_err(|e| PersistenceError::io(&tmp_dir, e))?;

        write_bincode(&tmp_dir.join(WEIGHTS_FILE), &artifacts.weights)?;
        write_bincode(&tmp_dir.join(REPLAY_FILE), &artifacts.replay)?;
        write_json(&tmp_dir.join(AGENT_FILE), &artifacts.state)?;

        if final_dir.exists() {
            if old_dir.exists() {
                fs::remove_dir_all(&old_dir).map_err(|e| PersistenceError::io(&old_dir, e))?;
            }
            fs::rename(&final_dir, &old_dir).map_err(|e| PersistenceError::io(&old_dir, e))?;
        }
        fs::rename(&tmp_dir, &final_dir).map_err(|e| PersistenceError::io(&final_dir, e))?;
        if old_dir.exists() {
            fs::remove_dir_all(&old_dir).map_err(|e| PersistenceError::io(&old_dir, e))?;
        }

        log::debug!(
            "saved checkpoint '{}' ({} weights, {} transitions)",
            name,
            artifacts.weights.len(),
            artifacts.replay.transitions.len()
        );
        Ok(final_dir)
    }

    /// Read all three artifacts under `name`.
    ///
    /// `Ok(None)` if there are no weights. Weights without the other two
    /// artifacts is an [`PersistenceError::Incomplete`] checkpoint.
    pub fn load_agent<S: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<AgentArtifacts<S>>, PersistenceError> {
        let Some(dir) = self.live_dir(name) else {
            return Ok(None);
        };
        if dir != self.agent_dir(name) {
            log::warn!("checkpoint '{}' was interrupted mid-save; loading the previous save", name);
        }
        let weights_path = dir.join(WEIGHTS_FILE);
        for required in [REPLAY_FILE, AGENT_FILE] {
            if !dir.join(required).is_file() {
                return Err(PersistenceError::Incomplete {
                    name: name.to_string(),
                    missing: required,
                });
            }
        }

        let artifacts = AgentArtifacts {
            weights: read_bincode(&weights_path)?,
            replay: read_bincode(&dir.join(REPLAY_FILE))?,
            state: read_json(&dir.join(AGENT_FILE))?,
        };
        log::debug!("loaded checkpoint '{}'", name);
        Ok(Some(artifacts))
    }

    /// Persist trainer progress for `name`.
    pub fn save_progress(
        &self,
        name: &str,
        progress: &TrainingProgress,
    ) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir).map_err(|e| PersistenceError::io(&self.dir, e))?;
        let path = self.progress_path(name);
        let tmp = path.with_extension("json.tmp");
        write_json(&tmp, progress)?;
        fs::rename(&tmp, &path).map_err(|e| PersistenceError::io(&path, e))
    }

    /// Trainer progress for `name`, `Ok(None)` if none was saved.
    pub fn load_progress(&self, name: &str) -> Result<Option<TrainingProgress>, PersistenceError> {
        let path = self.progress_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    /// Remove saved progress so the next run starts from scratch.
    pub fn clear_progress(&self, name: &str) -> Result<(), PersistenceError> {
        let path = self.progress_path(name);
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| PersistenceError::io(&path, e))?;
        }
        Ok(())
    }
}

/// Flush the buffer and sync the file to disk.
fn finish(path: &Path, mut writer: BufWriter<File>) -> Result<(), PersistenceError> {
    writer.flush().map_err(|e| PersistenceError::io(path, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| PersistenceError::io(path, e))
}

fn write_bincode<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let file = File::create(path).map_err(|e| PersistenceError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, value)?;
    finish(path, writer)
}

fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let file = File::open(path).map_err(|e| PersistenceError::io(path, e))?;
    Ok(bincode::deserialize_from(BufReader::new(file))?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let file = File::create(path).map_err(|e| PersistenceError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    finish(path, writer)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let file = File::open(path).map_err(|e| PersistenceError::io(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
