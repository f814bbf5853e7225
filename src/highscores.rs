//! High score leaderboard
//!
//! Scores are survival times in seconds. Every entry gets an id that the
//! Highscore screen uses to delete it. The file store rewrites the whole
//! board as JSON after each change.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Delete handle of a leaderboard entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScoreId(pub u64);

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: ScoreId,
    pub name: String,
    /// Seconds survived
    pub value: u64,
    /// Unix timestamp (seconds) when recorded
    pub timestamp: u64,
}

/// Listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreOrder {
    /// Longest survival first, earliest entry wins ties
    #[default]
    Best,
    /// Shortest survival first
    Worst,
    /// Alphabetical by name, then best
    Name,
}

/// Where finished games are recorded
pub trait ScoreStore {
    fn save_score(&mut self, name: &str, value: u64) -> Result<ScoreId, StoreError>;
    fn list_scores(&self, order: ScoreOrder) -> Result<Vec<ScoreEntry>, StoreError>;
    fn delete_score(&mut self, id: ScoreId) -> Result<(), StoreError>;
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// In-memory leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<ScoreEntry>,
    next_id: u64,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Leaderboard {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Record a score with an explicit timestamp
    pub fn add_score(&mut self, name: &str, value: u64, timestamp: u64) -> ScoreId {
        let id = ScoreId(self.next_id);
        self.next_id += 1;
        self.entries.push(ScoreEntry {
            id,
            name: name.trim().to_string(),
            value,
            timestamp,
        });
        id
    }

    pub fn remove(&mut self, id: ScoreId) -> Option<ScoreEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Entries in the requested order
    pub fn sorted(&self, order: ScoreOrder) -> Vec<ScoreEntry> {
        let mut entries = self.entries.clone();
        match order {
            ScoreOrder::Best => {
                entries.sort_by(|a, b| b.value.cmp(&a.value).then(a.id.cmp(&b.id)))
            }
            ScoreOrder::Worst => {
                entries.sort_by(|a, b| a.value.cmp(&b.value).then(a.id.cmp(&b.id)))
            }
            ScoreOrder::Name => entries.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then(b.value.cmp(&a.value))
                    .then(a.id.cmp(&b.id))
            }),
        }
        entries
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ScoreStore for Leaderboard {
    fn save_score(&mut self, name: &str, value: u64) -> Result<ScoreId, StoreError> {
        Ok(self.add_score(name, value, now_secs()))
    }

    fn list_scores(&self, order: ScoreOrder) -> Result<Vec<ScoreEntry>, StoreError> {
        Ok(self.sorted(order))
    }

    fn delete_score(&mut self, id: ScoreId) -> Result<(), StoreError> {
        self.remove(id).map(|_| ()).ok_or(StoreError::UnknownScore(id.0))
    }
}

/// Leaderboard persisted to a JSON file
#[derive(Debug)]
pub struct FileScoreStore {
    path: PathBuf,
    board: Leaderboard,
}

impl FileScoreStore {
    /// Open the store, starting empty if the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let board = match fs::read_to_string(&path) {
            Ok(json) => {
                let board: Leaderboard = serde_json::from_str(&json)?;
                log::info!("Loaded {} high scores", board.entries.len());
                board
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No high scores found, starting fresh");
                Leaderboard::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, board })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn board(&self) -> &Leaderboard {
        &self.board
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.board)?;
        fs::write(&self.path, json)?;
        log::debug!("High scores saved ({} entries)", self.board.entries.len());
        Ok(())
    }
}

impl ScoreStore for FileScoreStore {
    fn save_score(&mut self, name: &str, value: u64) -> Result<ScoreId, StoreError> {
        let id = self.board.add_score(name, value, now_secs());
        self.persist()?;
        Ok(id)
    }

    fn list_scores(&self, order: ScoreOrder) -> Result<Vec<ScoreEntry>, StoreError> {
        Ok(self.board.sorted(order))
    }

    fn delete_score(&mut self, id: ScoreId) -> Result<(), StoreError> {
        self.board.delete_score(id)?;
        self.persist()
    }
}
