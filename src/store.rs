//! Observation Persistence
//!
//! Storage is a capability interface: create, list, and the leaderboard
//! aggregation. Backends have churned before (browser storage, hosted
//! document stores, flat files), so nothing outside this module may depend
//! on a particular backend's record shape.
//!
//! The store is constructed once at startup and injected through the
//! application state; there is no module-level client singleton.

use async_trait::async_trait;
use chrono::Utc;
use rustc_hash::FxHashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{NewObservation, Observation, ObserverCount};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("observation store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt observation record at line {line}: {source}")]
    Corrupt {
        line: usize,
        source: serde_json::Error,
    },
    #[error("failed to serialize observation: {0}")]
    Serialize(serde_json::Error),
}

/// Persistence capability for observation records.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Persist a validated submission. Assigns `id` and `created_at`.
    async fn create(&self, new: NewObservation) -> Result<Observation, StoreError>;

    /// All observations, newest first by `created_at`.
    async fn list(&self) -> Result<Vec<Observation>, StoreError>;

    /// Observation counts per named observer, highest first; ties break on
    /// observer name. Records without an observer are not counted.
    async fn count_by_observer(&self) -> Result<Vec<ObserverCount>, StoreError>;
}

fn build_record(new: NewObservation) -> Observation {
    Observation {
        id: Uuid::new_v4().to_string(),
        observer_name: Some(new.observer_name),
        species_name: new.species_name,
        date_observed: new.date_observed,
        location: new.location,
        image_url: new.image_url,
        notes: new.notes,
        ai_suggested_species: new.ai_suggested_species,
        created_at: Utc::now(),
    }
}

fn newest_first(observations: &[Observation]) -> Vec<Observation> {
    let mut sorted = observations.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}

fn aggregate_by_observer(observations: &[Observation]) -> Vec<ObserverCount> {
    let mut counts: FxHashMap<&str, u64> = FxHashMap::default();
    for obs in observations {
        if let Some(name) = obs.observer_name.as_deref() {
            *counts.entry(name).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<ObserverCount> = counts
        .into_iter()
        .map(|(name, count)| ObserverCount {
            observer_name: name.to_string(),
            count,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.observer_name.cmp(&b.observer_name))
    });
    rows
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Ephemeral backend; also the test double for the HTTP layer.
#[derive(Default)]
pub struct MemoryStore {
    observations: RwLock<Vec<Observation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store, mainly for tests.
    pub fn with_observations(observations: Vec<Observation>) -> Self {
        Self {
            observations: RwLock::new(observations),
        }
    }
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn create(&self, new: NewObservation) -> Result<Observation, StoreError> {
        let record = build_record(new);
        self.observations.write().await.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<Observation>, StoreError> {
        Ok(newest_first(&self.observations.read().await))
    }

    async fn count_by_observer(&self) -> Result<Vec<ObserverCount>, StoreError> {
        Ok(aggregate_by_observer(&self.observations.read().await))
    }
}

// ============================================================================
// JSON-lines file backend
// ============================================================================

/// Append-only JSON-lines file, loaded fully at open. Suits the deployment
/// sizes this application sees (hundreds of records, not millions).
pub struct JsonlStore {
    path: PathBuf,
    observations: RwLock<Vec<Observation>>,
}

impl JsonlStore {
    /// Open (or create) the backing file and load every record.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let observations = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let mut records = Vec::new();
            for (idx, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let record: Observation =
                    serde_json::from_str(line).map_err(|source| StoreError::Corrupt {
                        line: idx + 1,
                        source,
                    })?;
                records.push(record);
            }
            tracing::info!("Loaded {} observations from {}", records.len(), path.display());
            records
        } else {
            tracing::info!("No observation file at {}, starting empty", path.display());
            Vec::new()
        };

        Ok(Self {
            path,
            observations: RwLock::new(observations),
        })
    }

    fn append_line(&self, record: &Observation) -> Result<(), StoreError> {
        let line = serde_json::to_string(record).map_err(StoreError::Serialize)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

#[async_trait]
impl ObservationStore for JsonlStore {
    async fn create(&self, new: NewObservation) -> Result<Observation, StoreError> {
        let record = build_record(new);
        // Hold the write lock across the file append so concurrent creates
        // cannot interleave partial lines
        let mut observations = self.observations.write().await;
        self.append_line(&record)?;
        observations.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<Observation>, StoreError> {
        Ok(newest_first(&self.observations.read().await))
    }

    async fn count_by_observer(&self) -> Result<Vec<ObserverCount>, StoreError> {
        Ok(aggregate_by_observer(&self.observations.read().await))
    }
}
