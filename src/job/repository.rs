//! Typed create/read/update storage for jobs and catalog records.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::foundation::error::{ReelError, ReelResult};
use crate::oracle::{EmotionAnalysis, StyleModelHandle, Tag};

/// A storable record with a repository-assigned id and creation time.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Short name used in error messages.
    const KIND: &'static str;

    /// Assigned id, `0` before creation.
    fn id(&self) -> u64;

    /// Creation time.
    fn created_at(&self) -> DateTime<Utc>;

    /// Stamp the id and creation time.
    fn assign(&mut self, id: u64, created_at: DateTime<Utc>);
}

/// Create/read/update storage. Records are never deleted.
///
/// Readers get `Arc` snapshots; an update replaces the stored snapshot as a whole.
pub trait Repository<R: Record>: Send + Sync {
    /// Assign an id and creation time, store, and return the stored record.
    fn create(&self, record: R) -> ReelResult<Arc<R>>;

    /// Current snapshot of `id`, if stored.
    fn get(&self, id: u64) -> ReelResult<Option<Arc<R>>>;

    /// Atomically replace record `id` with `f(current)`.
    fn replace(&self, id: u64, f: &dyn Fn(&R) -> ReelResult<R>) -> ReelResult<Arc<R>>;

    /// All records in id order.
    fn list(&self) -> ReelResult<Vec<Arc<R>>>;

    /// Overwrite a stored record with `record`.
    fn update(&self, record: R) -> ReelResult<Arc<R>> {
        let id = record.id();
        self.replace(id, &|_| Ok(record.clone()))
    }
}

fn unknown<R: Record>(id: u64) -> ReelError {
    ReelError::job(format!("unknown {} id {id}", R::KIND))
}

fn poisoned<R: Record>() -> ReelError {
    ReelError::job(format!("{} store lock poisoned", R::KIND))
}

/// In-process repository.
pub struct MemoryRepository<R> {
    next_id: AtomicU64,
    records: RwLock<BTreeMap<u64, Arc<R>>>,
}

impl<R> Default for MemoryRepository<R> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<R: Record> MemoryRepository<R> {
    /// Empty repository; ids start at 1.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: Record> Repository<R> for MemoryRepository<R> {
    fn create(&self, mut record: R) -> ReelResult<Arc<R>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        record.assign(id, Utc::now());
        let record = Arc::new(record);
        self.records
            .write()
            .map_err(|_| poisoned::<R>())?
            .insert(id, Arc::clone(&record));
        Ok(record)
    }

    fn get(&self, id: u64) -> ReelResult<Option<Arc<R>>> {
        let records = self.records.read().map_err(|_| poisoned::<R>())?;
        Ok(records.get(&id).cloned())
    }

    fn replace(&self, id: u64, f: &dyn Fn(&R) -> ReelResult<R>) -> ReelResult<Arc<R>> {
        let mut records = self.records.write().map_err(|_| poisoned::<R>())?;
        let current = records.get(&id).ok_or_else(|| unknown::<R>(id))?;
        let mut next = f(current)?;
        next.assign(id, current.created_at());
        let next = Arc::new(next);
        records.insert(id, Arc::clone(&next));
        Ok(next)
    }

    fn list(&self) -> ReelResult<Vec<Arc<R>>> {
        let records = self.records.read().map_err(|_| poisoned::<R>())?;
        Ok(records.values().cloned().collect())
    }
}

/// Repository persisted as one JSON array, rewritten on every mutation.
pub struct JsonFileRepository<R> {
    path: PathBuf,
    records: Mutex<Vec<R>>,
}

impl<R: Record> JsonFileRepository<R> {
    /// Open `path`, loading existing records if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> ReelResult<Self> {
        let path = path.into();
        let records = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("read {} store '{}'", R::KIND, path.display()))?;
            serde_json::from_str::<Vec<R>>(&text).map_err(|e| {
                ReelError::serde(format!("parse {} store '{}': {e}", R::KIND, path.display()))
            })?
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &[R]) -> ReelResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store directory '{}'", parent.display()))?;
        }
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| ReelError::serde(format!("encode {} store: {e}", R::KIND)))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("write {} store '{}'", R::KIND, tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace {} store '{}'", R::KIND, self.path.display()))?;
        Ok(())
    }
}

impl<R: Record> Repository<R> for JsonFileRepository<R> {
    fn create(&self, mut record: R) -> ReelResult<Arc<R>> {
        let mut records = self.records.lock().map_err(|_| poisoned::<R>())?;
        let id = records.iter().map(Record::id).max().unwrap_or(0) + 1;
        record.assign(id, Utc::now());
        records.push(record.clone());
        if let Err(e) = self.persist(&records) {
            records.pop();
            return Err(e);
        }
        Ok(Arc::new(record))
    }

    fn get(&self, id: u64) -> ReelResult<Option<Arc<R>>> {
        let records = self.records.lock().map_err(|_| poisoned::<R>())?;
        Ok(records.iter().find(|r| r.id() == id).cloned().map(Arc::new))
    }

    fn replace(&self, id: u64, f: &dyn Fn(&R) -> ReelResult<R>) -> ReelResult<Arc<R>> {
        let mut records = self.records.lock().map_err(|_| poisoned::<R>())?;
        let slot = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| unknown::<R>(id))?;
        let mut next = f(&records[slot])?;
        next.assign(id, records[slot].created_at());
        let previous = std::mem::replace(&mut records[slot], next.clone());
        if let Err(e) = self.persist(&records) {
            records[slot] = previous;
            return Err(e);
        }
        Ok(Arc::new(next))
    }

    fn list(&self) -> ReelResult<Vec<Arc<R>>> {
        let records = self.records.lock().map_err(|_| poisoned::<R>())?;
        let mut out: Vec<_> = records.iter().cloned().map(Arc::new).collect();
        out.sort_by_key(|r| r.id());
        Ok(out)
    }
}

/// A catalogued photo with its oracle annotations.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageRecord {
    /// Assigned on create.
    pub id: u64,
    /// Source file.
    pub path: PathBuf,
    /// Emotion analysis (neutral fallback when the oracle failed).
    pub emotion: EmotionAnalysis,
    /// Aesthetic score, absent when the oracle failed.
    pub aesthetic_score: Option<f32>,
    /// Semantic tags, descending relevance.
    pub tags: Vec<Tag>,
    /// Assigned on create.
    pub created_at: DateTime<Utc>,
}

impl Record for ImageRecord {
    const KIND: &'static str = "image";

    fn id(&self) -> u64 {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn assign(&mut self, id: u64, created_at: DateTime<Utc>) {
        self.id = id;
        self.created_at = created_at;
    }
}

/// A trained personal style model.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StyleModelRecord {
    /// Assigned on create.
    pub id: u64,
    /// User-facing name.
    pub name: String,
    /// Instance prompt used for training.
    pub prompt: String,
    /// Training epochs.
    pub epochs: u32,
    /// Number of training images.
    pub sample_count: usize,
    /// Opaque weights handle.
    pub handle: StyleModelHandle,
    /// Assigned on create.
    pub created_at: DateTime<Utc>,
}

impl Record for StyleModelRecord {
    const KIND: &'static str = "style_model";

    fn id(&self) -> u64 {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn assign(&mut self, id: u64, created_at: DateTime<Utc>) {
        self.id = id;
        self.created_at = created_at;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/repository.rs"]
mod tests;
