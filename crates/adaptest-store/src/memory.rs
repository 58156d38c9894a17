//! In-memory stores.
//!
//! Single-process implementations of the persistence traits. Each store
//! guards its map with one mutex, which also makes `SessionStore::update`
//! atomic per session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use adaptest_core::engine::EngineStores;
use adaptest_core::error::AssessmentError;
use adaptest_core::model::{latest_record, LevelRecord, RecommendationSet};
use adaptest_core::session::{PlacementSession, SessionStatus};
use adaptest_core::traits::{
    Clock, IdentityGenerator, LevelLog, RecommendationStore, SessionStore, SessionUpdate,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Placement sessions keyed by id.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, PlacementSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions physically held, expired ones included.
    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, session: PlacementSession) -> Result<(), AssessmentError> {
        let mut sessions = lock(&self.sessions);
        if sessions.contains_key(&session.id) {
            return Err(AssessmentError::InvalidInput(format!(
                "placement session id already in use: {}",
                session.id
            )));
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn get(&self, id: &str) -> Option<PlacementSession> {
        lock(&self.sessions).get(id).cloned()
    }

    fn update(&self, id: &str, f: SessionUpdate<'_>) -> Result<PlacementSession, AssessmentError> {
        let mut sessions = lock(&self.sessions);
        let stored = sessions
            .get_mut(id)
            .ok_or_else(|| AssessmentError::SessionNotFound(id.to_string()))?;

        // Work on a copy so a failing closure leaves the stored session untouched.
        let mut draft = stored.clone();
        f(&mut draft)?;
        *stored = draft.clone();
        Ok(draft)
    }

    fn remove(&self, id: &str) -> Option<PlacementSession> {
        lock(&self.sessions).remove(id)
    }

    fn purge(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = lock(&self.sessions);
        let before = sessions.len();
        sessions.retain(|_, s| s.status == SessionStatus::Open && !s.is_expired(now));
        before - sessions.len()
    }
}

/// Append-only level history per subject.
#[derive(Debug, Default)]
pub struct MemoryLevelLog {
    records: Mutex<HashMap<String, Vec<LevelRecord>>>,
}

impl MemoryLevelLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LevelLog for MemoryLevelLog {
    fn append(&self, record: LevelRecord) {
        tracing::debug!(
            "level record appended for {}: {} ({})",
            record.subject_id,
            record.level,
            record.source
        );
        lock(&self.records)
            .entry(record.subject_id.clone())
            .or_default()
            .push(record);
    }

    fn latest(&self, subject_id: &str) -> Option<LevelRecord> {
        let records = lock(&self.records);
        records
            .get(subject_id)
            .and_then(|history| latest_record(history))
            .cloned()
    }

    fn history(&self, subject_id: &str) -> Vec<LevelRecord> {
        lock(&self.records)
            .get(subject_id)
            .cloned()
            .unwrap_or_default()
    }
}

/// The current recommendation set per subject.
#[derive(Debug, Default)]
pub struct MemoryRecommendationStore {
    sets: Mutex<HashMap<String, RecommendationSet>>,
}

impl MemoryRecommendationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecommendationStore for MemoryRecommendationStore {
    fn replace(&self, set: RecommendationSet) {
        lock(&self.sets).insert(set.subject_id.clone(), set);
    }

    fn current(&self, subject_id: &str) -> Option<RecommendationSet> {
        lock(&self.sets).get(subject_id).cloned()
    }
}

/// One of each in-memory store, shared by handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryStores {
    pub sessions: Arc<MemorySessionStore>,
    pub levels: Arc<MemoryLevelLog>,
    pub recommendations: Arc<MemoryRecommendationStore>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle the stores with a clock and id generator for the engine.
    pub fn engine_stores(
        &self,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdentityGenerator>,
    ) -> EngineStores {
        EngineStores {
            sessions: self.sessions.clone(),
            levels: self.levels.clone(),
            recommendations: self.recommendations.clone(),
            clock,
            ids,
        }
    }
}
