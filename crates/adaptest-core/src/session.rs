//! Placement sessions.
//!
//! An anonymous learner's registration data is parked in a time-bounded
//! session while they take the placement assessment. The session receives
//! the assessment result once and is consumed once when registration is
//! finalized.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AssessmentError;
use crate::model::{GradeBand, Level, TopicProfile};
use crate::traits::{Clock, IdentityGenerator, SessionStore};

/// Default lifetime of a placement session.
pub fn default_session_ttl() -> Duration {
    Duration::hours(24)
}

/// Opaque registration data, returned byte-for-byte on finalize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationPayload(Vec<u8>);

impl RegistrationPayload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_vec(value).map(Self)
    }

    pub fn parse_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Placement outcome stored in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub level: Level,
    pub score_percent: f64,
    pub topics_profile: TopicProfile,
    #[serde(default)]
    pub weak_topics: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Finalized,
}

/// A stored placement session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementSession {
    pub id: String,
    /// Grade band the learner registered for; levels the placement result.
    pub grade: GradeBand,
    /// Never mutated after creation.
    pub registration: RegistrationPayload,
    #[serde(default)]
    pub result: Option<PlacementResult>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PlacementSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// What `finalize` hands back for account creation.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedPlacement {
    pub session_id: String,
    pub grade: GradeBand,
    pub registration: RegistrationPayload,
    pub result: Option<PlacementResult>,
}

/// Placement session lifecycle over a [`SessionStore`].
///
/// Every read re-checks `now < expires_at`; the store is not trusted to
/// have deleted expired sessions yet.
pub struct PlacementSessions {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdentityGenerator>,
    ttl: Duration,
}

impl PlacementSessions {
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdentityGenerator>,
    ) -> Self {
        Self {
            store,
            clock,
            ids,
            ttl: default_session_ttl(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Open a session for an anonymous learner and return its id.
    pub fn create(
        &self,
        grade: GradeBand,
        registration: RegistrationPayload,
    ) -> Result<String, AssessmentError> {
        let now = self.clock.now();
        let id = self.ids.next_id();
        self.store.insert(PlacementSession {
            id: id.clone(),
            grade,
            registration,
            result: None,
            status: SessionStatus::Open,
            created_at: now,
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        })?;
        tracing::info!("placement session created: {id} (grade {grade})");
        Ok(id)
    }

    /// Fetch a live, open session.
    pub fn get(&self, id: &str) -> Result<PlacementSession, AssessmentError> {
        let now = self.clock.now();
        let session = self
            .store
            .get(id)
            .ok_or_else(|| AssessmentError::SessionNotFound(id.to_string()))?;
        check_open(&session, now)?;
        Ok(session)
    }

    /// Attach the placement result. Allowed once per session.
    pub fn record_assessment_result(
        &self,
        id: &str,
        result: PlacementResult,
    ) -> Result<PlacementSession, AssessmentError> {
        let now = self.clock.now();
        let level = result.level;
        let updated = self.store.update(id, &mut |session: &mut PlacementSession| {
            check_open(session, now)?;
            if session.result.is_some() {
                return Err(AssessmentError::ResultAlreadyRecorded(session.id.clone()));
            }
            session.result = Some(result.clone());
            Ok(())
        })?;
        tracing::info!("placement session {id} assessed at {level}");
        Ok(updated)
    }

    /// Consume the session, returning the original registration payload.
    ///
    /// The session is marked finalized atomically, then removed. A repeated
    /// call fails with `AlreadyFinalized` while the store still holds the
    /// session and with `SessionNotFound` after it is gone.
    pub fn finalize(&self, id: &str) -> Result<FinalizedPlacement, AssessmentError> {
        let now = self.clock.now();
        let session = self.store.update(id, &mut |session: &mut PlacementSession| {
            check_open(session, now)?;
            session.status = SessionStatus::Finalized;
            Ok(())
        })?;
        self.store.remove(id);
        tracing::info!("placement session finalized: {id}");

        Ok(FinalizedPlacement {
            session_id: session.id,
            grade: session.grade,
            registration: session.registration,
            result: session.result,
        })
    }

    /// Ask the store to drop expired and finalized sessions.
    pub fn purge_expired(&self) -> usize {
        let removed = self.store.purge(self.clock.now());
        if removed > 0 {
            tracing::debug!("purged {removed} placement sessions");
        }
        removed
    }
}

fn check_open(session: &PlacementSession, now: DateTime<Utc>) -> Result<(), AssessmentError> {
    if session.is_expired(now) {
        return Err(AssessmentError::SessionNotFound(session.id.clone()));
    }
    if session.status == SessionStatus::Finalized {
        return Err(AssessmentError::AlreadyFinalized(session.id.clone()));
    }
    Ok(())
}
