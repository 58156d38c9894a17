//! Collaborator traits.
//!
//! The core consumes a clock, an identity generator and question lookup, and
//! hands its results to persistence through the store traits. Hosts own the
//! implementations; `adaptest-store` ships in-memory ones.

use chrono::{DateTime, Utc};

use crate::error::AssessmentError;
use crate::model::{LevelRecord, Question, RecommendationSet};
use crate::session::PlacementSession;

// ---------------------------------------------------------------------------
// Clock and identities
// ---------------------------------------------------------------------------

/// Source of the current time for expiry and eligibility windows.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Produces opaque, collision-resistant identities.
pub trait IdentityGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdentityGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

// ---------------------------------------------------------------------------
// Question lookup
// ---------------------------------------------------------------------------

/// Read access to a question bank.
pub trait QuestionSource {
    /// Look up a question by identity.
    fn question(&self, id: &str) -> Option<&Question>;

    /// All questions, in bank order.
    fn questions(&self) -> Box<dyn Iterator<Item = &Question> + '_>;
}

// ---------------------------------------------------------------------------
// Persistence boundary
// ---------------------------------------------------------------------------

/// Closure applied to a stored session under the store's per-session lock.
pub type SessionUpdate<'a> =
    &'a mut dyn FnMut(&mut PlacementSession) -> Result<(), AssessmentError>;

/// Storage for placement sessions.
///
/// `update` must be atomic per session id: the closure observes and mutates
/// the stored value without interleaving writers. Expired sessions may still
/// be returned until the store physically removes them.
pub trait SessionStore: Send + Sync {
    /// Insert a new session. Fails if the id is already taken.
    fn insert(&self, session: PlacementSession) -> Result<(), AssessmentError>;

    fn get(&self, id: &str) -> Option<PlacementSession>;

    /// Apply `f` to the stored session and return the updated copy.
    /// Nothing is written when `f` fails. `f` may run more than once, each
    /// time against a fresh copy of the stored value.
    fn update(&self, id: &str, f: SessionUpdate<'_>) -> Result<PlacementSession, AssessmentError>;

    fn remove(&self, id: &str) -> Option<PlacementSession>;

    /// Drop finalized sessions and sessions expired at `now`. Returns how
    /// many were removed.
    fn purge(&self, now: DateTime<Utc>) -> usize;
}

/// Append-only level history.
pub trait LevelLog: Send + Sync {
    fn append(&self, record: LevelRecord);

    /// The record with the latest `created_at` for a subject.
    fn latest(&self, subject_id: &str) -> Option<LevelRecord>;

    fn history(&self, subject_id: &str) -> Vec<LevelRecord>;
}

/// Holds the single current recommendation set per subject.
pub trait RecommendationStore: Send + Sync {
    /// Replace the subject's current set (last write wins).
    fn replace(&self, set: RecommendationSet);

    fn current(&self, subject_id: &str) -> Option<RecommendationSet>;
}
