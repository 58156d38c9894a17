//! Retest eligibility.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::LevelRecord;

/// When a learner may take another assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetestPolicy {
    /// Time that must pass after the last assessment.
    pub interval: Duration,
    /// Completed activities that unlock a retest early.
    pub activity_threshold: u32,
}

impl Default for RetestPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::days(14),
            activity_threshold: 8,
        }
    }
}

/// Eligibility decision plus the dates behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetestEligibility {
    pub eligible: bool,
    pub last_assessed_at: Option<DateTime<Utc>>,
    pub activities_completed: u32,
    pub next_eligible_at: DateTime<Utc>,
}

/// Decide whether a learner may re-assess at `now`.
///
/// Eligible with no prior record, once strictly more than the interval has
/// elapsed, or once the activity threshold is met. An interval that runs
/// past the representable calendar never unlocks by time; `next_eligible_at`
/// saturates at [`DateTime::<Utc>::MAX_UTC`].
pub fn evaluate_retest_eligibility(
    last: Option<&LevelRecord>,
    activities_completed: u32,
    policy: &RetestPolicy,
    now: DateTime<Utc>,
) -> RetestEligibility {
    let Some(last) = last else {
        return RetestEligibility {
            eligible: true,
            last_assessed_at: None,
            activities_completed,
            next_eligible_at: now,
        };
    };

    let unlocks_at = last.created_at.checked_add_signed(policy.interval);
    let eligible_by_time = unlocks_at.is_some_and(|at| now > at);
    let eligible = eligible_by_time || activities_completed >= policy.activity_threshold;

    RetestEligibility {
        eligible,
        last_assessed_at: Some(last.created_at),
        activities_completed,
        next_eligible_at: unlocks_at.unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssessmentSource, Level, TopicProfile};
    use chrono::TimeZone;

    fn record_at(created_at: DateTime<Utc>) -> LevelRecord {
        LevelRecord {
            subject_id: "s1".into(),
            source: AssessmentSource::Placement,
            level: Level::L2,
            score_percent: 48.0,
            topics_profile: TopicProfile::new(),
            weak_topics: vec![],
            created_at,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn no_record_is_always_eligible() {
        let policy = RetestPolicy::default();
        for activities in [0, 3, 100] {
            let result = evaluate_retest_eligibility(None, activities, &policy, t0());
            assert!(result.eligible);
            assert_eq!(result.next_eligible_at, t0());
            assert!(result.last_assessed_at.is_none());
        }
    }

    #[test]
    fn interval_must_be_strictly_exceeded() {
        let policy = RetestPolicy::default();
        let record = record_at(t0());

        let at_boundary = t0() + Duration::days(14);
        let result = evaluate_retest_eligibility(Some(&record), 0, &policy, at_boundary);
        assert!(!result.eligible);
        assert_eq!(result.next_eligible_at, at_boundary);

        let after = at_boundary + Duration::seconds(1);
        assert!(evaluate_retest_eligibility(Some(&record), 0, &policy, after).eligible);
    }

    #[test]
    fn activity_threshold_unlocks_early() {
        let policy = RetestPolicy::default();
        let record = record_at(t0());
        let soon = t0() + Duration::days(2);
        assert!(!evaluate_retest_eligibility(Some(&record), 7, &policy, soon).eligible);
        let result = evaluate_retest_eligibility(Some(&record), 8, &policy, soon);
        assert!(result.eligible);
        assert_eq!(result.next_eligible_at, t0() + Duration::days(14));
    }

    #[test]
    fn custom_policy() {
        let policy = RetestPolicy {
            interval: Duration::days(1),
            activity_threshold: 2,
        };
        let record = record_at(t0());
        assert!(evaluate_retest_eligibility(Some(&record), 0, &policy, t0() + Duration::hours(25)).eligible);
        assert!(evaluate_retest_eligibility(Some(&record), 2, &policy, t0()).eligible);
    }

    #[test]
    fn oversized_interval_never_unlocks_by_time() {
        let policy = RetestPolicy {
            interval: Duration::MAX,
            activity_threshold: 8,
        };
        let record = record_at(t0());
        let far = t0() + Duration::days(365 * 1000);

        let result = evaluate_retest_eligibility(Some(&record), 0, &policy, far);
        assert!(!result.eligible);
        assert_eq!(result.next_eligible_at, DateTime::<Utc>::MAX_UTC);
        assert!(evaluate_retest_eligibility(Some(&record), 8, &policy, far).eligible);
    }
}
