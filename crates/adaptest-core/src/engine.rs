//! Assessment engine.
//!
//! Composes grading, classification, profiling and recommendation with the
//! host's stores: placement sessions, the level log and the current
//! recommendation set. Per-subject writes must be serialized by the host.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::AssessmentError;
use crate::level::classify_level;
use crate::model::{
    AssessmentDefinition, AssessmentSource, AttemptResult, GradeBand, LevelRecord, Lesson,
    RecommendationSet, SubmittedAnswer,
};
use crate::recommend::{
    select_recommendations, select_starter, RecommendationRequest, Selection,
    DEFAULT_RECOMMENDATION_COUNT,
};
use crate::retest::{evaluate_retest_eligibility, RetestEligibility, RetestPolicy};
use crate::scoring::score_attempt;
use crate::session::{
    default_session_ttl, FinalizedPlacement, PlacementResult, PlacementSessions,
    RegistrationPayload,
};
use crate::traits::{
    Clock, IdentityGenerator, LevelLog, QuestionSource, RecommendationStore, SessionStore,
};

/// Configuration for the assessment engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Lessons per recommendation set.
    pub recommendation_count: usize,
    /// Minimum time between assessments.
    pub retest_interval: Duration,
    /// Completed activities that unlock an early retest.
    pub retest_activity_threshold: u32,
    /// Lifetime of a placement session.
    pub session_ttl: Duration,
    /// Questions in a materialized placement assessment.
    pub placement_question_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recommendation_count: DEFAULT_RECOMMENDATION_COUNT,
            retest_interval: Duration::days(14),
            retest_activity_threshold: 8,
            session_ttl: default_session_ttl(),
            placement_question_limit: 20,
        }
    }
}

impl EngineConfig {
    pub fn retest_policy(&self) -> RetestPolicy {
        RetestPolicy {
            interval: self.retest_interval,
            activity_threshold: self.retest_activity_threshold,
        }
    }
}

/// Score, classify and profile one submission for a grade band.
///
/// Pure: nothing is stored.
pub fn evaluate_attempt<Q>(
    definition: &AssessmentDefinition,
    questions: &Q,
    answers: &[SubmittedAnswer],
    grade: GradeBand,
) -> Result<AttemptResult, AssessmentError>
where
    Q: QuestionSource + ?Sized,
{
    let score = score_attempt(definition, questions, answers)?;
    let level = classify_level(score.score_percent, grade);
    Ok(score.into_result(Some(level)))
}

/// The stores and capabilities the engine writes through.
pub struct EngineStores {
    pub sessions: Arc<dyn SessionStore>,
    pub levels: Arc<dyn LevelLog>,
    pub recommendations: Arc<dyn RecommendationStore>,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdentityGenerator>,
}

/// Outcome of completing a registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub registration: RegistrationPayload,
    /// The placement level record, when the placement was taken.
    pub level_record: Option<LevelRecord>,
    pub recommendations: RecommendationSet,
}

/// Outcome of a scored retest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetestOutcome {
    pub attempt: AttemptResult,
    pub level_record: LevelRecord,
    pub recommendations: RecommendationSet,
}

/// The central assessment engine.
pub struct AssessmentEngine {
    sessions: PlacementSessions,
    levels: Arc<dyn LevelLog>,
    recommendations: Arc<dyn RecommendationStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl AssessmentEngine {
    pub fn new(stores: EngineStores, config: EngineConfig) -> Self {
        let sessions = PlacementSessions::new(stores.sessions, stores.clock.clone(), stores.ids)
            .with_ttl(config.session_ttl);
        Self {
            sessions,
            levels: stores.levels,
            recommendations: stores.recommendations,
            clock: stores.clock,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sessions(&self) -> &PlacementSessions {
        &self.sessions
    }

    /// Park an anonymous learner's registration while they take placement.
    pub fn start_placement(
        &self,
        grade: GradeBand,
        registration: RegistrationPayload,
    ) -> Result<String, AssessmentError> {
        self.sessions.create(grade, registration)
    }

    /// Score a placement attempt and store the result in the session.
    pub fn submit_placement<Q>(
        &self,
        session_id: &str,
        definition: &AssessmentDefinition,
        questions: &Q,
        answers: &[SubmittedAnswer],
    ) -> Result<AttemptResult, AssessmentError>
    where
        Q: QuestionSource + ?Sized,
    {
        let session = self.sessions.get(session_id)?;
        let attempt = evaluate_attempt(definition, questions, answers, session.grade)?;
        let level = attempt
            .level_estimate
            .unwrap_or_else(|| classify_level(attempt.total_score_percent, session.grade));

        self.sessions.record_assessment_result(
            session_id,
            PlacementResult {
                level,
                score_percent: attempt.total_score_percent,
                topics_profile: attempt.topics_profile.clone(),
                weak_topics: attempt.weak_topics.clone(),
            },
        )?;
        Ok(attempt)
    }

    /// Finalize the placement session into a permanent subject.
    ///
    /// Appends a placement level record when a result was stored and
    /// replaces the subject's recommendations.
    pub fn complete_registration(
        &self,
        session_id: &str,
        subject_id: &str,
        catalog: &[Lesson],
    ) -> Result<Registration, AssessmentError> {
        let FinalizedPlacement {
            registration,
            result,
            ..
        } = self.sessions.finalize(session_id)?;

        let level_record = result.map(|r| LevelRecord {
            subject_id: subject_id.to_string(),
            source: AssessmentSource::Placement,
            level: r.level,
            score_percent: r.score_percent,
            topics_profile: r.topics_profile,
            weak_topics: r.weak_topics,
            created_at: self.clock.now(),
        });
        if let Some(record) = &level_record {
            self.levels.append(record.clone());
        }

        let recommendations = self.store_recommendations(subject_id, level_record.as_ref(), catalog);
        tracing::info!("registration completed for subject {subject_id}");

        Ok(Registration {
            registration,
            level_record,
            recommendations,
        })
    }

    /// Score a retest for an existing subject, append a level record and
    /// replace the subject's recommendations.
    pub fn submit_retest<Q>(
        &self,
        subject_id: &str,
        grade: GradeBand,
        definition: &AssessmentDefinition,
        questions: &Q,
        answers: &[SubmittedAnswer],
        catalog: &[Lesson],
    ) -> Result<RetestOutcome, AssessmentError>
    where
        Q: QuestionSource + ?Sized,
    {
        let attempt = evaluate_attempt(definition, questions, answers, grade)?;
        let level = attempt
            .level_estimate
            .unwrap_or_else(|| classify_level(attempt.total_score_percent, grade));

        let level_record = LevelRecord {
            subject_id: subject_id.to_string(),
            source: AssessmentSource::Retest,
            level,
            score_percent: attempt.total_score_percent,
            topics_profile: attempt.topics_profile.clone(),
            weak_topics: attempt.weak_topics.clone(),
            created_at: self.clock.now(),
        };
        self.levels.append(level_record.clone());
        tracing::info!("retest recorded for subject {subject_id}: {level}");

        let recommendations = self.store_recommendations(subject_id, Some(&level_record), catalog);
        Ok(RetestOutcome {
            attempt,
            level_record,
            recommendations,
        })
    }

    /// Recompute the subject's recommendations from its latest level record.
    pub fn refresh_recommendations(&self, subject_id: &str, catalog: &[Lesson]) -> RecommendationSet {
        let latest = self.levels.latest(subject_id);
        self.store_recommendations(subject_id, latest.as_ref(), catalog)
    }

    /// Whether the subject may re-assess now.
    pub fn retest_schedule(&self, subject_id: &str, activities_completed: u32) -> RetestEligibility {
        let latest = self.levels.latest(subject_id);
        evaluate_retest_eligibility(
            latest.as_ref(),
            activities_completed,
            &self.config.retest_policy(),
            self.clock.now(),
        )
    }

    /// Select for the subject and replace its stored set.
    fn store_recommendations(
        &self,
        subject_id: &str,
        record: Option<&LevelRecord>,
        catalog: &[Lesson],
    ) -> RecommendationSet {
        let selection = self.select(record, catalog);
        let set = RecommendationSet {
            subject_id: subject_id.to_string(),
            computed_at: self.clock.now(),
            content_ids: selection.content_ids,
            rationale: selection.rationale,
        };
        self.recommendations.replace(set.clone());
        tracing::info!(
            "recommendations replaced for subject {subject_id}: {} lessons ({} targeted)",
            set.content_ids.len(),
            selection.targeted
        );
        set
    }

    fn select(&self, record: Option<&LevelRecord>, catalog: &[Lesson]) -> Selection {
        let count = self.config.recommendation_count;
        let Some(record) = record else {
            return select_starter(count, catalog);
        };

        let request = RecommendationRequest {
            count,
            level: record.level,
            topics_profile: &record.topics_profile,
            weak_topics: &record.weak_topics,
        };
        let mut selection = select_recommendations(&request, catalog);
        let prefix = match record.source {
            AssessmentSource::Placement => "Initial recommendations based on placement results",
            AssessmentSource::Retest => "Updated recommendations based on retest results",
        };
        selection.rationale = format!("{prefix}. {}", selection.rationale);
        selection
    }
}
