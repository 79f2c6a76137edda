use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{Config, QuizSettings};
use crate::error::SessionError;
use crate::metrics::{
    track_persistence, ACHIEVEMENTS_AWARDED_TOTAL, ANSWERS_SUBMITTED_TOTAL, SESSIONS_ACTIVE,
    SESSIONS_TOTAL,
};
use crate::models::{
    Answer, AttemptResult, BadgeDefinition, NewAchievements, Quiz, QuizRequest, Session,
    SessionPhase, SessionProgress,
};
use crate::stores::{CatalogRepository, HistoryStore};
use crate::utils::clock::Clock;
use crate::utils::retry::{retry_async_with_config, RetryConfig};

use super::achievement_service::{default_badge_definitions, evaluate};
use super::grader::grade;
use super::quiz_generator::QuizGenerator;

/// What the caller gets back once a quiz is graded and stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    pub attempt: AttemptResult,
    pub points_awarded: u32,
    pub new_achievements: NewAchievements,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// More questions remain.
    Next {
        answer: Answer,
        progress: SessionProgress,
    },
    /// That was the last question; the attempt is graded and persisted.
    Completed {
        answer: Answer,
        report: CompletionReport,
    },
}

/// Graded but not yet evaluated.
struct GradedAttempt {
    attempt: AttemptResult,
}

/// Graded and evaluated; ready to be written as one unit.
struct EvaluatedAttempt {
    attempt: AttemptResult,
    new_achievements: NewAchievements,
}

/// Drives one quiz session at a time from generation to persisted result.
pub struct SessionOrchestrator {
    catalog: Arc<CatalogRepository>,
    history: Arc<dyn HistoryStore>,
    clock: Arc<dyn Clock>,
    settings: QuizSettings,
    retry: RetryConfig,
    badges: Vec<BadgeDefinition>,
    rng: StdRng,
    phase: SessionPhase,
    session: Option<Session>,
}

impl SessionOrchestrator {
    pub fn new(
        config: &Config,
        catalog: Arc<CatalogRepository>,
        history: Arc<dyn HistoryStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            history,
            clock,
            settings: config.quiz.clone(),
            retry: RetryConfig::for_persistence(config.storage.persist_max_attempts),
            badges: default_badge_definitions(),
            rng: StdRng::from_os_rng(),
            phase: SessionPhase::Idle,
            session: None,
        }
    }

    pub fn with_badge_definitions(mut self, badges: Vec<BadgeDefinition>) -> Self {
        self.badges = badges;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Starting | SessionPhase::InProgress | SessionPhase::Grading
        )
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Generates a quiz and opens a session for it. Rejected while another session is active.
    pub fn start(&mut self, request: &QuizRequest) -> Result<&Quiz, SessionError> {
        if self.is_active() {
            warn!("Rejected {} quiz start: a session is already active", request.kind());
            return Err(SessionError::AlreadyActive);
        }

        self.phase = SessionPhase::Starting;
        let generated =
            QuizGenerator::new(self.catalog.as_ref(), &self.settings).generate(request, &mut self.rng);
        let quiz = match generated {
            Ok(quiz) => quiz,
            Err(e) => {
                self.phase = SessionPhase::Idle;
                return Err(e.into());
            }
        };

        let session = Session::new(quiz, self.clock.now());
        info!(
            "Session {} started for {} quiz {}",
            session.id, session.quiz.kind, session.quiz.id
        );
        SESSIONS_TOTAL.with_label_values(&["started"]).inc();
        SESSIONS_ACTIVE.inc();

        self.phase = SessionPhase::InProgress;
        let session = self.session.insert(session);
        Ok(&session.quiz)
    }

    /// Records the answer to the current question. Answering the last question grades,
    /// evaluates and persists the attempt before returning. If that fails the session
    /// stays in `Grading`; see [`Self::retry_completion`].
    pub async fn submit_answer(
        &mut self,
        question_id: Uuid,
        selected_option_id: Option<String>,
        time_taken_ms: u64,
    ) -> Result<SubmitOutcome, SessionError> {
        if self.phase != SessionPhase::InProgress {
            return Err(SessionError::NoActiveSession);
        }
        let session = self.session.as_mut().ok_or(SessionError::NoActiveSession)?;

        let current_id = session
            .current_question()
            .map(|question| question.id)
            .ok_or(SessionError::NoActiveSession)?;
        if current_id != question_id {
            return Err(SessionError::UnexpectedQuestion(question_id));
        }

        let answer = session
            .record(selected_option_id, time_taken_ms)
            .cloned()
            .ok_or(SessionError::NoActiveSession)?;
        ANSWERS_SUBMITTED_TOTAL
            .with_label_values(&[if answer.is_correct { "true" } else { "false" }])
            .inc();

        if !session.is_finished() {
            return Ok(SubmitOutcome::Next {
                answer,
                progress: session.progress(),
            });
        }

        let report = self.complete().await?;
        Ok(SubmitOutcome::Completed { answer, report })
    }

    /// Advances past the current question when its timer ran out, recording
    /// `default_option_id` (or no selection) with the full time limit as time taken.
    pub async fn timeout_current(
        &mut self,
        default_option_id: Option<String>,
    ) -> Result<SubmitOutcome, SessionError> {
        let (question_id, limit_seconds) = self
            .session
            .as_ref()
            .filter(|_| self.phase == SessionPhase::InProgress)
            .and_then(|session| session.current_question())
            .map(|question| (question.id, question.time_limit_seconds))
            .ok_or(SessionError::NoActiveSession)?;

        self.submit_answer(
            question_id,
            default_option_id,
            u64::from(limit_seconds) * 1000,
        )
        .await
    }

    /// Re-runs grading and persistence for a session whose completion failed.
    /// The recorded answers are kept in `Grading` until this succeeds or the
    /// session is cancelled.
    pub async fn retry_completion(&mut self) -> Result<CompletionReport, SessionError> {
        if self.phase != SessionPhase::Grading {
            return Err(SessionError::NoActiveSession);
        }
        self.complete().await
    }

    /// Discards the active session, including one waiting in `Grading` after a
    /// failed completion. Nothing is persisted.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if !matches!(self.phase, SessionPhase::InProgress | SessionPhase::Grading) {
            return Err(SessionError::NoActiveSession);
        }

        if let Some(session) = self.session.take() {
            info!(
                "Session {} cancelled after {} answers",
                session.id,
                session.answers().len()
            );
        }
        SESSIONS_TOTAL.with_label_values(&["cancelled"]).inc();
        SESSIONS_ACTIVE.dec();
        self.phase = SessionPhase::Idle;
        Ok(())
    }

    async fn complete(&mut self) -> Result<CompletionReport, SessionError> {
        self.phase = SessionPhase::Grading;
        let session = self.session.as_ref().ok_or(SessionError::NoActiveSession)?;
        let session_id = session.id;

        match self.grade_and_persist(session).await {
            Ok(report) => {
                self.session = None;
                self.phase = SessionPhase::Completed;
                SESSIONS_ACTIVE.dec();
                SESSIONS_TOTAL.with_label_values(&["completed"]).inc();
                info!(
                    "Session {} completed: score {}%, passed {}, {} new achievements",
                    session_id,
                    report.attempt.score,
                    report.attempt.passed,
                    report.new_achievements.len()
                );
                Ok(report)
            }
            Err(e) => {
                SESSIONS_TOTAL.with_label_values(&["failed"]).inc();
                error!(
                    "Session {} could not be completed, answers kept for retry: {}",
                    session_id, e
                );
                Err(e)
            }
        }
    }

    async fn grade_and_persist(&self, session: &Session) -> Result<CompletionReport, SessionError> {
        let graded = GradedAttempt {
            attempt: grade(
                &session.quiz,
                session.answers(),
                self.settings.points_per_correct_answer,
                self.clock.now(),
            ),
        };
        let evaluated = self.evaluate(graded).await?;
        self.persist(&evaluated).await?;

        for record in evaluated.new_achievements.to_records() {
            ACHIEVEMENTS_AWARDED_TOTAL
                .with_label_values(&[record.family()])
                .inc();
        }

        Ok(CompletionReport {
            points_awarded: evaluated.attempt.points_awarded,
            attempt: evaluated.attempt,
            new_achievements: evaluated.new_achievements,
        })
    }

    async fn evaluate(&self, graded: GradedAttempt) -> Result<EvaluatedAttempt, SessionError> {
        let history = track_persistence("load_attempts", self.history.all_attempts()).await?;
        let existing =
            track_persistence("load_achievements", self.history.all_achievements()).await?;

        let new_achievements = evaluate(&graded.attempt, &history, &existing, &self.badges);
        Ok(EvaluatedAttempt {
            attempt: graded.attempt,
            new_achievements,
        })
    }

    async fn persist(&self, evaluated: &EvaluatedAttempt) -> Result<(), SessionError> {
        let store = self.history.as_ref();
        let attempt = &evaluated.attempt;
        let records = evaluated.new_achievements.to_records();
        let records = records.as_slice();

        retry_async_with_config(self.retry.clone(), move || {
            track_persistence("append_completion", store.append_completion(attempt, records))
        })
        .await?;
        Ok(())
    }
}
