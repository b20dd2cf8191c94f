use std::io::Read;
use std::sync::Arc;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use drill_core::daily_goal;
use drill_core::grading::grade_answer;
use drill_core::model::{Card, CardId, GoalState, UserId, migrate_cards};
use drill_core::pool::{ensure_unique_ids, replace_card, reset_pool};
use drill_core::progress::transition;
use drill_core::{Clock, EngineSettings};
use storage::repository::{CardPoolRepository, GoalRepository, Storage, StorageError};

use super::seed::default_seed_pool;
use super::session::{CycleStatus, PracticeSession};
use crate::error::PracticeError;
use crate::import_service::{ImportReport, import_csv};

//
// ─── REPORTS ───────────────────────────────────────────────────────────────────
//

/// Outcome of one graded answer.
#[derive(Debug)]
pub struct AnswerReport {
    /// The answered card after its transition.
    pub card: Card,
    pub correct: bool,
    pub newly_mastered: bool,
    pub goal: GoalState,
    pub status: CycleStatus,
    /// The card to present next, `None` when the cycle is complete.
    pub next_card: Option<CardId>,
    /// Set when mirroring the new state to storage failed. Local state is kept;
    /// call [`PracticeCoordinator::flush`] to retry.
    pub persist_error: Option<StorageError>,
}

/// Outcome of submitting typed input.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Close but wrong: the same card stays current and nothing changes.
    Retry { card_id: CardId },
    Graded(AnswerReport),
}

//
// ─── COORDINATOR ───────────────────────────────────────────────────────────────
//

/// Runs the per-answer practice protocol on top of the pure engine and
/// mirrors every state change to storage.
#[derive(Clone)]
pub struct PracticeCoordinator {
    clock: Clock,
    settings: EngineSettings,
    cards: Arc<dyn CardPoolRepository>,
    goals: Arc<dyn GoalRepository>,
    seed_pool: Vec<Card>,
}

impl PracticeCoordinator {
    #[must_use]
    pub fn new(storage: &Storage) -> Self {
        Self {
            clock: Clock::default(),
            settings: EngineSettings::default(),
            cards: Arc::clone(&storage.cards),
            goals: Arc::clone(&storage.goals),
            seed_pool: default_seed_pool(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the engine settings.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Settings` if the settings fail validation.
    pub fn with_settings(mut self, settings: EngineSettings) -> Result<Self, PracticeError> {
        self.settings = settings.validate()?;
        Ok(self)
    }

    /// Cards used when a user's stored pool is empty.
    #[must_use]
    pub fn with_seed_pool(mut self, seed_pool: Vec<Card>) -> Self {
        self.seed_pool = seed_pool;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn today(&self) -> NaiveDate {
        self.clock.today(self.settings.day_offset())
    }

    /// Load a user's pool and goal and open a practice session.
    ///
    /// Stored cards are migrated to the current shape. The goal counter rolls
    /// over when the stored day is not today. An empty pool is replaced by
    /// the seed pool, which is saved with the first answer.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if loading fails, or
    /// `PracticeError::EmptyPool` if both the stored and the seed pool are empty.
    pub async fn start(&self, user_id: UserId, rng: StdRng) -> Result<PracticeSession, PracticeError> {
        let today = self.today();

        let stored = self.cards.load_card_pool(&user_id).await?;
        let migrated = migrate_cards(stored.clone());
        let pool_changed = migrated != stored;

        let stored_goal = self.goals.load_goal_state(&user_id).await?;
        let goal = stored_goal
            .unwrap_or_else(|| GoalState::new(self.settings.default_target_goal(), today));
        let rolled = daily_goal::check_rollover(&goal, today);
        let goal_changed = stored_goal.is_some() && rolled != goal;

        let pool = if migrated.is_empty() {
            if self.seed_pool.is_empty() {
                return Err(PracticeError::EmptyPool);
            }
            info!(user_id = %user_id, cards = self.seed_pool.len(), "seeding empty card pool");
            self.seed_pool.clone()
        } else {
            migrated
        };

        let mut session = PracticeSession::new(user_id, pool, rolled, rng);

        if pool_changed {
            let result = self.cards.save_card_pool(session.user_id(), session.pool()).await;
            note_persist(&mut session, result.err());
        }
        if goal_changed {
            let result = self.goals.save_goal_state(session.user_id(), session.goal()).await;
            note_persist(&mut session, result.err());
        }

        info!(
            user_id = %session.user_id(),
            cards = session.pool().len(),
            active = session.active_count(),
            correct_today = session.goal().current_progress,
            target = session.goal().target_goal,
            "started practice session"
        );
        Ok(session)
    }

    /// Grade typed input against the current card.
    ///
    /// Exact matches and far misses are graded through [`Self::answer`]; near
    /// misses leave every piece of state untouched so the learner can retry.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Completed` if the cycle is over.
    pub async fn submit(
        &self,
        session: &mut PracticeSession,
        input: &str,
    ) -> Result<SubmitOutcome, PracticeError> {
        self.roll_over(session);
        let card = session.current_card().ok_or(PracticeError::Completed)?;
        let card_id = card.id().clone();
        let grade = grade_answer(input, card.answer(), self.settings.near_miss_threshold());

        match grade.as_outcome() {
            Some(correct) => self.answer(session, correct).await.map(SubmitOutcome::Graded),
            None => {
                debug!(card_id = %card_id, "near miss, retrying");
                Ok(SubmitOutcome::Retry { card_id })
            }
        }
    }

    /// Apply a graded answer to the current card.
    ///
    /// Rolls the goal over if the day changed (reopening a cycle that ended on
    /// yesterday's goal), counts a correct answer, moves
    /// the card one step, picks the next card and then saves pool and goal.
    /// A failed save is reported in [`AnswerReport::persist_error`] and does
    /// not undo the transition.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Completed` if the cycle is over.
    pub async fn answer(
        &self,
        session: &mut PracticeSession,
        correct: bool,
    ) -> Result<AnswerReport, PracticeError> {
        self.roll_over(session);
        if session.is_complete() {
            return Err(PracticeError::Completed);
        }
        let card_id = session.current_id().cloned().ok_or(PracticeError::Completed)?;
        let today = self.today();
        let now = self.clock.now();

        let mut goal = *session.goal();
        if correct {
            goal = daily_goal::record_correct_answer(&goal, today);
        }

        let card = session
            .pool()
            .iter()
            .find(|card| card.id() == &card_id)
            .ok_or_else(|| PracticeError::UnknownCard(card_id.clone()))?;
        let step = transition(card, correct, now);

        replace_card(session.pool_mut(), step.card.clone());
        session.set_goal(goal);
        session.record_answer();
        session.advance(Some(&card_id));

        let persist_error = self.persist(session).await;

        Ok(AnswerReport {
            newly_mastered: step.newly_mastered(),
            card: step.card,
            correct,
            goal,
            status: session.status(),
            next_card: session.current_card().map(|card| card.id().clone()),
            persist_error,
        })
    }

    /// Start a new cycle: clear progress on every card, zero today's counter
    /// and save both.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if saving fails; the reset is kept locally.
    pub async fn reset(&self, session: &mut PracticeSession) -> Result<(), PracticeError> {
        let today = self.today();
        let pool = reset_pool(session.take_pool());
        session.set_pool(pool);
        session.set_goal(daily_goal::reset_progress(session.goal(), today));
        session.advance(None);

        info!(user_id = %session.user_id(), cards = session.pool().len(), "reset practice cycle");
        self.persist_or_fail(session).await
    }

    /// Change the daily target. Invalid goals fall back to the configured
    /// default; today's counter restarts at zero.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if saving fails; the change is kept locally.
    pub async fn set_goal(&self, session: &mut PracticeSession, goal: i64) -> Result<(), PracticeError> {
        let today = self.today();
        let next = daily_goal::set_goal(
            session.goal(),
            goal,
            self.settings.default_target_goal(),
            today,
        );
        info!(user_id = %session.user_id(), target = next.target_goal, "changed daily goal");
        session.set_goal(next);
        session.advance(None);
        self.persist_or_fail(session).await
    }

    /// Append cards read from CSV to the pool and save it.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Import` if the file cannot be parsed, or
    /// `PracticeError::Storage` if saving fails.
    pub async fn import_cards<R: Read>(
        &self,
        session: &mut PracticeSession,
        reader: R,
    ) -> Result<ImportReport, PracticeError> {
        let imported = import_csv(reader)?;
        let mut pool = session.take_pool();
        pool.extend(imported.cards);
        session.set_pool(ensure_unique_ids(pool));
        session.advance(None);
        self.persist_or_fail(session).await?;
        Ok(imported.report)
    }

    /// Save the session's pool and goal again, e.g. after a failed write.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if either save fails.
    pub async fn flush(&self, session: &mut PracticeSession) -> Result<(), PracticeError> {
        self.persist_or_fail(session).await
    }

    /// Restart the daily counter when the stored day is not today and
    /// re-evaluate the cycle, so a goal reached yesterday no longer ends it.
    fn roll_over(&self, session: &mut PracticeSession) {
        let rolled = daily_goal::check_rollover(session.goal(), self.today());
        if &rolled != session.goal() {
            session.set_goal(rolled);
            session.advance(None);
        }
    }

    async fn persist_or_fail(&self, session: &mut PracticeSession) -> Result<(), PracticeError> {
        match self.persist(session).await {
            Some(err) => Err(PracticeError::Storage(err)),
            None => Ok(()),
        }
    }

    /// Save pool and goal; both writes are attempted even if the first fails.
    async fn persist(&self, session: &mut PracticeSession) -> Option<StorageError> {
        let pool_result = self.cards.save_card_pool(session.user_id(), session.pool()).await;
        let goal_result = self.goals.save_goal_state(session.user_id(), session.goal()).await;

        let error = pool_result.err().or(goal_result.err());
        session.set_unsaved(false);
        note_persist(session, error)
    }
}

fn note_persist(session: &mut PracticeSession, error: Option<StorageError>) -> Option<StorageError> {
    if let Some(err) = &error {
        warn!(user_id = %session.user_id(), error = %err, "failed to save practice state");
        session.set_unsaved(true);
    }
    error
}
