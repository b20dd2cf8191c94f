use rand::rngs::StdRng;
use tracing::{debug, info};

use drill_core::daily_goal::is_cycle_complete;
use drill_core::model::{Card, CardId, GoalState, UserId};
use drill_core::pool::{self, PROGRESS_BUCKETS};
use drill_core::selection::select_next;

use crate::error::PracticeError;

//
// ─── CYCLE STATUS ──────────────────────────────────────────────────────────────
//

/// Whether the practice loop should keep presenting cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    InProgress,
    /// Today's target number of correct answers has been reached.
    GoalReached,
    /// Every card in a non-empty pool is mastered.
    AllMastered,
}

impl CycleStatus {
    /// Goal completion is checked first, so a cycle that ends on both
    /// conditions reports `GoalReached`.
    #[must_use]
    pub fn evaluate(pool: &[Card], goal: &GoalState) -> Self {
        if is_cycle_complete(goal) {
            Self::GoalReached
        } else if pool::all_mastered(pool) {
            Self::AllMastered
        } else {
            Self::InProgress
        }
    }

    #[must_use]
    pub fn is_complete(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one user's practice loop.
///
/// The session owns the pool and goal state; the coordinator is the only
/// mutator and mirrors every change to storage. When a save fails the session
/// keeps its state and remembers that a flush is pending.
pub struct PracticeSession {
    user_id: UserId,
    pool: Vec<Card>,
    goal: GoalState,
    current: Option<CardId>,
    status: CycleStatus,
    rng: StdRng,
    answered: u32,
    unsaved: bool,
}

impl PracticeSession {
    pub(crate) fn new(user_id: UserId, pool: Vec<Card>, goal: GoalState, rng: StdRng) -> Self {
        let status = CycleStatus::evaluate(&pool, &goal);
        let mut session = Self {
            user_id,
            pool,
            goal,
            current: None,
            status,
            rng,
            answered: 0,
            unsaved: false,
        };
        session.advance(None);
        session
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn pool(&self) -> &[Card] {
        &self.pool
    }

    #[must_use]
    pub fn goal(&self) -> &GoalState {
        &self.goal
    }

    #[must_use]
    pub fn status(&self) -> CycleStatus {
        self.status
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    /// The card waiting for an answer, `None` once the cycle is complete.
    #[must_use]
    pub fn current_card(&self) -> Option<&Card> {
        let id = self.current.as_ref()?;
        self.pool.iter().find(|card| card.id() == id)
    }

    /// Number of graded answers in this session. Near-miss retries are not counted.
    #[must_use]
    pub fn answered_count(&self) -> u32 {
        self.answered
    }

    /// True when the last save failed and local state is ahead of storage.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        pool::active_count(&self.pool)
    }

    #[must_use]
    pub fn mastered_count(&self) -> usize {
        pool::mastered_count(&self.pool)
    }

    /// Cards per progress value `0..=5`.
    #[must_use]
    pub fn progress_histogram(&self) -> [usize; PROGRESS_BUCKETS] {
        pool::progress_histogram(&self.pool)
    }

    /// Present a specific card instead of the drawn one.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Completed` if the cycle is over,
    /// `PracticeError::UnknownCard` if the id is not in the pool, or
    /// `PracticeError::CardMastered` if the card is no longer active.
    pub fn present(&mut self, id: &CardId) -> Result<&Card, PracticeError> {
        if self.is_complete() {
            return Err(PracticeError::Completed);
        }
        let card = self
            .pool
            .iter()
            .find(|card| card.id() == id)
            .ok_or_else(|| PracticeError::UnknownCard(id.clone()))?;
        if card.is_mastered() {
            return Err(PracticeError::CardMastered(id.clone()));
        }
        self.current = Some(id.clone());
        Ok(card)
    }

    // ─── Coordinator hooks ─────────────────────────────────────────────────────

    pub(crate) fn current_id(&self) -> Option<&CardId> {
        self.current.as_ref()
    }

    pub(crate) fn pool_mut(&mut self) -> &mut Vec<Card> {
        &mut self.pool
    }

    pub(crate) fn set_pool(&mut self, pool: Vec<Card>) {
        self.pool = pool;
    }

    pub(crate) fn take_pool(&mut self) -> Vec<Card> {
        std::mem::take(&mut self.pool)
    }

    pub(crate) fn set_goal(&mut self, goal: GoalState) {
        self.goal = goal;
    }

    pub(crate) fn record_answer(&mut self) {
        self.answered = self.answered.saturating_add(1);
    }

    pub(crate) fn set_unsaved(&mut self, unsaved: bool) {
        self.unsaved = unsaved;
    }

    /// Re-evaluate termination and pick the next card.
    ///
    /// A still-valid current card is kept unless `previous` asks for a fresh
    /// draw after an answer.
    pub(crate) fn advance(&mut self, previous: Option<&CardId>) {
        let was_complete = self.status.is_complete();
        self.status = CycleStatus::evaluate(&self.pool, &self.goal);

        if self.status.is_complete() {
            if !was_complete {
                info!(
                    user_id = %self.user_id,
                    status = ?self.status,
                    correct_today = self.goal.current_progress,
                    mastered = self.mastered_count(),
                    "practice cycle complete"
                );
            }
            self.current = None;
            return;
        }

        let keep_current = previous.is_none() && self.current_card().is_some_and(Card::is_active);
        if keep_current {
            return;
        }

        self.current = select_next(&self.pool, previous, &mut self.rng).map(|card| card.id().clone());
        debug!(user_id = %self.user_id, next = ?self.current, "advanced to next card");
    }
}
