use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::model::{Card, CardPhase, MASTERY_THRESHOLD};

/// Result of grading one answer against a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTransition {
    pub card: Card,
    pub from: CardPhase,
    pub to: CardPhase,
}

impl ProgressTransition {
    /// True when this answer moved the card into `Mastered`.
    #[must_use]
    pub fn newly_mastered(&self) -> bool {
        self.to == CardPhase::Mastered && self.from != CardPhase::Mastered
    }
}

/// Apply a graded answer and return the card's next state.
///
/// A correct answer adds one step (capped at 5), an incorrect one removes a
/// step (floored at 0). Reaching 5 stamps mastery level 5 and marks the card
/// completed. `last_practiced` is always set to `now`. The input card is not
/// modified; the caller swaps the returned value into its pool.
#[must_use]
pub fn apply_outcome(card: &Card, correct: bool, now: DateTime<Utc>) -> Card {
    transition(card, correct, now).card
}

/// Same as [`apply_outcome`], also reporting the phase change.
#[must_use]
pub fn transition(card: &Card, correct: bool, now: DateTime<Utc>) -> ProgressTransition {
    let from = card.phase();
    let current = card.session_progress();
    let next_progress = if correct {
        current.saturating_add(1).min(MASTERY_THRESHOLD)
    } else {
        current.saturating_sub(1)
    };

    let mut next = card.clone();
    next.set_progress(next_progress);
    next.set_last_practiced(now);
    let to = next.phase();

    debug!(
        card_id = %card.id(),
        correct,
        from = current,
        to = next_progress,
        "applied answer outcome"
    );
    if to == CardPhase::Mastered && from != CardPhase::Mastered {
        info!(card_id = %card.id(), answer = card.answer(), "card mastered");
    }

    ProgressTransition {
        card: next,
        from,
        to,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
