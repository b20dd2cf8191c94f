use rand::Rng;
use rand::distr::{Distribution, weighted::WeightedIndex};
use tracing::debug;

use crate::model::{Card, CardId, MASTERY_THRESHOLD};

/// Selection weight of an active card: `6 - sessionProgress`.
///
/// Untouched cards weigh 6 and cards one step from mastery weigh 1, so no
/// active card is ever starved.
#[must_use]
pub fn selection_weight(card: &Card) -> u32 {
    u32::from(MASTERY_THRESHOLD + 1).saturating_sub(u32::from(card.session_progress()))
}

/// Pick the next card to present, or `None` when every card is mastered.
///
/// Active cards are drawn with probability proportional to
/// [`selection_weight`]. When more than one card is active and the draw hits
/// `previous`, the draw is repeated once and that second result is accepted
/// as-is. A single remaining active card is always returned, even if it was
/// just shown.
///
/// The random source is injected so draws are reproducible in tests.
pub fn select_next<'a, R>(
    pool: &'a [Card],
    previous: Option<&CardId>,
    rng: &mut R,
) -> Option<&'a Card>
where
    R: Rng + ?Sized,
{
    let active: Vec<&Card> = pool.iter().filter(|card| card.is_active()).collect();
    let first = draw(&active, rng)?;

    if active.len() > 1 && previous == Some(first.id()) {
        debug!(card_id = %first.id(), "redrawing to avoid immediate repeat");
        return draw(&active, rng);
    }

    Some(first)
}

fn draw<'a, R>(active: &[&'a Card], rng: &mut R) -> Option<&'a Card>
where
    R: Rng + ?Sized,
{
    match active {
        [] => None,
        [only] => Some(*only),
        _ => {
            let weights = active.iter().map(|card| selection_weight(card));
            let picked = match WeightedIndex::new(weights) {
                Ok(dist) => active[dist.sample(rng)],
                // Weights are always >= 1, so construction cannot fail for a
                // non-empty slice; fall back to the first candidate regardless.
                Err(_) => active[0],
            };
            debug!(
                card_id = %picked.id(),
                session_progress = picked.session_progress(),
                candidates = active.len(),
                "selected card"
            );
            Some(picked)
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
