//! Queries and whole-value updates over a card pool.

use std::collections::HashSet;

use tracing::warn;

use crate::model::{Card, CardId, MASTERY_THRESHOLD};

/// Number of progress buckets (`0..=5`).
pub const PROGRESS_BUCKETS: usize = MASTERY_THRESHOLD as usize + 1;

#[must_use]
pub fn active_count(pool: &[Card]) -> usize {
    pool.iter().filter(|card| card.is_active()).count()
}

#[must_use]
pub fn mastered_count(pool: &[Card]) -> usize {
    pool.iter().filter(|card| card.is_mastered()).count()
}

/// True when the pool is non-empty and no card is left to practice.
#[must_use]
pub fn all_mastered(pool: &[Card]) -> bool {
    !pool.is_empty() && active_count(pool) == 0
}

/// Count of cards at each progress value, index `0..=5`.
#[must_use]
pub fn progress_histogram(pool: &[Card]) -> [usize; PROGRESS_BUCKETS] {
    let mut buckets = [0; PROGRESS_BUCKETS];
    for card in pool {
        buckets[usize::from(card.session_progress())] += 1;
    }
    buckets
}

/// Replace the card with the same id. Returns `false` when no card matched.
pub fn replace_card(pool: &mut [Card], updated: Card) -> bool {
    match pool.iter_mut().find(|card| card.id() == updated.id()) {
        Some(slot) => {
            *slot = updated;
            true
        }
        None => false,
    }
}

/// Clear this cycle's progress on every card.
#[must_use]
pub fn reset_pool(pool: Vec<Card>) -> Vec<Card> {
    pool.into_iter().map(Card::reset).collect()
}

/// Re-key cards whose id is already taken earlier in the pool.
///
/// A colliding card gets the id synthesized from its answer and position; if
/// that is taken too, a counter suffix is appended until the id is free. Pools
/// whose ids are already unique come back unchanged.
#[must_use]
pub fn ensure_unique_ids(pool: Vec<Card>) -> Vec<Card> {
    // Ids anywhere in the input stay reserved for their first owner.
    let mut taken: HashSet<CardId> = pool.iter().map(|card| card.id().clone()).collect();
    let mut kept: HashSet<CardId> = HashSet::with_capacity(pool.len());
    let mut out = Vec::with_capacity(pool.len());

    for (position, card) in pool.into_iter().enumerate() {
        if kept.insert(card.id().clone()) {
            out.push(card);
            continue;
        }

        let base = CardId::synthesize(card.answer(), position);
        let mut candidate = base.clone();
        let mut suffix = 1_usize;
        while taken.contains(&candidate) {
            candidate = CardId::new(format!("{base}_{suffix}"));
            suffix += 1;
        }

        warn!(duplicate = %card.id(), reassigned = %candidate, "re-keyed duplicate card id");
        taken.insert(candidate.clone());
        kept.insert(candidate.clone());
        out.push(card.with_id(candidate));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CardId;

    fn card(id: &str, progress: u8) -> Card {
        Card::new(CardId::new(id), "p ___", id)
            .unwrap()
            .with_session_progress(progress)
    }

    #[test]
    fn counts_active_and_mastered() {
        let pool = vec![card("a", 0), card("b", 5), card("c", 4)];
        assert_eq!(active_count(&pool), 2);
        assert_eq!(mastered_count(&pool), 1);
        assert!(!all_mastered(&pool));
    }

    #[test]
    fn empty_pool_is_not_all_mastered() {
        assert!(!all_mastered(&[]));
        assert!(all_mastered(&[card("a", 5)]));
    }

    #[test]
    fn histogram_buckets_each_progress() {
        let pool = vec![card("a", 0), card("b", 5), card("c", 0), card("d", 3)];
        assert_eq!(progress_histogram(&pool), [2, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn replace_swaps_matching_card() {
        let mut pool = vec![card("a", 0), card("b", 1)];
        assert!(replace_card(&mut pool, card("b", 2)));
        assert_eq!(pool[1].session_progress(), 2);
        assert!(!replace_card(&mut pool, card("z", 2)));
    }

    #[test]
    fn duplicate_ids_are_rekeyed_by_position() {
        let pool = ensure_unique_ids(vec![card("a", 0), card("b", 0), card("a", 2)]);
        let ids: Vec<&str> = pool.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "a_2"]);
        assert_eq!(pool[2].session_progress(), 2);
    }

    #[test]
    fn unique_pools_are_unchanged() {
        let pool = vec![card("a", 0), card("b", 1)];
        assert_eq!(ensure_unique_ids(pool.clone()), pool);
    }

    #[test]
    fn rekeying_skips_taken_candidates() {
        let pool = ensure_unique_ids(vec![card("x", 0), card("x_2", 0), card("x", 0)]);
        let ids: Vec<&str> = pool.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, vec!["x", "x_2", "x_2_1"]);
    }

    #[test]
    fn rekeying_never_steals_a_later_id() {
        let pool = ensure_unique_ids(vec![card("x", 0), card("x", 1), card("x_1", 3)]);
        let ids: Vec<&str> = pool.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, vec!["x", "x_1_1", "x_1"]);
        assert_eq!(pool[2].session_progress(), 3);
    }

    #[test]
    fn reset_clears_every_card() {
        let pool = reset_pool(vec![card("a", 5), card("b", 3)]);
        assert!(pool.iter().all(|c| c.session_progress() == 0 && !c.session_completed()));
        assert!(pool.iter().all(|c| c.mastery_level() == 0));
    }
}
