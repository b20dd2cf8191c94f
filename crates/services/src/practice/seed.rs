use drill_core::blank::{blank_word, clean_sentence};
use drill_core::model::{Card, CardId};

const DEFAULT_CARDS: [(&str, &str, &str, &str, &str); 3] = [
    (
        "friends_001",
        "Friends are very important in life",
        "friends",
        "arkadaşlar",
        "Arkadaşlar hayatta çok önemlidir.",
    ),
    (
        "exam_002",
        "She is studying for her exam",
        "exam",
        "sınav",
        "O sınavı için çalışıyor.",
    ),
    (
        "groceries_003",
        "We need to buy some groceries",
        "groceries",
        "market alışverişi",
        "Biraz market alışverişi yapmamız gerekiyor.",
    ),
];

/// Starter cards offered to a user whose stored pool is empty.
#[must_use]
pub fn default_seed_pool() -> Vec<Card> {
    DEFAULT_CARDS
        .iter()
        .filter_map(|(id, sentence, answer, meaning, translation)| {
            let blanked = blank_word(&clean_sentence(sentence), answer);
            Card::new(CardId::new(*id), blanked.text, *answer)
                .ok()
                .map(|card| {
                    card.with_blanked_form(blanked.matched)
                        .with_translation(*meaning)
                        .with_sentence_translation(*translation)
                })
        })
        .collect()
}
