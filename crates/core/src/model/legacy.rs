use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::model::{Card, CardId, PersistedCard, SchedulingMetadata};
use crate::pool::ensure_unique_ids;

//
// ─── LEGACY RECORD ─────────────────────────────────────────────────────────────
//

/// Identifier as written by older clients: either text or a row number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyId {
    Text(String),
    Number(i64),
}

impl LegacyId {
    fn into_card_id(self) -> Option<CardId> {
        match self {
            LegacyId::Text(s) if s.trim().is_empty() => None,
            LegacyId::Text(s) => Some(CardId::new(s)),
            LegacyId::Number(n) => Some(CardId::new(n.to_string())),
        }
    }
}

/// A card record in any shape written by earlier versions.
///
/// Older documents used `sentence`/`missingWord` for the prompt and answer,
/// stored the scheduler state under `fsrs`, and may lack ids or progress
/// fields entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCard {
    #[serde(default)]
    pub id: Option<LegacyId>,
    #[serde(default, alias = "sentence")]
    pub prompt: Option<String>,
    #[serde(default, alias = "missingWord")]
    pub answer: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub sentence_translation: Option<String>,
    #[serde(default)]
    pub blanked_form: Option<String>,
    #[serde(default)]
    pub session_progress: Option<i64>,
    #[serde(default)]
    pub mastery_level: Option<i64>,
    #[serde(default)]
    pub session_completed: Option<bool>,
    #[serde(default)]
    pub last_practiced: Option<DateTime<Utc>>,
    #[serde(default, alias = "fsrs")]
    pub scheduling_metadata: Option<Value>,
}

impl From<Card> for LegacyCard {
    fn from(card: Card) -> Self {
        Self {
            id: Some(LegacyId::Text(card.id().as_str().to_owned())),
            prompt: Some(card.prompt().to_owned()),
            answer: Some(card.answer().to_owned()),
            translation: Some(card.translation().to_owned()),
            sentence_translation: Some(card.sentence_translation().to_owned()),
            blanked_form: card.blanked_form().map(str::to_owned),
            session_progress: Some(i64::from(card.session_progress())),
            mastery_level: Some(i64::from(card.mastery_level())),
            session_completed: Some(card.session_completed()),
            last_practiced: card.last_practiced(),
            scheduling_metadata: Some(card.scheduling_metadata().clone().into_value()),
        }
    }
}

//
// ─── MIGRATION ─────────────────────────────────────────────────────────────────
//

/// Bring legacy records up to the current card shape.
///
/// - Missing ids are synthesized from the answer text and the record's
///   ordinal position; ids that collide are re-keyed.
/// - Missing progress fields default to 0 and missing scheduling metadata to a
///   fresh value; existing values are kept (progress is clamped into range).
/// - Records without a prompt or an answer cannot be practiced and are dropped.
///
/// Running the migration on its own output changes nothing.
#[must_use]
pub fn migrate(records: Vec<LegacyCard>) -> Vec<Card> {
    let total = records.len();
    let mut synthesized = 0_usize;
    let mut cards = Vec::with_capacity(total);

    for (ordinal, record) in records.into_iter().enumerate() {
        let (Some(prompt), Some(answer)) = (record.prompt, record.answer) else {
            warn!(ordinal, "dropped legacy record without prompt or answer");
            continue;
        };

        let id = match record.id.and_then(LegacyId::into_card_id) {
            Some(id) => id,
            None => {
                synthesized += 1;
                CardId::synthesize(&answer, ordinal)
            }
        };

        let scheduling_metadata = record
            .scheduling_metadata
            .map_or_else(SchedulingMetadata::fresh, SchedulingMetadata::from_value);

        cards.push(Card::from_persisted(PersistedCard {
            id,
            prompt,
            answer,
            translation: record.translation.unwrap_or_default(),
            sentence_translation: record.sentence_translation.unwrap_or_default(),
            blanked_form: record.blanked_form,
            session_progress: record.session_progress.unwrap_or(0),
            mastery_level: record.mastery_level.unwrap_or(0),
            session_completed: record.session_completed.unwrap_or(false),
            last_practiced: record.last_practiced,
            scheduling_metadata,
        }));
    }

    if synthesized > 0 || cards.len() != total {
        info!(
            total,
            migrated = cards.len(),
            synthesized_ids = synthesized,
            "migrated legacy card records"
        );
    }

    ensure_unique_ids(cards)
}

/// Migrate cards that are already in the current shape.
///
/// Used on every pool load so records written by older clients are upgraded
/// transparently.
#[must_use]
pub fn migrate_cards(cards: Vec<Card>) -> Vec<Card> {
    migrate(cards.into_iter().map(LegacyCard::from).collect())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
