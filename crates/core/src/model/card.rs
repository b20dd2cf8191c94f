use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::blank::restore_sentence;
use crate::model::{CardId, SchedulingMetadata};

/// Session progress at which a card counts as mastered.
pub const MASTERY_THRESHOLD: u8 = 5;

//
// ─── CARD PHASE ────────────────────────────────────────────────────────────────
//

/// Where a card sits in the current learning cycle, derived from its progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPhase {
    /// Not answered correctly yet in this cycle (progress 0).
    Untouched,
    /// Partially learned (progress 1..=4).
    Active(u8),
    /// Reached the threshold; excluded from selection until the pool is reset.
    Mastered,
}

impl CardPhase {
    #[must_use]
    pub fn from_progress(progress: u8) -> Self {
        match progress {
            0 => Self::Untouched,
            p if p >= MASTERY_THRESHOLD => Self::Mastered,
            p => Self::Active(p),
        }
    }

    #[must_use]
    pub fn is_selectable(self) -> bool {
        !matches!(self, Self::Mastered)
    }
}

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

/// One sentence-with-a-gap fact and its learning progress.
///
/// The prompt is the already-blanked sentence and the answer is the word the
/// learner has to type; the engine treats both as opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PersistedCard")]
pub struct Card {
    id: CardId,
    prompt: String,
    answer: String,
    translation: String,
    sentence_translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    blanked_form: Option<String>,
    session_progress: u8,
    mastery_level: u8,
    session_completed: bool,
    last_practiced: Option<DateTime<Utc>>,
    scheduling_metadata: SchedulingMetadata,
}

/// Raw persisted shape of a card, before progress values are normalized.
///
/// Documents written by older clients or edited by hand may carry progress
/// values outside the valid range; [`Card::from_persisted`] clamps them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCard {
    pub id: CardId,
    pub prompt: String,
    pub answer: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub sentence_translation: String,
    #[serde(default)]
    pub blanked_form: Option<String>,
    #[serde(default)]
    pub session_progress: i64,
    #[serde(default)]
    pub mastery_level: i64,
    #[serde(default)]
    pub session_completed: bool,
    #[serde(default)]
    pub last_practiced: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scheduling_metadata: SchedulingMetadata,
}

impl From<PersistedCard> for Card {
    fn from(value: PersistedCard) -> Self {
        Card::from_persisted(value)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_progress(value: i64) -> u8 {
    value.clamp(0, i64::from(MASTERY_THRESHOLD)) as u8
}

fn distinct_form(form: Option<String>, answer: &str) -> Option<String> {
    form.filter(|form| !form.is_empty() && form != answer)
}

impl Card {
    /// Create an untouched card.
    ///
    /// # Errors
    ///
    /// Returns `CardError` if the prompt or answer is blank.
    pub fn new(
        id: CardId,
        prompt: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<Self, CardError> {
        let prompt = prompt.into();
        let answer = answer.into();
        if prompt.trim().is_empty() {
            return Err(CardError::EmptyPrompt);
        }
        if answer.trim().is_empty() {
            return Err(CardError::EmptyAnswer);
        }

        Ok(Self {
            id,
            prompt,
            answer,
            translation: String::new(),
            sentence_translation: String::new(),
            blanked_form: None,
            session_progress: 0,
            mastery_level: 0,
            session_completed: false,
            last_practiced: None,
            scheduling_metadata: SchedulingMetadata::fresh(),
        })
    }

    /// Rebuild a card from stored values, clamping progress into `[0, 5]`.
    ///
    /// `sessionCompleted` and `masteryLevel` are re-derived from the clamped
    /// progress so a mastered card always reports mastery level 5.
    #[must_use]
    pub fn from_persisted(raw: PersistedCard) -> Self {
        let session_progress = clamp_progress(raw.session_progress);
        let mut mastery_level = clamp_progress(raw.mastery_level);

        if i64::from(session_progress) != raw.session_progress
            || i64::from(mastery_level) != raw.mastery_level
        {
            warn!(
                card_id = %raw.id,
                session_progress = raw.session_progress,
                mastery_level = raw.mastery_level,
                "clamped out-of-range progress on load"
            );
        }

        let blanked_form = distinct_form(raw.blanked_form, &raw.answer);
        let session_completed = session_progress >= MASTERY_THRESHOLD;
        if session_completed {
            mastery_level = MASTERY_THRESHOLD;
        }

        Self {
            id: raw.id,
            prompt: raw.prompt,
            answer: raw.answer,
            translation: raw.translation,
            sentence_translation: raw.sentence_translation,
            blanked_form,
            session_progress,
            mastery_level,
            session_completed,
            last_practiced: raw.last_practiced,
            scheduling_metadata: raw.scheduling_metadata,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: CardId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = translation.into();
        self
    }

    #[must_use]
    pub fn with_sentence_translation(mut self, sentence_translation: impl Into<String>) -> Self {
        self.sentence_translation = sentence_translation.into();
        self
    }

    /// Record the exact text the prompt's blank replaced, when it differs
    /// from the answer in case or form.
    #[must_use]
    pub fn with_blanked_form(mut self, form: Option<String>) -> Self {
        self.blanked_form = distinct_form(form, &self.answer);
        self
    }

    #[must_use]
    pub fn with_scheduling_metadata(mut self, metadata: SchedulingMetadata) -> Self {
        self.scheduling_metadata = metadata;
        self
    }

    /// Set session progress directly (clamped), keeping the mastery fields consistent.
    #[must_use]
    pub fn with_session_progress(mut self, progress: u8) -> Self {
        self.set_progress(progress);
        self
    }

    /// Clear this cycle's progress. Scheduling metadata and timestamps are kept.
    #[must_use]
    pub fn reset(mut self) -> Self {
        self.session_progress = 0;
        self.mastery_level = 0;
        self.session_completed = false;
        self
    }

    pub(crate) fn set_progress(&mut self, progress: u8) {
        self.session_progress = progress.min(MASTERY_THRESHOLD);
        self.session_completed = self.session_progress >= MASTERY_THRESHOLD;
        if self.session_completed {
            self.mastery_level = MASTERY_THRESHOLD;
        }
    }

    pub(crate) fn set_last_practiced(&mut self, at: DateTime<Utc>) {
        self.last_practiced = Some(at);
    }

    #[must_use]
    pub fn id(&self) -> &CardId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn translation(&self) -> &str {
        &self.translation
    }

    #[must_use]
    pub fn sentence_translation(&self) -> &str {
        &self.sentence_translation
    }

    #[must_use]
    pub fn blanked_form(&self) -> Option<&str> {
        self.blanked_form.as_deref()
    }

    /// The full sentence: the prompt with its blank filled by the blanked
    /// form, or by the answer when no form was recorded.
    #[must_use]
    pub fn sentence(&self) -> String {
        restore_sentence(&self.prompt, self.blanked_form().unwrap_or(&self.answer))
    }

    #[must_use]
    pub fn session_progress(&self) -> u8 {
        self.session_progress
    }

    #[must_use]
    pub fn mastery_level(&self) -> u8 {
        self.mastery_level
    }

    #[must_use]
    pub fn session_completed(&self) -> bool {
        self.session_completed
    }

    #[must_use]
    pub fn last_practiced(&self) -> Option<DateTime<Utc>> {
        self.last_practiced
    }

    #[must_use]
    pub fn scheduling_metadata(&self) -> &SchedulingMetadata {
        &self.scheduling_metadata
    }

    #[must_use]
    pub fn phase(&self) -> CardPhase {
        CardPhase::from_progress(self.session_progress)
    }

    /// True while the card is eligible for selection.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session_progress < MASTERY_THRESHOLD
    }

    #[must_use]
    pub fn is_mastered(&self) -> bool {
        !self.is_active()
    }
}

//
// ─── CARD ERRORS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("card prompt cannot be empty")]
    EmptyPrompt,

    #[error("card answer cannot be empty")]
    EmptyAnswer,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
