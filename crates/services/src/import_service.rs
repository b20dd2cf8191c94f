//! CSV import and export of card pools.
//!
//! The interchange format has the columns `word, sentence, word_mean,
//! sentence_translation`; exports add a `tags` column marking mastered rows so
//! the file can be loaded into third-party flashcard tools.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use drill_core::blank::{blank_word, clean_sentence, clean_word};
use drill_core::model::{Card, CardId};
use drill_core::pool::ensure_unique_ids;

use crate::error::ImportError;

/// Tag written for cards that reached mastery.
pub const MASTERED_TAG: &str = "mastered";

const REQUIRED_COLUMNS: [&str; 2] = ["word", "sentence"];

/// Counters gathered while importing a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub failed: usize,
    /// Rows whose sentence changed during cleanup.
    pub cleaned_sentences: usize,
    /// Rows whose sentence carried a `|` suffix that was dropped.
    pub pipe_cleaned: usize,
    /// Rows where the word (or a variation) was found and blanked.
    pub word_matched: usize,
}

/// Cards produced by an import along with its counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedCards {
    pub cards: Vec<Card>,
    pub report: ImportReport,
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(default)]
    word: Option<String>,
    #[serde(default)]
    sentence: Option<String>,
    #[serde(default)]
    word_mean: Option<String>,
    #[serde(default)]
    sentence_translation: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    word: &'a str,
    sentence: String,
    word_mean: &'a str,
    sentence_translation: &'a str,
    tags: &'static str,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Read cards from CSV.
///
/// Rows without a `word` or `sentence` (or that cannot be decoded) are counted
/// as failures and skipped. Each kept row becomes an untouched card whose
/// prompt is the cleaned sentence with the word blanked and whose id is
/// `{word}_{row_index}`.
///
/// # Errors
///
/// Returns `ImportError::MissingColumn` if the header lacks `word` or
/// `sentence`, or `ImportError::Csv` if the header cannot be read.
pub fn import_csv<R: Read>(reader: R) -> Result<ImportedCards, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: csv::StringRecord = reader
        .headers()?
        .iter()
        .map(str::to_ascii_lowercase)
        .collect();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ImportError::MissingColumn(column));
        }
    }
    reader.set_headers(headers);

    let mut report = ImportReport::default();
    let mut cards = Vec::new();

    for (row_index, result) in reader.deserialize::<ImportRow>().enumerate() {
        report.total_rows += 1;

        let row = match result {
            Ok(row) => row,
            Err(err) => {
                debug!(row_index, error = %err, "skipped undecodable row");
                report.failed += 1;
                continue;
            }
        };

        let (Some(word), Some(sentence)) = (non_blank(row.word), non_blank(row.sentence)) else {
            report.failed += 1;
            continue;
        };

        let cleaned = clean_sentence(&sentence);
        if cleaned != sentence {
            report.cleaned_sentences += 1;
            if sentence.contains('|') {
                report.pipe_cleaned += 1;
            }
        }

        let answer = clean_word(&word);
        let blanked = blank_word(&cleaned, &answer);
        if blanked.is_matched() {
            report.word_matched += 1;
        }

        match Card::new(CardId::synthesize(&answer, row_index), blanked.text, answer) {
            Ok(card) => {
                cards.push(
                    card.with_blanked_form(blanked.matched)
                        .with_translation(non_blank(row.word_mean).unwrap_or_default())
                        .with_sentence_translation(
                            non_blank(row.sentence_translation).unwrap_or_default(),
                        ),
                );
                report.imported += 1;
            }
            Err(err) => {
                debug!(row_index, error = %err, "skipped invalid row");
                report.failed += 1;
            }
        }
    }

    info!(
        total = report.total_rows,
        imported = report.imported,
        failed = report.failed,
        matched = report.word_matched,
        "imported csv"
    );

    Ok(ImportedCards {
        cards: ensure_unique_ids(cards),
        report,
    })
}

/// Write every card as CSV, tagging mastered ones.
///
/// The sentence column carries the full sentence with the blanked text put
/// back as it was written at import time.
///
/// # Errors
///
/// Returns `ImportError` if writing fails.
pub fn export_csv<'a, W, I>(cards: I, writer: W) -> Result<usize, ImportError>
where
    W: Write,
    I: IntoIterator<Item = &'a Card>,
{
    let mut writer = csv::Writer::from_writer(writer);
    let mut written = 0;
    for card in cards {
        writer.serialize(ExportRow {
            word: card.answer(),
            sentence: card.sentence(),
            word_mean: card.translation(),
            sentence_translation: card.sentence_translation(),
            tags: if card.is_mastered() { MASTERED_TAG } else { "" },
        })?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Write only mastered cards.
///
/// # Errors
///
/// Returns `ImportError::NothingMastered` if no card is mastered, or another
/// `ImportError` if writing fails.
pub fn export_mastered_csv<W: Write>(cards: &[Card], writer: W) -> Result<usize, ImportError> {
    let mastered: Vec<&Card> = cards.iter().filter(|card| card.is_mastered()).collect();
    if mastered.is_empty() {
        return Err(ImportError::NothingMastered);
    }
    export_csv(mastered, writer)
}
