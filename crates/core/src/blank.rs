//! Sentence cleanup and word blanking used when cards are imported.

use regex::Regex;

/// Marker that replaces the target word in a card prompt.
pub const BLANK_MARKER: &str = "___";

const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("person", "people"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("mouse", "mice"),
];

/// Result of blanking a word out of a sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blanked {
    pub text: String,
    /// The text the blank replaced, as written in the sentence. `None` when
    /// neither the word nor any variation occurs.
    pub matched: Option<String>,
}

impl Blanked {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }
}

/// Normalize an imported sentence.
///
/// Drops everything after the first `|`, collapses whitespace and terminates
/// the sentence with `.` unless it already ends in `.`, `!` or `?`.
#[must_use]
pub fn clean_sentence(sentence: &str) -> String {
    let head = sentence.split('|').next().unwrap_or_default();
    let mut cleaned = head.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return cleaned;
    }
    if !cleaned.ends_with(['.', '!', '?']) {
        cleaned.push('.');
    }
    cleaned
}

/// Trim and lower-case an imported target word.
#[must_use]
pub fn clean_word(word: &str) -> String {
    word.trim().to_lowercase()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Singular/plural and irregular forms of `word`, each also capitalized.
///
/// The word itself comes first; duplicates are removed keeping first-seen order.
#[must_use]
pub fn word_variations(word: &str) -> Vec<String> {
    let lower = word.to_lowercase();
    let mut forms = vec![word.to_owned()];

    if let Some(singular) = lower.strip_suffix('s') {
        forms.push(singular.to_owned());
    } else {
        forms.push(format!("{lower}s"));
    }

    if let Some(stem) = lower.strip_suffix("es") {
        forms.push(stem.to_owned());
    } else if !lower.ends_with('s') {
        forms.push(format!("{lower}es"));
    }

    if let Some(stem) = lower.strip_suffix("ies") {
        forms.push(format!("{stem}y"));
    } else if let Some(stem) = lower.strip_suffix('y').filter(|stem| !stem.is_empty()) {
        forms.push(format!("{stem}ies"));
    }

    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *singular {
            forms.push((*plural).to_owned());
        } else if lower == *plural {
            forms.push((*singular).to_owned());
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(forms.len() * 2);
    for form in forms {
        if form.is_empty() {
            continue;
        }
        let capitalized = capitalize(&form);
        for candidate in [form, capitalized] {
            if !out.contains(&candidate) {
                out.push(candidate);
            }
        }
    }
    out
}

fn whole_word(word: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))).ok()
}

/// Replace the first whole-word occurrence of `word` (or of one of its
/// variations) with [`BLANK_MARKER`].
#[must_use]
pub fn blank_word(sentence: &str, word: &str) -> Blanked {
    let target = clean_word(word);
    if target.is_empty() {
        return Blanked {
            text: sentence.to_owned(),
            matched: None,
        };
    }

    let exact = std::iter::once(target.clone());
    let variations = word_variations(&target).into_iter().skip(1);
    for candidate in exact.chain(variations) {
        let Some(re) = whole_word(&candidate) else {
            continue;
        };
        if let Some(found) = re.find(sentence) {
            return Blanked {
                text: re.replacen(sentence, 1, BLANK_MARKER).into_owned(),
                matched: Some(found.as_str().to_owned()),
            };
        }
    }

    Blanked {
        text: sentence.to_owned(),
        matched: None,
    }
}

/// Put `answer` back in place of the first blank marker.
///
/// Pass [`Blanked::matched`] when it is known to recover the exact sentence.
#[must_use]
pub fn restore_sentence(prompt: &str, answer: &str) -> String {
    prompt.replacen(BLANK_MARKER, answer, 1)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
