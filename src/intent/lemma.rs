//! Lightweight tokenizer and verb lemmatizer
//!
//! Only the verbs the command rules care about are lemmatized; every other
//! word is its own lemma.

/// Base forms recognized by the lemmatizer
const VERBS: &[&str] = &[
    "open", "launch", "start", "create", "make", "search", "type", "write", "close", "increase",
    "decrease", "play", "stop",
];

/// Irregular inflections
const IRREGULAR: &[(&str, &str)] = &[
    ("wrote", "write"),
    ("written", "write"),
    ("made", "make"),
];

/// A word of the utterance with its lemma
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lower-cased surface form
    pub text: String,
    /// Dictionary form
    pub lemma: String,
}

/// Split text into lower-cased word tokens with lemmas
#[must_use]
pub fn tokenize(text: &str) -> Vec<Token> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(|w| Token {
            text: w.to_string(),
            lemma: lemmatize(w),
        })
        .collect()
}

/// Dictionary form of a lower-case word
#[must_use]
pub fn lemmatize(word: &str) -> String {
    if let Some((_, base)) = IRREGULAR.iter().find(|(form, _)| *form == word) {
        return (*base).to_string();
    }

    VERBS
        .iter()
        .find(|base| inflections(base).any(|form| form == word))
        .map_or_else(|| word.to_string(), |base| (*base).to_string())
}

/// Regular inflected forms of a base verb
fn inflections(base: &str) -> impl Iterator<Item = String> + '_ {
    let stem = base.strip_suffix('e').unwrap_or(base);
    let doubled = base
        .chars()
        .last()
        .filter(|c| matches!(c, 'p' | 't') && base.len() <= 4)
        .map(|c| format!("{base}{c}"));

    let sibilant = base.ends_with("ch") || base.ends_with("sh") || base.ends_with('s');
    let third_person = if sibilant {
        format!("{base}es")
    } else {
        format!("{base}s")
    };

    [
        Some(base.to_string()),
        Some(third_person),
        Some(format!("{stem}ed")),
        Some(format!("{stem}ing")),
        doubled.as_ref().map(|d| format!("{d}ed")),
        doubled.map(|d| format!("{d}ing")),
    ]
    .into_iter()
    .flatten()
}

/// Whether any token's lemma is in `lemmas`
#[must_use]
pub fn has_lemma(tokens: &[Token], lemmas: &[&str]) -> bool {
    tokens.iter().any(|t| lemmas.contains(&t.lemma.as_str()))
}
