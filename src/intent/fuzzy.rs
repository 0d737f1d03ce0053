//! Fuzzy string scoring on a 0-100 scale
//!
//! Scores are based on the longest common subsequence of characters:
//! `ratio = 2 * lcs / (len(a) + len(b))`, so identical strings score 100 and
//! strings with no characters in common score 0.

/// Similarity of two whole strings
#[must_use]
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best similarity of the shorter string against any equally long window of the longer one
#[must_use]
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return 0;
    }

    long.windows(short.len())
        .map(|window| ratio_chars(&short, window))
        .max()
        .unwrap_or(0)
}

/// Similarity after sorting the words of each string
#[must_use]
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Combined score tolerant of word order and of extra surrounding words
///
/// Strings of similar length are compared whole; when one is much longer,
/// the best-matching window of the longer string counts (scaled down).
#[must_use]
pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let a = normalize(a);
    let b = normalize(b);
    let (len_a, len_b) = (a.chars().count(), b.chars().count());

    if len_a == 0 || len_b == 0 {
        return 0;
    }

    let base = u32::from(ratio(&a, &b));
    let sorted = u32::from(token_sort_ratio(&a, &b)) * 95 / 100;
    let (longer, shorter) = (len_a.max(len_b), len_a.min(len_b));

    // length ratio below 1.5
    if longer * 2 < shorter * 3 {
        return clamp(base.max(sorted));
    }

    let scale = if longer < shorter * 8 { 90 } else { 60 };
    let partial = u32::from(partial_ratio(&a, &b)) * scale / 100;
    clamp(base.max(partial).max(sorted * scale / 100))
}

/// Pick the best-scoring choice for `query`
///
/// Ties keep the earliest choice. Returns `None` only when there are no choices.
#[must_use]
pub fn extract_one<'a, I, S>(query: &str, choices: I, scorer: fn(&str, &str) -> u8) -> Option<(&'a str, u8)>
where
    I: IntoIterator<Item = &'a S>,
    S: AsRef<str> + ?Sized + 'a,
{
    let mut best: Option<(&'a str, u8)> = None;

    for choice in choices {
        let choice: &'a str = choice.as_ref();
        let score = scorer(query, choice);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((choice, score));
        }
    }

    best
}

fn ratio_chars(a: &[char], b: &[char]) -> u8 {
    let total = a.len() + b.len();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let matched = lcs_len(a, b);
    // Rounded integer percentage; matched <= min(len) so the result is <= 100
    let score = (200 * matched + total / 2) / total;
    u8::try_from(score).unwrap_or(100)
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn normalize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn clamp(score: u32) -> u8 {
    u8::try_from(score.min(100)).unwrap_or(100)
}
