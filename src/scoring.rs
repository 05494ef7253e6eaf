use crate::util::round_to;

/// One character of the finished input, flagged when it differs from the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffChar {
    pub char: char,
    pub is_error: bool,
}

/// Statistics frozen at the moment a session finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResults {
    pub words_typed: usize,
    pub elapsed_seconds: u64,
    pub wpm: f64,
    pub error_count: usize,
    pub error_percentage: f64,
    pub diff: Vec<DiffChar>,
}

impl SessionResults {
    /// WPM as shown to the user, one decimal place.
    pub fn rounded_wpm(&self) -> f64 {
        round_to(self.wpm, 1)
    }

    /// Error percentage as shown to the user, two decimal places.
    pub fn rounded_error_percentage(&self) -> f64 {
        round_to(self.error_percentage, 2)
    }
}

/// Number of whitespace-separated, non-empty tokens.
pub fn count_words(text: &[char]) -> usize {
    let mut words = 0;
    let mut in_word = false;
    for c in text {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            words += 1;
        }
    }
    words
}

/// Words per minute over `elapsed_secs` whole seconds.
///
/// Returns `0.0` when no second has elapsed.
pub fn words_per_minute(words: usize, elapsed_secs: u64) -> f64 {
    if elapsed_secs == 0 {
        return 0.0;
    }
    words as f64 / (elapsed_secs as f64 / 60.0)
}

/// Compares `typed` against `sample` position by position.
///
/// Only positions present in both are listed. [`score`] counts sample positions
/// past the end of `typed` as errors.
pub fn diff(sample: &[char], typed: &[char]) -> Vec<DiffChar> {
    sample
        .iter()
        .enumerate()
        .filter_map(|(idx, expected)| {
            typed.get(idx).map(|&c| DiffChar {
                char: c,
                is_error: c != *expected,
            })
        })
        .collect()
}

pub fn score(sample: &[char], typed: &[char], elapsed_seconds: u64) -> SessionResults {
    let words_typed = count_words(typed);
    let diff = diff(sample, typed);
    let matched = diff.iter().filter(|d| !d.is_error).count();
    let error_count = sample.len() - matched;

    let error_percentage = if sample.is_empty() {
        0.0
    } else {
        error_count as f64 / sample.len() as f64 * 100.0
    };

    SessionResults {
        words_typed,
        elapsed_seconds,
        wpm: words_per_minute(words_typed, elapsed_seconds),
        error_count,
        error_percentage,
        diff,
    }
}
