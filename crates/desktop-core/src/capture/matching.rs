//! Window title matching
//!
//! A [`WindowSelector`] picks one window out of the enumerated list in one of
//! two ways:
//!
//! 1. **Regex** (`use_regex`): case-insensitive search, the first window in
//!    enumeration order whose title matches wins.
//! 2. **Fuzzy** (default): every title gets a 0-100 partial-ratio score and
//!    the best one wins if it reaches the selector's threshold. Ties keep
//!    enumeration order.
//!
//! # Security
//!
//! Regex patterns are limited to 1MB and their DFA to 10MB so a hostile
//! pattern cannot stall the server.
//!
//! # Performance
//!
//! Compiled regexes are cached in a global LRU cache. A global cache suits
//! tokio tasks that migrate between worker threads better than thread-locals.

use std::num::NonZeroUsize;

use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};

use crate::{
    error::{DesktopError, DesktopResult},
    model::{WindowInfo, WindowSelector},
};

/// Maximum regex pattern size (1MB)
const MAX_REGEX_SIZE: usize = 1_048_576;

/// Maximum DFA size (10MB)
const MAX_DFA_SIZE: usize = 10 * 1_048_576;

const MAX_REGEX_CACHE_SIZE: usize = 32;

/// Compiled patterns, including the compile error for invalid ones
static REGEX_CACHE: Lazy<Mutex<LruCache<String, Result<Regex, String>>>> =
    Lazy::new(|| {
        let capacity = NonZeroUsize::new(MAX_REGEX_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Mutex::new(LruCache::new(capacity))
    });

fn get_or_compile_regex(pattern: &str) -> DesktopResult<Regex> {
    let mut cache = REGEX_CACHE.lock();

    let compiled = match cache.get(pattern) {
        Some(cached) => cached.clone(),
        None => {
            let compiled = compile_regex_with_limits(pattern);
            cache.put(pattern.to_string(), compiled.clone());
            compiled
        }
    };

    compiled.map_err(|reason| DesktopError::invalid("title_pattern", reason))
}

fn compile_regex_with_limits(pattern: &str) -> Result<Regex, String> {
    if pattern.len() > MAX_REGEX_SIZE {
        return Err("regex pattern exceeds 1MB".to_string());
    }

    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(MAX_REGEX_SIZE)
        .dfa_size_limit(MAX_DFA_SIZE)
        .build()
        .map_err(|e| e.to_string())
}

/// Scores how well `pattern` matches somewhere inside `title` (0-100)
///
/// A case-insensitive substring scores 100. Otherwise the score is the best
/// of two measures: the longest common subsequence between the pattern and
/// the best-aligned title slice of the same length, and the skim fuzzy score
/// normalised against the pattern matched with itself.
///
/// ```
/// use desktop_core::capture::matching::fuzzy_score;
///
/// assert_eq!(fuzzy_score("firefox", "Mozilla Firefox"), 100);
/// assert!(fuzzy_score("Firefix", "Mozilla Firefox") >= 80);
/// assert!(fuzzy_score("spreadsheet", "Terminal") < 60);
/// ```
pub fn fuzzy_score(pattern: &str, title: &str) -> u8 {
    let pattern = pattern.to_lowercase();
    let title = title.to_lowercase();
    if pattern.is_empty() || title.is_empty() {
        return 0;
    }
    if title.contains(&pattern) {
        return 100;
    }

    partial_lcs_ratio(&pattern, &title).max(skim_ratio(&pattern, &title))
}

fn partial_lcs_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let window = short.len();
    let best = (0..=long.len() - window)
        .map(|start| lcs_len(short, &long[start..start + window]))
        .max()
        .unwrap_or(0);

    (best * 100 / window) as u8
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

fn skim_ratio(pattern: &str, title: &str) -> u8 {
    let matcher = SkimMatcherV2::default();
    let Some(perfect) = matcher.fuzzy_match(pattern, pattern).filter(|s| *s > 0) else {
        return 0;
    };

    matcher
        .fuzzy_match(title, pattern)
        .map(|score| (score.max(0) * 100 / perfect).min(100) as u8)
        .unwrap_or(0)
}

/// Stateless window matcher
#[derive(Debug, Clone, Default)]
pub struct WindowMatcher;

impl WindowMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Finds the window the selector refers to
    ///
    /// Returns `Ok(None)` for a blank pattern or when nothing matches. An
    /// invalid regex is reported as [`DesktopError::InvalidParameter`].
    pub fn find_match<'a>(
        &self,
        selector: &WindowSelector,
        windows: &'a [WindowInfo],
    ) -> DesktopResult<Option<&'a WindowInfo>> {
        let Some(pattern) = selector.pattern() else {
            tracing::debug!("WindowMatcher: no title pattern, no match");
            return Ok(None);
        };

        if selector.use_regex {
            let regex = get_or_compile_regex(pattern)?;
            let found = windows.iter().find(|w| regex.is_match(&w.title));
            if let Some(window) = found {
                tracing::debug!("WindowMatcher: regex '{}' matched '{}'", pattern, window.title);
            }
            return Ok(found);
        }

        let mut best: Option<(&WindowInfo, u8)> = None;
        for window in windows {
            let score = fuzzy_score(pattern, &window.title);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((window, score));
            }
        }

        Ok(match best {
            Some((window, score)) if score >= selector.threshold => {
                tracing::debug!(
                    "WindowMatcher: best fuzzy match '{}' with score {}",
                    window.title,
                    score
                );
                Some(window)
            }
            Some((window, score)) => {
                tracing::debug!(
                    "WindowMatcher: best fuzzy match '{}' scored {} below threshold {}",
                    window.title,
                    score,
                    selector.threshold
                );
                None
            }
            None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Region;

    fn windows() -> Vec<WindowInfo> {
        vec![
            WindowInfo::new("1", "Mozilla Firefox", Region::new(0, 0, 800, 600)),
            WindowInfo::new("2", "Visual Studio Code", Region::new(100, 100, 1200, 800)),
            WindowInfo::new("3", "Terminal - Alacritty", Region::new(-1920, 0, 640, 480)),
            WindowInfo::new("4", "Firefox Developer Edition", Region::new(0, 0, 800, 600)),
        ]
    }

    #[test]
    fn test_empty_pattern_matches_nothing() {
        let matcher = WindowMatcher::new();
        let windows = windows();
        assert!(matcher.find_match(&WindowSelector::default(), &windows).unwrap().is_none());
        assert!(matcher.find_match(&WindowSelector::by_title(""), &windows).unwrap().is_none());
    }

    #[test]
    fn test_regex_first_match_in_enumeration_order() {
        let windows = windows();
        let found = WindowMatcher::new()
            .find_match(&WindowSelector::by_regex("fire.ox"), &windows)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "1");
    }

    #[test]
    fn test_regex_is_case_insensitive() {
        let windows = windows();
        let found = WindowMatcher::new()
            .find_match(&WindowSelector::by_regex("^TERMINAL"), &windows)
            .unwrap();
        assert_eq!(found.map(|w| w.id.as_str()), Some("3"));
    }

    #[test]
    fn test_regex_without_match() {
        let windows = windows();
        let found = WindowMatcher::new()
            .find_match(&WindowSelector::by_regex("^Slack$"), &windows)
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_invalid_regex_is_error() {
        let windows = windows();
        let result = WindowMatcher::new().find_match(&WindowSelector::by_regex("(unclosed"), &windows);
        assert!(matches!(
            result,
            Err(DesktopError::InvalidParameter { ref parameter, .. }) if parameter == "title_pattern"
        ));
    }

    #[test]
    fn test_fuzzy_substring_ties_keep_order() {
        let windows = windows();
        let found = WindowMatcher::new()
            .find_match(&WindowSelector::by_title("firefox"), &windows)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "1");
    }

    #[test]
    fn test_fuzzy_prefers_best_score() {
        let windows = windows();
        let found = WindowMatcher::new()
            .find_match(&WindowSelector::by_title("Visual Studo Code"), &windows)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "2");
    }

    #[test]
    fn test_fuzzy_threshold_gates_match() {
        let windows = windows();
        let matcher = WindowMatcher::new();

        let loose = WindowSelector::by_title("Alacrity").with_threshold(60);
        assert_eq!(matcher.find_match(&loose, &windows).unwrap().map(|w| w.id.as_str()), Some("3"));

        let strict = WindowSelector::by_title("Alacrity").with_threshold(100);
        assert!(matcher.find_match(&strict, &windows).unwrap().is_none());
    }

    #[test]
    fn test_no_windows() {
        let found = WindowMatcher::new()
            .find_match(&WindowSelector::by_title("anything"), &[])
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_fuzzy_score_bounds() {
        assert_eq!(fuzzy_score("", "Firefox"), 0);
        assert_eq!(fuzzy_score("code", ""), 0);
        assert_eq!(fuzzy_score("CODE", "Visual Studio Code"), 100);
        assert!(fuzzy_score("Mozilla Firefox browser window", "Firefox") <= 100);
        assert!(fuzzy_score("xyz", "Terminal") < 60);
    }

    #[test]
    fn test_regex_cache_reuses_compiled_pattern() {
        let first = get_or_compile_regex("cached-pattern-\\d+").unwrap();
        let second = get_or_compile_regex("cached-pattern-\\d+").unwrap();
        assert_eq!(first.as_str(), second.as_str());
        assert!(REGEX_CACHE.lock().contains("cached-pattern-\\d+"));
    }
}
