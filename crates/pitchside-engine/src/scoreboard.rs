//! Heuristic scoreboard text parsing.
//!
//! OCR output from broadcast overlays is messy, so extraction is an
//! ordered chain of progressively looser patterns with early return. Each
//! pattern stays its own regex so its priority can be tested in isolation.

use std::sync::LazyLock;

use regex::Regex;

/// Team tokens recognized in scoreboard overlays.
const TEAM_TOKENS: &[&str] = &[
    "ARG", "AUS", "BEL", "BRA", "CHI", "COL", "CRO", "DEN", "ENG", "ESP", "FRA", "GER", "ITA",
    "JPN", "KOR", "MEX", "NED", "PER", "POL", "POR", "SUI", "SWE", "URU", "USA",
];

fn team_alternation() -> String {
    TEAM_TOKENS.join("|")
}

static TEAM_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})\b", team_alternation())).unwrap()
});

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

static STANDALONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{1,2}\b").unwrap());

/// Patterns tried in order; each captures the two score numbers.
static SCORE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let teams = team_alternation();
    vec![
        // Two team tokens with both numbers between them: "ARG 0-2 POR"
        Regex::new(&format!(
            r"(?i)\b(?:{teams})\b\D*?(\d{{1,2}})\D+?(\d{{1,2}})\D*?\b(?:{teams})\b"
        ))
        .unwrap(),
        // Numbers flanking the team tokens: "0 ARG POR 2"
        Regex::new(&format!(
            r"(?i)\b(\d{{1,2}})\s+(?:{teams})\b.*?\b(?:{teams})\s+(\d{{1,2}})\b"
        ))
        .unwrap(),
        // Dash-separated pair anywhere
        Regex::new(r"\b(\d{1,2})\s*-\s*(\d{1,2})\b").unwrap(),
        // Whitespace-separated pair anywhere
        Regex::new(r"\b(\d{1,2})\s+(\d{1,2})\b").unwrap(),
    ]
});

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract a normalized `"A-B"` score from free-form recognized text.
///
/// Tries the team-anchored patterns first, then separator pairs, then the
/// first two standalone 1-2 digit numbers in order of appearance. Returns
/// `None` when fewer than two such numbers exist.
pub fn extract_score(text: &str) -> Option<String> {
    let text = normalize(text);

    for pattern in SCORE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&text) {
            return Some(format!("{}-{}", &caps[1], &caps[2]));
        }
    }

    // Fallback: first two standalone numbers in order of appearance.
    let mut numbers = STANDALONE_NUMBER.find_iter(&text);
    let first = numbers.next()?;
    let second = numbers.next()?;
    Some(format!("{}-{}", first.as_str(), second.as_str()))
}

/// Whether a recognized text is worth running score extraction on.
///
/// Requires at least one team token and at least two numeric substrings,
/// which filters out clock and period overlays carrying a single number.
pub fn is_scoreboard_candidate(text: &str) -> bool {
    TEAM_TOKEN.is_match(text) && NUMBER.find_iter(text).count() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_anchored_extraction() {
        assert_eq!(extract_score("ARG 0 2 POR"), Some("0-2".to_string()));
        assert_eq!(extract_score("ARG 0-2 POR"), Some("0-2".to_string()));
    }

    #[test]
    fn test_leading_noise_number_is_skipped() {
        // The "2" before the first team token is overlay noise; the
        // team-anchored pattern starts at "ARG" and ignores it.
        assert_eq!(extract_score("2 ARG 0 2 POR"), Some("0-2".to_string()));
    }

    #[test]
    fn test_flanking_numbers() {
        assert_eq!(extract_score("0 ARG POR 2"), Some("0-2".to_string()));
    }

    #[test]
    fn test_case_insensitive_teams() {
        assert_eq!(extract_score("arg 1-1 por"), Some("1-1".to_string()));
    }

    #[test]
    fn test_generic_fallback_pair() {
        assert_eq!(extract_score("7 9"), Some("7-9".to_string()));
    }

    #[test]
    fn test_period_overlay_yields_nothing() {
        assert_eq!(extract_score("1st PERIOD"), None);
    }

    #[test]
    fn test_single_number_yields_nothing() {
        assert_eq!(extract_score("HALF 45"), None);
        assert_eq!(extract_score(""), None);
    }

    #[test]
    fn test_whitespace_is_normalized() {
        assert_eq!(extract_score("  ARG   0   2\tPOR "), Some("0-2".to_string()));
    }

    #[test]
    fn test_candidate_gate() {
        assert!(is_scoreboard_candidate("ARG 0 2 POR"));
        assert!(is_scoreboard_candidate("arg 0-2 por"));
        // One number only
        assert!(!is_scoreboard_candidate("ARG 1 POR"));
        // Two numbers but no team token
        assert!(!is_scoreboard_candidate("45:00 2nd"));
        assert!(!is_scoreboard_candidate("1st PERIOD"));
    }
}
