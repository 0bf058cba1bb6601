//! Token-budget arithmetic for the context assembler (§4.5).
//!
//! Two primitives: a token estimator and a truncation rule, both defined
//! exactly rather than heuristically so the assembler's budget bookkeeping
//! stays predictable.

/// Estimate how many LLM tokens `text` will cost.
///
/// Per spec this is always `ceil(chars / 4)` — a plain character-count
/// approximation, not a real tokenizer. `chars` counts Unicode scalar
/// values, not bytes, so multi-byte UTF-8 source doesn't inflate the
/// estimate.
pub fn estimate_tokens(text: &str) -> usize {
    let chars = text.chars().count();
    (chars + 3) / 4
}

/// Appended to truncated text so callers can tell a snippet was cut.
pub const TRUNCATION_INDICATOR: &str = "\n... (truncated)";

/// Truncate `text` to fit within `max_tokens`.
///
/// If `text` already fits, it is returned unchanged. Otherwise it is cut
/// at the last newline within 80% of the character limit implied by
/// `max_tokens` (`max_tokens * 4`), and [`TRUNCATION_INDICATOR`] is
/// appended. Cutting at a newline rather than mid-line keeps the result
/// syntactically plausible to read even though it's incomplete.
pub fn truncate_to_fit(text: &str, max_tokens: usize) -> String {
    if estimate_tokens(text) <= max_tokens {
        return text.to_string();
    }

    let char_limit = max_tokens * 4;
    let cutoff = char_limit * 80 / 100;
    let chars: Vec<char> = text.chars().collect();
    let search_end = cutoff.min(chars.len());
    let keep = chars[..search_end]
        .iter()
        .rposition(|&c| c == '\n')
        .unwrap_or(search_end);

    let truncated: String = chars[..keep].iter().collect();
    format!("{truncated}{TRUNCATION_INDICATOR}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_tokens_empty_string() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn estimate_tokens_exact_multiple_of_four() {
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
    }

    #[test]
    fn estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn estimate_tokens_counts_unicode_scalars_not_bytes() {
        // Each of these is a single scalar value despite being multi-byte UTF-8.
        let text = "€€€€"; // 4 scalars, 12 bytes
        assert_eq!(estimate_tokens(text), 1);
    }

    #[test]
    fn estimate_tokens_matches_spec_example() {
        // 1000 * 0.6 * 4 = 2400 chars is the budget referenced in §8's
        // editing-context property; confirm the formula behind that math.
        let text = "x".repeat(2400);
        assert_eq!(estimate_tokens(&text), 600);
    }

    #[test]
    fn truncate_to_fit_returns_unchanged_when_within_budget() {
        let text = "short text";
        assert_eq!(truncate_to_fit(text, 100), text);
    }

    #[test]
    fn truncate_to_fit_cuts_at_last_newline() {
        let text = "line one\nline two\nline three\nline four\nline five";
        let out = truncate_to_fit(text, 5); // char_limit=20, cutoff=16
        assert!(out.ends_with(TRUNCATION_INDICATOR));
        assert!(!out.contains("line four"));
        assert!(out.starts_with("line one"));
    }

    #[test]
    fn truncate_to_fit_falls_back_to_hard_cut_without_newline() {
        let text = "a".repeat(100);
        let out = truncate_to_fit(&text, 5); // char_limit=20, cutoff=16, no newline anywhere
        assert!(out.starts_with(&"a".repeat(16)));
        assert!(out.ends_with(TRUNCATION_INDICATOR));
    }

    #[test]
    fn truncate_to_fit_zero_budget_yields_only_indicator() {
        let text = "anything at all";
        let out = truncate_to_fit(text, 0);
        assert_eq!(out, TRUNCATION_INDICATOR);
    }

    #[test]
    fn truncate_to_fit_never_exceeds_original_length() {
        let text = "a\nbb\nccc\ndddd\neeeee\n".repeat(20);
        let out = truncate_to_fit(&text, 10);
        assert!(out.len() < text.len() + TRUNCATION_INDICATOR.len());
    }
}
