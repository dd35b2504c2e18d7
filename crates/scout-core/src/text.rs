//! Text helpers: termination-sentinel stripping and UTF-8-safe truncation.

/// Out-of-band "I am done" token appended by answer-generating sources.
pub const TERMINATION_SENTINEL: &str = "TERMINATE";

/// Strip a trailing [`TERMINATION_SENTINEL`] from generated text.
///
/// Trailing whitespace is trimmed, the sentinel is removed on exact suffix
/// match (case-sensitive), and whitespace left before the sentinel is trimmed
/// as well. Text that does not end with the sentinel is returned with only
/// the trailing-whitespace trim. Text that legitimately ends with the literal
/// word is stripped unconditionally — a known limitation of the protocol.
#[must_use]
pub fn strip_termination_sentinel(text: &str) -> &str {
    let trimmed = text.trim_end();
    match trimmed.strip_suffix(TERMINATION_SENTINEL) {
        Some(rest) => rest.trim_end(),
        None => trimmed,
    }
}

/// Truncate a string to at most `max_bytes` bytes without splitting a
/// multi-byte character.
///
/// Returns the longest prefix of `s` whose byte length is ≤ `max_bytes` and
/// that ends on a char boundary.
#[inline]
#[must_use]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    // `str::floor_char_boundary` is nightly-only; walk back by hand.
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ── strip_termination_sentinel ───────────────────────────────────────

    #[test]
    fn strips_trailing_sentinel() {
        assert_eq!(
            strip_termination_sentinel("Hello world TERMINATE"),
            "Hello world"
        );
    }

    #[test]
    fn no_sentinel_is_unchanged() {
        assert_eq!(strip_termination_sentinel("Hello world"), "Hello world");
    }

    #[test]
    fn sentinel_on_own_line() {
        assert_eq!(
            strip_termination_sentinel("Hello world\nTERMINATE\n"),
            "Hello world"
        );
    }

    #[test]
    fn sentinel_alone_yields_empty() {
        assert_eq!(strip_termination_sentinel("TERMINATE"), "");
    }

    #[test]
    fn lowercase_sentinel_is_kept() {
        assert_eq!(strip_termination_sentinel("done terminate"), "done terminate");
    }

    #[test]
    fn sentinel_in_the_middle_is_kept() {
        assert_eq!(
            strip_termination_sentinel("TERMINATE early and often"),
            "TERMINATE early and often"
        );
    }

    #[test]
    fn only_trailing_whitespace_trimmed() {
        assert_eq!(strip_termination_sentinel("  hi  "), "  hi");
    }

    proptest! {
        #[test]
        fn stripped_never_ends_with_sentinel(body in "[a-zA-Z0-9 .\n]{0,60}") {
            let with_sentinel = format!("{body} {TERMINATION_SENTINEL}");
            let stripped = strip_termination_sentinel(&with_sentinel);
            // One strip pass: the result carries no sentinel that the input
            // appended, and it never grows.
            prop_assert!(stripped.len() <= with_sentinel.len());
            prop_assert_eq!(stripped, strip_termination_sentinel(body.trim_end()));
        }

        #[test]
        fn truncation_is_boundary_safe(s in "\\PC{0,40}", max in 0usize..50) {
            let out = truncate_str(&s, max);
            prop_assert!(out.len() <= max || s.len() <= max);
            prop_assert!(s.starts_with(out));
        }
    }

    // ── truncate_str ─────────────────────────────────────────────────────

    #[test]
    fn ascii_within_limit() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn ascii_truncated() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn multibyte_snaps_back() {
        // 'é' is 2 bytes: cutting inside it must fall back to byte 3.
        assert_eq!(truncate_str("café", 4), "caf");
        assert_eq!(truncate_str("café", 5), "café");
    }

    #[test]
    fn zero_max() {
        assert_eq!(truncate_str("hello", 0), "");
    }
}
