//! Property-based tests for path manipulation functions.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::keep::KeepRules;
    use crate::path::{ancestors, join, matches, split, SEPARATOR};
    use proptest::prelude::*;

    /// A single dot-free path segment.
    fn segment() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-]{1,8}"
    }

    /// A path of one to five segments.
    fn segments() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(segment(), 1..5)
    }

    fn to_path(segments: &[String]) -> String {
        segments
            .iter()
            .fold(String::new(), |prefix, segment| join(&prefix, segment))
    }

    // ============================================================================
    // join / split property tests
    // ============================================================================

    proptest! {
        /// Property: split undoes successive joins
        #[test]
        fn split_inverts_join(segs in segments()) {
            let path = to_path(&segs);
            let parts: Vec<String> = split(&path).into_iter().map(str::to_string).collect();
            prop_assert_eq!(parts, segs);
        }

        /// Property: joining onto an empty prefix yields the bare segment
        #[test]
        fn join_empty_prefix_is_identity(seg in segment()) {
            prop_assert_eq!(join("", &seg), seg);
        }

        /// Property: a joined path has exactly one separator between segments
        #[test]
        fn join_separator_count(segs in segments()) {
            let path = to_path(&segs);
            prop_assert_eq!(path.matches(SEPARATOR).count(), segs.len() - 1);
        }
    }

    // ============================================================================
    // matches property tests
    // ============================================================================

    proptest! {
        /// Property: every path matches itself
        #[test]
        fn matches_is_reflexive(segs in segments()) {
            let path = to_path(&segs);
            prop_assert!(matches(&path, &path));
        }

        /// Property: every path lies beneath each of its segment prefixes
        #[test]
        fn matches_every_prefix(segs in segments()) {
            let path = to_path(&segs);
            for len in 1..=segs.len() {
                let rule = to_path(&segs[..len]);
                prop_assert!(matches(&path, &rule), "{} should match {}", path, rule);
            }
        }

        /// Property: extending the last segment breaks the match
        #[test]
        fn matches_whole_segments_only(segs in segments(), extra in segment()) {
            let rule = to_path(&segs);
            let path = format!("{}{}", rule, extra);
            prop_assert!(!matches(&path, &rule));
        }

        /// Property: a strictly longer rule never matches a shorter path
        #[test]
        fn matches_never_upward(segs in segments(), extra in segment()) {
            let path = to_path(&segs);
            let rule = join(&path, &extra);
            prop_assert!(!matches(&path, &rule));
        }
    }

    // ============================================================================
    // ancestors property tests
    // ============================================================================

    proptest! {
        /// Property: ancestors are the strict prefixes, nearest first
        #[test]
        fn ancestors_are_strict_prefixes(segs in segments()) {
            let path = to_path(&segs);
            let found: Vec<String> = ancestors(&path).map(str::to_string).collect();
            let expected: Vec<String> = (1..segs.len()).rev().map(|len| to_path(&segs[..len])).collect();
            prop_assert_eq!(found, expected);
        }
    }

    // ============================================================================
    // keep rule property tests
    // ============================================================================

    proptest! {
        /// Property: a kept rule protects everything beneath it
        #[test]
        fn kept_rule_covers_descendants(rule in segments(), rest in segments()) {
            let rule_path = to_path(&rule);
            let keep = KeepRules::new([rule_path.as_str()]);
            let mut all = rule.clone();
            all.extend(rest);
            prop_assert!(keep.is_kept(&to_path(&all)));
        }

        /// Property: nested rules are exactly the rules strictly beneath a path
        #[test]
        fn nested_under_is_strict(segs in segments(), extra in segment()) {
            let path = to_path(&segs);
            let child = join(&path, &extra);
            let keep = KeepRules::new([path.as_str(), child.as_str()]);
            let nested: Vec<&str> = keep.nested_under(&path).collect();
            prop_assert_eq!(nested, vec![child.as_str()]);
        }

        /// Property: parsing a comma list is insensitive to surrounding spaces
        #[test]
        fn keep_parse_trims(segs in prop::collection::vec(segment(), 1..4)) {
            let spaced = segs.iter().map(|s| format!(" {} ", s)).collect::<Vec<_>>().join(",");
            let keep = KeepRules::parse(&spaced);
            for seg in &segs {
                prop_assert!(keep.is_kept(seg));
            }
        }
    }
}
