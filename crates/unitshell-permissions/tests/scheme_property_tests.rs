//! Property-based tests for scheme coverage
//!
//! A granted scheme covers exactly itself and the schemes below it in the
//! dotted hierarchy; the root scheme covers everything.

use proptest::prelude::*;
use unitshell_permissions::Scheme;

fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn scheme_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment_strategy(), 1..5)
}

proptest! {
    #[test]
    fn prop_every_prefix_covers_the_full_scheme(segments in scheme_strategy()) {
        let full = Scheme::new(segments.join("."));
        for len in 1..=segments.len() {
            let prefix = Scheme::new(segments[..len].join("."));
            prop_assert!(prefix.covers(&full), "{} should cover {}", prefix, full);
        }
    }

    #[test]
    fn prop_longer_scheme_never_covers_its_parent(segments in scheme_strategy(), extra in segment_strategy()) {
        let parent = Scheme::new(segments.join("."));
        let child = Scheme::new(format!("{}.{}", segments.join("."), extra));
        prop_assert!(!child.covers(&parent));
    }

    #[test]
    fn prop_root_covers_everything(segments in scheme_strategy()) {
        prop_assert!(Scheme::root().covers(&Scheme::new(segments.join("."))));
    }

    #[test]
    fn prop_partial_segment_is_not_a_prefix(segments in scheme_strategy(), suffix in segment_strategy()) {
        let granted = Scheme::new(segments.join("."));
        let required = Scheme::new(format!("{}{}", segments.join("."), suffix));
        prop_assert!(!granted.covers(&required));
    }
}
