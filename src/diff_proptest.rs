//! Property-based tests for the three-way comparison and its application.
//!
//! Trees are drawn from a small key alphabet so that the old defaults, the
//! new defaults and the user's values overlap often.

#[cfg(test)]
mod proptest_tests {
    use std::collections::BTreeSet;

    use crate::apply::apply;
    use crate::diff::{compare, diff, CompareOptions, Delta};
    use crate::document::{Document, Format};
    use crate::error::{Error, Operation};
    use crate::keep::KeepRules;
    use crate::path;
    use crate::value;
    use proptest::prelude::*;
    use serde_yaml::{Mapping, Value};

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            (-100i64..100).prop_map(Value::from),
            "[a-z]{1,5}".prop_map(Value::from),
            any::<bool>().prop_map(Value::Bool),
            prop::collection::vec((0i64..10).prop_map(Value::from), 0..3).prop_map(Value::Sequence),
        ]
    }

    fn mapping<S: Strategy<Value = Value>>(inner: S) -> impl Strategy<Value = Value> {
        prop::collection::btree_map("[a-d]", inner, 0..4).prop_map(|entries| {
            Value::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (Value::String(k), v))
                    .collect::<Mapping>(),
            )
        })
    }

    /// A values tree: always a mapping at the root.
    fn tree() -> impl Strategy<Value = Value> {
        mapping(leaf().prop_recursive(3, 24, 4, mapping))
    }

    /// A keep rule of one or two segments over the same alphabet.
    fn rule() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-d]", 1..3).prop_map(|segs| segs.join("."))
    }

    /// Apply `delta` to `doc`. Removals of paths the user had already
    /// dropped are the only failures allowed.
    fn apply_allowing_absent(delta: &Delta, doc: &mut Document) -> Result<(), TestCaseError> {
        match apply(delta, doc) {
            Ok(_) => Ok(()),
            Err(Error::Reconciliation { failures }) => {
                for failure in &failures {
                    prop_assert_eq!(failure.operation, Operation::Delete);
                    prop_assert!(
                        matches!(failure.error, Error::PathNotFound { .. }),
                        "unexpected failure: {}", failure
                    );
                }
                Ok(())
            }
            Err(other) => Err(TestCaseError::fail(other.to_string())),
        }
    }

    fn upgraded(
        old: &Value,
        new: &Value,
        user: &Value,
        options: &CompareOptions,
    ) -> Result<Value, TestCaseError> {
        let delta = compare(old, new, user, options);
        let mut doc = Document::from_value(user, Format::Yaml);
        apply_allowing_absent(&delta, &mut doc)?;
        Ok(doc.to_value())
    }

    proptest! {
        /// Property: a path is classified at most once
        #[test]
        fn delta_classes_are_disjoint(old in tree(), new in tree(), user in tree()) {
            let delta = compare(&old, &new, &user, &CompareOptions::default());
            let added: BTreeSet<_> = delta.added.keys().collect();
            let modified: BTreeSet<_> = delta.modified.keys().collect();
            let removed: BTreeSet<_> = delta.removed.keys().collect();
            prop_assert!(added.is_disjoint(&modified));
            prop_assert!(added.is_disjoint(&removed));
            prop_assert!(modified.is_disjoint(&removed));
        }

        /// Property: the user's value at a kept path survives the upgrade
        #[test]
        fn kept_paths_are_untouched(
            old in tree(),
            new in tree(),
            user in tree(),
            kept in prop::collection::vec(rule(), 1..3),
        ) {
            let options = CompareOptions {
                keep: KeepRules::new(&kept),
                ignore_missing: false,
            };
            let delta = compare(&old, &new, &user, &options);
            for (_, changed, _) in delta.changes() {
                prop_assert!(!options.keep.is_kept(changed), "{} is kept", changed);
            }

            let result = upgraded(&old, &new, &user, &options)?;
            for rule in &kept {
                let segments = path::split(rule);
                prop_assert_eq!(
                    value::lookup(&result, &segments),
                    value::lookup(&user, &segments),
                    "kept path {}", rule
                );
            }
        }

        /// Property: with removals tolerated, nothing is reported removed
        #[test]
        fn ignore_missing_removes_nothing(old in tree(), new in tree(), user in tree()) {
            let options = CompareOptions {
                keep: KeepRules::default(),
                ignore_missing: true,
            };
            prop_assert!(compare(&old, &new, &user, &options).removed.is_empty());
        }

        /// Property: a change emitted at a path the user edited carries the user's value
        #[test]
        fn user_edits_win_at_their_path(old in tree(), new in tree(), user in tree()) {
            let user_diff = diff(&old, &user);
            let delta = compare(&old, &new, &user, &CompareOptions::default());
            for (_, changed, emitted) in delta.changes() {
                if user_diff.added.contains_key(changed) || user_diff.modified.contains_key(changed) {
                    prop_assert_eq!(Some(emitted), value::lookup(&user, &path::split(changed)));
                }
            }
        }

        /// Property: applying the same delta twice changes nothing the second time
        #[test]
        fn apply_is_idempotent(old in tree(), new in tree(), user in tree()) {
            let delta = compare(&old, &new, &user, &CompareOptions::default());
            let mut doc = Document::from_value(&user, Format::Yaml);
            apply_allowing_absent(&delta, &mut doc)?;
            let once = doc.to_value();

            apply_allowing_absent(&delta, &mut doc)?;
            prop_assert_eq!(doc.to_value(), once);
        }

        /// Property: removals are strict, a dropped path the user never had fails
        #[test]
        fn removal_of_absent_path_is_reported(old in tree(), new in tree()) {
            let delta = compare(&old, &new, &old, &CompareOptions::default());
            let mut doc = Document::from_value(&old, Format::Yaml);
            apply(&delta, &mut doc).unwrap();

            match apply(&delta, &mut doc) {
                Ok(_) => prop_assert!(delta.removed.is_empty()),
                Err(Error::Reconciliation { failures }) => {
                    prop_assert_eq!(failures.len(), delta.removed.len());
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }

        /// Property: values never customized upgrade to exactly the new defaults
        #[test]
        fn uncustomized_values_reach_new_defaults(old in tree(), new in tree()) {
            let result = upgraded(&old, &new, &old, &CompareOptions::default())?;
            prop_assert_eq!(result, new);
        }

        /// Property: upgrading across unchanged defaults is a no-op
        #[test]
        fn unchanged_defaults_yield_empty_delta(defaults in tree(), user in tree()) {
            prop_assert!(compare(&defaults, &defaults, &user, &CompareOptions::default()).is_empty());
        }

        /// Property: a rendered YAML document parses back to the same values
        #[test]
        fn yaml_render_round_trips(values in tree()) {
            let text = Document::from_value(&values, Format::Yaml).render().unwrap();
            let reparsed = Document::parse(&text, Format::Yaml).unwrap();
            prop_assert_eq!(reparsed.to_value(), values);
            prop_assert_eq!(reparsed.render().unwrap(), text);
        }
    }
}
