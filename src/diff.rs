//! Three-way comparison of value trees
//!
//! [`compare`] walks the old and new default trees side by side and
//! classifies every difference as added, modified or removed. Before it does,
//! the user's values are diffed against the old defaults with the same
//! walk ([`diff`]); the paths the user added or modified are "touched", and
//! an upstream change at a touched path carries the user's value instead of
//! the new default.
//!
//! Keep rules take precedence over everything else: a kept path is never
//! emitted, and a value emitted above a kept path has the user's value
//! grafted back in at that path.
//!
//! Sequences are compared and replaced whole.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::keep::KeepRules;
use crate::path;
use crate::value::{self, ValueKind};

/// Classification of a single change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => f.write_str("added"),
            ChangeKind::Modified => f.write_str("modified"),
            ChangeKind::Removed => f.write_str("removed"),
        }
    }
}

/// The classified difference between two trees, keyed by dotted path.
///
/// A path appears in at most one of the three maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delta {
    pub added: BTreeMap<String, Value>,
    pub modified: BTreeMap<String, Value>,
    pub removed: BTreeMap<String, Value>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    /// Which map, if any, holds `path`.
    pub fn classify(&self, path: &str) -> Option<ChangeKind> {
        if self.added.contains_key(path) {
            Some(ChangeKind::Added)
        } else if self.modified.contains_key(path) {
            Some(ChangeKind::Modified)
        } else if self.removed.contains_key(path) {
            Some(ChangeKind::Removed)
        } else {
            None
        }
    }

    /// All changes in application order: added, then modified, then removed.
    pub fn changes(&self) -> impl Iterator<Item = (ChangeKind, &str, &Value)> {
        let added = self
            .added
            .iter()
            .map(|(path, value)| (ChangeKind::Added, path.as_str(), value));
        let modified = self
            .modified
            .iter()
            .map(|(path, value)| (ChangeKind::Modified, path.as_str(), value));
        let removed = self
            .removed
            .iter()
            .map(|(path, value)| (ChangeKind::Removed, path.as_str(), value));
        added.chain(modified).chain(removed)
    }

    fn insert(&mut self, kind: ChangeKind, path: String, value: Value) {
        let target = match kind {
            ChangeKind::Added => &mut self.added,
            ChangeKind::Modified => &mut self.modified,
            ChangeKind::Removed => &mut self.removed,
        };
        target.insert(path, value);
    }
}

/// Knobs for [`compare`].
#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    /// Subtrees left exactly as the user has them.
    pub keep: KeepRules,
    /// Do not propagate keys that the new defaults dropped.
    pub ignore_missing: bool,
}

/// Plain structural diff of `other` against `base`, with no policy applied.
///
/// Non-mapping roots are treated as empty mappings.
pub fn diff(base: &Value, other: &Value) -> Delta {
    let base = value::stringify_keys(base.clone());
    let other = value::stringify_keys(other.clone());
    let empty = Mapping::new();

    let mut delta = Delta::default();
    walk(
        "",
        base.as_mapping().unwrap_or(&empty),
        other.as_mapping().unwrap_or(&empty),
        None,
        &mut delta,
    );
    delta
}

/// Three-way comparison of the old defaults, the new defaults and the user's
/// values.
///
/// The resulting delta, applied to the user's values, upgrades them to the
/// new defaults while keeping the user's own changes.
pub fn compare(old: &Value, new: &Value, user: &Value, options: &CompareOptions) -> Delta {
    let user = value::stringify_keys(user.clone());
    let user_diff = diff(old, &user);
    let touched: BTreeSet<String> = user_diff
        .added
        .into_keys()
        .chain(user_diff.modified.into_keys())
        .collect();
    debug!("User values touch {} path(s) of the old defaults", touched.len());

    let reconciler = Reconciler {
        options,
        user: &user,
        touched,
    };

    let old = value::stringify_keys(old.clone());
    let new = value::stringify_keys(new.clone());
    let empty = Mapping::new();

    let mut delta = Delta::default();
    walk(
        "",
        old.as_mapping().unwrap_or(&empty),
        new.as_mapping().unwrap_or(&empty),
        Some(&reconciler),
        &mut delta,
    );
    delta
}

/// Policy consulted by [`walk`] when comparing defaults.
struct Reconciler<'a> {
    options: &'a CompareOptions,
    user: &'a Value,
    touched: BTreeSet<String>,
}

impl Reconciler<'_> {
    /// The value to emit for an upstream change at `path`, or `None` when
    /// the user's own edit above `path` stands.
    fn resolve(&self, path: &str, upstream: &Value) -> Option<Value> {
        if self.touched.contains(path) {
            debug!("{}: user value wins over upstream change", path);
            let user_value = value::lookup(self.user, &path::split(path)).unwrap_or(upstream);
            return Some(user_value.clone());
        }

        if let Some(ancestor) = path::ancestors(path).find(|a| self.touched.contains(*a)) {
            debug!("{}: skipped, user replaced {}", path, ancestor);
            return None;
        }

        let mut emitted = upstream.clone();
        for rule in self.options.keep.nested_under(path) {
            let relative = path::split(&rule[path.len() + 1..]);
            match value::lookup(self.user, &path::split(rule)) {
                Some(user_value) => {
                    debug!("{}: grafting kept user value at {}", path, rule);
                    value::insert_at(&mut emitted, &relative, user_value.clone());
                }
                None => {
                    debug!("{}: dropping kept path {} absent from user values", path, rule);
                    value::remove_at(&mut emitted, &relative);
                }
            }
        }
        Some(emitted)
    }

    fn skip_removal(&self, path: &str) -> bool {
        if self.options.ignore_missing {
            debug!("{}: removal ignored", path);
            return true;
        }
        if let Some(ancestor) = path::ancestors(path).find(|a| self.touched.contains(*a)) {
            debug!("{}: removal skipped, user replaced {}", path, ancestor);
            return true;
        }
        if let Some(rule) = self.options.keep.nested_under(path).next() {
            debug!("{}: removal skipped, {} is kept", path, rule);
            return true;
        }
        false
    }
}

fn walk(prefix: &str, old: &Mapping, new: &Mapping, policy: Option<&Reconciler>, delta: &mut Delta) {
    for (key, new_value) in new {
        let key_text = value::key_string(key);
        let path = path::join(prefix, &key_text);

        if let Some(policy) = policy {
            if path::is_ambiguous(&key_text) {
                warn!(
                    "Key '{}' under '{}' contains '.', its path is ambiguous",
                    key_text, prefix
                );
            }
            if policy.options.keep.is_kept(&path) {
                debug!("{}: kept", path);
                continue;
            }
        }

        let kind = match old.get(key) {
            None => ChangeKind::Added,
            Some(old_value) if ValueKind::of(old_value) != ValueKind::of(new_value) => {
                ChangeKind::Modified
            }
            Some(Value::Mapping(old_map)) => {
                if let Value::Mapping(new_map) = new_value {
                    walk(&path, old_map, new_map, policy, delta);
                }
                continue;
            }
            Some(old_value) if old_value != new_value => ChangeKind::Modified,
            Some(_) => continue,
        };

        let emitted = match policy {
            Some(policy) => policy.resolve(&path, new_value),
            None => Some(new_value.clone()),
        };
        if let Some(emitted) = emitted {
            delta.insert(kind, path, emitted);
        }
    }

    for (key, old_value) in old {
        if new.contains_key(key) {
            continue;
        }
        let path = path::join(prefix, &value::key_string(key));
        if let Some(policy) = policy {
            if policy.options.keep.is_kept(&path) {
                debug!("{}: kept", path);
                continue;
            }
            if policy.skip_removal(&path) {
                continue;
            }
        }
        delta.insert(ChangeKind::Removed, path, old_value.clone());
    }
}
