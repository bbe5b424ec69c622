//! Keep rules
//!
//! A keep rule protects a subtree of the user's values from the upgrade: the
//! rule path and everything beneath it are never added, modified or removed
//! because of an upstream change.

use std::convert::Infallible;
use std::str::FromStr;

use crate::path;

/// A set of path prefixes whose subtrees are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeepRules {
    rules: Vec<String>,
}

impl KeepRules {
    /// Build a rule set, trimming whitespace and dropping blanks and duplicates.
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        set.extend(rules);
        set
    }

    /// Parse a comma-separated rule list such as `grafana,alertmanager.config`.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Add more rules to the set.
    pub fn extend<I, S>(&mut self, rules: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for rule in rules {
            let rule = rule.as_ref().trim();
            if !rule.is_empty() && !self.rules.iter().any(|r| r == rule) {
                self.rules.push(rule.to_string());
            }
        }
    }

    /// Whether `path` is protected by any rule.
    pub fn is_kept(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| path::matches(path, rule))
    }

    /// Rules that lie strictly beneath `path`.
    ///
    /// Replacing or removing `path` wholesale would also rewrite these.
    pub fn nested_under<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.as_str() != path && path::matches(rule, path))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl FromStr for KeepRules {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
