//! # valgrade
//!
//! This library upgrades a customized chart values file from one chart
//! version to another. It is used by the `valgrade` command-line tool but
//! the comparison and the document editor work on plain values and text, so
//! they can be embedded elsewhere.
//!
//! ## Quick Example
//!
//! ```
//! use serde_yaml::Value;
//! use valgrade::diff::CompareOptions;
//! use valgrade::document::{Document, Format};
//! use valgrade::upgrade::upgrade;
//!
//! let old: Value = serde_yaml::from_str("replicas: 1\nimage:\n  tag: v1\n").unwrap();
//! let new: Value = serde_yaml::from_str("replicas: 1\nimage:\n  tag: v2\n  pullPolicy: Always\n").unwrap();
//!
//! let mut doc = Document::parse("# production\nreplicas: 3\nimage:\n  tag: v1\n", Format::Yaml).unwrap();
//! let result = upgrade(&old, &new, &mut doc, &CompareOptions::default()).unwrap();
//!
//! assert_eq!(result.delta.len(), 2);
//! assert_eq!(
//!     doc.render().unwrap(),
//!     "# production\nreplicas: 3\nimage:\n  tag: v2\n  pullPolicy: Always\n"
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Paths (`path`)**: dotted key paths, the address of a value in a tree.
//! - **Keep rules (`keep`)**: paths whose user value must survive the upgrade
//!   untouched, together with everything below them.
//! - **Comparison (`diff`)**: the three-way comparison of the old defaults,
//!   the new defaults and the user's values, producing a [`diff::Delta`] of
//!   added, modified and removed paths.
//! - **Documents (`document`)**: the user's values file as an editable tree
//!   that keeps comments, key order and formatting across edits.
//! - **Application (`apply`)**: replays a delta onto a document.
//! - **Charts (`chart`, `cache`)**: fetching the default values of a chart
//!   version from a repository, with an on-disk cache for remote charts.
//!
//! ## Execution Flow
//!
//! An upgrade run (see [`upgrade::upgrade`]):
//!
//! 1.  **Retrieval**: fetch the defaults of the base and the target version.
//! 2.  **Comparison**: compute the delta between them, honoring the user's
//!     changes and the keep rules.
//! 3.  **Application**: write the delta into the user's document.
//! 4.  **Output**: save the document or print it.

pub mod apply;
pub mod cache;
pub mod chart;
pub mod config;
pub mod defaults;
pub mod diff;
pub mod document;
pub mod error;
pub mod keep;
pub mod output;
pub mod path;
pub mod suggestions;
pub mod upgrade;
pub mod value;

#[cfg(test)]
mod diff_proptest;
#[cfg(test)]
mod path_proptest;
