//! The upgrade pipeline: compare the defaults, then apply the result to the
//! user's document.

use log::{debug, info};
use serde_yaml::Value;

use crate::apply::{apply, ApplySummary};
use crate::diff::{compare, CompareOptions, Delta};
use crate::document::Document;
use crate::error::Result;
use crate::value;

/// Outcome of a successful upgrade.
#[derive(Debug, Clone, PartialEq)]
pub struct Upgrade {
    pub delta: Delta,
    pub summary: ApplySummary,
}

/// Upgrade `document` from the `old` defaults to the `new` defaults.
///
/// The user's values are read from the document itself.
pub fn upgrade(old: &Value, new: &Value, document: &mut Document, options: &CompareOptions) -> Result<Upgrade> {
    let user = document.to_value();
    let delta = compare(old, new, &user, options);

    info!(
        "Computed {} change(s): {} added, {} modified, {} removed",
        delta.len(),
        delta.added.len(),
        delta.modified.len(),
        delta.removed.len()
    );
    for (kind, path, value) in delta.changes() {
        debug!("  {} {} = {}", kind, path, value::describe(value));
    }

    let summary = apply(&delta, document)?;
    info!(
        "Applied: {} written, {} removed, {} unchanged",
        summary.written, summary.removed, summary.unchanged
    );
    Ok(Upgrade { delta, summary })
}
