//! Applying a delta to a document
//!
//! Changes are replayed in a fixed order (added, modified, then removed)
//! through the document's path operations. A failing change does not stop
//! the others; every failure is collected and reported together.

use log::debug;

use crate::diff::{ChangeKind, Delta};
use crate::document::Document;
use crate::error::{Error, Operation, PathFailure, Result};
use crate::path;

/// What happened to each change of an applied delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Values written by `set`.
    pub written: usize,
    /// Entries removed by `delete`.
    pub removed: usize,
    /// Values already equal to the target, left with their source formatting.
    pub unchanged: usize,
}

/// Write `delta` into `document`.
///
/// Fails with [`Error::Reconciliation`] listing every change that could not
/// be applied, including removals of paths the document does not hold. The
/// document may be partially updated in that case.
pub fn apply(delta: &Delta, document: &mut Document) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();
    let mut failures = Vec::new();

    for (kind, path_text, value) in delta.changes() {
        let segments = path::split(path_text);
        match kind {
            ChangeKind::Added | ChangeKind::Modified => {
                let current = document.get(&segments).ok().map(|node| node.to_value());
                if current.as_ref() == Some(value) {
                    debug!("{} {}: already up to date", kind, path_text);
                    summary.unchanged += 1;
                    continue;
                }
                match document.set(&segments, value) {
                    Ok(()) => {
                        debug!("{} {}", kind, path_text);
                        summary.written += 1;
                    }
                    Err(error) => failures.push(PathFailure {
                        operation: Operation::Set,
                        path: path_text.to_string(),
                        error,
                    }),
                }
            }
            ChangeKind::Removed => match document.delete(&segments) {
                Ok(_) => {
                    debug!("{} {}", kind, path_text);
                    summary.removed += 1;
                }
                Err(error) => failures.push(PathFailure {
                    operation: Operation::Delete,
                    path: path_text.to_string(),
                    error,
                }),
            },
        }
    }

    if failures.is_empty() {
        Ok(summary)
    } else {
        Err(Error::Reconciliation { failures })
    }
}
