//! Named rule sets.
use crate::rules::Rule;

pub mod batch_one;

/// Names accepted by --batch.
pub const NAMES: &[&str] = &["batch-one"];

/// Rule set for the given name.
///
/// ```
/// assert!(bibedit::batches::lookup("batch-one").is_some());
/// assert!(bibedit::batches::lookup("batch-two").is_none());
/// ```
pub fn lookup(name: &str) -> Option<Vec<Rule>> {
    match name {
        "batch-one" => Some(batch_one::rules()),
        _ => None,
    }
}
