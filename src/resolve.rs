//! Nested-table traversal over the evaluator's working stack.
//!
//! Both forms start from the globals table and repeatedly replace the table
//! on top of the stack with one of its fields, leaving the resolved value
//! (possibly nil) on top. They differ in how keys are obtained and — on
//! purpose — in how a non-table intermediate is described: the path form
//! reports the dotted prefix walked so far, the key-list form only the last
//! key it consumed. Both behaviors are long-standing and hosts match on the
//! messages.

use itertools::Itertools;
use tracing::trace;

use crate::errors::{ConfError, Result};
use crate::evaluator::{Evaluator, ValueKind};
use crate::path::PathCursor;

/// Resolve a dotted path, leaving the terminal value on top of the stack.
pub(crate) fn find_by_path<E: Evaluator>(ev: &mut E, path: &str) -> Result<()> {
    let mut cursor = PathCursor::new(path)?;
    let first = cursor.component()?;
    if first.is_empty() {
        // A quoted-empty component is a valid map key anywhere but at the
        // top level, mirroring the key-list form.
        return Err(ConfError::BadKey("Empty top-level key".into()));
    }
    ev.push_globals();
    trace!(path, key = %first, "lookup");
    ev.lookup(&first)?;
    while cursor.has_more() {
        if ev.top_kind() != ValueKind::Table {
            return Err(ConfError::BadKey(format!("Not a table: {}", cursor.consumed())));
        }
        let key = cursor.component()?;
        trace!(path, key = %key, "lookup");
        ev.lookup(&key)?;
    }
    Ok(())
}

/// Resolve an explicit key list, leaving the terminal value on top of the
/// stack. Keys are used verbatim: they may contain dots or quotes, and may
/// be empty anywhere except first. Returns the index of the last key
/// consumed (the key the terminal value lives under).
pub(crate) fn find_by_keys<E: Evaluator>(ev: &mut E, keys: &[&str]) -> Result<usize> {
    let Some((first, rest)) = keys.split_first() else {
        return Err(ConfError::BadKey("Empty keys".into()));
    };
    if first.is_empty() {
        return Err(ConfError::BadKey("Empty top-level key".into()));
    }
    ev.push_globals();
    trace!(key = %first, "lookup");
    ev.lookup(first)?;
    for (i, key) in rest.iter().enumerate() {
        if ev.top_kind() != ValueKind::Table {
            // Just the previous key, not a joined prefix.
            return Err(ConfError::BadKey(format!("Not a table: {}", keys[i])));
        }
        trace!(key = %key, "lookup");
        ev.lookup(key)?;
    }
    Ok(keys.len() - 1)
}

/// Render a key list for diagnostics and for the argument passed to
/// function-valued leaves: up to `max_keys` keys (all if 0), each wrapped in
/// double quotes, joined with `.`.
pub fn format_keys(keys: &[&str], max_keys: usize) -> String {
    let take = if max_keys == 0 { keys.len() } else { max_keys.min(keys.len()) };
    keys[..take].iter().map(|key| format!("\"{key}\"")).join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn format_keys_quotes_and_joins() {
        assert_eq!(format_keys(&[], 0), "");
        assert_eq!(format_keys(&["tf", "s"], 0), "\"tf\".\"s\"");
        assert_eq!(format_keys(&["t6", "", "6.6"], 0), "\"t6\".\"\".\"6.6\"");
    }

    #[test]
    fn format_keys_honors_max() {
        let keys = ["a", "b", "c"];
        assert_eq!(format_keys(&keys, 2), "\"a\".\"b\"");
        assert_eq!(format_keys(&keys, 5), "\"a\".\"b\".\"c\"");
    }
}
