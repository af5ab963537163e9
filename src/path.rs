//! Dotted key-path lexing.
//!
//! A path like `t3.t.b3` is split on `.` into components. A component may be
//! a double-quoted literal so that the empty string, or a key containing
//! dots, stays addressable from the path syntax: `t6."".k2`, `t6."6.6".bm`.
//! Keys containing a `"` are only reachable through the key-list API.
//!
//! Components are produced one at a time, on demand, because the traversal
//! must check "is the current value a table?" *before* parsing the next
//! component — `tf.b.` has to report `Not a table: tf.b`, not an empty
//! component.

use crate::errors::{ConfError, Result};

pub struct PathCursor<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> PathCursor<'a> {
    /// Validates the up-front path shape: a path must be non-empty and must
    /// not start with a separator.
    pub fn new(s: &'a str) -> Result<Self> {
        if s.is_empty() {
            return Err(ConfError::BadKey("Empty path".into()));
        }
        if s.starts_with('.') {
            return Err(ConfError::BadKey(format!("Empty component in: {s}")));
        }
        Ok(Self { s, i: 0 })
    }

    /// Whether another component follows. The cursor rests *on* the
    /// separator between components, so a trailing `.` answers true and the
    /// next `component()` call reports the empty trailing component.
    pub fn has_more(&self) -> bool {
        self.i < self.s.len()
    }

    /// The slice of the path consumed so far, used for `Not a table`
    /// diagnostics. Never includes the separator the cursor rests on.
    pub fn consumed(&self) -> &'a str {
        &self.s[..self.i]
    }

    /// Parse the next component. Must only be called when `has_more()`.
    pub fn component(&mut self) -> Result<String> {
        if self.i > 0 {
            debug_assert_eq!(self.peek(), Some('.'));
            self.i += 1;
        }
        if self.peek() == Some('"') {
            return self.quoted_component();
        }
        let start = self.i;
        while let Some(c) = self.peek() {
            if c == '.' {
                break;
            }
            self.i += c.len_utf8();
        }
        if self.i == start {
            return Err(ConfError::BadKey(format!("Empty component in: {}", self.s)));
        }
        Ok(self.s[start..self.i].to_string())
    }

    fn quoted_component(&mut self) -> Result<String> {
        self.i += 1;
        let start = self.i;
        while let Some(c) = self.peek() {
            if c == '"' {
                let key = &self.s[start..self.i];
                self.i += 1;
                // The quote must end the component.
                if !matches!(self.peek(), None | Some('.')) {
                    return Err(ConfError::BadKey(format!(
                        "Malformed component in: {}",
                        self.s
                    )));
                }
                return Ok(key.to_string());
            }
            self.i += c.len_utf8();
        }
        Err(ConfError::BadKey(format!("Unterminated quote in: {}", self.s)))
    }

    fn peek(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }
}
