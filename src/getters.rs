//! Typed getters: stack guard + traversal + optional call + coercion.
//!
//! Each getter resolves a location, and if the value there is a function,
//! calls it with a single argument naming the location (the dotted path, or
//! the quoted key list for the key-list form) and exactly one expected
//! result — so a config can compute values lazily:
//!
//! ```lua
//! retries = 3
//! timeout = function(path) return defaults[path] or 30 end
//! ```
//!
//! A nil terminal value is `NotFound` for every type; a wrong type is
//! `TypeMismatch` with a `Not a <type>: <where>` message. `<where>` is the
//! whole path for the path form but only the final key for the key-list
//! form, mirroring the traversal diagnostics in `resolve`.

use tracing::debug;

use crate::context::Context;
use crate::errors::{ConfError, Result};
use crate::evaluator::{Evaluator, LuaEvaluator, ValueKind};
use crate::resolve::{self, format_keys};

enum Query<'a> {
    Path(&'a str),
    Keys(&'a [&'a str]),
}

impl Context {
    /// Get the boolean at a dotted path.
    pub fn get_boolean(&mut self, path: &str) -> Result<bool> {
        self.fetch(Query::Path(path), "a boolean", |ev| Ok(ev.top_boolean()))
    }

    /// Get the boolean at an explicit key list.
    pub fn get_boolean_by_keys(&mut self, keys: &[&str]) -> Result<bool> {
        self.fetch(Query::Keys(keys), "a boolean", |ev| Ok(ev.top_boolean()))
    }

    /// Get the double at a dotted path. Any Lua number qualifies.
    pub fn get_double(&mut self, path: &str) -> Result<f64> {
        self.fetch(Query::Path(path), "a double", |ev| Ok(ev.top_double()))
    }

    /// Get the double at an explicit key list.
    pub fn get_double_by_keys(&mut self, keys: &[&str]) -> Result<f64> {
        self.fetch(Query::Keys(keys), "a double", |ev| Ok(ev.top_double()))
    }

    /// Get the integer at a dotted path. Lua integers and exactly-integral
    /// floats qualify; `1.5` is a `TypeMismatch`, never truncated.
    pub fn get_integer(&mut self, path: &str) -> Result<i64> {
        self.fetch(Query::Path(path), "an integer", |ev| Ok(ev.top_integer()))
    }

    /// Get the integer at an explicit key list.
    pub fn get_integer_by_keys(&mut self, keys: &[&str]) -> Result<i64> {
        self.fetch(Query::Keys(keys), "an integer", |ev| Ok(ev.top_integer()))
    }

    /// Get the string at a dotted path, as an owned byte buffer independent
    /// of the interpreter. Lua strings are byte strings: embedded NUL bytes
    /// are preserved and the length is `Vec::len`. No coercion from other
    /// types.
    pub fn get_string(&mut self, path: &str) -> Result<Vec<u8>> {
        self.fetch(Query::Path(path), "a string", |ev| ev.copy_top_string(path))
    }

    /// Get the string at an explicit key list.
    pub fn get_string_by_keys(&mut self, keys: &[&str]) -> Result<Vec<u8>> {
        let what = keys.last().copied().unwrap_or_default();
        self.fetch(Query::Keys(keys), "a string", |ev| ev.copy_top_string(what))
    }

    fn fetch<T>(
        &mut self,
        query: Query<'_>,
        expected: &'static str,
        extract: impl FnOnce(&LuaEvaluator) -> Result<Option<T>>,
    ) -> Result<T> {
        self.with_stack(|ev| {
            // `where_` names the location in diagnostics; `call_arg` is what
            // a function-valued leaf receives.
            let (where_, call_arg) = match query {
                Query::Path(path) => {
                    resolve::find_by_path(ev, path)?;
                    (path.to_string(), path.to_string())
                }
                Query::Keys(keys) => {
                    let last = resolve::find_by_keys(ev, keys)?;
                    (keys[last].to_string(), format_keys(keys, 0))
                }
            };
            if ev.top_kind() == ValueKind::Function {
                debug!(at = %call_arg, "calling config function");
                ev.call_top(&call_arg)?;
            }
            if ev.top_kind() == ValueKind::Nil {
                return Err(ConfError::NotFound);
            }
            match extract(ev)? {
                Some(value) => Ok(value),
                None => Err(ConfError::TypeMismatch {
                    expected,
                    key: where_,
                }),
            }
        })
    }
}
