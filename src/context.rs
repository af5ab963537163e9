//! The host-visible configuration handle.

use std::path::Path;

use tracing::debug;

use crate::errors::{ConfError, ErrorCode, Result};
use crate::evaluator::{Evaluator, LuaEvaluator};

/// Cached error messages are capped at this many bytes (truncated on a
/// character boundary), so a pathological script cannot balloon the handle.
pub(crate) const ERROR_STRING_CAPACITY: usize = 128;

/// A configuration context: one owned Lua evaluator plus the error state of
/// the most recent operation.
///
/// Every fallible operation returns a [`Result`]; the same outcome is also
/// cached and queryable afterwards through [`Context::error_code`] /
/// [`Context::error_string`], for hosts that funnel status through a
/// separate reporting path.
///
/// A context is single-owner: it is not internally synchronized, and the
/// evaluator it owns is never shared between contexts.
pub struct Context {
    evaluator: Option<LuaEvaluator>,
    last_code: ErrorCode,
    last_message: String,
}

impl Context {
    /// Create a context with a fresh Lua state. Always returns a usable
    /// handle; check [`Context::error_code`] if you need to distinguish a
    /// handle whose evaluator could not be set up.
    pub fn new() -> Self {
        Self {
            evaluator: Some(LuaEvaluator::new()),
            last_code: ErrorCode::Ok,
            last_message: String::new(),
        }
    }

    /// Tear down the evaluator. Idempotent; any later operation fails with
    /// `NoEvaluator`. Dropping the context does this implicitly.
    pub fn close(&mut self) {
        if self.evaluator.take().is_some() {
            debug!("context closed");
        }
    }

    /// The owned evaluator, if the context has not been closed. Through it,
    /// [`LuaEvaluator::lua`] exposes the raw interpreter state for sandbox
    /// setup; see the caveats there.
    pub fn evaluator(&self) -> Option<&LuaEvaluator> {
        self.evaluator.as_ref()
    }

    /// Error code of the most recent operation.
    pub fn error_code(&self) -> ErrorCode {
        self.last_code
    }

    /// Error message of the most recent operation; `""` when it succeeded
    /// (and for `NotFound`, which historically carries no message).
    pub fn error_string(&self) -> &str {
        &self.last_message
    }

    /// Instruction budget applied to chunk execution and config-function
    /// calls; 0 means unlimited. Reports 0 on a closed context.
    pub fn instruction_limit(&self) -> u32 {
        self.evaluator.as_ref().map_or(0, Evaluator::instruction_limit)
    }

    /// Set the instruction budget. 0 disables it. The budget applies to
    /// each subsequent execution individually and stays set until changed.
    pub fn set_instruction_limit(&mut self, limit: u32) -> Result<()> {
        self.clear_error();
        match self.evaluator.as_mut() {
            Some(ev) => {
                ev.set_instruction_limit(limit);
                Ok(())
            }
            None => Err(self.record(ConfError::NoEvaluator)),
        }
    }

    /// Compile `source` and execute it, defining the globals later queried
    /// by the getters. Compile failure is `LoadFailed`; a failure while the
    /// chunk runs is `CallFailed`.
    pub fn load_string(&mut self, source: &str) -> Result<()> {
        self.with_stack(|ev| ev.load_string(source))
    }

    /// As [`Context::load_string`], reading the chunk from a file.
    pub fn load_file(&mut self, file: impl AsRef<Path>) -> Result<()> {
        let file = file.as_ref();
        if file.as_os_str().is_empty() {
            self.clear_error();
            return Err(self.record(ConfError::InvalidArgument("empty file name".into())));
        }
        self.with_stack(|ev| ev.load_file(file))
    }

    /// Stack-depth guard around `body`: resets the error state, runs `body`
    /// against the evaluator, unwinds the working stack to its entry depth
    /// on every exit path, and caches the outcome.
    pub(crate) fn with_stack<T>(
        &mut self,
        body: impl FnOnce(&mut LuaEvaluator) -> Result<T>,
    ) -> Result<T> {
        self.clear_error();
        let Some(ev) = self.evaluator.as_mut() else {
            return Err(self.record(ConfError::NoEvaluator));
        };
        let depth = ev.stack_depth();
        let out = body(ev);
        // Going below the entry depth would mean a lookup consumed values
        // it did not push: a bug, not a recoverable condition.
        assert!(ev.stack_depth() >= depth, "working stack below entry depth");
        ev.unwind_to(depth);
        out.map_err(|err| self.record(err))
    }

    fn clear_error(&mut self) {
        self.last_code = ErrorCode::Ok;
        self.last_message.clear();
    }

    fn record(&mut self, err: ConfError) -> ConfError {
        self.last_code = err.code();
        self.last_message = bounded(err.to_string());
        err
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

fn bounded(mut message: String) -> String {
    if message.len() > ERROR_STRING_CAPACITY {
        let mut end = ERROR_STRING_CAPACITY;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message.truncate(end);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_context_has_clean_error_state() {
        let conf = Context::new();
        assert_eq!(conf.error_code(), ErrorCode::Ok);
        assert_eq!(conf.error_string(), "");
        assert!(conf.evaluator().is_some());
        assert_eq!(conf.instruction_limit(), 0);
    }

    #[test]
    fn close_is_idempotent_and_poisons_operations() {
        let mut conf = Context::new();
        conf.close();
        conf.close();
        assert!(conf.evaluator().is_none());
        let err = conf.load_string("x = 1").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoEvaluator);
        assert_eq!(conf.error_code(), ErrorCode::NoEvaluator);
        let err = conf.set_instruction_limit(5).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoEvaluator);
        assert_eq!(conf.instruction_limit(), 0);
    }

    #[test]
    fn success_clears_previous_error() {
        let mut conf = Context::new();
        assert!(conf.load_string("junk junk").is_err());
        assert_eq!(conf.error_code(), ErrorCode::LoadFailed);
        conf.load_string("x = 1").unwrap();
        assert_eq!(conf.error_code(), ErrorCode::Ok);
        assert_eq!(conf.error_string(), "");
    }

    #[test]
    fn cached_message_is_bounded() {
        let long = "x".repeat(3 * ERROR_STRING_CAPACITY);
        assert_eq!(bounded(long).len(), ERROR_STRING_CAPACITY);
        let exact = "y".repeat(ERROR_STRING_CAPACITY);
        assert_eq!(bounded(exact.clone()), exact);
        // Multi-byte characters are not split.
        let wide = "é".repeat(ERROR_STRING_CAPACITY);
        let out = bounded(wide);
        assert!(out.len() <= ERROR_STRING_CAPACITY);
        assert!(out.chars().all(|c| c == 'é'));
    }

    #[test]
    fn empty_file_name_is_invalid_argument() {
        let mut conf = Context::new();
        let err = conf.load_file("").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(conf.error_string(), "empty file name");
    }
}
