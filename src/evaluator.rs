//! The embedded Lua interpreter, seen as a small stack machine.
//!
//! The resolver and getters never touch `mlua` directly; they speak to the
//! [`Evaluator`] trait: load and execute chunks, push the globals table,
//! replace the table on top of the working stack with one of its fields,
//! call the value on top, and extract primitives from it. The working stack
//! is a crate-side `Vec` of Lua value handles, so unwinding it (see
//! `Context::with_stack`) just drops handles.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mlua::{HookTriggers, Lua, Value as LuaValue};
use tracing::debug;

use crate::errors::{ConfError, Result};

/// Type tag of a value on the working stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Nil,
    Boolean,
    Integer,
    Number,
    String,
    Table,
    Function,
    /// Userdata, threads, and anything else the config surface has no use for.
    Other,
}

/// Interpreter capability used by the resolution engine.
///
/// Implementations own a working stack of interpreter values. Methods that
/// say "top of stack" require the caller to have established the expected
/// shape (the resolver checks `top_kind` before `lookup`/`call_top`);
/// violating that is a programming error, not a runtime condition.
pub trait Evaluator {
    /// Compile `source` and execute it as a side-effecting chunk.
    /// Compile errors are `LoadFailed`, execution errors `CallFailed`.
    fn load_string(&mut self, source: &str) -> Result<()>;

    /// Compile the file at `file` and execute it, as [`Evaluator::load_string`].
    fn load_file(&mut self, file: &Path) -> Result<()>;

    /// Current working-stack depth.
    fn stack_depth(&self) -> usize;

    /// Pop values until the stack is `depth` deep again. No-op if it already
    /// is. Must not be called with a depth greater than the current one.
    fn unwind_to(&mut self, depth: usize);

    /// Push the globals table.
    fn push_globals(&mut self);

    /// Replace the table on top of the stack with `table[key]`.
    /// The top of the stack must be a table.
    fn lookup(&mut self, key: &str) -> Result<()>;

    /// Type tag of the value on top of the stack.
    fn top_kind(&self) -> ValueKind;

    /// Replace the function on top of the stack with the result of calling
    /// it as `f(arg)`, expecting exactly one result. The top of the stack
    /// must be a function.
    fn call_top(&mut self, arg: &str) -> Result<()>;

    fn top_boolean(&self) -> Option<bool>;

    /// Integer extraction: Lua integers, plus floats with an exact integer
    /// value. `1.01` is a mismatch, not a truncation.
    fn top_integer(&self) -> Option<i64>;

    /// Double extraction: any Lua number.
    fn top_double(&self) -> Option<f64>;

    /// Copy the string on top of the stack into an owned buffer, embedded
    /// NUL bytes included. `Ok(None)` if the top is not a string;
    /// `ResourceExhausted` (mentioning `what`) if the copy cannot be
    /// allocated.
    fn copy_top_string(&self, what: &str) -> Result<Option<Vec<u8>>>;

    /// Instruction budget applied to every chunk execution and function
    /// call. 0 disables the limit.
    fn set_instruction_limit(&mut self, limit: u32);

    fn instruction_limit(&self) -> u32;
}

/// [`Evaluator`] backed by an `mlua` Lua 5.4 state.
pub struct LuaEvaluator {
    lua: Lua,
    stack: Vec<LuaValue>,
    limit: u32,
    /// Set by the count hook when it aborts a run; distinguishes a limit
    /// abort from an ordinary runtime error.
    tripped: Arc<AtomicBool>,
}

impl LuaEvaluator {
    pub fn new() -> Self {
        Self {
            lua: Lua::new(),
            stack: Vec::new(),
            limit: 0,
            tripped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The raw interpreter state, for sandbox setup or other advanced host
    /// manipulation.
    ///
    /// Replacing or corrupting interpreter state the resolution engine
    /// relies on (the globals table may be reshaped freely; handles held on
    /// the working stack may not) is the caller's own risk.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Run `op` with the instruction-count hook installed when a limit is
    /// set, and removed again afterwards no matter how `op` ends.
    fn with_limit<T>(&self, op: impl FnOnce() -> mlua::Result<T>) -> Result<T> {
        if self.limit > 0 {
            self.tripped.store(false, Ordering::Relaxed);
            let tripped = Arc::clone(&self.tripped);
            self.lua.set_hook(
                HookTriggers::new().every_nth_instruction(self.limit),
                move |_lua, _debug| {
                    tripped.store(true, Ordering::Relaxed);
                    Err(mlua::Error::runtime("instruction budget exhausted"))
                },
            );
        }
        let out = op();
        if self.limit > 0 {
            self.lua.remove_hook();
        }
        out.map_err(|err| {
            if self.limit > 0 && self.tripped.load(Ordering::Relaxed) {
                ConfError::CallFailed("Instruction count exceeded".into())
            } else {
                failure(&err)
            }
        })
    }
}

impl Default for LuaEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for LuaEvaluator {
    fn load_string(&mut self, source: &str) -> Result<()> {
        debug!(bytes = source.len(), "loading chunk from string");
        let chunk = self.lua.load(source);
        self.with_limit(|| chunk.exec())
    }

    fn load_file(&mut self, file: &Path) -> Result<()> {
        debug!(file = %file.display(), "loading chunk from file");
        let source = std::fs::read_to_string(file)
            .map_err(|err| ConfError::LoadFailed(format!("cannot open {}: {err}", file.display())))?;
        let chunk = self.lua.load(source).set_name(format!("@{}", file.display()));
        self.with_limit(|| chunk.exec())
    }

    fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    fn unwind_to(&mut self, depth: usize) {
        assert!(depth <= self.stack.len(), "unwind above current depth");
        self.stack.truncate(depth);
    }

    fn push_globals(&mut self) {
        self.stack.push(LuaValue::Table(self.lua.globals()));
    }

    fn lookup(&mut self, key: &str) -> Result<()> {
        let top = self.stack.pop();
        let Some(LuaValue::Table(table)) = top else {
            unreachable!("lookup with no table on the stack");
        };
        // Plain indexing, metamethods included; an __index error surfaces
        // as a call failure.
        let value: LuaValue = table.get(key).map_err(|err| failure(&err))?;
        self.stack.push(value);
        Ok(())
    }

    fn top_kind(&self) -> ValueKind {
        match self.stack.last() {
            None | Some(LuaValue::Nil) => ValueKind::Nil,
            Some(LuaValue::Boolean(_)) => ValueKind::Boolean,
            Some(LuaValue::Integer(_)) => ValueKind::Integer,
            Some(LuaValue::Number(_)) => ValueKind::Number,
            Some(LuaValue::String(_)) => ValueKind::String,
            Some(LuaValue::Table(_)) => ValueKind::Table,
            Some(LuaValue::Function(_)) => ValueKind::Function,
            Some(_) => ValueKind::Other,
        }
    }

    fn call_top(&mut self, arg: &str) -> Result<()> {
        let top = self.stack.pop();
        let Some(LuaValue::Function(func)) = top else {
            unreachable!("call_top with no function on the stack");
        };
        let result = self.with_limit(|| func.call::<LuaValue>(arg))?;
        self.stack.push(result);
        Ok(())
    }

    fn top_boolean(&self) -> Option<bool> {
        match self.stack.last() {
            Some(LuaValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    fn top_integer(&self) -> Option<i64> {
        match self.stack.last() {
            Some(LuaValue::Integer(i)) => Some(*i),
            Some(LuaValue::Number(n)) if n.fract() == 0.0 && n.is_finite() => {
                // Exactly representable floats only. `i64::MAX as f64`
                // rounds up to 2^63, so the upper bound must be exclusive
                // or a float of exactly 2^63 would saturate to i64::MAX.
                if *n >= i64::MIN as f64 && *n < (i64::MAX as u64 + 1) as f64 {
                    Some(*n as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn top_double(&self) -> Option<f64> {
        match self.stack.last() {
            Some(LuaValue::Integer(i)) => Some(*i as f64),
            Some(LuaValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    fn copy_top_string(&self, what: &str) -> Result<Option<Vec<u8>>> {
        let Some(LuaValue::String(s)) = self.stack.last() else {
            return Ok(None);
        };
        let bytes = s.as_bytes();
        let mut copy = Vec::new();
        copy.try_reserve_exact(bytes.len())
            .map_err(|_| ConfError::ResourceExhausted(what.to_string()))?;
        copy.extend_from_slice(&bytes);
        Ok(Some(copy))
    }

    fn set_instruction_limit(&mut self, limit: u32) {
        self.limit = limit;
    }

    fn instruction_limit(&self) -> u32 {
        self.limit
    }
}

/// Map an `mlua` error to ours, surfacing Lua's own message. Syntax errors
/// become `LoadFailed`; everything else is a call failure. Tracebacks are
/// trimmed off so messages match what `error("...")` raised.
fn failure(err: &mlua::Error) -> ConfError {
    match err {
        mlua::Error::SyntaxError { message, .. } => ConfError::LoadFailed(trim_traceback(message)),
        mlua::Error::RuntimeError(message) | mlua::Error::MemoryError(message) => {
            ConfError::CallFailed(trim_traceback(message))
        }
        mlua::Error::CallbackError { cause, .. } => failure(cause),
        other => ConfError::CallFailed(other.to_string()),
    }
}

fn trim_traceback(message: &str) -> String {
    message
        .split("\nstack traceback:")
        .next()
        .unwrap_or(message)
        .trim_end()
        .to_string()
}
