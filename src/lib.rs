//! Read application configuration written as Lua source.
//!
//! A [`Context`] owns an embedded Lua 5.4 state. Load one or more chunks
//! into it, then pull typed values out of the resulting globals by dotted
//! path or by explicit key list:
//!
//! ```
//! use luaconf::Context;
//!
//! let mut conf = Context::new();
//! conf.load_string("server = { port = 8080, name = 'srv' }").unwrap();
//! assert_eq!(conf.get_integer("server.port").unwrap(), 8080);
//! assert_eq!(conf.get_string("server.name").unwrap(), b"srv");
//! ```
//!
//! A value may also be a function; it is called with the queried location
//! and its single result is what gets type-checked and returned. Untrusted
//! configs can be bounded with [`Context::set_instruction_limit`].
//!
//! Errors carry both a message that pinpoints the failing path segment and
//! a stable numeric [`ErrorCode`]; the last outcome is additionally cached
//! on the context for two-step call-then-query hosts.

pub mod context;
pub mod errors;
pub mod evaluator;
mod getters;
mod path;
mod resolve;

pub use context::Context;
pub use errors::{ConfError, ErrorCode, Result};
pub use evaluator::{Evaluator, LuaEvaluator, ValueKind};
pub use resolve::format_keys;
