//! The richer configuration language.
//!
//! `.ncl` files are Nickel programs, evaluated with `nickel-lang-core`.
//! Imports of `.json`, `.jsonc` and `.json5` files are read with the
//! JSON-with-comments parser before the interpreter sees them.
//!
//! The evaluator never reads files itself. The caller passes an
//! [`ImportHost`] that resolves, reads and records every import, and can
//! cancel the evaluation by failing a read with [`ReadFailure::Cancelled`].
//!
//! ```rust
//! use computed_settings_ncl::find_imports;
//!
//! let sites = find_imports("let base = import \"base.ncl\" in base & { size = 14 }");
//! assert_eq!(sites[0].path, "base.ncl");
//! ```

mod error;
mod eval;
mod host;
mod imports;

pub use error::{EvalError, EvalResult};
pub use eval::NickelEvaluator;
pub use host::{Evaluator, ImportHost, ReadFailure};
pub use imports::{ImportSite, find_imports, rewrite_imports};
