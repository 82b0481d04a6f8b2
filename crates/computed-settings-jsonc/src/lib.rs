//! JSON with comments and trailing commas.
//!
//! A tolerant scanner and parser for the settings-file dialect: `//` and
//! `/* */` comments, trailing commas, duplicate keys. Parsing never fails
//! outright; it returns the best tree it could build together with every
//! [`ParseError`] found, each carrying a byte offset and length.
//!
//! ```rust
//! use computed_settings_jsonc::{ParseErrorCode, parse};
//!
//! let out = parse("{\"a\": 1, // note\n}");
//! assert!(out.is_ok());
//!
//! let out = parse("{\"a\" 1}");
//! assert_eq!(out.errors[0].code, ParseErrorCode::ColonExpected);
//! ```

mod ast;
mod convert;
mod error;
mod parser;
mod scanner;

pub use ast::{Node, NodeKind, Property, Span};
pub use convert::{parse_config, to_config_value};
pub use error::{ParseError, ParseErrorCode};
pub use parser::{ParseOptions, ParseOutput, parse, parse_with_options};
pub use scanner::{Scanner, SyntaxKind, Token};
