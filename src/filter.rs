//! Textual filter language.
//!
//! Parses expressions like `age > 30 and (city = 'NY' or city = 'LA')`
//! into predicate trees. Plain names address the value bag,
//! `meta.<name>` the meta bag and `key` the record identity.

pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::Lexer;
pub use parser::{parse_filter, Parser};
pub use token::{Spanned, Token};
