pub mod constants;
pub mod cursor;
pub mod errors;
pub mod grammar;
pub mod lexer;
pub mod parser;
mod parser_utils;
pub mod span;
pub mod token;

pub use errors::{ParserError, ParserResult};
pub use lexer::{tokenize, Lexer};
pub use parser::Parser;

use grammar::Program;

/// Lexes and parses a complete program.
pub fn parse(source: &str) -> ParserResult<Program> {
    Parser::new(tokenize(source).into_iter()).parse()
}
