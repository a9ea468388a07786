use super::span::CodePosition;
use super::token::{SpannedToken, Token};

use std::fmt;
use thiserror::Error;

/// Deepest nesting of blocks and expressions the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 1024;

/// What the parser was looking for when it gave up.
#[derive(Debug, PartialEq, Clone)]
pub enum Expected {
    Token(Token),
    Identifier,
    VariableType,
    ReturnType,
    Expression,
}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum ParserError {
    #[error(
        "{}: invalid token {} `{}`, expected {expected}",
        .found.pos,
        .found.token.kind(),
        .found.token
    )]
    UnexpectedToken {
        found: SpannedToken,
        expected: Expected,
    },
    #[error("{pos}: nesting deeper than {limit} levels", limit = MAX_NESTING_DEPTH)]
    TooDeeplyNested { pos: CodePosition },
    #[error("{pos}: program declares no functions")]
    NoFunctions { pos: CodePosition },
    #[error("unexpected end of token stream")]
    BeyondEndOfFile,
}

pub type ParserResult<T> = Result<T, ParserError>;

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(token) => write!(f, "{} `{}`", token.kind(), token),
            Expected::Identifier => write!(f, "identifier"),
            Expected::VariableType => write!(f, "variable type"),
            Expected::ReturnType => write!(f, "return type"),
            Expected::Expression => write!(f, "expression"),
        }
    }
}

impl ParserError {
    pub fn unexpected(found: SpannedToken, expected: Expected) -> Self {
        ParserError::UnexpectedToken { found, expected }
    }

    pub fn position(&self) -> Option<CodePosition> {
        match self {
            ParserError::UnexpectedToken { found, .. } => Some(found.pos),
            ParserError::TooDeeplyNested { pos } | ParserError::NoFunctions { pos } => Some(*pos),
            ParserError::BeyondEndOfFile => None,
        }
    }

    /// Formats the error together with the offending source line and a
    /// caret under the offending column.
    pub fn render(&self, source: &str) -> String {
        let pos = match self.position() {
            Some(pos) => pos,
            None => return format!("Error: {}", self),
        };

        let line = source
            .lines()
            .nth(pos.line_no.saturating_sub(1))
            .unwrap_or_default()
            .replace('\t', "    ");
        let caret = " ".repeat(pos.column_no.saturating_sub(1));

        format!("[line {}] Error: {}\n    {}\n    {}^", pos.line_no, self, line, caret)
    }
}
