use super::constants::Keyword;
use super::span::CodePosition;
use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    // Punctuation.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,

    // Single-character operators.
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Caret,
    Tilde,

    // One or two character operators.
    Bang,
    BangEq,
    Equals,
    DoubleEq,
    LeftAngle,
    LeftAngleEq,
    RightAngle,
    RightAngleEq,

    // Word operators.
    And,
    Or,

    // Literals.
    Identifier(String),
    Integer(i64),
    Number(f64),
    Str(String),
    Boolean(bool),

    Keyword(Keyword),

    /// A word that matched no lexical class.
    Invalid(String),
    EndOfFile,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub pos: CodePosition,
}

impl SpannedToken {
    pub fn new(token: Token, pos: CodePosition) -> Self {
        SpannedToken { token, pos }
    }
}

impl Token {
    /// Name of the token class, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::LeftParen | Token::RightParen => "Parenthesis",
            Token::LeftBrace | Token::RightBrace => "Brace",
            Token::Comma => "Separator",
            Token::Semicolon => "Semicolon",
            Token::Bang | Token::Tilde => "UnaryOperator",
            Token::Plus | Token::Minus => "AdditiveOperator",
            Token::Asterisk | Token::Slash | Token::Percent => "MultiplicativeOperator",
            Token::Caret => "ExponentialOperator",
            Token::Equals => "Assignment",
            Token::DoubleEq | Token::BangEq => "EqualityOperator",
            Token::LeftAngle | Token::LeftAngleEq | Token::RightAngle | Token::RightAngleEq => {
                "RelationalOperator"
            }
            Token::And => "LogicalAndOperator",
            Token::Or => "LogicalOrOperator",
            Token::Identifier(_) => "Identifier",
            Token::Integer(_) => "IntegerConstant",
            Token::Number(_) => "NumberConstant",
            Token::Str(_) => "StringConstant",
            Token::Boolean(_) => "BooleanConstant",
            Token::Keyword(_) => "Keyword",
            Token::Invalid(_) => "Invalid",
            Token::EndOfFile => "EndOfFile",
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Token::Integer(_) | Token::Number(_) | Token::Str(_) | Token::Boolean(_)
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftBrace => "{",
            Token::RightBrace => "}",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Asterisk => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Caret => "^",
            Token::Tilde => "~",
            Token::Bang => "!",
            Token::BangEq => "!=",
            Token::Equals => "=",
            Token::DoubleEq => "==",
            Token::LeftAngle => "<",
            Token::LeftAngleEq => "<=",
            Token::RightAngle => ">",
            Token::RightAngleEq => ">=",
            Token::And => "and",
            Token::Or => "or",
            Token::Identifier(name) => name,
            Token::Integer(n) => return write!(f, "{}", n),
            Token::Number(n) => return write!(f, "{}", n),
            Token::Str(s) => return write!(f, "\"{}\"", s),
            Token::Boolean(b) => return write!(f, "{}", b),
            Token::Keyword(keyword) => keyword.as_str(),
            Token::Invalid(word) => word,
            Token::EndOfFile => "<eof>",
        };
        write!(f, "{}", value)
    }
}

impl fmt::Display for SpannedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}, {}, {}, {}>",
            self.pos.line_no,
            self.pos.column_no,
            self.token.kind(),
            self.token
        )
    }
}
