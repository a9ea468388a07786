use super::grammar::Type;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Name of the function a program starts in.
pub const MAIN_FUNCTION: &str = "main";

/// Reserved words, indexed by `Keyword` discriminant.
pub const KEYWORDS: [&str; 10] = [
    "void", "int", "num", "str", "bool", "true", "false", "return", "if", "else",
];

/// Free stack below which recursive walks switch to a fresh heap segment.
pub const STACK_RED_ZONE: usize = 64 * 1024;
/// Size of each heap stack segment.
pub const STACK_GROWTH: usize = 1024 * 1024;

pub const AND_WORD: &str = "and";
pub const OR_WORD: &str = "or";

#[derive(Debug, PartialEq, Eq, Clone, Copy, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Keyword {
    Void,
    Int,
    Num,
    Str,
    Bool,
    True,
    False,
    Return,
    If,
    Else,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Keyword> {
        let index = KEYWORDS.iter().position(|kw| *kw == word)?;
        u8::try_from(index)
            .ok()
            .and_then(|index| Keyword::try_from(index).ok())
    }

    pub fn as_str(&self) -> &'static str {
        KEYWORDS[u8::from(*self) as usize]
    }

    pub fn boolean_value(&self) -> Option<bool> {
        match self {
            Keyword::True => Some(true),
            Keyword::False => Some(false),
            _ => None,
        }
    }

    /// Types a variable or parameter may be declared with.
    pub fn variable_type(&self) -> Option<Type> {
        match self {
            Keyword::Int => Some(Type::Integer),
            Keyword::Num => Some(Type::Number),
            Keyword::Str => Some(Type::String),
            Keyword::Bool => Some(Type::Boolean),
            _ => None,
        }
    }

    /// Types a function may be declared to return.
    pub fn return_type(&self) -> Option<Type> {
        match self {
            Keyword::Void => Some(Type::Void),
            _ => self.variable_type(),
        }
    }
}
