use super::constants::{Keyword, AND_WORD, OR_WORD};
use super::cursor::Cursor;
use super::span::CodePosition;
use super::token::{SpannedToken, Token};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref INTEGER_LITERAL: Regex = Regex::new(r"^[0-9]+$").unwrap();
    static ref NUMBER_LITERAL: Regex = Regex::new(r"^(([0-9]+(\.[0-9]*)?)|(\.[0-9]+))$").unwrap();
    static ref STRING_LITERAL: Regex = Regex::new(r#"^"[^"]*"$"#).unwrap();
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[_a-zA-Z][_a-zA-Z0-9]*(\.[_a-zA-Z][_a-zA-Z0-9]*)*$").unwrap();
}

/// Splits source text into position-tagged tokens.
///
/// Words are accumulated until whitespace or an operator character ends
/// them, and are then classified as a whole. Lexing never fails: words
/// that fit no class come out as `Token::Invalid`. The last token is
/// always `Token::EndOfFile`.
pub fn tokenize(source: &str) -> Vec<SpannedToken> {
    Lexer::new(source).tokenize()
}

pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    word: String,
    word_start: CodePosition,
    tokens: Vec<SpannedToken>,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer from source.
    pub fn new(source: &'src str) -> Self {
        Lexer {
            cursor: Cursor::new(source),
            word: String::new(),
            word_start: CodePosition::start(),
            tokens: vec![],
        }
    }

    pub fn tokenize(mut self) -> Vec<SpannedToken> {
        while let Some(ch) = self.cursor.peek() {
            let pos = self.cursor.get_position();

            if ch.is_whitespace() {
                self.flush_word();
                self.cursor.take();
                continue;
            }

            if ch == '"' && self.word.is_empty() {
                self.accumulate_string(pos);
                continue;
            }

            if let Some(single) = operator_token(ch) {
                self.flush_word();
                self.cursor.take();
                if let Some(token) = self.lex_operator(single) {
                    self.tokens.push(SpannedToken::new(token, pos));
                }
                continue;
            }

            if self.word.is_empty() {
                self.word_start = pos;
            }
            self.word.push(ch);
            self.cursor.take();
        }

        self.flush_word();
        let end = self.cursor.get_position();
        self.tokens.push(SpannedToken::new(Token::EndOfFile, end));

        debug!(count = self.tokens.len(), "lexed source");
        self.tokens
    }

    /// Extends a single-character operator that has already been consumed.
    /// Returns None for comments.
    fn lex_operator(&mut self, single: Token) -> Option<Token> {
        let token = match single {
            // Slash can either be comment or division.
            Token::Slash if self.cursor.take_if('/') => {
                self.cursor.take_until(|ch| ch == '\n');
                return None;
            }

            // Potentially two character operators.
            Token::Equals => self.look_for_eq_sign(Token::Equals, Token::DoubleEq),
            Token::Bang => self.look_for_eq_sign(Token::Bang, Token::BangEq),
            Token::LeftAngle => self.look_for_eq_sign(Token::LeftAngle, Token::LeftAngleEq),
            Token::RightAngle => self.look_for_eq_sign(Token::RightAngle, Token::RightAngleEq),

            other => other,
        };

        Some(token)
    }

    /// Checks if next char is '='. If so, consume it and return t2.
    /// Otherwise, return t1.
    fn look_for_eq_sign(&mut self, t1: Token, t2: Token) -> Token {
        if self.cursor.take_if('=') {
            t2
        } else {
            t1
        }
    }

    /// Reads a quoted run, whitespace and operators included, into the
    /// pending word. An unterminated string stays unterminated and is
    /// classified as invalid.
    fn accumulate_string(&mut self, start: CodePosition) {
        self.word_start = start;
        if let Some(quote) = self.cursor.take() {
            self.word.push(quote);
        }

        while let Some(ch) = self.cursor.take() {
            self.word.push(ch);
            if ch == '"' {
                break;
            }
        }
    }

    fn flush_word(&mut self) {
        if self.word.is_empty() {
            return;
        }

        let word = std::mem::take(&mut self.word);
        let token = classify_word(word);
        self.tokens.push(SpannedToken::new(token, self.word_start));
    }
}

/// Single-character operators. Any character listed here ends a word.
fn operator_token(ch: char) -> Option<Token> {
    let token = match ch {
        '(' => Token::LeftParen,
        ')' => Token::RightParen,
        '{' => Token::LeftBrace,
        '}' => Token::RightBrace,
        ',' => Token::Comma,
        ';' => Token::Semicolon,
        '+' => Token::Plus,
        '-' => Token::Minus,
        '*' => Token::Asterisk,
        '/' => Token::Slash,
        '%' => Token::Percent,
        '^' => Token::Caret,
        '~' => Token::Tilde,
        '=' => Token::Equals,
        '!' => Token::Bang,
        '<' => Token::LeftAngle,
        '>' => Token::RightAngle,
        _ => return None,
    };
    Some(token)
}

/// Classifies a complete word. First match wins.
fn classify_word(word: String) -> Token {
    match word.as_str() {
        AND_WORD => return Token::And,
        OR_WORD => return Token::Or,
        _ => {}
    }

    if let Some(keyword) = Keyword::from_word(&word) {
        return match keyword.boolean_value() {
            Some(value) => Token::Boolean(value),
            None => Token::Keyword(keyword),
        };
    }

    if INTEGER_LITERAL.is_match(&word) {
        return match word.parse() {
            Ok(value) => Token::Integer(value),
            Err(_) => Token::Invalid(word),
        };
    }

    if NUMBER_LITERAL.is_match(&word) {
        return match word.parse() {
            Ok(value) => Token::Number(value),
            Err(_) => Token::Invalid(word),
        };
    }

    if STRING_LITERAL.is_match(&word) {
        return Token::Str(word[1..word.len() - 1].to_owned());
    }

    if IDENTIFIER.is_match(&word) {
        return Token::Identifier(word);
    }

    Token::Invalid(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        tokenize(source).into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn test_lex_function() {
        assert_eq!(
            lex("int main(){return 42;}"),
            vec![
                Token::Keyword(Keyword::Int),
                Token::Identifier("main".to_owned()),
                Token::LeftParen,
                Token::RightParen,
                Token::LeftBrace,
                Token::Keyword(Keyword::Return),
                Token::Integer(42),
                Token::Semicolon,
                Token::RightBrace,
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            lex("42.5 .5 7. true false \"hello world\""),
            vec![
                Token::Number(42.5),
                Token::Number(0.5),
                Token::Number(7.0),
                Token::Boolean(true),
                Token::Boolean(false),
                Token::Str("hello world".to_owned()),
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_operators_ignore_spacing() {
        assert_eq!(
            lex("a<=b>=c==d!=e<f>g"),
            vec![
                Token::Identifier("a".to_owned()),
                Token::LeftAngleEq,
                Token::Identifier("b".to_owned()),
                Token::RightAngleEq,
                Token::Identifier("c".to_owned()),
                Token::DoubleEq,
                Token::Identifier("d".to_owned()),
                Token::BangEq,
                Token::Identifier("e".to_owned()),
                Token::LeftAngle,
                Token::Identifier("f".to_owned()),
                Token::RightAngle,
                Token::Identifier("g".to_owned()),
                Token::EndOfFile,
            ]
        );

        assert_eq!(
            lex("x=-2^3%4"),
            vec![
                Token::Identifier("x".to_owned()),
                Token::Equals,
                Token::Minus,
                Token::Integer(2),
                Token::Caret,
                Token::Integer(3),
                Token::Percent,
                Token::Integer(4),
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_word_operators_and_dotted_identifiers() {
        assert_eq!(
            lex("a and b or math.sqrt(x)"),
            vec![
                Token::Identifier("a".to_owned()),
                Token::And,
                Token::Identifier("b".to_owned()),
                Token::Or,
                Token::Identifier("math.sqrt".to_owned()),
                Token::LeftParen,
                Token::Identifier("x".to_owned()),
                Token::RightParen,
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_invalid_words_keep_position() {
        let tokens = tokenize("int 9lives = \"open;");
        assert_eq!(tokens[1].token, Token::Invalid("9lives".to_owned()));
        assert_eq!(tokens[1].pos, CodePosition::new(1, 5));
        assert_eq!(tokens[3].token, Token::Invalid("\"open;".to_owned()));
        assert_eq!(tokens[3].pos, CodePosition::new(1, 14));
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn test_integer_out_of_range() {
        assert_eq!(
            lex("99999999999999999999"),
            vec![
                Token::Invalid("99999999999999999999".to_owned()),
                Token::EndOfFile
            ]
        );
    }

    #[test]
    fn test_positions() {
        let source = "int main() {\n\treturn 42;\n}";
        let positions: Vec<_> = tokenize(source)
            .into_iter()
            .map(|t| (t.pos.line_no, t.pos.column_no))
            .collect();

        assert_eq!(
            positions,
            vec![
                (1, 1),
                (1, 5),
                (1, 9),
                (1, 10),
                (1, 12),
                (2, 5),
                (2, 12),
                (2, 14),
                (3, 1),
                (3, 2),
            ]
        );
    }

    #[test]
    fn test_every_operator_character_ends_a_word() {
        assert_eq!(
            lex("a(b)c{d}e,f;g+h-i*j/k%l^m~n=o!p<q>r"),
            vec![
                Token::Identifier("a".to_owned()),
                Token::LeftParen,
                Token::Identifier("b".to_owned()),
                Token::RightParen,
                Token::Identifier("c".to_owned()),
                Token::LeftBrace,
                Token::Identifier("d".to_owned()),
                Token::RightBrace,
                Token::Identifier("e".to_owned()),
                Token::Comma,
                Token::Identifier("f".to_owned()),
                Token::Semicolon,
                Token::Identifier("g".to_owned()),
                Token::Plus,
                Token::Identifier("h".to_owned()),
                Token::Minus,
                Token::Identifier("i".to_owned()),
                Token::Asterisk,
                Token::Identifier("j".to_owned()),
                Token::Slash,
                Token::Identifier("k".to_owned()),
                Token::Percent,
                Token::Identifier("l".to_owned()),
                Token::Caret,
                Token::Identifier("m".to_owned()),
                Token::Tilde,
                Token::Identifier("n".to_owned()),
                Token::Equals,
                Token::Identifier("o".to_owned()),
                Token::Bang,
                Token::Identifier("p".to_owned()),
                Token::LeftAngle,
                Token::Identifier("q".to_owned()),
                Token::RightAngle,
                Token::Identifier("r".to_owned()),
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_unknown_characters_stay_in_word() {
        assert_eq!(
            lex("a@b #c"),
            vec![
                Token::Invalid("a@b".to_owned()),
                Token::Invalid("#c".to_owned()),
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            lex("return 1; // expect: 1\n/ 2"),
            vec![
                Token::Keyword(Keyword::Return),
                Token::Integer(1),
                Token::Semicolon,
                Token::Slash,
                Token::Integer(2),
                Token::EndOfFile,
            ]
        );
    }
}
