use super::span::CodePosition;
use std::iter::Peekable;
use std::str::Chars;

/// Columns a tab character advances the cursor by.
pub const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone)]
pub struct Cursor<'src> {
    chars: Peekable<Chars<'src>>,
    position: CodePosition,
}

impl<'src> Cursor<'src> {
    /// Creates a character stream for the source string.
    pub fn new(source: &'src str) -> Self {
        Cursor {
            chars: source.chars().peekable(),
            position: CodePosition::start(),
        }
    }

    /// Position of the next character.
    pub fn get_position(&self) -> CodePosition {
        self.position
    }

    /// Peeks the next character without consuming it.
    pub fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Consumes the next character.
    pub fn take(&mut self) -> Option<char> {
        let ch = self.chars.next()?;

        match ch {
            '\n' => {
                self.position.line_no += 1;
                self.position.column_no = 1;
            }
            '\t' => self.position.column_no += TAB_WIDTH,
            _ => self.position.column_no += 1,
        }

        Some(ch)
    }

    /// Consumes the next character if it equals target char.
    pub fn take_if(&mut self, target: char) -> bool {
        match self.peek() {
            Some(ch) if ch == target => {
                self.take();
                true
            }
            _ => false,
        }
    }

    /// Consumes next characters as long as they do not meet condition.
    /// At the end, the next character meets condition.
    pub fn take_until<F>(&mut self, condition: F)
    where
        F: Fn(char) -> bool,
    {
        while let Some(ch) = self.peek() {
            if condition(ch) {
                break;
            }
            self.take();
        }
    }
}
