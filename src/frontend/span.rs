use std::fmt;

/// Tracks position in source code for error messages.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct CodePosition {
    pub line_no: usize,
    pub column_no: usize,
}

impl CodePosition {
    pub fn new(line_no: usize, column_no: usize) -> Self {
        CodePosition { line_no, column_no }
    }

    /// Position of the first character of a source file.
    pub fn start() -> Self {
        CodePosition::new(1, 1)
    }
}

impl Default for CodePosition {
    fn default() -> Self {
        CodePosition::start()
    }
}

impl fmt::Display for CodePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_no, self.column_no)
    }
}
