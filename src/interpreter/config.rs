pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct EvaluatorConfig {
    /// Nested calls allowed before evaluation fails with a stack overflow.
    pub max_call_depth: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        EvaluatorConfig {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
