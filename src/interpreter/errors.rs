use crate::frontend::span::CodePosition;
use thiserror::Error;

/// Failure of a single operator application, before it is tied to a source position.
#[derive(Debug, PartialEq, Clone, Error)]
pub enum OperationError {
    #[error("cannot apply '{op}' to {lhs} and {rhs}")]
    IllegalInfixOperation {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("cannot apply '{op}' to {operand}")]
    IllegalPrefixOperation {
        op: &'static str,
        operand: &'static str,
    },
    #[error("division by zero")]
    DivideByZero,
    #[error("integer overflow")]
    IntegerOverflow,
}

pub type OperationResult<T> = Result<T, OperationError>;

#[derive(Debug, PartialEq, Clone, Error)]
pub enum RuntimeError {
    #[error("{pos}: undefined identifier '{name}'")]
    UndefinedVariable { name: String, pos: CodePosition },
    #[error("{pos}: '{name}' was declared but never given a value")]
    Uninitialized { name: String, pos: CodePosition },
    #[error("{pos}: '{name}' is not a function")]
    NotCallable { name: String, pos: CodePosition },
    #[error("{pos}: '{name}' expects {expected} argument(s) but got {got}")]
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
        pos: CodePosition,
    },
    #[error("{pos}: condition must be bool, found {found}")]
    NonBooleanCondition {
        found: &'static str,
        pos: CodePosition,
    },
    #[error("{pos}: {source}")]
    Operation {
        source: OperationError,
        pos: CodePosition,
    },
    #[error("{pos}: call to '{name}' produced no value")]
    NoValue { name: String, pos: CodePosition },
    #[error("{pos}: call depth exceeded {limit}")]
    StackOverflow { limit: usize, pos: CodePosition },
    #[error("{pos}: builtin '{name}' failed: {reason}")]
    Builtin {
        name: String,
        reason: String,
        pos: CodePosition,
    },
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

impl RuntimeError {
    pub fn at(pos: CodePosition) -> impl FnOnce(OperationError) -> RuntimeError {
        move |source| RuntimeError::Operation { source, pos }
    }

    pub fn position(&self) -> CodePosition {
        match self {
            RuntimeError::UndefinedVariable { pos, .. }
            | RuntimeError::Uninitialized { pos, .. }
            | RuntimeError::NotCallable { pos, .. }
            | RuntimeError::WrongArity { pos, .. }
            | RuntimeError::NonBooleanCondition { pos, .. }
            | RuntimeError::Operation { pos, .. }
            | RuntimeError::NoValue { pos, .. }
            | RuntimeError::StackOverflow { pos, .. }
            | RuntimeError::Builtin { pos, .. } => *pos,
        }
    }
}
