mod config;
mod errors;
mod evaluator;
mod library;
mod output;
mod scope;
mod symbol;
mod value;

pub use config::{EvaluatorConfig, DEFAULT_MAX_CALL_DEPTH};
pub use errors::{OperationError, RuntimeError, RuntimeResult};
pub use evaluator::Evaluator;
pub use library::Library;
pub use output::{Listener, MessageSeverity, OutputSink};
pub use scope::{ScopeId, ScopeStore};
pub use symbol::Symbol;
pub use value::{FunctionRef, Value};
