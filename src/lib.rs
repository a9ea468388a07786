pub mod codegen;
pub mod frontend;
pub mod interpreter;
