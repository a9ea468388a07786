use super::value::Value;
use crate::frontend::grammar::Type;
use std::fmt;

/// A named binding. The declared type is fixed at creation; the value may be
/// absent until the first assignment.
#[derive(Debug, PartialEq, Clone)]
pub struct Symbol {
    ident: String,
    ty: Type,
    value: Option<Value>,
}

impl Symbol {
    pub fn new(ident: &str, ty: Type) -> Self {
        Symbol {
            ident: ident.to_owned(),
            ty,
            value: None,
        }
    }

    pub fn with_value(ident: &str, ty: Type, value: Value) -> Self {
        Symbol {
            ident: ident.to_owned(),
            ty,
            value: Some(value),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.ident
    }

    pub fn ty(&self) -> Type {
        self.ty
    }

    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} = {}", self.ty, self.ident, value),
            None => write!(f, "{} {}", self.ty, self.ident),
        }
    }
}
