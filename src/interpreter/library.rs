use super::scope::{ScopeId, ScopeStore};
use super::value::{FunctionRef, Value};
use crate::frontend::grammar::{Function, FunctionBody, Identifier, Parameter, Type};
use crate::frontend::span::CodePosition;
use tracing::warn;

type BuiltinFn = fn(&[Value]) -> Result<Value, String>;

struct Builtin {
    name: &'static str,
    return_type: Type,
    params: &'static [(Type, &'static str)],
    func: BuiltinFn,
}

const BUILTINS: &[Builtin] = &[Builtin {
    name: "math.sqrt",
    return_type: Type::Number,
    params: &[(Type::Number, "value")],
    func: sqrt,
}];

fn sqrt(args: &[Value]) -> Result<Value, String> {
    match args {
        [value] => value
            .as_number()
            .map(|n| Value::Number(n.sqrt()))
            .ok_or_else(|| format!("expected a number, found {}", value.type_name())),
        _ => Err(format!("expected 1 argument, found {}", args.len())),
    }
}

/// Functions provided by the host. Each is exposed as a body-less
/// [`Function`] node so calls bind parameters exactly like user functions.
#[derive(Debug)]
pub struct Library {
    functions: Vec<Function>,
}

impl Library {
    pub fn new() -> Self {
        let functions = BUILTINS
            .iter()
            .map(|builtin| Function {
                return_type: builtin.return_type,
                ident: Identifier::new(builtin.name.to_owned(), CodePosition::default()),
                params: builtin
                    .params
                    .iter()
                    .map(|(ty, name)| Parameter {
                        ty: *ty,
                        ident: Identifier::new((*name).to_owned(), CodePosition::default()),
                        pos: CodePosition::default(),
                    })
                    .collect(),
                body: FunctionBody::Builtin,
                pos: CodePosition::default(),
            })
            .collect();
        Library { functions }
    }

    pub fn is_builtin(name: &str) -> bool {
        BUILTINS.iter().any(|builtin| builtin.name == name)
    }

    pub fn function(&self, index: usize) -> Option<&Function> {
        self.functions.get(index)
    }

    /// Binds every builtin as a function symbol in `scope`.
    pub fn register_all(&self, store: &mut ScopeStore, scope: ScopeId) {
        for (index, function) in self.functions.iter().enumerate() {
            let value = Value::Function(FunctionRef::Builtin(index));
            if !store.define(scope, &function.ident.name, Type::Function, value) {
                warn!(name = %function.ident.name, "builtin not registered");
            }
        }
    }

    /// Runs builtin `name` with the arguments already bound in `frame`.
    pub fn invoke(&self, name: &str, store: &ScopeStore, frame: ScopeId) -> Result<Value, String> {
        let index = BUILTINS
            .iter()
            .position(|builtin| builtin.name == name)
            .ok_or_else(|| format!("no builtin named '{}'", name))?;
        let args = self.functions[index]
            .params
            .iter()
            .map(|param| {
                store
                    .lookup(frame, &param.ident.name)
                    .and_then(|symbol| symbol.value().cloned())
                    .ok_or_else(|| format!("parameter '{}' is not bound", param.ident.name))
            })
            .collect::<Result<Vec<_>, _>>()?;
        (BUILTINS[index].func)(&args)
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}
