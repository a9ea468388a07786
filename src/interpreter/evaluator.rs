use super::config::EvaluatorConfig;
use super::errors::{RuntimeError, RuntimeResult};
use super::library::Library;
use super::output::{Listener, MessageSeverity, OutputSink};
use super::scope::{ScopeId, ScopeStore};
use super::value::{FunctionRef, Value};
use crate::frontend::constants::{STACK_GROWTH, STACK_RED_ZONE};
use crate::frontend::grammar::{
    ElseBranch, Expr, ExprType, Function, FunctionBody, Identifier, Primary, Program, Stmt,
    StmtType, Type,
};

use std::rc::Rc;
#[cfg(feature = "trace-execution")]
use tracing::trace;
use tracing::{debug, warn};

/// Outcome of running a statement sequence.
enum Flow {
    Continue,
    Return(Value),
}

pub struct Evaluator<'p> {
    program: &'p Program,
    library: Rc<Library>,
    config: EvaluatorConfig,
    output: OutputSink,
    scopes: ScopeStore,
    global: ScopeId,
    /// Scope of the innermost active call; new call frames are adjacent to it.
    frame: ScopeId,
    /// Innermost scope, where declarations land and lookups start.
    scope: ScopeId,
    depth: usize,
}

impl<'p> Evaluator<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self::with_config(program, EvaluatorConfig::default())
    }

    pub fn with_config(program: &'p Program, config: EvaluatorConfig) -> Self {
        let mut scopes = ScopeStore::new();
        let global = scopes.new_root();
        Evaluator {
            program,
            library: Rc::new(Library::new()),
            config,
            output: OutputSink::new(),
            scopes,
            global,
            frame: global,
            scope: global,
            depth: 0,
        }
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.output.subscribe(listener);
    }

    pub fn unsubscribe(&mut self, listener: &Listener) {
        self.output.unsubscribe(listener);
    }

    /// Runs the entry function. Failures are published to the listeners and
    /// turn into no value.
    pub fn run(&mut self) -> Option<Value> {
        match self.try_run() {
            Ok(value) => {
                if let Some(value) = &value {
                    self.output.publish(&value.to_string(), MessageSeverity::Normal);
                }
                value
            }
            Err(err) => {
                debug!(%err, "evaluation failed");
                self.output.publish(&err.to_string(), MessageSeverity::Error);
                None
            }
        }
    }

    pub fn try_run(&mut self) -> RuntimeResult<Option<Value>> {
        self.reset();
        let program = self.program;
        let main = program.main();
        debug!(entry = %main.ident.name, "starting evaluation");

        let frame = self.scopes.push_nested(self.global);
        self.frame = frame;
        self.scope = frame;
        let result = self.eval_function_body(main);
        self.scopes.pop(frame);
        self.frame = self.global;
        self.scope = self.global;

        debug!(ok = result.is_ok(), "finished evaluation");
        result
    }

    fn reset(&mut self) {
        self.scopes.clear(self.global);
        self.depth = 0;
        self.library.register_all(&mut self.scopes, self.global);
        for (index, function) in self.program.functions.iter().enumerate() {
            let name = &function.ident.name;
            if Library::is_builtin(name) {
                warn!(%name, pos = %function.pos, "function hidden by builtin of the same name");
                continue;
            }
            let value = Value::Function(FunctionRef::Program(index));
            if !self.scopes.define(self.global, name, Type::Function, value) {
                warn!(%name, pos = %function.pos, "duplicate function ignored");
            }
        }
    }

    fn eval_function_body(&mut self, function: &Function) -> RuntimeResult<Option<Value>> {
        match &function.body {
            FunctionBody::Statements(stmts) => match self.eval_statements(stmts)? {
                Flow::Return(value) => Ok(Some(value)),
                Flow::Continue => Ok(None),
            },
            FunctionBody::Builtin => {
                let name = &function.ident.name;
                self.library
                    .invoke(name, &self.scopes, self.scope)
                    .map(Some)
                    .map_err(|reason| RuntimeError::Builtin {
                        name: name.clone(),
                        reason,
                        pos: function.pos,
                    })
            }
        }
    }

    fn eval_statements(&mut self, stmts: &[Stmt]) -> RuntimeResult<Flow> {
        for stmt in stmts {
            if let Flow::Return(value) = self.eval_statement(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Continue)
    }

    /// Statements and expressions recurse through calls and nesting, so both
    /// run on a stack that is grown on the heap when it gets low. The call
    /// depth limit then decides when recursion fails.
    fn eval_statement(&mut self, stmt: &Stmt) -> RuntimeResult<Flow> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || self.exec_statement(stmt))
    }

    fn exec_statement(&mut self, stmt: &Stmt) -> RuntimeResult<Flow> {
        #[cfg(feature = "trace-execution")]
        trace!(pos = %stmt.pos, "{}", stmt.ast_string());

        match &stmt.stmt {
            StmtType::Declaration(ty, ident, init) => {
                self.scopes.declare(self.scope, &ident.name, *ty);
                if let Some(expr) = init {
                    let value = self.eval_expression(expr)?;
                    if let Some(symbol) = self.scopes.local_mut(self.scope, &ident.name) {
                        symbol.set_value(value);
                    }
                }
                Ok(Flow::Continue)
            }
            StmtType::Assignment(ident, expr) => {
                if self.scopes.owner(self.scope, &ident.name).is_none() {
                    return Err(undefined(ident));
                }
                let value = self.eval_expression(expr)?;
                match self.scopes.lookup_mut(self.scope, &ident.name) {
                    Some(symbol) => {
                        symbol.set_value(value);
                        Ok(Flow::Continue)
                    }
                    None => Err(undefined(ident)),
                }
            }
            StmtType::Return(expr) => Ok(Flow::Return(self.eval_expression(expr)?)),
            StmtType::If(condition, then_block, else_branch) => {
                if self.eval_condition(condition)? {
                    self.eval_block(then_block)
                } else {
                    match else_branch {
                        Some(ElseBranch::Block(stmts)) => self.eval_block(stmts),
                        Some(ElseBranch::If(stmt)) => self.eval_statement(stmt),
                        None => Ok(Flow::Continue),
                    }
                }
            }
        }
    }

    fn eval_condition(&mut self, condition: &Expr) -> RuntimeResult<bool> {
        match self.eval_expression(condition)? {
            Value::Boolean(b) => Ok(b),
            other => Err(RuntimeError::NonBooleanCondition {
                found: other.type_name(),
                pos: condition.pos,
            }),
        }
    }

    fn eval_block(&mut self, stmts: &[Stmt]) -> RuntimeResult<Flow> {
        let enclosing = self.scope;
        self.scope = self.scopes.push_nested(enclosing);
        let result = self.eval_statements(stmts);
        self.scopes.pop(self.scope);
        self.scope = enclosing;
        result
    }

    pub fn eval_expression(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || self.exec_expression(expr))
    }

    fn exec_expression(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        let at = RuntimeError::at(expr.pos);
        match &expr.expr {
            ExprType::Logical(op, lhs, rhs) => {
                let (lhs, rhs) = self.eval_operands(lhs, rhs)?;
                Value::apply_logical(*op, lhs, rhs).map_err(at)
            }
            ExprType::Equality(op, lhs, rhs) => {
                let (lhs, rhs) = self.eval_operands(lhs, rhs)?;
                Value::apply_equality(*op, lhs, rhs).map_err(at)
            }
            ExprType::Relational(op, lhs, rhs) => {
                let (lhs, rhs) = self.eval_operands(lhs, rhs)?;
                Value::apply_relational(*op, lhs, rhs).map_err(at)
            }
            ExprType::Additive(op, lhs, rhs) => {
                let (lhs, rhs) = self.eval_operands(lhs, rhs)?;
                Value::apply_additive(*op, lhs, rhs).map_err(at)
            }
            ExprType::Multiplicative(op, lhs, rhs) => {
                let (lhs, rhs) = self.eval_operands(lhs, rhs)?;
                Value::apply_multiplicative(*op, lhs, rhs).map_err(at)
            }
            ExprType::Exponential(lhs, rhs) => {
                let (lhs, rhs) = self.eval_operands(lhs, rhs)?;
                Value::apply_exponential(lhs, rhs).map_err(at)
            }
            ExprType::Unary(op, operand) => {
                let value = self.eval_expression(operand)?;
                Value::apply_unary(*op, value).map_err(at)
            }
            ExprType::Primary(Primary::Constant(constant)) => Ok(Value::from(constant)),
            ExprType::Primary(Primary::Identifier(ident)) => self.lookup_value(ident),
            ExprType::Primary(Primary::Call(ident, args)) => match self.eval_call(ident, args)? {
                Some(value) => Ok(value),
                None => Err(RuntimeError::NoValue {
                    name: ident.name.clone(),
                    pos: expr.pos,
                }),
            },
        }
    }

    fn eval_operands(&mut self, lhs: &Expr, rhs: &Expr) -> RuntimeResult<(Value, Value)> {
        let lhs = self.eval_expression(lhs)?;
        let rhs = self.eval_expression(rhs)?;
        Ok((lhs, rhs))
    }

    fn lookup_value(&self, ident: &Identifier) -> RuntimeResult<Value> {
        let symbol = self
            .scopes
            .lookup(self.scope, &ident.name)
            .ok_or_else(|| undefined(ident))?;
        symbol
            .value()
            .cloned()
            .ok_or_else(|| RuntimeError::Uninitialized {
                name: ident.name.clone(),
                pos: ident.pos,
            })
    }

    fn eval_call(&mut self, ident: &Identifier, args: &[Expr]) -> RuntimeResult<Option<Value>> {
        let callee = match self.lookup_value(ident)? {
            Value::Function(callee) => callee,
            _ => return Err(not_callable(ident)),
        };
        let program = self.program;
        let library = Rc::clone(&self.library);
        let function = match callee {
            FunctionRef::Program(index) => program.functions.get(index),
            FunctionRef::Builtin(index) => library.function(index),
        }
        .ok_or_else(|| not_callable(ident))?;

        if function.params.len() != args.len() {
            return Err(RuntimeError::WrongArity {
                name: ident.name.clone(),
                expected: function.params.len(),
                got: args.len(),
                pos: ident.pos,
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expression(arg)?);
        }

        if self.depth >= self.config.max_call_depth {
            return Err(RuntimeError::StackOverflow {
                limit: self.config.max_call_depth,
                pos: ident.pos,
            });
        }

        let (caller_frame, caller_scope) = (self.frame, self.scope);
        let frame = self.scopes.push_adjacent(caller_frame);
        for (param, value) in function.params.iter().zip(values) {
            if !self.scopes.define(frame, &param.ident.name, param.ty, value) {
                warn!(function = %ident.name, param = %param.ident.name, "duplicate parameter");
            }
        }

        self.frame = frame;
        self.scope = frame;
        self.depth += 1;
        let result = self.eval_function_body(function);
        self.depth -= 1;
        self.frame = caller_frame;
        self.scope = caller_scope;
        self.scopes.pop(frame);
        result
    }
}

fn undefined(ident: &Identifier) -> RuntimeError {
    RuntimeError::UndefinedVariable {
        name: ident.name.clone(),
        pos: ident.pos,
    }
}

fn not_callable(ident: &Identifier) -> RuntimeError {
    RuntimeError::NotCallable {
        name: ident.name.clone(),
        pos: ident.pos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse;
    use crate::interpreter::config::DEFAULT_MAX_CALL_DEPTH;
    use crate::interpreter::errors::OperationError;
    use std::cell::RefCell;

    fn run(source: &str) -> RuntimeResult<Option<Value>> {
        let program = parse(source).unwrap();
        Evaluator::new(&program).try_run()
    }

    #[test]
    fn test_arithmetic_and_widening() {
        assert_eq!(
            run("int main() { return 1 + 2 * 3 - 4; }"),
            Ok(Some(Value::Integer(3)))
        );
        assert_eq!(
            run("num main() { return 33 / 4 + 0.5; }"),
            Ok(Some(Value::Number(8.5)))
        );
        assert_eq!(
            run("num main(){ int value = -100.5; return -value; }"),
            Ok(Some(Value::Number(100.5)))
        );
    }

    #[test]
    fn test_recursion_uses_fresh_frames() {
        let source = "
            int fact(int n) {
                if (n <= 1) { return 1; }
                return n * fact(n - 1);
            }
            int main() { return fact(10); }
        ";
        assert_eq!(run(source), Ok(Some(Value::Integer(3628800))));
    }

    #[test]
    fn test_callee_cannot_see_caller_locals() {
        let source = "
            int peek() { return secret; }
            int main() { int secret = 1; return peek(); }
        ";
        match run(source) {
            Err(RuntimeError::UndefinedVariable { name, .. }) => assert_eq!(name, "secret"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_shadowing_in_if_block() {
        let source = "
            int main() {
                int v = 1;
                if (true) { int v = 2; v = 3; }
                return v;
            }
        ";
        assert_eq!(run(source), Ok(Some(Value::Integer(1))));

        let source = "
            int main() {
                int v = 1;
                if (true) { v = 5; }
                return v;
            }
        ";
        assert_eq!(run(source), Ok(Some(Value::Integer(5))));
    }

    #[test]
    fn test_else_if_chain() {
        let source = "
            str sign(int n) {
                if (n < 0) { return \"neg\"; }
                else if (n == 0) { return \"zero\"; }
                else { return \"pos\"; }
            }
            str main() { return sign(0) + sign(-3); }
        ";
        assert_eq!(run(source), Ok(Some(Value::Str("zeroneg".to_owned()))));
    }

    #[test]
    fn test_runtime_errors() {
        match run("int main() { if (1) { return 1; } return 0; }") {
            Err(RuntimeError::NonBooleanCondition { found, .. }) => assert_eq!(found, "int"),
            other => panic!("unexpected {:?}", other),
        }
        match run("int main() { return 1 / 0; }") {
            Err(RuntimeError::Operation { source, .. }) => {
                assert_eq!(source, OperationError::DivideByZero)
            }
            other => panic!("unexpected {:?}", other),
        }
        match run("int f(int a) { return a; } int main() { return f(1, 2); }") {
            Err(RuntimeError::WrongArity { expected, got, .. }) => {
                assert_eq!((expected, got), (1, 2))
            }
            other => panic!("unexpected {:?}", other),
        }
        match run("int main() { int x; return x; }") {
            Err(RuntimeError::Uninitialized { name, .. }) => assert_eq!(name, "x"),
            other => panic!("unexpected {:?}", other),
        }
        match run("void f() { int x = 1; } int main() { return f() + 1; }") {
            Err(RuntimeError::NoValue { name, .. }) => assert_eq!(name, "f"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_call_depth_limit() {
        let program = parse("int f(int n) { return f(n + 1); } int main() { return f(0); }").unwrap();
        let config = EvaluatorConfig { max_call_depth: 16 };
        match Evaluator::with_config(&program, config).try_run() {
            Err(RuntimeError::StackOverflow { limit, .. }) => assert_eq!(limit, 16),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_builtin_call() {
        assert_eq!(
            run("num main() { return math.sqrt(16); }"),
            Ok(Some(Value::Number(4.0)))
        );
    }

    #[test]
    fn test_run_publishes_and_resets() {
        let program = parse("int main() { int x = 2; return x ^ 3; }").unwrap();
        let messages = Rc::new(RefCell::new(Vec::new()));
        let received = Rc::clone(&messages);
        let listener: Listener = Rc::new(move |message: &str, severity: MessageSeverity| {
            received.borrow_mut().push((message.to_owned(), severity))
        });

        let mut evaluator = Evaluator::new(&program);
        evaluator.subscribe(Rc::clone(&listener));
        assert_eq!(evaluator.run(), Some(Value::Integer(8)));
        assert_eq!(evaluator.run(), Some(Value::Integer(8)));
        assert_eq!(evaluator.scopes.len(), 1);
        assert_eq!(
            *messages.borrow(),
            vec![
                ("8".to_owned(), MessageSeverity::Normal),
                ("8".to_owned(), MessageSeverity::Normal)
            ]
        );

        let failing = parse("int main() { return y; }").unwrap();
        let mut evaluator = Evaluator::new(&failing);
        evaluator.subscribe(Rc::clone(&listener));
        assert_eq!(evaluator.run(), None);
        let (message, severity) = messages.borrow().last().cloned().unwrap();
        assert_eq!(severity, MessageSeverity::Error);
        assert_eq!(message, "1:21: undefined identifier 'y'");
    }

    fn on_default_stack<F, T>(run: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(run)
            .unwrap()
            .join()
            .unwrap()
    }

    #[test]
    fn test_runaway_recursion_is_reported_on_small_stack() {
        let result = on_default_stack(|| {
            run("int f(int n) { if (n > 0) { if (true) { return f(n - 1) + 1; } } return 0; }
                 int main() { return f(1000); }")
        });
        match result {
            Err(RuntimeError::StackOverflow { limit, .. }) => {
                assert_eq!(limit, DEFAULT_MAX_CALL_DEPTH)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_deep_recursion_within_configured_limit() {
        let result = on_default_stack(|| {
            let program = parse(
                "int down(int n) { if (n == 0) { return 0; } return down(n - 1) + 1; }
                 int main() { return down(5000); }",
            )
            .unwrap();
            let config = EvaluatorConfig {
                max_call_depth: 10_000,
            };
            Evaluator::with_config(&program, config).try_run()
        });
        assert_eq!(result, Ok(Some(Value::Integer(5000))));
    }

    #[test]
    fn test_long_expression_chain_on_small_stack() {
        let result = on_default_stack(|| {
            run(&format!("int main() {{ return 1{}; }}", " + 1".repeat(1000)))
        });
        assert_eq!(result, Ok(Some(Value::Integer(1001))));
    }
}
