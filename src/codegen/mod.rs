//! Three-address code printer. Walks the entry function of a parsed program
//! without evaluating it and emits one operation per line.

use crate::frontend::grammar::{
    Constant, ElseBranch, Expr, ExprType, Function, FunctionBody, LogicalOperator, Primary,
    Program, Stmt, StmtType,
};
use std::fmt::Write;

const TEMPORARY_PREFIX: &str = "_t";
const LABEL_PREFIX: &str = "_L";

pub fn generate(program: &Program) -> String {
    let mut generator = Generator::default();
    generator.function(program.main());
    generator.output
}

#[derive(Default)]
struct Generator {
    output: String,
    next_temporary: usize,
    next_label: usize,
    indent: usize,
}

impl Generator {
    fn temporary(&mut self) -> String {
        let name = format!("{}{}", TEMPORARY_PREFIX, self.next_temporary);
        self.next_temporary += 1;
        name
    }

    fn label(&mut self) -> String {
        let name = format!("{}{}", LABEL_PREFIX, self.next_label);
        self.next_label += 1;
        name
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.output.push('\t');
        }
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn place_label(&mut self, label: &str) {
        let _ = writeln!(self.output, "{}:", label);
    }

    fn function(&mut self, function: &Function) {
        self.place_label(&function.ident.name);
        self.indent += 1;
        if let FunctionBody::Statements(stmts) = &function.body {
            self.statements(stmts);
        }
        self.indent -= 1;
    }

    fn statements(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.statement(stmt);
        }
    }

    fn statement(&mut self, stmt: &Stmt) {
        match &stmt.stmt {
            StmtType::Declaration(_, _, None) => {}
            StmtType::Declaration(_, ident, Some(expr)) | StmtType::Assignment(ident, expr) => {
                let value = self.expression(expr);
                self.line(&format!("{} = {}", ident.name, value));
            }
            StmtType::Return(expr) => {
                let value = self.expression(expr);
                self.line(&format!("ret {}", value));
            }
            StmtType::If(condition, then_block, else_branch) => {
                let condition = self.expression(condition);
                let true_label = self.label();
                let end_label = self.label();
                self.line(&format!("if {} goto {}", condition, true_label));

                self.indent += 1;
                match else_branch {
                    Some(ElseBranch::Block(stmts)) => self.statements(stmts),
                    Some(ElseBranch::If(stmt)) => self.statement(stmt),
                    None => {}
                }
                self.line(&format!("goto {}", end_label));
                self.place_label(&true_label);
                self.statements(then_block);
                self.place_label(&end_label);
                self.indent -= 1;
            }
        }
    }

    /// Emits the code for `expr` and returns the temporary holding its result.
    fn expression(&mut self, expr: &Expr) -> String {
        match &expr.expr {
            ExprType::Logical(op, lhs, rhs) => {
                let symbol = match op {
                    LogicalOperator::And => "&&",
                    LogicalOperator::Or => "||",
                };
                self.binary(symbol, lhs, rhs)
            }
            ExprType::Equality(op, lhs, rhs) => self.binary(op.symbol(), lhs, rhs),
            ExprType::Relational(op, lhs, rhs) => self.binary(op.symbol(), lhs, rhs),
            ExprType::Additive(op, lhs, rhs) => self.binary(op.symbol(), lhs, rhs),
            ExprType::Multiplicative(op, lhs, rhs) => self.binary(op.symbol(), lhs, rhs),
            ExprType::Exponential(lhs, rhs) => self.binary("^", lhs, rhs),
            ExprType::Unary(op, operand) => {
                let operand = self.expression(operand);
                let result = self.temporary();
                self.line(&format!("{} = {}{}", result, op.symbol(), operand));
                result
            }
            ExprType::Primary(Primary::Identifier(ident)) => self.assign_temporary(&ident.name),
            ExprType::Primary(Primary::Constant(constant)) => {
                let text = match constant {
                    Constant::Integer(n) => n.to_string(),
                    Constant::Number(n) => format!("{:?}", n),
                    Constant::Str(s) => format!("\"{}\"", s),
                    Constant::Boolean(b) => b.to_string(),
                };
                self.assign_temporary(&text)
            }
            ExprType::Primary(Primary::Call(ident, args)) => {
                let args: Vec<_> = args.iter().map(|arg| self.expression(arg)).collect();
                for arg in &args {
                    self.line(&format!("param {}", arg));
                }
                let result = self.temporary();
                self.line(&format!("{} = call {}, {}", result, ident.name, args.len()));
                result
            }
        }
    }

    fn binary(&mut self, symbol: &str, lhs: &Expr, rhs: &Expr) -> String {
        let lhs = self.expression(lhs);
        let rhs = self.expression(rhs);
        let result = self.temporary();
        self.line(&format!("{} = {} {} {}", result, lhs, symbol, rhs));
        result
    }

    fn assign_temporary(&mut self, value: &str) -> String {
        let result = self.temporary();
        self.line(&format!("{} = {}", result, value));
        result
    }
}
