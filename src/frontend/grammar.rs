use super::span::CodePosition;
use std::fmt;

/// Declared type of a function, parameter, variable or symbol.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Type {
    Void,
    Integer,
    Number,
    String,
    Boolean,
    /// Never written in source; carried by symbols bound to functions.
    Function,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum EqualityOperator {
    EqualTo,
    NotEqualTo,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RelationalOperator {
    LessThan,
    GreaterThan,
    LessEq,
    GreaterEq,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AdditiveOperator {
    Add,
    Subtract,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MultiplicativeOperator {
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOperator {
    Negate,
    LogicalNot,
    Complement,
}

/// Root of a parsed program.
#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub functions: Vec<Function>,
    /// Index of the entry function in `functions`.
    pub main: usize,
    pub pos: CodePosition,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Function {
    pub return_type: Type,
    pub ident: Identifier,
    pub params: Vec<Parameter>,
    pub body: FunctionBody,
    pub pos: CodePosition,
}

#[derive(Debug, PartialEq, Clone)]
pub enum FunctionBody {
    Statements(Vec<Stmt>),
    /// Implemented by the builtin library.
    Builtin,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Parameter {
    pub ty: Type,
    pub ident: Identifier,
    pub pos: CodePosition,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Identifier {
    pub name: String,
    pub pos: CodePosition,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Stmt {
    pub stmt: StmtType,
    pub pos: CodePosition,
}

#[derive(Debug, PartialEq, Clone)]
pub enum StmtType {
    Declaration(Type, Identifier, Option<Expr>),
    Assignment(Identifier, Expr),
    Return(Expr),
    If(Expr, Vec<Stmt>, Option<ElseBranch>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum ElseBranch {
    Block(Vec<Stmt>),
    /// `else if`, always a `StmtType::If`.
    If(Box<Stmt>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Expr {
    pub expr: ExprType,
    pub pos: CodePosition,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ExprType {
    Logical(LogicalOperator, Box<Expr>, Box<Expr>),
    Equality(EqualityOperator, Box<Expr>, Box<Expr>),
    Relational(RelationalOperator, Box<Expr>, Box<Expr>),
    Additive(AdditiveOperator, Box<Expr>, Box<Expr>),
    Multiplicative(MultiplicativeOperator, Box<Expr>, Box<Expr>),
    Exponential(Box<Expr>, Box<Expr>),
    Unary(UnaryOperator, Box<Expr>),
    Primary(Primary),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Primary {
    Identifier(Identifier),
    Call(Identifier, Vec<Expr>),
    Constant(Constant),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Constant {
    Integer(i64),
    Number(f64),
    Str(String),
    Boolean(bool),
}

impl Type {
    pub fn name(&self) -> &'static str {
        match self {
            Type::Void => "void",
            Type::Integer => "int",
            Type::Number => "num",
            Type::String => "str",
            Type::Boolean => "bool",
            Type::Function => "function",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl LogicalOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }
}

impl EqualityOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            EqualityOperator::EqualTo => "==",
            EqualityOperator::NotEqualTo => "!=",
        }
    }
}

impl RelationalOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            RelationalOperator::LessThan => "<",
            RelationalOperator::GreaterThan => ">",
            RelationalOperator::LessEq => "<=",
            RelationalOperator::GreaterEq => ">=",
        }
    }
}

impl AdditiveOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            AdditiveOperator::Add => "+",
            AdditiveOperator::Subtract => "-",
        }
    }
}

impl MultiplicativeOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            MultiplicativeOperator::Multiply => "*",
            MultiplicativeOperator::Divide => "/",
            MultiplicativeOperator::Modulo => "%",
        }
    }
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::LogicalNot => "!",
            UnaryOperator::Complement => "~",
        }
    }
}

impl Program {
    /// The entry function.
    pub fn main(&self) -> &Function {
        &self.functions[self.main]
    }

    pub fn ast_string(&self) -> String {
        let functions: Vec<_> = self.functions.iter().map(|f| f.ast_string()).collect();
        format!("(program {})", functions.join(" "))
    }
}

impl Function {
    pub fn is_builtin(&self) -> bool {
        matches!(self.body, FunctionBody::Builtin)
    }

    pub fn ast_string(&self) -> String {
        let params: Vec<_> = self
            .params
            .iter()
            .map(|p| format!("{} {}", p.ty, p.ident.name))
            .collect();
        let body = match &self.body {
            FunctionBody::Statements(stmts) => block_string(stmts),
            FunctionBody::Builtin => "builtin".to_owned(),
        };
        format!(
            "(fn {} {} ({}) {})",
            self.return_type,
            self.ident.name,
            params.join(", "),
            body
        )
    }
}

impl Identifier {
    pub fn new(name: String, pos: CodePosition) -> Self {
        Identifier { name, pos }
    }
}

impl Stmt {
    pub fn new(stmt: StmtType, pos: CodePosition) -> Self {
        Stmt { stmt, pos }
    }

    pub fn ast_string(&self) -> String {
        match &self.stmt {
            StmtType::Declaration(ty, ident, None) => format!("(decl {} {})", ty, ident.name),
            StmtType::Declaration(ty, ident, Some(expr)) => {
                format!("(decl {} {} {})", ty, ident.name, expr.ast_string())
            }
            StmtType::Assignment(ident, expr) => {
                format!("(set {} {})", ident.name, expr.ast_string())
            }
            StmtType::Return(expr) => format!("(return {})", expr.ast_string()),
            StmtType::If(condition, then_block, else_branch) => {
                let mut s = format!("(if {} {}", condition.ast_string(), block_string(then_block));
                match else_branch {
                    Some(ElseBranch::Block(stmts)) => s += &format!(" {}", block_string(stmts)),
                    Some(ElseBranch::If(stmt)) => s += &format!(" {}", stmt.ast_string()),
                    None => {}
                }
                s + ")"
            }
        }
    }
}

impl Expr {
    pub fn new(expr: ExprType, pos: CodePosition) -> Self {
        Expr { expr, pos }
    }

    pub fn ast_string(&self) -> String {
        match &self.expr {
            ExprType::Logical(op, lhs, rhs) => binary_string(op.symbol(), lhs, rhs),
            ExprType::Equality(op, lhs, rhs) => binary_string(op.symbol(), lhs, rhs),
            ExprType::Relational(op, lhs, rhs) => binary_string(op.symbol(), lhs, rhs),
            ExprType::Additive(op, lhs, rhs) => binary_string(op.symbol(), lhs, rhs),
            ExprType::Multiplicative(op, lhs, rhs) => binary_string(op.symbol(), lhs, rhs),
            ExprType::Exponential(lhs, rhs) => binary_string("^", lhs, rhs),
            ExprType::Unary(op, expr) => format!("({} {})", op.symbol(), expr.ast_string()),
            ExprType::Primary(primary) => match primary {
                Primary::Identifier(ident) => ident.name.clone(),
                Primary::Call(ident, args) => {
                    let exprs: Vec<_> = args.iter().map(|a| a.ast_string()).collect();
                    format!("(call {} {})", ident.name, exprs.join(" "))
                }
                Primary::Constant(constant) => match constant {
                    Constant::Integer(n) => n.to_string(),
                    Constant::Number(n) => format!("{:?}", n),
                    Constant::Str(s) => format!("\"{}\"", s),
                    Constant::Boolean(b) => b.to_string(),
                },
            },
        }
    }
}

fn binary_string(symbol: &str, lhs: &Expr, rhs: &Expr) -> String {
    format!("({} {} {})", symbol, lhs.ast_string(), rhs.ast_string())
}

fn block_string(stmts: &[Stmt]) -> String {
    let stmts: Vec<_> = stmts.iter().map(|s| s.ast_string()).collect();
    format!("{{{}}}", stmts.join(" "))
}
