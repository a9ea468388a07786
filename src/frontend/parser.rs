use super::constants::{Keyword, MAIN_FUNCTION, STACK_GROWTH, STACK_RED_ZONE};
use super::errors::{Expected, ParserError, ParserResult, MAX_NESTING_DEPTH};
use super::grammar::{
    AdditiveOperator, Constant, ElseBranch, EqualityOperator, Expr, ExprType, Function,
    FunctionBody, Identifier, LogicalOperator, MultiplicativeOperator, Parameter, Primary,
    Program, RelationalOperator, Stmt, StmtType, Type, UnaryOperator,
};
use super::span::CodePosition;
use super::token::{SpannedToken, Token};

use std::iter::Peekable;
use tracing::debug;

/// Recursive descent parser with one token of lookahead.
///
/// Each grammar rule has its own routine. The first grammar violation
/// ends parsing; there is no recovery.
pub struct Parser<T>
where
    T: Iterator<Item = SpannedToken>,
{
    tokens: Peekable<T>,
    /// Current nesting of blocks, sub-expressions and operator chains.
    depth: usize,
}

impl<T> Parser<T>
where
    T: Iterator<Item = SpannedToken>,
{
    pub fn new(tokens: T) -> Self {
        Parser {
            tokens: tokens.peekable(),
            depth: 0,
        }
    }

    /// Returns current token.
    fn peek_token(&mut self) -> ParserResult<&SpannedToken> {
        self.tokens.peek().ok_or(ParserError::BeyondEndOfFile)
    }

    /// Returns current token and advances stream.
    fn take_token(&mut self) -> ParserResult<SpannedToken> {
        self.tokens.next().ok_or(ParserError::BeyondEndOfFile)
    }

    fn peek_pos(&mut self) -> ParserResult<CodePosition> {
        Ok(self.peek_token()?.pos)
    }

    /// Checks whether or not the current token matches the given token.
    fn check(&mut self, t: &Token) -> ParserResult<bool> {
        Ok(&self.peek_token()?.token == t)
    }

    /// If the current token matches the given token, consume it and
    /// return true, else return false.
    fn check_consume(&mut self, t: &Token) -> ParserResult<bool> {
        if self.check(t)? {
            self.take_token()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Consumes token, asserting that it equals the expected token.
    fn consume(&mut self, t: Token) -> ParserResult<CodePosition> {
        let found = self.take_token()?;

        if found.token == t {
            Ok(found.pos)
        } else {
            Err(ParserError::unexpected(found, Expected::Token(t)))
        }
    }

    /// Goes one nesting level deeper, failing at the current token once
    /// `MAX_NESTING_DEPTH` is reached.
    fn enter(&mut self) -> ParserResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            let pos = self.peek_pos()?;
            return Err(ParserError::TooDeeplyNested { pos });
        }
        self.depth += 1;
        Ok(())
    }

    /// Runs a recursive rule one level deeper, on a grown stack if needed.
    fn nested<R, F>(&mut self, rule: F) -> ParserResult<R>
    where
        F: FnOnce(&mut Self) -> ParserResult<R>,
    {
        self.enter()?;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || rule(self));
        self.depth -= 1;
        result
    }

    /// Parses the whole token stream as a list of functions.
    pub fn parse(mut self) -> ParserResult<Program> {
        let pos = self.peek_pos()?;
        let mut functions = vec![];

        while !self.check(&Token::EndOfFile)? {
            functions.push(self.parse_function()?);
        }

        if functions.is_empty() {
            return Err(ParserError::NoFunctions { pos });
        }

        let main = find_main(&functions);
        debug!(
            functions = functions.len(),
            entry = %functions[main].ident.name,
            "parsed program"
        );

        Ok(Program {
            functions,
            main,
            pos,
        })
    }

    /// Function ::= ReturnType Identifier ( Parameters ) { Statements }
    fn parse_function(&mut self) -> ParserResult<Function> {
        let found = self.take_token()?;
        let return_type = match &found.token {
            Token::Keyword(keyword) => keyword.return_type(),
            _ => None,
        };
        let return_type = match return_type {
            Some(ty) => ty,
            None => return Err(ParserError::unexpected(found, Expected::ReturnType)),
        };

        let ident = self.parse_identifier()?;
        self.consume(Token::LeftParen)?;
        let params = self.parse_parameters()?;
        self.consume(Token::RightParen)?;
        let body = self.parse_block()?;

        Ok(Function {
            return_type,
            ident,
            params,
            body: FunctionBody::Statements(body),
            pos: found.pos,
        })
    }

    fn parse_parameters(&mut self) -> ParserResult<Vec<Parameter>> {
        let mut params = vec![];
        if self.check(&Token::RightParen)? {
            return Ok(params);
        }

        loop {
            params.push(self.parse_parameter()?);
            if !self.check_consume(&Token::Comma)? {
                return Ok(params);
            }
        }
    }

    /// Parameter ::= VariableType Identifier
    fn parse_parameter(&mut self) -> ParserResult<Parameter> {
        let (ty, pos) = self.parse_variable_type()?;
        let ident = self.parse_identifier()?;
        Ok(Parameter { ty, ident, pos })
    }

    fn parse_variable_type(&mut self) -> ParserResult<(Type, CodePosition)> {
        let found = self.take_token()?;
        let ty = match &found.token {
            Token::Keyword(keyword) => keyword.variable_type(),
            _ => None,
        };

        match ty {
            Some(ty) => Ok((ty, found.pos)),
            None => Err(ParserError::unexpected(found, Expected::VariableType)),
        }
    }

    fn parse_identifier(&mut self) -> ParserResult<Identifier> {
        let found = self.take_token()?;
        match found.token {
            Token::Identifier(name) => Ok(Identifier::new(name, found.pos)),
            _ => Err(ParserError::unexpected(found, Expected::Identifier)),
        }
    }

    /// { Statements }
    fn parse_block(&mut self) -> ParserResult<Vec<Stmt>> {
        self.consume(Token::LeftBrace)?;
        let stmts = self.nested(Self::parse_statements)?;
        self.consume(Token::RightBrace)?;
        Ok(stmts)
    }

    /// Parses statements until a token that cannot start one.
    fn parse_statements(&mut self) -> ParserResult<Vec<Stmt>> {
        let mut stmts = vec![];

        loop {
            let token = self.peek_token()?.token.clone();
            let stmt = match token {
                Token::Keyword(Keyword::Return) => self.parse_return()?,
                Token::Keyword(Keyword::If) => self.parse_if()?,
                Token::Keyword(keyword) if keyword.variable_type().is_some() => {
                    self.parse_declaration()?
                }
                Token::Identifier(_) => self.parse_assignment()?,
                Token::Semicolon => {
                    // Empty statement.
                    self.take_token()?;
                    continue;
                }
                _ => return Ok(stmts),
            };
            stmts.push(stmt);
        }
    }

    /// Declaration ::= Type Identifier [= Expression] ;
    fn parse_declaration(&mut self) -> ParserResult<Stmt> {
        let (ty, pos) = self.parse_variable_type()?;
        let ident = self.parse_identifier()?;
        let expr = if self.check_consume(&Token::Equals)? {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume(Token::Semicolon)?;

        Ok(Stmt::new(StmtType::Declaration(ty, ident, expr), pos))
    }

    /// Assignment ::= Identifier = Expression ;
    fn parse_assignment(&mut self) -> ParserResult<Stmt> {
        let ident = self.parse_identifier()?;
        self.consume(Token::Equals)?;
        let expr = self.parse_expression()?;
        self.consume(Token::Semicolon)?;

        let pos = ident.pos;
        Ok(Stmt::new(StmtType::Assignment(ident, expr), pos))
    }

    /// Return ::= return Expression ;
    fn parse_return(&mut self) -> ParserResult<Stmt> {
        let pos = self.consume(Token::Keyword(Keyword::Return))?;
        let expr = self.parse_expression()?;
        self.consume(Token::Semicolon)?;

        Ok(Stmt::new(StmtType::Return(expr), pos))
    }

    /// If ::= if ( Expression ) { Statements } [else ({ Statements } | If)]
    fn parse_if(&mut self) -> ParserResult<Stmt> {
        let pos = self.consume(Token::Keyword(Keyword::If))?;
        self.consume(Token::LeftParen)?;
        let condition = self.parse_expression()?;
        self.consume(Token::RightParen)?;
        let then_block = self.parse_block()?;

        let else_branch = if self.check_consume(&Token::Keyword(Keyword::Else))? {
            if self.check(&Token::Keyword(Keyword::If))? {
                Some(ElseBranch::If(Box::new(self.parse_if()?)))
            } else {
                Some(ElseBranch::Block(self.parse_block()?))
            }
        } else {
            None
        };

        Ok(Stmt::new(StmtType::If(condition, then_block, else_branch), pos))
    }

    /// Expression ::= LogicalOr
    pub fn parse_expression(&mut self) -> ParserResult<Expr> {
        self.nested(Self::parse_logical_or)
    }

    /// LogicalOr ::= LogicalAnd {or LogicalAnd}
    fn parse_logical_or(&mut self) -> ParserResult<Expr> {
        let depth = self.depth;
        let mut lhs = self.parse_logical_and()?;

        while self.check_consume(&Token::Or)? {
            self.enter()?;
            let rhs = self.parse_logical_and()?;
            lhs = binary(lhs, rhs, |l, r| ExprType::Logical(LogicalOperator::Or, l, r));
        }

        self.depth = depth;
        Ok(lhs)
    }

    /// LogicalAnd ::= Equality {and Equality}
    fn parse_logical_and(&mut self) -> ParserResult<Expr> {
        let depth = self.depth;
        let mut lhs = self.parse_equality()?;

        while self.check_consume(&Token::And)? {
            self.enter()?;
            let rhs = self.parse_equality()?;
            lhs = binary(lhs, rhs, |l, r| ExprType::Logical(LogicalOperator::And, l, r));
        }

        self.depth = depth;
        Ok(lhs)
    }

    /// Equality ::= Relational {(== | !=) Relational}
    fn parse_equality(&mut self) -> ParserResult<Expr> {
        let depth = self.depth;
        let mut lhs = self.parse_relational()?;

        while let Some(op) = EqualityOperator::from_token(&self.peek_token()?.token) {
            self.enter()?;
            self.take_token()?;
            let rhs = self.parse_relational()?;
            lhs = binary(lhs, rhs, |l, r| ExprType::Equality(op, l, r));
        }

        self.depth = depth;
        Ok(lhs)
    }

    /// Relational ::= Additive [(< | > | <= | >=) Additive]
    fn parse_relational(&mut self) -> ParserResult<Expr> {
        let lhs = self.parse_additive()?;

        match RelationalOperator::from_token(&self.peek_token()?.token) {
            Some(op) => {
                self.take_token()?;
                let rhs = self.parse_additive()?;
                Ok(binary(lhs, rhs, |l, r| ExprType::Relational(op, l, r)))
            }
            None => Ok(lhs),
        }
    }

    /// Additive ::= Multiplicative {(+ | -) Multiplicative}
    fn parse_additive(&mut self) -> ParserResult<Expr> {
        let depth = self.depth;
        let mut lhs = self.parse_multiplicative()?;

        while let Some(op) = AdditiveOperator::from_token(&self.peek_token()?.token) {
            self.enter()?;
            self.take_token()?;
            let rhs = self.parse_multiplicative()?;
            lhs = binary(lhs, rhs, |l, r| ExprType::Additive(op, l, r));
        }

        self.depth = depth;
        Ok(lhs)
    }

    /// Multiplicative ::= Exponential {(* | / | %) Exponential}
    fn parse_multiplicative(&mut self) -> ParserResult<Expr> {
        let depth = self.depth;
        let mut lhs = self.parse_exponential()?;

        while let Some(op) = MultiplicativeOperator::from_token(&self.peek_token()?.token) {
            self.enter()?;
            self.take_token()?;
            let rhs = self.parse_exponential()?;
            lhs = binary(lhs, rhs, |l, r| ExprType::Multiplicative(op, l, r));
        }

        self.depth = depth;
        Ok(lhs)
    }

    /// Exponential ::= Primary [^ Primary]
    fn parse_exponential(&mut self) -> ParserResult<Expr> {
        let lhs = self.parse_primary()?;

        if self.check_consume(&Token::Caret)? {
            let rhs = self.parse_primary()?;
            return Ok(binary(lhs, rhs, ExprType::Exponential));
        }

        Ok(lhs)
    }

    /// Primary ::= Identifier | Identifier ( Arguments ) | ( Expression )
    ///           | Constant | UnaryOperator Primary
    fn parse_primary(&mut self) -> ParserResult<Expr> {
        if self.peek_token()?.token.is_constant() {
            return self.parse_constant();
        }

        let found = self.take_token()?;
        let pos = found.pos;

        let primary = match found.token {
            Token::Identifier(name) => {
                let ident = Identifier::new(name, pos);
                if self.check_consume(&Token::LeftParen)? {
                    let args = self.parse_arguments()?;
                    self.consume(Token::RightParen)?;
                    Primary::Call(ident, args)
                } else {
                    Primary::Identifier(ident)
                }
            }
            Token::LeftParen => {
                let mut sub_expr = self.parse_expression()?;
                self.consume(Token::RightParen)?;
                sub_expr.pos = pos;
                return Ok(sub_expr);
            }
            token => match UnaryOperator::from_token(&token) {
                Some(op) => {
                    let operand = self.nested(Self::parse_primary)?;
                    return Ok(Expr::new(ExprType::Unary(op, Box::new(operand)), pos));
                }
                None => {
                    let found = SpannedToken::new(token, pos);
                    return Err(ParserError::unexpected(found, Expected::Expression));
                }
            },
        };

        Ok(Expr::new(ExprType::Primary(primary), pos))
    }

    /// Constant ::= IntegerConstant | NumberConstant | StringConstant | BooleanConstant
    fn parse_constant(&mut self) -> ParserResult<Expr> {
        let found = self.take_token()?;
        let constant = match found.token {
            Token::Integer(n) => Constant::Integer(n),
            Token::Number(n) => Constant::Number(n),
            Token::Str(s) => Constant::Str(s),
            Token::Boolean(b) => Constant::Boolean(b),
            _ => return Err(ParserError::unexpected(found, Expected::Expression)),
        };

        Ok(Expr::new(
            ExprType::Primary(Primary::Constant(constant)),
            found.pos,
        ))
    }

    fn parse_arguments(&mut self) -> ParserResult<Vec<Expr>> {
        let mut args = vec![];
        if self.check(&Token::RightParen)? {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if !self.check_consume(&Token::Comma)? {
                return Ok(args);
            }
        }
    }
}

/// Index of the function named `main`, else of the first function.
fn find_main(functions: &[Function]) -> usize {
    functions
        .iter()
        .position(|f| f.ident.name == MAIN_FUNCTION)
        .unwrap_or(0)
}

/// Builds a binary node stamped with the position of its left operand.
fn binary<F>(lhs: Expr, rhs: Expr, make: F) -> Expr
where
    F: FnOnce(Box<Expr>, Box<Expr>) -> ExprType,
{
    let pos = lhs.pos;
    Expr::new(make(Box::new(lhs), Box::new(rhs)), pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;

    fn parse_source(source: &str) -> ParserResult<Program> {
        Parser::new(tokenize(source).into_iter()).parse()
    }

    fn parse_expr(source: &str) -> String {
        let mut parser = Parser::new(tokenize(source).into_iter());
        parser.parse_expression().unwrap().ast_string()
    }

    #[test]
    fn test_parser() {
        assert_eq!(parse_expr("99 + 49"), "(+ 99 49)");
        assert_eq!(parse_expr("3 + 99 * 20 - 5"), "(- (+ 3 (* 99 20)) 5)");
        assert_eq!(parse_expr("-3 * (110 + 220)"), "(* (- 3) (+ 110 220))");
        assert_eq!(parse_expr("2 ^ 4 * 1.5"), "(* (^ 2 4) 1.5)");
        assert_eq!(parse_expr("-2 ^ 2"), "(^ (- 2) 2)");
    }

    #[test]
    fn test_left_associative_chains() {
        assert_eq!(parse_expr("10 - 4 - 3"), "(- (- 10 4) 3)");
        assert_eq!(parse_expr("64 / 4 / 2 % 3"), "(% (/ (/ 64 4) 2) 3)");
        assert_eq!(parse_expr("a or b or c"), "(or (or a b) c)");
    }

    #[test]
    fn test_precedence_tiers() {
        assert_eq!(
            parse_expr("a < b + 1 and c == d or !e"),
            "(or (and (< a (+ b 1)) (== c d)) (! e))"
        );
        assert_eq!(
            parse_expr("f(x, 1 + 2) != ~g()"),
            "(!= (call f x (+ 1 2)) (~ (call g )))"
        );
    }

    #[test]
    fn test_positions_are_leftmost() {
        let mut parser = Parser::new(tokenize("  x + (y * 2)").into_iter());
        let expr = parser.parse_expression().unwrap();
        assert_eq!(expr.pos, CodePosition::new(1, 3));

        match expr.expr {
            ExprType::Additive(_, _, rhs) => assert_eq!(rhs.pos, CodePosition::new(1, 7)),
            other => panic!("unexpected expression {:?}", other),
        }
    }

    #[test]
    fn test_parse_program() {
        let program = parse_source(
            "int helper(int a, num b) { return a; }\n\
             int main() { int v = 65; ; v = v + 1; if (v > 1) { return v; } else if (false) { } else { } return 0; }",
        )
        .unwrap();

        assert_eq!(program.functions.len(), 2);
        assert_eq!(program.main, 1);
        assert_eq!(program.main().ident.name, "main");
        assert_eq!(program.functions[0].params.len(), 2);
        assert_eq!(program.functions[0].params[1].ty, Type::Number);
        assert_eq!(
            program.main().ast_string(),
            "(fn int main () {(decl int v 65) (set v (+ v 1)) \
             (if (> v 1) {(return v)} (if false {} {})) (return 0)})"
        );
    }

    #[test]
    fn test_entry_point_fallback() {
        let program = parse_source("int first() { return 1; } int second() { return 2; }").unwrap();
        assert_eq!(program.main, 0);

        let program = parse_source("int main() { return 1; } int other() { return 2; }").unwrap();
        assert_eq!(program.main, 0);

        let program = parse_source("int a() { return 1; } int b() { return 2; } int main() { return 3; }")
            .unwrap();
        assert_eq!(program.main, 2);
    }

    #[test]
    fn test_parse_errors() {
        let error = parse_source("int main() { return ; }").unwrap_err();
        assert_eq!(
            error,
            ParserError::unexpected(
                SpannedToken::new(Token::Semicolon, CodePosition::new(1, 21)),
                Expected::Expression
            )
        );

        let error = parse_source("int main() { int x = 1 }").unwrap_err();
        assert_eq!(error.position(), Some(CodePosition::new(1, 24)));

        let error = parse_source("main() { }").unwrap_err();
        assert!(matches!(
            error,
            ParserError::UnexpectedToken {
                expected: Expected::ReturnType,
                ..
            }
        ));

        let error = parse_source("int main(void x) { }").unwrap_err();
        assert!(matches!(
            error,
            ParserError::UnexpectedToken {
                expected: Expected::VariableType,
                ..
            }
        ));

        let error = parse_source("   ").unwrap_err();
        assert_eq!(
            error,
            ParserError::NoFunctions {
                pos: CodePosition::new(1, 4)
            }
        );
    }

    #[test]
    fn test_invalid_token_is_reported() {
        let error = parse_source("int main() { return 9lives; }").unwrap_err();
        match error {
            ParserError::UnexpectedToken { found, .. } => {
                assert_eq!(found.token, Token::Invalid("9lives".to_owned()));
                assert_eq!(found.pos, CodePosition::new(1, 21));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_nesting_limit() {
        let parens = 50_000;
        let source = format!(
            "int main() {{ return {}1{}; }}",
            "(".repeat(parens),
            ")".repeat(parens)
        );
        match parse_source(&source) {
            Err(ParserError::TooDeeplyNested { pos }) => {
                assert_eq!(pos, CodePosition::new(1, 20 + MAX_NESTING_DEPTH))
            }
            other => panic!("unexpected result {:?}", other.map(|p| p.functions.len())),
        }

        let source = format!("int main() {{ return 1{}; }}", " + 1".repeat(5_000));
        assert!(matches!(
            parse_source(&source),
            Err(ParserError::TooDeeplyNested { .. })
        ));

        let source = format!(
            "int main() {{ {} return 1; {} }}",
            "if (true) {".repeat(2_000),
            "}".repeat(2_000)
        );
        assert!(matches!(
            parse_source(&source),
            Err(ParserError::TooDeeplyNested { .. })
        ));

        let error = ParserError::TooDeeplyNested {
            pos: CodePosition::new(2, 5),
        };
        assert_eq!(error.to_string(), "2:5: nesting deeper than 1024 levels");
    }

    #[test]
    fn test_nesting_within_limit() {
        let source = format!(
            "int main() {{ return {}1{}; }}",
            "(".repeat(500),
            ")".repeat(500)
        );
        assert!(parse_source(&source).is_ok());

        let source = format!("int main() {{ return 1{}; }}", " + 1".repeat(500));
        assert!(parse_source(&source).is_ok());
    }
}
