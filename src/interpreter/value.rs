use super::errors::{OperationError, OperationResult};
use crate::frontend::grammar::{
    AdditiveOperator, Constant, EqualityOperator, LogicalOperator, MultiplicativeOperator,
    RelationalOperator, Type, UnaryOperator,
};
use std::cmp::Ordering;
use std::fmt;

/// Handle to something callable: a user function by its index in the program,
/// or a builtin by its index in the library.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FunctionRef {
    Program(usize),
    Builtin(usize),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Integer(i64),
    Number(f64),
    Str(String),
    Boolean(bool),
    Function(FunctionRef),
}

impl Value {
    pub fn value_type(&self) -> Type {
        match self {
            Value::Integer(_) => Type::Integer,
            Value::Number(_) => Type::Number,
            Value::Str(_) => Type::String,
            Value::Boolean(_) => Type::Boolean,
            Value::Function(_) => Type::Function,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    /// Numeric view of the value; integers widen to float.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn apply_logical(op: LogicalOperator, lhs: Value, rhs: Value) -> OperationResult<Value> {
        match (lhs, rhs) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(match op {
                LogicalOperator::And => a && b,
                LogicalOperator::Or => a || b,
            })),
            (a, b) => Err(illegal_infix(op.symbol(), &a, &b)),
        }
    }

    pub fn apply_equality(op: EqualityOperator, lhs: Value, rhs: Value) -> OperationResult<Value> {
        let equal = match (&lhs, &rhs) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => return Err(illegal_infix(op.symbol(), &lhs, &rhs)),
            },
        };
        Ok(Value::Boolean(match op {
            EqualityOperator::EqualTo => equal,
            EqualityOperator::NotEqualTo => !equal,
        }))
    }

    pub fn apply_relational(
        op: RelationalOperator,
        lhs: Value,
        rhs: Value,
    ) -> OperationResult<Value> {
        let ordering = match (&lhs, &rhs) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => return Err(illegal_infix(op.symbol(), &lhs, &rhs)),
            },
        };
        // NaN compares false against everything.
        let result = match ordering {
            None => false,
            Some(ordering) => match op {
                RelationalOperator::LessThan => ordering == Ordering::Less,
                RelationalOperator::GreaterThan => ordering == Ordering::Greater,
                RelationalOperator::LessEq => ordering != Ordering::Greater,
                RelationalOperator::GreaterEq => ordering != Ordering::Less,
            },
        };
        Ok(Value::Boolean(result))
    }

    pub fn apply_additive(op: AdditiveOperator, lhs: Value, rhs: Value) -> OperationResult<Value> {
        match (op, lhs, rhs) {
            (AdditiveOperator::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (AdditiveOperator::Add, lhs, rhs) => numerical_binop(
                op.symbol(),
                lhs,
                rhs,
                |a, b| a.checked_add(b).ok_or(OperationError::IntegerOverflow),
                |a, b| a + b,
            ),
            (AdditiveOperator::Subtract, lhs, rhs) => numerical_binop(
                op.symbol(),
                lhs,
                rhs,
                |a, b| a.checked_sub(b).ok_or(OperationError::IntegerOverflow),
                |a, b| a - b,
            ),
        }
    }

    pub fn apply_multiplicative(
        op: MultiplicativeOperator,
        lhs: Value,
        rhs: Value,
    ) -> OperationResult<Value> {
        match op {
            MultiplicativeOperator::Multiply => numerical_binop(
                op.symbol(),
                lhs,
                rhs,
                |a, b| a.checked_mul(b).ok_or(OperationError::IntegerOverflow),
                |a, b| a * b,
            ),
            MultiplicativeOperator::Divide => numerical_binop(
                op.symbol(),
                lhs,
                rhs,
                |a, b| checked_division(a, b, i64::checked_div),
                |a, b| a / b,
            ),
            MultiplicativeOperator::Modulo => numerical_binop(
                op.symbol(),
                lhs,
                rhs,
                |a, b| checked_division(a, b, i64::checked_rem),
                |a, b| a % b,
            ),
        }
    }

    /// `int ^ int` stays integral; a negative exponent truncates the float result
    /// toward zero. Anything involving a float is a float power.
    pub fn apply_exponential(lhs: Value, rhs: Value) -> OperationResult<Value> {
        match (&lhs, &rhs) {
            (Value::Integer(base), Value::Integer(exp)) if *exp >= 0 => {
                let exp = u32::try_from(*exp).map_err(|_| OperationError::IntegerOverflow)?;
                base.checked_pow(exp)
                    .map(Value::Integer)
                    .ok_or(OperationError::IntegerOverflow)
            }
            (Value::Integer(0), Value::Integer(_)) => Err(OperationError::DivideByZero),
            (Value::Integer(base), Value::Integer(exp)) => {
                let power = (*base as f64).powf(*exp as f64);
                if !power.is_finite() {
                    return Err(OperationError::IntegerOverflow);
                }
                Ok(Value::Integer(power.trunc() as i64))
            }
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(a), Some(b)) => Ok(Value::Number(a.powf(b))),
                _ => Err(illegal_infix("^", &lhs, &rhs)),
            },
        }
    }

    pub fn apply_unary(op: UnaryOperator, value: Value) -> OperationResult<Value> {
        match (op, value) {
            (UnaryOperator::Negate, Value::Integer(n)) => n
                .checked_neg()
                .map(Value::Integer)
                .ok_or(OperationError::IntegerOverflow),
            (UnaryOperator::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
            (UnaryOperator::LogicalNot, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
            (UnaryOperator::Complement, Value::Integer(n)) => Ok(Value::Integer(!n)),
            (op, value) => Err(OperationError::IllegalPrefixOperation {
                op: op.symbol(),
                operand: value.type_name(),
            }),
        }
    }
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Integer(n) => Value::Integer(*n),
            Constant::Number(n) => Value::Number(*n),
            Constant::Str(s) => Value::Str(s.clone()),
            Constant::Boolean(b) => Value::Boolean(*b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Function(FunctionRef::Program(index)) => write!(f, "<fn #{}>", index),
            Value::Function(FunctionRef::Builtin(index)) => write!(f, "<builtin #{}>", index),
        }
    }
}

fn illegal_infix(op: &'static str, lhs: &Value, rhs: &Value) -> OperationError {
    OperationError::IllegalInfixOperation {
        op,
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}

fn checked_division<F>(a: i64, b: i64, func: F) -> OperationResult<i64>
where
    F: Fn(i64, i64) -> Option<i64>,
{
    if b == 0 {
        return Err(OperationError::DivideByZero);
    }
    func(a, b).ok_or(OperationError::IntegerOverflow)
}

/// Integer pair stays integral, any float operand widens both sides.
fn numerical_binop<I, F>(
    op: &'static str,
    lhs: Value,
    rhs: Value,
    int_op: I,
    float_op: F,
) -> OperationResult<Value>
where
    I: Fn(i64, i64) -> OperationResult<i64>,
    F: Fn(f64, f64) -> f64,
{
    match (&lhs, &rhs) {
        (Value::Integer(a), Value::Integer(b)) => int_op(*a, *b).map(Value::Integer),
        (a, b) => match (a.as_number(), b.as_number()) {
            (Some(a), Some(b)) => Ok(Value::Number(float_op(a, b))),
            _ => Err(illegal_infix(op, &lhs, &rhs)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use more_asserts::*;

    #[test]
    fn test_integer_arithmetic_stays_integral() {
        let sum = Value::apply_additive(AdditiveOperator::Add, Value::Integer(40), Value::Integer(2));
        assert_eq!(sum, Ok(Value::Integer(42)));

        let quotient = Value::apply_multiplicative(
            MultiplicativeOperator::Divide,
            Value::Integer(33),
            Value::Integer(4),
        );
        assert_eq!(quotient, Ok(Value::Integer(8)));

        let remainder = Value::apply_multiplicative(
            MultiplicativeOperator::Modulo,
            Value::Integer(-7),
            Value::Integer(3),
        );
        assert_eq!(remainder, Ok(Value::Integer(-1)));
    }

    #[test]
    fn test_mixed_operands_widen() {
        let product = Value::apply_multiplicative(
            MultiplicativeOperator::Multiply,
            Value::Integer(3),
            Value::Number(1.5),
        );
        assert_eq!(product, Ok(Value::Number(4.5)));

        let quotient = Value::apply_multiplicative(
            MultiplicativeOperator::Divide,
            Value::Number(1.0),
            Value::Integer(0),
        );
        match quotient {
            Ok(Value::Number(n)) => assert!(n.is_infinite()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_integer_failures() {
        assert_eq!(
            Value::apply_multiplicative(
                MultiplicativeOperator::Divide,
                Value::Integer(1),
                Value::Integer(0)
            ),
            Err(OperationError::DivideByZero)
        );
        assert_eq!(
            Value::apply_multiplicative(
                MultiplicativeOperator::Modulo,
                Value::Integer(1),
                Value::Integer(0)
            ),
            Err(OperationError::DivideByZero)
        );
        assert_eq!(
            Value::apply_additive(AdditiveOperator::Add, Value::Integer(i64::MAX), Value::Integer(1)),
            Err(OperationError::IntegerOverflow)
        );
        assert_eq!(
            Value::apply_unary(UnaryOperator::Negate, Value::Integer(i64::MIN)),
            Err(OperationError::IntegerOverflow)
        );
    }

    #[test]
    fn test_exponential() {
        assert_eq!(
            Value::apply_exponential(Value::Integer(2), Value::Integer(10)),
            Ok(Value::Integer(1024))
        );
        assert_eq!(
            Value::apply_exponential(Value::Integer(2), Value::Integer(-1)),
            Ok(Value::Integer(0))
        );
        assert_eq!(
            Value::apply_exponential(Value::Integer(-1), Value::Integer(-3)),
            Ok(Value::Integer(-1))
        );
        assert_eq!(
            Value::apply_exponential(Value::Integer(0), Value::Integer(-1)),
            Err(OperationError::DivideByZero)
        );
        assert_eq!(
            Value::apply_exponential(Value::Integer(0), Value::Integer(0)),
            Ok(Value::Integer(1))
        );
        match Value::apply_exponential(Value::Number(2.0), Value::Number(0.5)) {
            Ok(Value::Number(n)) => {
                assert_gt!(n, 1.414);
                assert_lt!(n, 1.415);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            Value::apply_relational(
                RelationalOperator::LessEq,
                Value::Integer(2),
                Value::Number(2.0)
            ),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            Value::apply_equality(
                EqualityOperator::EqualTo,
                Value::Integer(1),
                Value::Number(1.0)
            ),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            Value::apply_equality(
                EqualityOperator::NotEqualTo,
                Value::Str("a".to_owned()),
                Value::Str("b".to_owned())
            ),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            Value::apply_relational(
                RelationalOperator::GreaterThan,
                Value::Number(f64::NAN),
                Value::Integer(0)
            ),
            Ok(Value::Boolean(false))
        );
    }

    #[test]
    fn test_illegal_operations() {
        assert_eq!(
            Value::apply_additive(
                AdditiveOperator::Subtract,
                Value::Str("a".to_owned()),
                Value::Integer(1)
            ),
            Err(OperationError::IllegalInfixOperation {
                op: "-",
                lhs: "str",
                rhs: "int"
            })
        );
        assert_eq!(
            Value::apply_logical(LogicalOperator::And, Value::Boolean(true), Value::Integer(1)),
            Err(OperationError::IllegalInfixOperation {
                op: "and",
                lhs: "bool",
                rhs: "int"
            })
        );
        assert_eq!(
            Value::apply_unary(UnaryOperator::LogicalNot, Value::Integer(1)),
            Err(OperationError::IllegalPrefixOperation {
                op: "!",
                operand: "int"
            })
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(
            Value::apply_unary(UnaryOperator::Complement, Value::Integer(0)),
            Ok(Value::Integer(-1))
        );
        assert_eq!(
            Value::apply_unary(UnaryOperator::Negate, Value::Number(100.5)),
            Ok(Value::Number(-100.5))
        );
    }
}
