use super::grammar::{
    AdditiveOperator, EqualityOperator, LogicalOperator, MultiplicativeOperator,
    RelationalOperator, UnaryOperator,
};
use super::token::Token;

impl LogicalOperator {
    pub fn from_token(token: &Token) -> Option<LogicalOperator> {
        match token {
            Token::And => Some(LogicalOperator::And),
            Token::Or => Some(LogicalOperator::Or),
            _ => None,
        }
    }
}

impl EqualityOperator {
    pub fn from_token(token: &Token) -> Option<EqualityOperator> {
        match token {
            Token::DoubleEq => Some(EqualityOperator::EqualTo),
            Token::BangEq => Some(EqualityOperator::NotEqualTo),
            _ => None,
        }
    }
}

impl RelationalOperator {
    pub fn from_token(token: &Token) -> Option<RelationalOperator> {
        let op = match token {
            Token::LeftAngle => RelationalOperator::LessThan,
            Token::RightAngle => RelationalOperator::GreaterThan,
            Token::LeftAngleEq => RelationalOperator::LessEq,
            Token::RightAngleEq => RelationalOperator::GreaterEq,
            _ => return None,
        };
        Some(op)
    }
}

impl AdditiveOperator {
    pub fn from_token(token: &Token) -> Option<AdditiveOperator> {
        match token {
            Token::Plus => Some(AdditiveOperator::Add),
            Token::Minus => Some(AdditiveOperator::Subtract),
            _ => None,
        }
    }
}

impl MultiplicativeOperator {
    pub fn from_token(token: &Token) -> Option<MultiplicativeOperator> {
        let op = match token {
            Token::Asterisk => MultiplicativeOperator::Multiply,
            Token::Slash => MultiplicativeOperator::Divide,
            Token::Percent => MultiplicativeOperator::Modulo,
            _ => return None,
        };
        Some(op)
    }
}

impl UnaryOperator {
    pub fn from_token(token: &Token) -> Option<UnaryOperator> {
        let op = match token {
            Token::Minus => UnaryOperator::Negate,
            Token::Bang => UnaryOperator::LogicalNot,
            Token::Tilde => UnaryOperator::Complement,
            _ => return None,
        };
        Some(op)
    }
}
