// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

use crate::{location::Location, token::Punctuator};

/// The parsed operand of `#if` and `#elif`.
///
/// Macros and `defined` are resolved while parsing, so the tree only
/// contains integer values and operators.
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Number(i64, Location),
    Binary(BinaryOperator, Location, Box<Expression>, Box<Expression>),
    Unary(UnaryOperator, Location, Box<Expression>),
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOperator {
    // Arithmetic operators
    Add,      // '+'
    Subtract, // '-'
    Multiply, // '*'
    Divide,   // '/'
    Modulo,   // '%'

    // Relational operators
    Equal,              // '=='
    NotEqual,           // '!='
    LessThan,           // '<'
    LessThanOrEqual,    // '<='
    GreaterThan,        // '>'
    GreaterThanOrEqual, // '>='

    // Logical operators
    And, // '&&'
    Or,  // '||'

    // Bitwise operators
    BitwiseAnd, // '&'
    BitwiseOr,  // '|'
    BitwiseXor, // '^'
    ShiftLeft,  // '<<'
    ShiftRight, // '>>', arithmetic
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Plus,       // '+'
    Minus,      // '-'
    LogicalNot, // '!'
    BitwiseNot, // '~'
}

impl BinaryOperator {
    pub fn from_punctuator(punctuator: Punctuator) -> Option<Self> {
        let operator = match punctuator {
            Punctuator::Add => BinaryOperator::Add,
            Punctuator::Subtract => BinaryOperator::Subtract,
            Punctuator::Multiply => BinaryOperator::Multiply,
            Punctuator::Divide => BinaryOperator::Divide,
            Punctuator::Modulo => BinaryOperator::Modulo,
            Punctuator::Equal => BinaryOperator::Equal,
            Punctuator::NotEqual => BinaryOperator::NotEqual,
            Punctuator::LessThan => BinaryOperator::LessThan,
            Punctuator::LessThanOrEqual => BinaryOperator::LessThanOrEqual,
            Punctuator::GreaterThan => BinaryOperator::GreaterThan,
            Punctuator::GreaterThanOrEqual => BinaryOperator::GreaterThanOrEqual,
            Punctuator::And => BinaryOperator::And,
            Punctuator::Or => BinaryOperator::Or,
            Punctuator::BitwiseAnd => BinaryOperator::BitwiseAnd,
            Punctuator::BitwiseOr => BinaryOperator::BitwiseOr,
            Punctuator::BitwiseXor => BinaryOperator::BitwiseXor,
            Punctuator::ShiftLeft => BinaryOperator::ShiftLeft,
            Punctuator::ShiftRight => BinaryOperator::ShiftRight,
            _ => return None,
        };
        Some(operator)
    }
}

impl UnaryOperator {
    pub fn from_punctuator(punctuator: Punctuator) -> Option<Self> {
        match punctuator {
            Punctuator::Add => Some(UnaryOperator::Plus),
            Punctuator::Subtract => Some(UnaryOperator::Minus),
            Punctuator::Not => Some(UnaryOperator::LogicalNot),
            Punctuator::BitwiseNot => Some(UnaryOperator::BitwiseNot),
            _ => None,
        }
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
        };
        write!(f, "{}", symbol)
    }
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::LogicalNot => "!",
            UnaryOperator::BitwiseNot => "~",
        };
        write!(f, "{}", symbol)
    }
}

/// Builds the tree of one precedence level, left-associatively:
/// `a - b - c` becomes `((a - b) - c)`.
pub fn build_binary_tree(
    first: Expression,
    rest: Vec<(BinaryOperator, Location, Expression)>,
) -> Expression {
    rest.into_iter()
        .fold(first, |left, (operator, location, right)| {
            Expression::Binary(operator, location, Box::new(left), Box::new(right))
        })
}
