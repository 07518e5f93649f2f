// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    error::PreprocessError,
    expression::ast::{BinaryOperator, Expression, UnaryOperator},
    location::Location,
};

/// Evaluates an expression in the signed 64-bit domain.
///
/// Arithmetic wraps around, comparisons and logical operators give 0 or 1.
/// The right operand of `&&` and `||` is not evaluated when the left operand
/// decides the result.
pub fn evaluate_expression(expression: &Expression) -> Result<i64, PreprocessError> {
    match expression {
        Expression::Number(value, _) => Ok(*value),
        Expression::Binary(operator, operator_location, left, right) => {
            evaluate_binary_expression(*operator, operator_location, left, right)
        }
        Expression::Unary(operator, _, operand) => {
            let value = evaluate_expression(operand)?;
            let result = match operator {
                UnaryOperator::Plus => value,
                UnaryOperator::Minus => value.wrapping_neg(),
                UnaryOperator::LogicalNot => i64::from(value == 0),
                UnaryOperator::BitwiseNot => !value,
            };
            Ok(result)
        }
    }
}

fn evaluate_binary_expression(
    operator: BinaryOperator,
    operator_location: &Location,
    left: &Expression,
    right: &Expression,
) -> Result<i64, PreprocessError> {
    let left = evaluate_expression(left)?;

    // Logical short-circuiting
    match operator {
        BinaryOperator::And if left == 0 => return Ok(0),
        BinaryOperator::Or if left != 0 => return Ok(1),
        _ => {}
    }

    let right = evaluate_expression(right)?;

    let result = match operator {
        BinaryOperator::Add => left.wrapping_add(right),
        BinaryOperator::Subtract => left.wrapping_sub(right),
        BinaryOperator::Multiply => left.wrapping_mul(right),
        BinaryOperator::Divide | BinaryOperator::Modulo if right == 0 => {
            return Err(PreprocessError::DivisionByZero(*operator_location));
        }
        BinaryOperator::Divide => left.wrapping_div(right),
        BinaryOperator::Modulo => left.wrapping_rem(right),
        BinaryOperator::Equal => i64::from(left == right),
        BinaryOperator::NotEqual => i64::from(left != right),
        BinaryOperator::LessThan => i64::from(left < right),
        BinaryOperator::LessThanOrEqual => i64::from(left <= right),
        BinaryOperator::GreaterThan => i64::from(left > right),
        BinaryOperator::GreaterThanOrEqual => i64::from(left >= right),
        BinaryOperator::And | BinaryOperator::Or => i64::from(right != 0),
        BinaryOperator::BitwiseAnd => left & right,
        BinaryOperator::BitwiseOr => left | right,
        BinaryOperator::BitwiseXor => left ^ right,
        BinaryOperator::ShiftLeft | BinaryOperator::ShiftRight => {
            let Some(count) = u32::try_from(right).ok().filter(|count| *count < 64) else {
                return Err(PreprocessError::malformed_expression(
                    &format!("Shift count {} is out of the range 0 to 63.", right),
                    *operator_location,
                ));
            };

            if operator == BinaryOperator::ShiftLeft {
                left.wrapping_shl(count)
            } else {
                left >> count
            }
        }
    };

    Ok(result)
}
