// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Write;

use crate::expression::ast::Expression;

/// Prints an expression fully parenthesized, e.g. `((1 + 2) * (-3))`.
pub fn print_expression<W: Write>(writer: &mut W, expression: &Expression) -> std::fmt::Result {
    match expression {
        Expression::Number(number, _) => write!(writer, "{number}"),
        Expression::Binary(operator, _, left, right) => {
            write!(writer, "(")?;
            print_expression(writer, left)?;
            write!(writer, " {operator} ")?;
            print_expression(writer, right)?;
            write!(writer, ")")
        }
        Expression::Unary(operator, _, operand) => {
            write!(writer, "({operator}")?;
            print_expression(writer, operand)?;
            write!(writer, ")")
        }
    }
}

pub fn print_to_string(expression: &Expression) -> String {
    let mut output = String::new();
    // writing to a `String` never fails
    let _ = print_expression(&mut output, expression);
    output
}
