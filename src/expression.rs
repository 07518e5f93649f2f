// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

pub mod ast;
pub mod ast_printer;
pub mod evaluator;
pub mod parser;

use crate::{
    error::PreprocessError,
    expander::{ExpansionToken, Expander, TokenQueue},
    location::Location,
    token::Token,
};

use self::{ast_printer::print_to_string, evaluator::evaluate_expression, parser::parse_expression};

pub use self::parser::ExpressionContext;

/// Evaluates the operand of `#if` or `#elif`, macros in it are expanded
/// by `context` as needed.
pub fn evaluate<C: ExpressionContext>(
    tokens: Vec<Token>,
    context: &C,
    directive_location: Location,
) -> Result<i64, PreprocessError> {
    let expression = parse_expression(tokens, context, directive_location)?;
    log::trace!("condition at {}: {}", directive_location, print_to_string(&expression));
    evaluate_expression(&expression)
}

impl ExpressionContext for Expander<'_> {
    fn is_defined(&self, name: &str) -> bool {
        Expander::is_defined(self, name)
    }

    fn is_function_like(&self, name: &str) -> bool {
        Expander::is_function_like(self, name)
    }

    fn expand(
        &self,
        item: &ExpansionToken,
        rest: &mut TokenQueue,
    ) -> Result<Option<Vec<ExpansionToken>>, PreprocessError> {
        self.expand_identifier(item, rest)
    }
}
