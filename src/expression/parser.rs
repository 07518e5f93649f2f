// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    error::PreprocessError,
    expander::{ExpansionToken, TokenQueue},
    expression::{
        ast::{BinaryOperator, Expression, UnaryOperator, build_binary_tree},
        evaluator::evaluate_expression,
    },
    location::Location,
    token::{Punctuator, Token, TokenKind},
};

/// The macro environment of a conditional expression.
pub trait ExpressionContext {
    fn is_defined(&self, name: &str) -> bool;

    fn is_function_like(&self, name: &str) -> bool;

    /// Expands `item` if it is a macro invocation, see `Expander::expand_identifier`.
    fn expand(
        &self,
        item: &ExpansionToken,
        rest: &mut TokenQueue,
    ) -> Result<Option<Vec<ExpansionToken>>, PreprocessError>;
}

// Operator tiers, from the lowest to the highest precedence.
// Each tier is left-associative.
//
// 1: `||`
// 2: `&&`
// 3: `|`
// 4: `^`
// 5: `&`
// 6: `== !=`
// 7: `< <= > >=`
// 8: `<< >>`
// 9: `+`
// 10: `-`
// 11: `*`
// 12: `/ %`
// 13: unary `+ - ! ~`
//
// Note that `-` and `/` have tiers of their own, so `2 * 3 / 4` is `2 * (3 / 4)`.

/// Parses the operand of `#if` or `#elif`.
///
/// Macros are expanded while parsing, and only where the value may matter:
/// the right operand of `&&` (`||`) whose left operand is 0 (non-zero)
/// is parsed without expanding anything.
pub fn parse_expression<C: ExpressionContext>(
    tokens: Vec<Token>,
    context: &C,
    directive_location: Location,
) -> Result<Expression, PreprocessError> {
    let mut parser = ExpressionParser::new(TokenQueue::from_tokens(tokens), context, directive_location);

    if parser.peek_token()?.is_none() {
        return Err(PreprocessError::malformed_expression(
            "Expected an expression.",
            directive_location,
        ));
    }

    let expression = parser.parse_logic_or_expression()?;

    if let Some(token) = parser.peek_token()? {
        return Err(PreprocessError::malformed_expression(
            &format!("Unexpected token \"{}\" after the expression.", token.text),
            token.location,
        ));
    }

    Ok(expression)
}

struct ExpressionParser<'a, C> {
    queue: TokenQueue,
    context: &'a C,

    // Macros are only expanded in evaluating mode.
    evaluating: bool,

    // The number of tokens at the front of the queue which are not
    // expanded again: the result of an expansion, and names which are
    // known not to be expandable.
    settled_count: usize,

    // The location of the last consumed token.
    last_location: Location,
}

impl<'a, C> ExpressionParser<'a, C>
where
    C: ExpressionContext,
{
    fn new(queue: TokenQueue, context: &'a C, directive_location: Location) -> Self {
        Self {
            queue,
            context,
            evaluating: true,
            settled_count: 0,
            last_location: directive_location,
        }
    }

    fn pop_item(&mut self) -> Option<ExpansionToken> {
        let item = self.queue.pop_front()?;
        self.settled_count = self.settled_count.saturating_sub(1);
        Some(item)
    }

    fn skip_whitespace(&mut self) {
        while self
            .queue
            .peek(0)
            .is_some_and(|item| item.token.is_whitespace() || item.token.is_newline())
        {
            self.pop_item();
        }
    }

    // Peeks the next significant token. In evaluating mode a macro
    // invocation at the front is replaced by its expansion first.
    fn peek_token(&mut self) -> Result<Option<&Token>, PreprocessError> {
        loop {
            self.skip_whitespace();
            if !self.evaluating || self.settled_count > 0 {
                break;
            }

            let Some(item) = self.queue.pop_front() else {
                break;
            };

            // The operand of `defined` is read raw.
            let expanded = if item.token.is_identifier("defined") {
                None
            } else {
                self.context.expand(&item, &mut self.queue)?
            };

            match expanded {
                Some(items) => {
                    self.settled_count = items.len();
                    self.queue.push_front_all(items);
                }
                None => {
                    self.queue.push_front(item);
                    self.settled_count = 1;
                    break;
                }
            }
        }

        Ok(self.queue.peek(0).map(|item| &item.token))
    }

    fn next_token(&mut self) -> Result<Option<Token>, PreprocessError> {
        self.peek_token()?;
        Ok(self.pop_item().map(|item| {
            self.last_location = item.token.location;
            item.token
        }))
    }

    // Takes the next significant token without expanding it.
    fn next_raw_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let item = self.pop_item()?;
        self.last_location = item.token.location;
        Some(item.token)
    }

    fn peek_operator(
        &mut self,
        expected_punctuators: &[Punctuator],
    ) -> Result<Option<(BinaryOperator, Location)>, PreprocessError> {
        let Some(token) = self.peek_token()? else {
            return Ok(None);
        };

        match token.kind {
            TokenKind::Punctuator(punctuator) if expected_punctuators.contains(&punctuator) => {
                Ok(BinaryOperator::from_punctuator(punctuator).map(|operator| (operator, token.location)))
            }
            _ => Ok(None),
        }
    }

    fn consume_closing_paren(&mut self) -> Result<(), PreprocessError> {
        match self.next_token()? {
            Some(token) if token.is_punctuator(Punctuator::ParenthesisClose) => Ok(()),
            Some(token) => Err(PreprocessError::malformed_expression(
                &format!("Expected \")\" but found \"{}\".", token.text),
                token.location,
            )),
            None => Err(PreprocessError::malformed_expression(
                "Expected \")\".",
                self.last_location,
            )),
        }
    }
}

impl<C> ExpressionParser<'_, C>
where
    C: ExpressionContext,
{
    fn parse_logic_or_expression(&mut self) -> Result<Expression, PreprocessError> {
        self.parse_binary_expression(&[Punctuator::Or], Self::parse_logic_and_expression)
    }

    fn parse_logic_and_expression(&mut self) -> Result<Expression, PreprocessError> {
        self.parse_binary_expression(&[Punctuator::And], Self::parse_bitwise_or_expression)
    }

    fn parse_bitwise_or_expression(&mut self) -> Result<Expression, PreprocessError> {
        self.parse_binary_expression(&[Punctuator::BitwiseOr], Self::parse_bitwise_xor_expression)
    }

    fn parse_bitwise_xor_expression(&mut self) -> Result<Expression, PreprocessError> {
        self.parse_binary_expression(&[Punctuator::BitwiseXor], Self::parse_bitwise_and_expression)
    }

    fn parse_bitwise_and_expression(&mut self) -> Result<Expression, PreprocessError> {
        self.parse_binary_expression(&[Punctuator::BitwiseAnd], Self::parse_equality_expression)
    }

    fn parse_equality_expression(&mut self) -> Result<Expression, PreprocessError> {
        self.parse_binary_expression(
            &[Punctuator::Equal, Punctuator::NotEqual],
            Self::parse_relational_expression,
        )
    }

    fn parse_relational_expression(&mut self) -> Result<Expression, PreprocessError> {
        self.parse_binary_expression(
            &[
                Punctuator::LessThan,
                Punctuator::LessThanOrEqual,
                Punctuator::GreaterThan,
                Punctuator::GreaterThanOrEqual,
            ],
            Self::parse_shift_expression,
        )
    }

    fn parse_shift_expression(&mut self) -> Result<Expression, PreprocessError> {
        self.parse_binary_expression(
            &[Punctuator::ShiftLeft, Punctuator::ShiftRight],
            Self::parse_additive_expression,
        )
    }

    fn parse_additive_expression(&mut self) -> Result<Expression, PreprocessError> {
        self.parse_binary_expression(&[Punctuator::Add], Self::parse_subtractive_expression)
    }

    fn parse_subtractive_expression(&mut self) -> Result<Expression, PreprocessError> {
        self.parse_binary_expression(&[Punctuator::Subtract], Self::parse_multiplicative_expression)
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expression, PreprocessError> {
        self.parse_binary_expression(&[Punctuator::Multiply], Self::parse_division_expression)
    }

    fn parse_division_expression(&mut self) -> Result<Expression, PreprocessError> {
        self.parse_binary_expression(
            &[Punctuator::Divide, Punctuator::Modulo],
            Self::parse_unary_expression,
        )
    }

    fn parse_binary_expression(
        &mut self,
        expected_punctuators: &[Punctuator],
        next_parse_function: fn(&mut Self) -> Result<Expression, PreprocessError>,
    ) -> Result<Expression, PreprocessError> {
        // A short-circuited operand switches the evaluating mode off
        // until the end of its tier.
        let evaluating = self.evaluating;
        let result = self.parse_binary_operands(expected_punctuators, next_parse_function);
        self.evaluating = evaluating;
        result
    }

    fn parse_binary_operands(
        &mut self,
        expected_punctuators: &[Punctuator],
        next_parse_function: fn(&mut Self) -> Result<Expression, PreprocessError>,
    ) -> Result<Expression, PreprocessError> {
        let first = next_parse_function(self)?;
        let mut rest: Vec<(BinaryOperator, Location, Expression)> = vec![];

        while let Some((operator, location)) = self.peek_operator(expected_punctuators)? {
            // Consume the operator token.
            self.next_token()?;

            if self.evaluating && matches!(operator, BinaryOperator::And | BinaryOperator::Or) {
                let last = rest.last().map_or(&first, |(_, _, expression)| expression);
                let value = evaluate_expression(last)?;
                if (operator == BinaryOperator::And) == (value == 0) {
                    self.evaluating = false;
                }
            }

            let right = next_parse_function(self)?;
            rest.push((operator, location, right));
        }

        Ok(build_binary_tree(first, rest))
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, PreprocessError> {
        let unary = match self.peek_token()? {
            Some(Token {
                kind: TokenKind::Punctuator(punctuator),
                location,
                ..
            }) => UnaryOperator::from_punctuator(*punctuator).map(|operator| (operator, *location)),
            _ => None,
        };

        if let Some((operator, location)) = unary {
            // Consume the unary operator.
            self.next_token()?;

            let operand = self.parse_unary_expression()?;
            return Ok(Expression::Unary(operator, location, Box::new(operand)));
        }

        self.parse_primary_expression()
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, PreprocessError> {
        let Some(token) = self.next_token()? else {
            return Err(PreprocessError::malformed_expression(
                "Incomplete expression.",
                self.last_location,
            ));
        };

        let location = token.location;
        match token.kind {
            TokenKind::Number => parse_integer_literal(&token.text)
                .map(|value| Expression::Number(value, location))
                .ok_or_else(|| {
                    PreprocessError::malformed_expression(
                        &format!("\"{}\" is not an integer number.", token.text),
                        location,
                    )
                }),
            TokenKind::Char => parse_char_literal(&token.text)
                .map(|value| Expression::Number(value, location))
                .ok_or_else(|| {
                    PreprocessError::malformed_expression(
                        &format!("Invalid character constant {}.", token.text),
                        location,
                    )
                }),
            TokenKind::Punctuator(Punctuator::ParenthesisOpen) => {
                let inner = self.parse_logic_or_expression()?;
                self.consume_closing_paren()?;
                Ok(inner)
            }
            TokenKind::Identifier if token.is_identifier("defined") => {
                self.parse_defined_operand(location)
            }
            TokenKind::Identifier => {
                // A name which is not a macro (or which is skipped) is 0.
                if !self.evaluating && self.context.is_function_like(&token.name()) {
                    self.skip_invocation_arguments()?;
                }
                Ok(Expression::Number(0, location))
            }
            _ => Err(PreprocessError::malformed_expression(
                &format!("Unexpected token \"{}\" in the expression.", token.text),
                location,
            )),
        }
    }

    // `defined X` or `defined ( X )`
    fn parse_defined_operand(&mut self, location: Location) -> Result<Expression, PreprocessError> {
        let mut token = self.next_raw_token();
        let parenthesized = token
            .as_ref()
            .is_some_and(|token| token.is_punctuator(Punctuator::ParenthesisOpen));
        if parenthesized {
            token = self.next_raw_token();
        }

        let name = match token {
            Some(token) if token.kind == TokenKind::Identifier => token.name().into_owned(),
            _ => {
                return Err(PreprocessError::malformed_expression(
                    "Operator \"defined\" requires an identifier.",
                    self.last_location,
                ));
            }
        };

        if parenthesized
            && !self
                .next_raw_token()
                .is_some_and(|token| token.is_punctuator(Punctuator::ParenthesisClose))
        {
            return Err(PreprocessError::malformed_expression(
                "Expected \")\" after the operand of \"defined\".",
                self.last_location,
            ));
        }

        Ok(Expression::Number(
            i64::from(self.context.is_defined(&name)),
            location,
        ))
    }

    // In a skipped operand the invocation of a function-like macro, e.g.
    // `0 && MAX(A, B) > 1`, is a single value, its arguments are dropped.
    fn skip_invocation_arguments(&mut self) -> Result<(), PreprocessError> {
        self.skip_whitespace();
        if !self
            .queue
            .peek(0)
            .is_some_and(|item| item.token.is_punctuator(Punctuator::ParenthesisOpen))
        {
            return Ok(());
        }

        let mut depth = 0usize;
        while let Some(token) = self.next_raw_token() {
            if token.is_punctuator(Punctuator::ParenthesisOpen) {
                depth += 1;
            } else if token.is_punctuator(Punctuator::ParenthesisClose) {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }

        Err(PreprocessError::malformed_expression(
            "Unterminated macro arguments.",
            self.last_location,
        ))
    }
}

/// Parses an integer literal: decimal, `0x` hexadecimal, `0b` binary or
/// `0` octal, with optional `u` and `l` suffixes.
///
/// Values beyond `i64::MAX` wrap around into the signed domain.
pub fn parse_integer_literal(text: &str) -> Option<i64> {
    let digits = text.trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));

    let (digits, radix) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (hex, 16)
    } else if let Some(binary) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (binary, 2)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (&digits[1..], 8)
    } else {
        (digits, 10)
    };

    parse_digits(digits, radix).map(|value| value as i64)
}

/// Parses a character constant such as `'a'`, `'\n'`, `'\x41'` or `'\101'`.
pub fn parse_char_literal(text: &str) -> Option<i64> {
    let body = text.strip_prefix('\'')?.strip_suffix('\'')?;

    let Some(escaped) = body.strip_prefix('\\') else {
        let mut chars = body.chars();
        let c = chars.next()?;
        return chars.next().is_none().then_some(c as i64);
    };

    let value = match escaped {
        "n" => 10,
        "t" => 9,
        "r" => 13,
        "a" => 7,
        "b" => 8,
        "f" => 12,
        "v" => 11,
        "\\" => 92,
        "'" => 39,
        "\"" => 34,
        "?" => 63,
        _ => {
            let value = match escaped.strip_prefix('x') {
                Some(hex) => parse_digits(hex, 16)?,
                None if escaped.len() <= 3 => parse_digits(escaped, 8)?,
                None => return None,
            };
            value as i64
        }
    };

    Some(value)
}

fn parse_digits(digits: &str, radix: u32) -> Option<u64> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        context::{FileTable, Timestamp},
        directive::parse_define,
        error::PreprocessError,
        expander::{ExpansionType, Expander},
        expression::{
            ast_printer::print_to_string,
            parser::{parse_char_literal, parse_expression, parse_integer_literal},
        },
        lexer::lex_from_str,
        location::Location,
        macro_map::MacroMap,
    };

    fn try_parse(definitions: &[&str], source_text: &str) -> Result<String, PreprocessError> {
        let mut macro_map = MacroMap::new();
        for definition in definitions {
            let tokens = lex_from_str(definition, 1)?;
            let (name, macro_definition) = parse_define(&tokens, tokens[0].location)?;
            macro_map.define(&name, macro_definition)?;
        }

        let file_table = FileTable::new();
        let timestamp = Timestamp::now();
        let expander = Expander::new(
            &macro_map,
            &file_table,
            &timestamp,
            ExpansionType::ConditionalExpression,
        );

        let tokens = lex_from_str(source_text, 1)?;
        let expression = parse_expression(tokens, &expander, Location::default())?;
        Ok(print_to_string(&expression))
    }

    fn parse(definitions: &[&str], source_text: &str) -> String {
        try_parse(definitions, source_text).unwrap()
    }

    #[test]
    fn test_parse_precedence() {
        assert_eq!(parse(&[], "1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(parse(&[], "1 || 2 && 3 | 4 ^ 5 & 6"), "(1 || (2 && (3 | (4 ^ (5 & 6)))))");
        assert_eq!(parse(&[], "1 == 2 < 3 << 4"), "(1 == (2 < (3 << 4)))");
        assert_eq!(parse(&[], "1 - 2 - 3"), "((1 - 2) - 3)");
        assert_eq!(parse(&[], "1 + 2 - 3"), "(1 + (2 - 3))");
        assert_eq!(parse(&[], "2 * 3 / 4 % 5"), "(2 * ((3 / 4) % 5))");
        assert_eq!(parse(&[], "-(1 + 2) * ~3"), "((-(1 + 2)) * (~3))");
        assert_eq!(parse(&[], "!!1"), "(!(!1))");
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(parse(&[], "0x10 + 010 + 0b10 + 10u"), "(((16 + 8) + 2) + 10)");
        assert_eq!(parse(&[], "'a' == 97"), "(97 == 97)");

        // unknown names are 0
        assert_eq!(parse(&[], "UNKNOWN + 1"), "(0 + 1)");
    }

    #[test]
    fn test_parse_defined() {
        let definitions = ["LIGHTS 4", "SHADOWS"];
        assert_eq!(
            parse(&definitions, "defined LIGHTS && defined(SHADOWS) && defined ( FOG )"),
            "((1 && 1) && 0)"
        );

        // builtin macros are defined
        assert_eq!(parse(&[], "defined(__LINE__)"), "1");

        // `defined` inside a macro body
        assert_eq!(
            parse(&["HAS_LIGHTS defined(LIGHTS)", "LIGHTS 4"], "HAS_LIGHTS"),
            "1"
        );
    }

    #[test]
    fn test_parse_expands_macros() {
        let definitions = ["LIGHTS 4", "MAX(a, b) ((a) > (b) ? a : b)", "AND &&", "TWICE(x) (x * 2)"];
        assert_eq!(parse(&definitions, "LIGHTS > 2"), "(4 > 2)");
        assert_eq!(parse(&definitions, "1 AND LIGHTS"), "(1 && 4)");
        assert_eq!(parse(&definitions, "TWICE(LIGHTS) == 8"), "((4 * 2) == 8)");
    }

    #[test]
    fn test_parse_short_circuit_does_not_expand() {
        let definitions = ["BROKEN 1 /", "CHECK(x) (x / 0)"];

        // evaluated, so it is expanded
        assert!(matches!(
            try_parse(&definitions, "1 && BROKEN"),
            Err(PreprocessError::MalformedExpression { .. })
        ));

        assert_eq!(parse(&definitions, "0 && BROKEN"), "(0 && 0)");
        assert_eq!(parse(&definitions, "1 || BROKEN || 1"), "((1 || 0) || 1)");
        assert_eq!(parse(&definitions, "0 && CHECK(1) > 0"), "(0 && (0 > 0))");
        assert_eq!(parse(&definitions, "0 && BROKEN || 1"), "((0 && 0) || 1)");

        // `X` undefined
        assert_eq!(parse(&[], "defined(X) && X > 0"), "(0 && (0 > 0))");
    }

    #[test]
    fn test_parse_errors() {
        let expect_malformed = |source_text: &str| {
            assert!(
                matches!(
                    try_parse(&[], source_text),
                    Err(PreprocessError::MalformedExpression { .. })
                ),
                "{}",
                source_text
            );
        };

        expect_malformed("");
        expect_malformed("  ");
        expect_malformed("1 +");
        expect_malformed("(1");
        expect_malformed("1 2");
        expect_malformed("1.5");
        expect_malformed("1 = 1");
        expect_malformed("defined");
        expect_malformed("defined(X");
        expect_malformed("defined 1");
        expect_malformed("\"text\"");
    }

    #[test]
    fn test_parse_integer_literal() {
        assert_eq!(parse_integer_literal("0"), Some(0));
        assert_eq!(parse_integer_literal("123"), Some(123));
        assert_eq!(parse_integer_literal("0x7fUL"), Some(127));
        assert_eq!(parse_integer_literal("0B11"), Some(3));
        assert_eq!(parse_integer_literal("017"), Some(15));
        assert_eq!(parse_integer_literal("0u"), Some(0));
        assert_eq!(parse_integer_literal("08"), None);
        assert_eq!(parse_integer_literal("0x"), None);
        assert_eq!(parse_integer_literal("1.0"), None);
        assert_eq!(parse_integer_literal("1e3"), None);
        assert_eq!(parse_integer_literal("18446744073709551616"), None);
    }

    #[test]
    fn test_parse_char_literal() {
        assert_eq!(parse_char_literal("'A'"), Some(65));
        assert_eq!(parse_char_literal(r"'\n'"), Some(10));
        assert_eq!(parse_char_literal(r"'\''"), Some(39));
        assert_eq!(parse_char_literal(r"'\x41'"), Some(65));
        assert_eq!(parse_char_literal(r"'\101'"), Some(65));
        assert_eq!(parse_char_literal(r"'\0'"), Some(0));
        assert_eq!(parse_char_literal("'ab'"), None);
        assert_eq!(parse_char_literal("''"), None);
        assert_eq!(parse_char_literal(r"'\q'"), None);
    }
}
