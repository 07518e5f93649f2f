// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::path::PathBuf;

use crate::{
    error::PreprocessError,
    include_handler::IncludeRequest,
    location::Location,
    macro_map::{MacroDefinition, VARIADIC_ARGUMENTS, VARIADIC_PARAMETER, is_reserved_name},
    token::{Punctuator, Token, TokenKind},
    token_string::{TokenString, trim_tokens},
};

/// The directives understood by the preprocessor.
///
/// See:
/// - https://learn.microsoft.com/en-us/windows/win32/direct3dhlsl/dx-graphics-hlsl-appendix-preprocessor
/// - https://en.cppreference.com/w/c/preprocessor.html
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum DirectiveKind {
    Define,
    Undef,
    Include,
    If,
    Ifdef,
    Ifndef,
    Elif,
    Elifdef,
    Elifndef,
    Else,
    Endif,
    Pragma,
    Line,
    Error,
    Warning,
}

impl DirectiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "define" => DirectiveKind::Define,
            "undef" => DirectiveKind::Undef,
            "include" => DirectiveKind::Include,
            "if" => DirectiveKind::If,
            "ifdef" => DirectiveKind::Ifdef,
            "ifndef" => DirectiveKind::Ifndef,
            "elif" => DirectiveKind::Elif,
            "elifdef" => DirectiveKind::Elifdef,
            "elifndef" => DirectiveKind::Elifndef,
            "else" => DirectiveKind::Else,
            "endif" => DirectiveKind::Endif,
            "pragma" => DirectiveKind::Pragma,
            "line" => DirectiveKind::Line,
            "error" => DirectiveKind::Error,
            "warning" => DirectiveKind::Warning,
            _ => return None,
        };
        Some(kind)
    }

    /// The directives which are interpreted in inactive regions too,
    /// in order to track the nesting of the conditional blocks.
    pub fn is_conditional(&self) -> bool {
        matches!(
            self,
            DirectiveKind::If
                | DirectiveKind::Ifdef
                | DirectiveKind::Ifndef
                | DirectiveKind::Elif
                | DirectiveKind::Elifdef
                | DirectiveKind::Elifndef
                | DirectiveKind::Else
                | DirectiveKind::Endif
        )
    }
}

fn next_significant(tokens: &[Token], start: usize) -> Option<usize> {
    (start..tokens.len()).find(|&index| !tokens[index].is_whitespace())
}

/// Splits a directive line (the tokens after `#`) into the directive name
/// and the operand tokens. Returns `None` for the null directive.
pub fn split_directive_name(tokens: Vec<Token>) -> Option<(Token, Vec<Token>)> {
    let name_index = next_significant(&tokens, 0)?;
    let mut tokens = tokens;
    let operand = tokens.split_off(name_index + 1);
    let name = tokens.pop()?;
    Some((name, operand))
}

/// Parses the operand of `#define`: the macro name, an optional parameter
/// list and the replacement list.
///
/// The macro is function-like only when `(` immediately follows the name.
pub fn parse_define(
    tokens: &[Token],
    directive_location: Location,
) -> Result<(String, MacroDefinition), PreprocessError> {
    let name_index = next_significant(tokens, 0)
        .filter(|&index| tokens[index].kind == TokenKind::Identifier)
        .ok_or_else(|| {
            PreprocessError::malformed_directive(
                "Expect a macro name after \"#define\".",
                directive_location,
            )
        })?;

    let name_token = &tokens[name_index];
    let name = name_token.name().into_owned();
    if is_reserved_name(&name) {
        return Err(PreprocessError::malformed_directive(
            &format!("Macro name \"{}\" is reserved.", name),
            name_token.location,
        ));
    }

    let is_function_like = tokens
        .get(name_index + 1)
        .is_some_and(|token| token.is_punctuator(Punctuator::ParenthesisOpen));

    let (parameters, body_index) = if is_function_like {
        let (parameters, closing_index) = parse_parameters(tokens, name_index + 2, name_token)?;
        (Some(parameters), closing_index + 1)
    } else {
        (None, name_index + 1)
    };

    let body = TokenString::from_tokens(tokens[body_index..].to_vec());
    let definition = match parameters {
        Some(parameters) => MacroDefinition::function_like(parameters, body, name_token.location),
        None => MacroDefinition::object_like(body, name_token.location),
    };

    check_body(&definition)?;
    Ok((name, definition))
}

// Returns the parameter names and the index of the closing parenthesis.
fn parse_parameters(
    tokens: &[Token],
    start: usize,
    name_token: &Token,
) -> Result<(Vec<String>, usize), PreprocessError> {
    let malformed = |message: &str, location: Location| {
        PreprocessError::malformed_directive(
            &format!("{} in the parameter list of macro \"{}\".", message, name_token.text),
            location,
        )
    };

    let mut parameters: Vec<String> = vec![];
    let mut index = start;

    loop {
        let Some(current) = next_significant(tokens, index) else {
            return Err(malformed("Missing \")\"", name_token.location));
        };
        let token = &tokens[current];

        if token.is_punctuator(Punctuator::ParenthesisClose) && parameters.is_empty() {
            return Ok((parameters, current));
        }

        let parameter = match token.kind {
            TokenKind::Identifier if token.name() == VARIADIC_ARGUMENTS => {
                return Err(malformed("Reserved name \"__VA_ARGS__\"", token.location));
            }
            TokenKind::Identifier => token.name().into_owned(),
            TokenKind::Punctuator(Punctuator::Ellipsis) => VARIADIC_PARAMETER.to_owned(),
            _ => return Err(malformed("Expect a parameter name", token.location)),
        };

        if parameters.contains(&parameter) {
            return Err(malformed(
                &format!("Duplicate parameter \"{}\"", parameter),
                token.location,
            ));
        }
        parameters.push(parameter);

        let Some(separator_index) = next_significant(tokens, current + 1) else {
            return Err(malformed("Missing \")\"", name_token.location));
        };
        let separator = &tokens[separator_index];

        match separator.kind {
            TokenKind::Punctuator(Punctuator::ParenthesisClose) => {
                return Ok((parameters, separator_index));
            }
            TokenKind::Punctuator(Punctuator::Comma)
                if parameters.last().map(String::as_str) != Some(VARIADIC_PARAMETER) =>
            {
                index = separator_index + 1;
            }
            _ => return Err(malformed("Expect \",\" or \")\"", separator.location)),
        }
    }
}

// `##` can not start or end a replacement list, and in a function-like
// macro `#` must be followed by a parameter.
fn check_body(definition: &MacroDefinition) -> Result<(), PreprocessError> {
    let tokens = trim_tokens(definition.body.tokens());

    for token in [tokens.first(), tokens.last()].into_iter().flatten() {
        if token.is_punctuator(Punctuator::PoundPound) {
            return Err(PreprocessError::malformed_directive(
                "Operator \"##\" can not appear at either end of a macro body.",
                token.location,
            ));
        }
    }

    if definition.is_function_like() {
        for (index, token) in tokens.iter().enumerate() {
            if !token.is_punctuator(Punctuator::Pound) {
                continue;
            }

            let is_parameter = next_significant(tokens, index + 1).is_some_and(|operand_index| {
                let operand = &tokens[operand_index];
                operand.kind == TokenKind::Identifier
                    && definition.parameter_index(&operand.name()).is_some()
            });

            if !is_parameter {
                return Err(PreprocessError::malformed_directive(
                    "Operator \"#\" is not followed by a macro parameter.",
                    token.location,
                ));
            }
        }
    }

    Ok(())
}

/// Parses the operand of `#ifdef`, `#ifndef`, `#elifdef`, `#elifndef` and `#undef`,
/// which is exactly one identifier.
pub fn parse_identifier_operand(
    tokens: &[Token],
    directive_name: &str,
    directive_location: Location,
) -> Result<Token, PreprocessError> {
    let significant: Vec<&Token> = tokens.iter().filter(|token| !token.is_whitespace()).collect();

    match significant.as_slice() {
        [token] if token.kind == TokenKind::Identifier => Ok((*token).clone()),
        _ => Err(PreprocessError::malformed_directive(
            &format!("Expect exactly one identifier after \"#{}\".", directive_name),
            significant
                .first()
                .map_or(directive_location, |token| token.location),
        )),
    }
}

/// Parses the operand of `#include`, which is a header name, or tokens that
/// (after macro expansion) form `"path"` or `<path>`.
pub fn parse_include_operand(
    tokens: &[Token],
    directive_location: Location,
) -> Result<IncludeRequest, PreprocessError> {
    let tokens = trim_tokens(tokens);
    let malformed = || {
        PreprocessError::malformed_directive(
            "Expect \"path\" or <path> after \"#include\".",
            tokens.first().map_or(directive_location, |token| token.location),
        )
    };

    match tokens {
        [token] if token.kind == TokenKind::HeaderName || token.kind == TokenKind::String => {
            let inner = strip_delimiters(&token.text).ok_or_else(malformed)?;
            if token.text.starts_with('<') {
                Ok(IncludeRequest::Angled(PathBuf::from(inner)))
            } else {
                Ok(IncludeRequest::Quoted(PathBuf::from(inner)))
            }
        }
        [first, inner @ .., last]
            if first.is_punctuator(Punctuator::LessThan)
                && last.is_punctuator(Punctuator::GreaterThan)
                && !inner.is_empty() =>
        {
            let path: String = inner.iter().map(|token| token.text.as_str()).collect();
            Ok(IncludeRequest::Angled(PathBuf::from(path)))
        }
        _ => Err(malformed()),
    }
}

fn strip_delimiters(text: &str) -> Option<&str> {
    let mut chars = text.chars();
    let inner = match (chars.next(), chars.next_back()) {
        (Some('"'), Some('"')) | (Some('<'), Some('>')) => chars.as_str(),
        _ => return None,
    };
    (!inner.is_empty()).then_some(inner)
}

/// Parses the (macro expanded) operand of `#line`: a line number and an
/// optional file name.
pub fn parse_line_operand(
    tokens: &[Token],
    directive_location: Location,
) -> Result<(usize, Option<String>), PreprocessError> {
    let significant: Vec<&Token> = tokens.iter().filter(|token| !token.is_whitespace()).collect();
    let malformed = || {
        PreprocessError::malformed_directive(
            "Expect a line number and an optional \"file name\" after \"#line\".",
            significant
                .first()
                .map_or(directive_location, |token| token.location),
        )
    };

    let (number_token, file_token) = match significant.as_slice() {
        [number] => (*number, None),
        [number, file] if file.kind == TokenKind::String => (*number, Some(*file)),
        _ => return Err(malformed()),
    };

    let line_number = (number_token.kind == TokenKind::Number
        && number_token.text.chars().all(|c| c.is_ascii_digit()))
    .then(|| number_token.text.parse::<usize>().ok())
    .flatten()
    .filter(|&line_number| line_number > 0)
    .ok_or_else(malformed)?;

    let file_name = match file_token {
        Some(token) => Some(unquote(&token.text).ok_or_else(malformed)?),
        None => None,
    };

    Ok((line_number, file_name))
}

// The value of a string literal, only `\\` and `\"` are unescaped.
fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut value = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('\\' | '"')) => value.push(escaped),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => value.push('\\'),
            },
            _ => value.push(c),
        }
    }
    Some(value)
}
