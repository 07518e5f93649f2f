// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::{BTreeSet, VecDeque};

use crate::{
    context::{FileTable, Timestamp},
    error::PreprocessError,
    lexer::lex_from_str,
    location::Location,
    macro_map::{MacroDefinition, MacroMap},
    token::{Punctuator, Token, TokenKind},
};

/// A set of macro names.
///
/// Each token carries the names of the macros whose expansion produced it,
/// and each rescan carries the names of the macros being expanded on the
/// active path (arguments are substituted verbatim and have no record of
/// it). A name in either set is never expanded again.
pub type HideSet = BTreeSet<String>;

#[derive(Debug, PartialEq, Clone)]
pub struct ExpansionToken {
    pub token: Token,
    pub hide_set: HideSet,
}

impl ExpansionToken {
    pub fn new(token: Token) -> Self {
        Self {
            token,
            hide_set: HideSet::new(),
        }
    }

    pub fn with_hide_set(token: Token, hide_set: HideSet) -> Self {
        Self { token, hide_set }
    }
}

/// The tokens waiting to be processed, consumed from the front.
#[derive(Debug, Default)]
pub struct TokenQueue {
    items: VecDeque<ExpansionToken>,
}

impl TokenQueue {
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            items: tokens.into_iter().map(ExpansionToken::new).collect(),
        }
    }

    pub fn from_items(items: Vec<ExpansionToken>) -> Self {
        Self {
            items: items.into(),
        }
    }

    pub fn pop_front(&mut self) -> Option<ExpansionToken> {
        self.items.pop_front()
    }

    pub fn peek(&self, offset: usize) -> Option<&ExpansionToken> {
        self.items.get(offset)
    }

    pub fn push_front(&mut self, item: ExpansionToken) {
        self.items.push_front(item);
    }

    pub fn push_front_all(&mut self, items: Vec<ExpansionToken>) {
        for item in items.into_iter().rev() {
            self.items.push_front(item);
        }
    }

    /// The offset of the first token which is neither whitespace nor a line break.
    pub fn find_significant(&self) -> Option<usize> {
        self.items
            .iter()
            .position(|item| !item.token.is_whitespace() && !item.token.is_newline())
    }

    /// Takes the tokens up to the end of the current line.
    /// Returns the tokens and the line break (absent at the end of the text).
    pub fn take_line(&mut self) -> (Vec<Token>, Option<Token>) {
        let mut tokens = vec![];
        while let Some(item) = self.items.pop_front() {
            if item.token.is_newline() {
                return (tokens, Some(item.token));
            }
            tokens.push(item.token);
        }
        (tokens, None)
    }

    /// Moves the logical location of all remaining tokens, used by `#line`.
    pub fn relocate(&mut self, line_delta: isize, file_number: usize) {
        for item in self.items.iter_mut() {
            item.token.location.shift_line(line_delta);
            item.token.location.file_number = file_number;
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ExpansionType {
    Normal,

    // The operand of `#if` and `#elif`: the identifier after
    // `defined` is never expanded.
    ConditionalExpression,
}

// An argument of a macro invocation, with the comma that ends it.
struct Argument {
    tokens: Vec<ExpansionToken>,
    separator: Option<ExpansionToken>,
}

/// Expands macro invocations.
///
/// The expansion of a macro is rescanned on its own, it never consumes the
/// tokens which follow the invocation. Recursion is cut by the hide sets
/// carried by the tokens and by the set of macros in flight.
pub struct Expander<'a> {
    macro_map: &'a MacroMap,
    file_table: &'a FileTable,
    timestamp: &'a Timestamp,
    expansion_type: ExpansionType,
}

impl<'a> Expander<'a> {
    pub fn new(
        macro_map: &'a MacroMap,
        file_table: &'a FileTable,
        timestamp: &'a Timestamp,
        expansion_type: ExpansionType,
    ) -> Self {
        Self {
            macro_map,
            file_table,
            timestamp,
            expansion_type,
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macro_map.contains(name) || crate::macro_map::BUILTIN_MACROS.contains(&name)
    }

    pub fn is_function_like(&self, name: &str) -> bool {
        self.macro_map
            .get(name)
            .is_some_and(MacroDefinition::is_function_like)
    }

    /// Expands all macro invocations in the tokens.
    pub fn expand_tokens(&self, tokens: Vec<Token>) -> Result<Vec<Token>, PreprocessError> {
        let mut queue = TokenQueue::from_tokens(tokens);
        let items = self.rescan(&mut queue, &HideSet::new())?;
        Ok(items.into_iter().map(|item| item.token).collect())
    }

    fn rescan(
        &self,
        queue: &mut TokenQueue,
        in_flight: &HideSet,
    ) -> Result<Vec<ExpansionToken>, PreprocessError> {
        let mut output = vec![];

        while let Some(item) = queue.pop_front() {
            if self.expansion_type == ExpansionType::ConditionalExpression
                && item.token.is_identifier("defined")
            {
                output.push(item);
                copy_defined_operand(queue, &mut output);
                continue;
            }

            match self.expand_within(&item, queue, in_flight)? {
                Some(expanded) => output.extend(expanded),
                None => output.push(item),
            }
        }

        Ok(output)
    }

    /// Expands `item` if it is the name of a macro which is not hidden.
    ///
    /// The arguments of a function-like macro are taken from `rest`. Returns
    /// `None` (and leaves `rest` untouched) when `item` is not expanded, e.g.
    /// a function-like macro name which is not followed by `(`.
    pub fn expand_identifier(
        &self,
        item: &ExpansionToken,
        rest: &mut TokenQueue,
    ) -> Result<Option<Vec<ExpansionToken>>, PreprocessError> {
        self.expand_within(item, rest, &HideSet::new())
    }

    fn expand_within(
        &self,
        item: &ExpansionToken,
        rest: &mut TokenQueue,
        in_flight: &HideSet,
    ) -> Result<Option<Vec<ExpansionToken>>, PreprocessError> {
        if item.token.kind != TokenKind::Identifier {
            return Ok(None);
        }

        let name = item.token.name();
        if item.hide_set.contains(name.as_ref()) || in_flight.contains(name.as_ref()) {
            return Ok(None);
        }

        if let Some(token) = self.expand_builtin(&name, &item.token) {
            return Ok(Some(vec![ExpansionToken::with_hide_set(
                token,
                item.hide_set.clone(),
            )]));
        }

        let Some(definition) = self.macro_map.get(&name) else {
            return Ok(None);
        };

        let location = item.token.location;
        let mut line_breaks = vec![];

        let arguments = if definition.is_function_like() {
            let opening = rest.find_significant().filter(|&offset| {
                rest.peek(offset)
                    .is_some_and(|next| next.token.is_punctuator(Punctuator::ParenthesisOpen))
            });

            let Some(offset) = opening else {
                return Ok(None);
            };

            // Consume up to and including `(`.
            for _ in 0..=offset {
                if let Some(skipped) = rest.pop_front() {
                    if skipped.token.is_newline() {
                        line_breaks.push(skipped.token);
                    }
                }
            }

            let arguments = collect_arguments(&name, location, rest, &mut line_breaks)?;
            bind_arguments(&name, definition, arguments, location)?
        } else {
            vec![]
        };

        let mut hide_set = item.hide_set.clone();
        hide_set.insert(name.to_string());

        let mut nested_in_flight = in_flight.clone();
        nested_in_flight.insert(name.into_owned());

        let substituted = substitute(definition, &arguments, &hide_set, location)?;
        let mut queue = TokenQueue::from_items(substituted);
        let mut expanded = self.rescan(&mut queue, &nested_in_flight)?;

        // An invocation spanning several lines keeps its line breaks after
        // the expansion, so the lines that follow keep their numbers.
        let produced = expanded
            .iter()
            .filter(|expanded_item| expanded_item.token.is_newline())
            .count();
        expanded.extend(
            line_breaks
                .into_iter()
                .skip(produced)
                .map(ExpansionToken::new),
        );

        Ok(Some(expanded))
    }

    fn expand_builtin(&self, name: &str, token: &Token) -> Option<Token> {
        let location = token.location;
        match name {
            "__FILE__" => {
                let file_name = self.file_table.name(location.file_number).unwrap_or("");
                Some(Token::new(TokenKind::String, &quote(file_name), location))
            }
            "__LINE__" => Some(Token::new(
                TokenKind::Number,
                &(location.position.line + 1).to_string(),
                location,
            )),
            "__DATE__" => Some(Token::new(
                TokenKind::String,
                &quote(&self.timestamp.date),
                location,
            )),
            "__TIME__" => Some(Token::new(
                TokenKind::String,
                &quote(&self.timestamp.time),
                location,
            )),
            _ => None,
        }
    }
}

// Copies the operand of `defined`, i.e. `X` or `( X )`, without expanding it.
// A malformed operand is left for the expression parser to report.
fn copy_defined_operand(queue: &mut TokenQueue, output: &mut Vec<ExpansionToken>) {
    let mut parenthesized = false;
    let mut seen_identifier = false;

    while let Some(item) = queue.peek(0) {
        let token = &item.token;
        let accept = if token.is_whitespace() {
            true
        } else if !seen_identifier && !parenthesized && token.is_punctuator(Punctuator::ParenthesisOpen)
        {
            parenthesized = true;
            true
        } else if !seen_identifier && token.kind == TokenKind::Identifier {
            seen_identifier = true;
            true
        } else {
            parenthesized && seen_identifier && token.is_punctuator(Punctuator::ParenthesisClose)
        };

        if !accept {
            return;
        }

        let finished = (seen_identifier && !parenthesized)
            || token.is_punctuator(Punctuator::ParenthesisClose);

        if let Some(item) = queue.pop_front() {
            output.push(item);
        }

        if finished {
            return;
        }
    }
}

// Collects the arguments after the opening parenthesis of an invocation,
// up to and including the closing parenthesis. Commas inside nested
// parentheses do not split arguments.
fn collect_arguments(
    name: &str,
    location: Location,
    rest: &mut TokenQueue,
    line_breaks: &mut Vec<Token>,
) -> Result<Vec<Argument>, PreprocessError> {
    let mut arguments = vec![];
    let mut current = vec![];
    let mut depth = 0usize;

    loop {
        let Some(item) = rest.pop_front() else {
            return Err(PreprocessError::UnterminatedInvocation {
                name: name.to_owned(),
                location,
            });
        };

        match item.token.kind {
            TokenKind::Punctuator(Punctuator::ParenthesisOpen) => {
                depth += 1;
                current.push(item);
            }
            TokenKind::Punctuator(Punctuator::ParenthesisClose) if depth == 0 => {
                arguments.push(Argument {
                    tokens: current,
                    separator: None,
                });
                return Ok(arguments);
            }
            TokenKind::Punctuator(Punctuator::ParenthesisClose) => {
                depth -= 1;
                current.push(item);
            }
            TokenKind::Punctuator(Punctuator::Comma) if depth == 0 => {
                arguments.push(Argument {
                    tokens: std::mem::take(&mut current),
                    separator: Some(item),
                });
            }
            TokenKind::DirectiveStart => {
                return Err(PreprocessError::malformed_directive(
                    &format!(
                        "Directives are not allowed inside the arguments of macro \"{}\".",
                        name
                    ),
                    item.token.location,
                ));
            }
            TokenKind::Newline => {
                line_breaks.push(item.token.clone());
                current.push(item);
            }
            _ => current.push(item),
        }
    }
}

// Matches the arguments with the parameters, the result has one
// (whitespace trimmed) token list per parameter.
fn bind_arguments(
    name: &str,
    definition: &MacroDefinition,
    mut arguments: Vec<Argument>,
    location: Location,
) -> Result<Vec<Vec<ExpansionToken>>, PreprocessError> {
    let parameters = definition.parameters.as_deref().unwrap_or(&[]);

    // `F()` passes one empty argument, which is no argument for `F` without parameters.
    if parameters.is_empty()
        && arguments.len() == 1
        && arguments
            .first()
            .is_some_and(|argument| trim_items(&argument.tokens).is_empty())
    {
        arguments.clear();
    }

    let arity_mismatch = |expected: usize, found: usize| PreprocessError::MacroArityMismatch {
        name: name.to_owned(),
        expected,
        found,
        location,
    };

    if definition.is_variadic() {
        let fixed = parameters.len() - 1;
        if arguments.len() < fixed {
            return Err(arity_mismatch(fixed, arguments.len()));
        }

        // The variadic arguments keep their separating commas.
        let variadic: Vec<ExpansionToken> = arguments
            .drain(fixed..)
            .flat_map(|argument| argument.tokens.into_iter().chain(argument.separator))
            .collect();

        let mut bound: Vec<Vec<ExpansionToken>> = arguments
            .into_iter()
            .map(|argument| trim_items(&argument.tokens).to_vec())
            .collect();
        bound.push(trim_items(&variadic).to_vec());
        Ok(bound)
    } else if arguments.len() != parameters.len() {
        Err(arity_mismatch(parameters.len(), arguments.len()))
    } else {
        Ok(arguments
            .into_iter()
            .map(|argument| trim_items(&argument.tokens).to_vec())
            .collect())
    }
}

// Replaces the parameters in the macro body with the arguments and applies
// the `#` and `##` operators. Arguments are substituted verbatim, they are
// expanded by the rescan of the result.
fn substitute(
    definition: &MacroDefinition,
    arguments: &[Vec<ExpansionToken>],
    hide_set: &HideSet,
    location: Location,
) -> Result<Vec<ExpansionToken>, PreprocessError> {
    let body = definition.body.tokens();
    let mut output: Vec<ExpansionToken> = vec![];
    let mut index = 0;

    while let Some(token) = body.get(index) {
        if token.is_punctuator(Punctuator::PoundPound) {
            while output.last().is_some_and(|item| item.token.is_whitespace()) {
                output.pop();
            }

            let Some(right_index) = next_significant(body, index + 1) else {
                return Err(PreprocessError::malformed_directive(
                    "Operator \"##\" can not appear at the end of a macro body.",
                    token.location,
                ));
            };

            let right =
                substitute_operand(definition, arguments, &body[right_index], hide_set, location);
            match output.pop() {
                Some(left) if !is_placemarker(&left) => match right.split_first() {
                    Some((first, others)) if !is_placemarker(first) => {
                        output.push(paste(&left, first, hide_set)?);
                        output.extend(others.iter().cloned());
                    }
                    _ => output.push(left),
                },
                _ => output.extend(right),
            }

            index = right_index + 1;
            continue;
        }

        if definition.is_function_like() && token.is_punctuator(Punctuator::Pound) {
            let operand = next_significant(body, index + 1).and_then(|operand_index| {
                parameter_of(definition, &body[operand_index])
                    .map(|parameter_index| (operand_index, parameter_index))
            });

            let Some((operand_index, parameter_index)) = operand else {
                return Err(PreprocessError::malformed_directive(
                    "Operator \"#\" is not followed by a macro parameter.",
                    token.location,
                ));
            };

            output.push(ExpansionToken::with_hide_set(
                stringize(&arguments[parameter_index], location),
                hide_set.clone(),
            ));
            index = operand_index + 1;
            continue;
        }

        output.extend(substitute_operand(
            definition, arguments, token, hide_set, location,
        ));
        index += 1;
    }

    output.retain(|item| !is_placemarker(item));
    Ok(output)
}

fn substitute_operand(
    definition: &MacroDefinition,
    arguments: &[Vec<ExpansionToken>],
    token: &Token,
    hide_set: &HideSet,
    location: Location,
) -> Vec<ExpansionToken> {
    match parameter_of(definition, token) {
        Some(parameter_index) if arguments[parameter_index].is_empty() => {
            vec![ExpansionToken::new(Token::new(TokenKind::Other, "", location))]
        }
        Some(parameter_index) => arguments[parameter_index].clone(),
        None => vec![ExpansionToken::with_hide_set(
            relocate_token(token, location),
            hide_set.clone(),
        )],
    }
}

// An empty argument, it stands for "nothing" as an operand of `##`.
fn is_placemarker(item: &ExpansionToken) -> bool {
    item.token.kind == TokenKind::Other && item.token.text.is_empty()
}

fn parameter_of(definition: &MacroDefinition, token: &Token) -> Option<usize> {
    if token.kind == TokenKind::Identifier {
        definition.parameter_index(&token.name())
    } else {
        None
    }
}

// Body tokens take the location of the invocation, so that e.g. `__LINE__`
// in a macro body is the line of the invocation.
fn relocate_token(token: &Token, location: Location) -> Token {
    Token {
        kind: token.kind,
        text: token.text.clone(),
        location: Location::new(location.file_number, location.position, token.location.length),
    }
}

fn next_significant(tokens: &[Token], start: usize) -> Option<usize> {
    (start..tokens.len()).find(|&index| !tokens[index].is_whitespace() && !tokens[index].is_newline())
}

pub fn trim_items(items: &[ExpansionToken]) -> &[ExpansionToken] {
    let is_space = |item: &ExpansionToken| item.token.is_whitespace() || item.token.is_newline();
    let start = items
        .iter()
        .position(|item| !is_space(item))
        .unwrap_or(items.len());
    let end = items
        .iter()
        .rposition(|item| !is_space(item))
        .map_or(start, |index| index + 1);
    &items[start..end]
}

// Joins two tokens into one, the joined text must form exactly one token.
fn paste(
    left: &ExpansionToken,
    right: &ExpansionToken,
    hide_set: &HideSet,
) -> Result<ExpansionToken, PreprocessError> {
    let text = format!("{}{}", left.token.text, right.token.text);
    let location = left.token.location;
    let invalid = || {
        PreprocessError::malformed_directive(
            &format!("Pasting \"{}\" and \"{}\" does not give a valid token.", left.token.text, right.token.text),
            location,
        )
    };

    let tokens = lex_from_str(&text, location.file_number).map_err(|_| invalid())?;
    match tokens.as_slice() {
        [token] if !token.is_whitespace() && token.kind != TokenKind::DirectiveStart => {
            Ok(ExpansionToken::with_hide_set(
                Token::new(token.kind, &text, location),
                hide_set.clone(),
            ))
        }
        _ => Err(invalid()),
    }
}

// Builds a string literal from the text of an argument. Whitespace runs
// become one space, `"` and `\` inside string and character literals are escaped.
fn stringize(items: &[ExpansionToken], location: Location) -> Token {
    let mut text = String::from("\"");
    let mut pending_space = false;

    for item in trim_items(items) {
        let token = &item.token;
        if token.is_whitespace() || token.is_newline() {
            pending_space = true;
            continue;
        }

        if pending_space {
            text.push(' ');
            pending_space = false;
        }

        match token.kind {
            TokenKind::String | TokenKind::Char => {
                for c in token.text.chars() {
                    if c == '"' || c == '\\' {
                        text.push('\\');
                    }
                    text.push(c);
                }
            }
            _ => text.push_str(&token.text),
        }
    }

    text.push('"');
    Token::new(TokenKind::String, &text, location)
}

fn quote(value: &str) -> String {
    let mut text = String::from("\"");
    for c in value.chars() {
        if c == '"' || c == '\\' {
            text.push('\\');
        }
        text.push(c);
    }
    text.push('"');
    text
}
