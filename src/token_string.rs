// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

use crate::token::Token;

/// An ordered sequence of tokens, e.g. a macro body or the operand of a directive.
///
/// Rendering a token string concatenates the text of its tokens, so the
/// whitespace and comments it contains are reproduced as written.
#[derive(Debug, PartialEq, Clone)]
pub struct TokenString {
    tokens: Vec<Token>,
}

impl TokenString {
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Removes the leading and trailing whitespace, comments and line breaks.
    pub fn trimmed(&self) -> TokenString {
        let tokens = trim_tokens(&self.tokens);
        Self {
            tokens: tokens.to_vec(),
        }
    }

    /// Compares two token strings by their significant tokens, where every
    /// non-empty run of whitespace (comments included) counts as one separator.
    ///
    /// This is the notion of "same" used to accept an identical macro redefinition.
    pub fn structurally_equals(&self, other: &TokenString) -> bool {
        structure(&self.tokens) == structure(&other.tokens)
    }

    pub fn render(&self) -> String {
        self.tokens.iter().map(|token| token.text.as_str()).collect()
    }
}

impl Display for TokenString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

pub fn trim_tokens(tokens: &[Token]) -> &[Token] {
    let is_space = |token: &Token| token.is_whitespace() || token.is_newline();
    let start = tokens
        .iter()
        .position(|token| !is_space(token))
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|token| !is_space(token))
        .map_or(start, |index| index + 1);
    &tokens[start..end]
}

// `None` stands for a run of whitespace.
fn structure(tokens: &[Token]) -> Vec<Option<&str>> {
    let mut items = vec![];
    for token in trim_tokens(tokens) {
        if token.is_whitespace() || token.is_newline() {
            if items.last() != Some(&None) {
                items.push(None);
            }
        } else {
            items.push(Some(token.text.as_str()));
        }
    }
    items
}
