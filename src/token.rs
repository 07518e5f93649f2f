// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{borrow::Cow, fmt::Display};

use unicode_normalization::UnicodeNormalization;

use crate::location::Location;

/// The kind of a preprocessing token.
///
/// Unlike a compiler lexer, the preprocessor keeps whitespace, line breaks
/// and comments as tokens, so that the output text can be reconstructed
/// from the token stream with its original spacing.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    // Any sequence of letters (including non-Latin letters), digits and
    // underscores starting with a letter or underscore.
    // HLSL keywords and type names are identifiers to the preprocessor.
    Identifier,

    // A preprocessing number: it may start with a period, must contain at least one
    // decimal digit, and may contain letters, digits, underscores, periods and the
    // exponent markers `e+`, `e-`, `E+`, `E-`, `p+`, `p-`, `P+` and `P-`.
    Number,

    // A string literal, e.g. `"hello"`.
    String,

    // A character constant, e.g. `'a'`, `'\n'`.
    Char,

    // The operand of `#include <...>` and `#include "..."`.
    // Escape sequences are not interpreted in header names.
    HeaderName,

    Punctuator(Punctuator),

    // A run of spaces, horizontal tabs, vertical tabs, form feeds and
    // lone carriage returns.
    Whitespace,

    // `"\n"` or `"\r\n"`.
    Newline,

    // A backslash followed by a line break. The two physical lines are
    // joined into one logical line.
    LineContinuation,

    // `// ...` (without the line break) or `/* ... */`.
    Comment,

    // The `#` which is the first non-whitespace token of a line.
    DirectiveStart,

    // Any other single character, e.g. `@`, `$` or a stray backslash.
    Other,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Punctuator {
    // Arithmetic Operators
    Add,      // '+'
    Subtract, // '-'
    Multiply, // '*'
    Divide,   // '/'
    Modulo,   // '%'
    Increase, // '++'
    Decrease, // '--'

    // Relational Operators
    Equal,              // '=='
    NotEqual,           // '!='
    GreaterThan,        // '>'
    LessThan,           // '<'
    GreaterThanOrEqual, // '>='
    LessThanOrEqual,    // '<='

    // Logical Operators
    And, // '&&'
    Or,  // '||'
    Not, // '!'

    // Bitwise Operators
    BitwiseAnd, // '&'
    BitwiseOr,  // '|'
    BitwiseXor, // '^'
    BitwiseNot, // '~'
    ShiftLeft,  // '<<'
    ShiftRight, // '>>'

    // Assignment Operators
    Assign,           // '='
    AddAssign,        // '+='
    SubtractAssign,   // '-='
    MultiplyAssign,   // '*='
    DivideAssign,     // '/='
    ModulusAssign,    // '%='
    BitwiseAndAssign, // '&='
    BitwiseOrAssign,  // '|='
    BitwiseXorAssign, // '^='
    ShiftLeftAssign,  // '<<='
    ShiftRightAssign, // '>>='

    // Miscellaneous Operators
    QuestionMark,     // '?'
    Comma,            // ','
    Dot,              // '.'
    Arrow,            // '->'
    ScopeResolution,  // '::'

    // Brackets and Delimiters
    BraceOpen,        // '{'
    BraceClose,       // '}'
    BracketOpen,      // '['
    BracketClose,     // ']'
    ParenthesisOpen,  // '('
    ParenthesisClose, // ')'
    Semicolon,        // ';'
    Colon,            // ':'
    Ellipsis,         // '...'

    // Macro Operators
    Pound,      // '#', stringizing
    PoundPound, // '##', token pasting
}

/// All punctuators ordered by text length (longest first), so that the
/// lexer can pick the longest match by scanning from the top.
pub const PUNCTUATORS: [(&str, Punctuator); 49] = [
    ("<<=", Punctuator::ShiftLeftAssign),
    (">>=", Punctuator::ShiftRightAssign),
    ("...", Punctuator::Ellipsis),
    ("++", Punctuator::Increase),
    ("--", Punctuator::Decrease),
    ("==", Punctuator::Equal),
    ("!=", Punctuator::NotEqual),
    (">=", Punctuator::GreaterThanOrEqual),
    ("<=", Punctuator::LessThanOrEqual),
    ("&&", Punctuator::And),
    ("||", Punctuator::Or),
    ("<<", Punctuator::ShiftLeft),
    (">>", Punctuator::ShiftRight),
    ("+=", Punctuator::AddAssign),
    ("-=", Punctuator::SubtractAssign),
    ("*=", Punctuator::MultiplyAssign),
    ("/=", Punctuator::DivideAssign),
    ("%=", Punctuator::ModulusAssign),
    ("&=", Punctuator::BitwiseAndAssign),
    ("|=", Punctuator::BitwiseOrAssign),
    ("^=", Punctuator::BitwiseXorAssign),
    ("->", Punctuator::Arrow),
    ("::", Punctuator::ScopeResolution),
    ("##", Punctuator::PoundPound),
    ("+", Punctuator::Add),
    ("-", Punctuator::Subtract),
    ("*", Punctuator::Multiply),
    ("/", Punctuator::Divide),
    ("%", Punctuator::Modulo),
    (">", Punctuator::GreaterThan),
    ("<", Punctuator::LessThan),
    ("!", Punctuator::Not),
    ("&", Punctuator::BitwiseAnd),
    ("|", Punctuator::BitwiseOr),
    ("^", Punctuator::BitwiseXor),
    ("~", Punctuator::BitwiseNot),
    ("=", Punctuator::Assign),
    ("?", Punctuator::QuestionMark),
    (",", Punctuator::Comma),
    (".", Punctuator::Dot),
    ("{", Punctuator::BraceOpen),
    ("}", Punctuator::BraceClose),
    ("[", Punctuator::BracketOpen),
    ("]", Punctuator::BracketClose),
    ("(", Punctuator::ParenthesisOpen),
    (")", Punctuator::ParenthesisClose),
    (";", Punctuator::Semicolon),
    (":", Punctuator::Colon),
    ("#", Punctuator::Pound),
];

impl Punctuator {
    pub fn as_str(&self) -> &'static str {
        PUNCTUATORS
            .iter()
            .find(|(_, punctuator)| punctuator == self)
            .map(|(text, _)| *text)
            .unwrap_or("")
    }

    /// Finds the longest punctuator at the start of `text`.
    pub fn match_prefix(text: &str) -> Option<(Punctuator, usize)> {
        PUNCTUATORS
            .iter()
            .find(|(candidate, _)| text.starts_with(candidate))
            .map(|(candidate, punctuator)| (*punctuator, candidate.chars().count()))
    }
}

impl Display for Punctuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A preprocessing token, which is a piece of the source text with its kind
/// and location.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str, location: Location) -> Self {
        Self {
            kind,
            text: text.to_owned(),
            location,
        }
    }

    /// Whitespace, comments and line continuations. They separate tokens
    /// but carry no meaning, line breaks are not included.
    pub fn is_whitespace(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::LineContinuation
        )
    }

    pub fn is_newline(&self) -> bool {
        self.kind == TokenKind::Newline
    }

    pub fn is_punctuator(&self, punctuator: Punctuator) -> bool {
        self.kind == TokenKind::Punctuator(punctuator)
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && identifier_name(&self.text) == name
    }

    /// The identifier text in Unicode NFC form, which is used as the key of macros
    /// and parameters, so that canonically equivalent spellings name the same macro.
    pub fn name(&self) -> Cow<'_, str> {
        identifier_name(&self.text)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

pub fn identifier_name(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.nfc().collect())
    }
}
