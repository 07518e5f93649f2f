// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    error::PreprocessError,
    char_with_position::{CharWithPosition, CharsWithPositionIter},
    location::{Location, Position},
    token::{Punctuator, Token, TokenKind},
};

/// Splits the source text into preprocessing tokens.
///
/// The lexer is lossless: concatenating the `text` of all tokens yields
/// the source text again. Whitespace, comments, line breaks and line
/// continuations are kept as tokens so that the preprocessor can
/// reproduce the original layout of the lines it does not modify.
pub fn lex_from_str(source_text: &str, file_number: usize) -> Result<Vec<Token>, PreprocessError> {
    let chars: Vec<CharWithPosition> = CharsWithPositionIter::new(source_text.chars()).collect();
    let mut lexer = Lexer::new(chars, file_number);
    lexer.lex()
}

// Where the lexer is within the current line. Used to recognize the directive
// start `#` and the header name of `#include`.
#[derive(Debug, PartialEq, Clone, Copy)]
enum LineState {
    // Only whitespace has been seen since the last line break.
    LineStart,
    // The `#` of a directive has been seen, waiting for the directive name.
    DirectiveName,
    // The directive name `include` has been seen, waiting for the header name.
    IncludeOperand,
    Other,
}

struct Lexer {
    chars: Vec<CharWithPosition>,
    cursor: usize,
    file_number: usize,
    line_state: LineState,

    // Stack of positions.
    // Used to store the start position of a token while consuming its characters.
    stored_positions: Vec<Position>,
}

impl Lexer {
    fn new(chars: Vec<CharWithPosition>, file_number: usize) -> Self {
        Self {
            chars,
            cursor: 0,
            file_number,
            line_state: LineState::LineStart,
            stored_positions: vec![],
        }
    }

    fn next_char(&mut self) -> Option<char> {
        let character = self.chars.get(self.cursor)?.character;
        self.cursor += 1;
        Some(character)
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.chars
            .get(self.cursor + offset)
            .map(|char_with_position| char_with_position.character)
    }

    fn peek_char_and_equals(&self, offset: usize, expected_char: char) -> bool {
        self.peek_char(offset) == Some(expected_char)
    }

    fn peek_position(&self) -> Position {
        match self.chars.get(self.cursor) {
            Some(char_with_position) => char_with_position.position,
            None => match self.chars.last() {
                Some(last) => Position::new(
                    last.position.index + 1,
                    last.position.line,
                    last.position.column + 1,
                ),
                None => Position::default(),
            },
        }
    }

    /// Saves the position of the next character, i.e. the start of the next token.
    fn push_peek_position_into_store(&mut self) {
        let position = self.peek_position();
        self.stored_positions.push(position);
    }

    /// Builds a token from the stored start position to the current cursor.
    fn pop_token(&mut self, kind: TokenKind) -> Token {
        let start = self.stored_positions.pop().unwrap_or_default();
        let end = self.peek_position();
        let text: String = self.chars[start.index..end.index]
            .iter()
            .map(|char_with_position| char_with_position.character)
            .collect();

        Token {
            kind,
            text,
            location: Location::new(self.file_number, start, end.index - start.index),
        }
    }

    fn error_at_store(&mut self, message: &str) -> PreprocessError {
        let start = self.stored_positions.pop().unwrap_or_default();
        PreprocessError::UnexpectedEndOfDocument {
            message: message.to_owned(),
            location: Location::new(self.file_number, start, 1),
        }
    }
}

impl Lexer {
    fn lex(&mut self) -> Result<Vec<Token>, PreprocessError> {
        let mut output = vec![];

        while let Some(current_char) = self.peek_char(0) {
            self.push_peek_position_into_store();

            let token = match current_char {
                ' ' | '\t' | '\u{0b}' | '\u{0c}' => {
                    self.consume_while(|c| matches!(c, ' ' | '\t' | '\u{0b}' | '\u{0c}'));
                    self.pop_token(TokenKind::Whitespace)
                }
                '\r' if self.peek_char_and_equals(1, '\n') => {
                    self.next_char(); // consume '\r'
                    self.next_char(); // consume '\n'
                    self.line_state = LineState::LineStart;
                    self.pop_token(TokenKind::Newline)
                }
                '\r' => {
                    self.next_char(); // consume the lone '\r'
                    self.pop_token(TokenKind::Whitespace)
                }
                '\n' => {
                    self.next_char(); // consume '\n'
                    self.line_state = LineState::LineStart;
                    self.pop_token(TokenKind::Newline)
                }
                '\\' => self.lex_backslash(),
                '/' if self.peek_char_and_equals(1, '/') => self.lex_line_comment(),
                '/' if self.peek_char_and_equals(1, '*') => self.lex_block_comment()?,
                '"' | '<' if self.line_state == LineState::IncludeOperand => {
                    let token = self.lex_header_name();
                    self.line_state = LineState::Other;
                    token
                }
                '"' => self.lex_quoted('"', TokenKind::String),
                '\'' => self.lex_quoted('\'', TokenKind::Char),
                '#' if self.line_state == LineState::LineStart => {
                    self.next_char(); // consume '#'
                    self.line_state = LineState::DirectiveName;
                    self.pop_token(TokenKind::DirectiveStart)
                }
                '0'..='9' => self.lex_number(),
                '.' if matches!(self.peek_char(1), Some('0'..='9')) => self.lex_number(),
                c if c == '_' || c.is_alphabetic() => {
                    let token = self.lex_identifier();
                    self.line_state = if self.line_state == LineState::DirectiveName
                        && token.text == "include"
                    {
                        LineState::IncludeOperand
                    } else {
                        LineState::Other
                    };
                    token
                }
                _ => self.lex_punctuator_or_other(),
            };

            // Whitespace keeps the line state, any other token moves it forward.
            if !token.is_whitespace()
                && !token.is_newline()
                && token.kind != TokenKind::DirectiveStart
                && token.kind != TokenKind::Identifier
            {
                self.line_state = LineState::Other;
            }

            output.push(token);
        }

        Ok(output)
    }

    fn consume_while<F>(&mut self, predicate: F)
    where
        F: Fn(char) -> bool,
    {
        while let Some(c) = self.peek_char(0) {
            if !predicate(c) {
                break;
            }
            self.next_char();
        }
    }

    // A backslash followed by optional horizontal whitespace and a line break
    // is a line continuation, otherwise it is a stray character.
    fn lex_backslash(&mut self) -> Token {
        let mut offset = 1;
        while matches!(self.peek_char(offset), Some(' ' | '\t' | '\u{0b}' | '\u{0c}')) {
            offset += 1;
        }

        let break_length = match (self.peek_char(offset), self.peek_char(offset + 1)) {
            (Some('\n'), _) => 1,
            (Some('\r'), Some('\n')) => 2,
            _ => 0,
        };

        if break_length == 0 {
            self.next_char(); // consume '\'
            return self.pop_token(TokenKind::Other);
        }

        for _ in 0..offset + break_length {
            self.next_char();
        }
        self.pop_token(TokenKind::LineContinuation)
    }

    fn lex_line_comment(&mut self) -> Token {
        self.next_char(); // consume '/'
        self.next_char(); // consume '/'

        // A line continuation extends a line comment to the next line.
        while let Some(c) = self.peek_char(0) {
            match c {
                '\n' => break,
                '\r' if self.peek_char_and_equals(1, '\n') => break,
                '\\' if self.peek_char_and_equals(1, '\n') => {
                    self.next_char();
                    self.next_char();
                }
                '\\' if self.peek_char_and_equals(1, '\r') && self.peek_char_and_equals(2, '\n') => {
                    self.next_char();
                    self.next_char();
                    self.next_char();
                }
                _ => {
                    self.next_char();
                }
            }
        }

        self.pop_token(TokenKind::Comment)
    }

    fn lex_block_comment(&mut self) -> Result<Token, PreprocessError> {
        self.next_char(); // consume '/'
        self.next_char(); // consume '*'

        loop {
            match self.next_char() {
                Some('*') if self.peek_char_and_equals(0, '/') => {
                    self.next_char(); // consume '/'
                    break;
                }
                Some(_) => {}
                None => {
                    return Err(
                        self.error_at_store("Unexpected end of document inside a block comment.")
                    );
                }
            }
        }

        Ok(self.pop_token(TokenKind::Comment))
    }

    // The header name is the raw text between the delimiters, escape
    // sequences are not interpreted. A header name without its closing
    // delimiter on the same line is lexed as an ordinary token, and the
    // `#include` directive reports it.
    fn lex_header_name(&mut self) -> Token {
        let closing = match self.peek_char(0) {
            Some('<') => '>',
            _ => '"',
        };

        let mut offset = 1;
        loop {
            match self.peek_char(offset) {
                Some(c) if c == closing => break,
                Some('\n') | None => {
                    return self.lex_punctuator_or_other();
                }
                Some(_) => offset += 1,
            }
        }

        for _ in 0..=offset {
            self.next_char();
        }
        self.pop_token(TokenKind::HeaderName)
    }

    // A string literal or character constant. An unterminated one (e.g. the
    // apostrophe of an English word in a disabled region) is lexed as a
    // single stray character.
    fn lex_quoted(&mut self, quote: char, kind: TokenKind) -> Token {
        let mut offset = 1;
        loop {
            match self.peek_char(offset) {
                Some(c) if c == quote => break,
                Some('\\') if !matches!(self.peek_char(offset + 1), Some('\n') | None) => {
                    offset += 2;
                }
                Some('\n') | None => {
                    self.next_char();
                    return self.pop_token(TokenKind::Other);
                }
                Some(_) => offset += 1,
            }
        }

        for _ in 0..=offset {
            self.next_char();
        }
        self.pop_token(kind)
    }

    fn lex_number(&mut self) -> Token {
        while let Some(c) = self.peek_char(0) {
            match c {
                'e' | 'E' | 'p' | 'P'
                    if matches!(self.peek_char(1), Some('+' | '-')) =>
                {
                    self.next_char(); // consume the exponent marker
                    self.next_char(); // consume the sign
                }
                c if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                    self.next_char();
                }
                _ => break,
            }
        }

        self.pop_token(TokenKind::Number)
    }

    fn lex_identifier(&mut self) -> Token {
        self.consume_while(|c| c == '_' || c.is_alphanumeric());
        self.pop_token(TokenKind::Identifier)
    }

    fn lex_punctuator_or_other(&mut self) -> Token {
        let rest: String = self.chars[self.cursor..]
            .iter()
            .take(3)
            .map(|char_with_position| char_with_position.character)
            .collect();

        match Punctuator::match_prefix(&rest) {
            Some((punctuator, length)) => {
                for _ in 0..length {
                    self.next_char();
                }
                self.pop_token(TokenKind::Punctuator(punctuator))
            }
            None => {
                self.next_char();
                self.pop_token(TokenKind::Other)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        error::PreprocessError,
        lexer::lex_from_str,
        location::Location,
        token::{Punctuator, TokenKind},
    };

    fn lex_kinds(source_text: &str) -> Vec<(TokenKind, String)> {
        lex_from_str(source_text, 1)
            .unwrap()
            .into_iter()
            .map(|token| (token.kind, token.text))
            .collect()
    }

    fn kind_and_text(kind: TokenKind, text: &str) -> (TokenKind, String) {
        (kind, text.to_owned())
    }

    #[test]
    fn test_lex_lossless() {
        let source_text = "float4 main(float2 uv : TEXCOORD0) : SV_Target\r\n{\n\treturn tex.Sample(s, uv) * 0.5f; // half\n}\n/* tail */";
        let tokens = lex_from_str(source_text, 1).unwrap();
        let text: String = tokens.iter().map(|token| token.text.as_str()).collect();
        assert_eq!(text, source_text);
    }

    #[test]
    fn test_lex_code_line() {
        assert_eq!(
            lex_kinds("x = a+=1.5e-3;"),
            vec![
                kind_and_text(TokenKind::Identifier, "x"),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::Punctuator(Punctuator::Assign), "="),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::Identifier, "a"),
                kind_and_text(TokenKind::Punctuator(Punctuator::AddAssign), "+="),
                kind_and_text(TokenKind::Number, "1.5e-3"),
                kind_and_text(TokenKind::Punctuator(Punctuator::Semicolon), ";"),
            ]
        );
    }

    #[test]
    fn test_lex_directive_start() {
        assert_eq!(
            lex_kinds("  # define A #x\n#"),
            vec![
                kind_and_text(TokenKind::Whitespace, "  "),
                kind_and_text(TokenKind::DirectiveStart, "#"),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::Identifier, "define"),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::Identifier, "A"),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::Punctuator(Punctuator::Pound), "#"),
                kind_and_text(TokenKind::Identifier, "x"),
                kind_and_text(TokenKind::Newline, "\n"),
                kind_and_text(TokenKind::DirectiveStart, "#"),
            ]
        );

        // `#` after other tokens of the line
        assert_eq!(
            lex_kinds("a #b")[2],
            kind_and_text(TokenKind::Punctuator(Punctuator::Pound), "#")
        );
    }

    #[test]
    fn test_lex_header_name() {
        assert_eq!(
            lex_kinds("#include <common/light.hlsli>\n#include \"a\\b.h\""),
            vec![
                kind_and_text(TokenKind::DirectiveStart, "#"),
                kind_and_text(TokenKind::Identifier, "include"),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::HeaderName, "<common/light.hlsli>"),
                kind_and_text(TokenKind::Newline, "\n"),
                kind_and_text(TokenKind::DirectiveStart, "#"),
                kind_and_text(TokenKind::Identifier, "include"),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::HeaderName, "\"a\\b.h\""),
            ]
        );

        // outside `#include`, `<` is a punctuator
        assert_eq!(
            lex_kinds("#if a<b")[4],
            kind_and_text(TokenKind::Punctuator(Punctuator::LessThan), "<")
        );
    }

    #[test]
    fn test_lex_literals() {
        assert_eq!(
            lex_kinds(r#""a\"b" 'c' '\''"#),
            vec![
                kind_and_text(TokenKind::String, r#""a\"b""#),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::Char, "'c'"),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::Char, r"'\''"),
            ]
        );

        // an apostrophe without its pair
        assert_eq!(
            lex_kinds("don't\n"),
            vec![
                kind_and_text(TokenKind::Identifier, "don"),
                kind_and_text(TokenKind::Other, "'"),
                kind_and_text(TokenKind::Identifier, "t"),
                kind_and_text(TokenKind::Newline, "\n"),
            ]
        );
    }

    #[test]
    fn test_lex_line_continuation_and_comments() {
        assert_eq!(
            lex_kinds("a \\  \nb // c \\\nd\n/* e\nf */"),
            vec![
                kind_and_text(TokenKind::Identifier, "a"),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::LineContinuation, "\\  \n"),
                kind_and_text(TokenKind::Identifier, "b"),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::Comment, "// c \\\nd"),
                kind_and_text(TokenKind::Newline, "\n"),
                kind_and_text(TokenKind::Comment, "/* e\nf */"),
            ]
        );
    }

    #[test]
    fn test_lex_unicode_identifier() {
        assert_eq!(
            lex_kinds("颜色 = 1"),
            vec![
                kind_and_text(TokenKind::Identifier, "颜色"),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::Punctuator(Punctuator::Assign), "="),
                kind_and_text(TokenKind::Whitespace, " "),
                kind_and_text(TokenKind::Number, "1"),
            ]
        );
    }

    #[test]
    fn test_lex_locations() {
        let tokens = lex_from_str("a\n  bc", 3).unwrap();
        assert_eq!(tokens[0].location, Location::from_detail(3, 0, 0, 0, 1));
        assert_eq!(tokens[1].location, Location::from_detail(3, 1, 0, 1, 1));
        assert_eq!(tokens[3].location, Location::from_detail(3, 4, 1, 2, 2));
    }

    #[test]
    fn test_lex_unterminated_block_comment() {
        assert!(matches!(
            lex_from_str("a /* b", 1),
            Err(PreprocessError::UnexpectedEndOfDocument { location, .. })
                if location == Location::from_detail(1, 2, 0, 2, 1)
        ));
    }
}
