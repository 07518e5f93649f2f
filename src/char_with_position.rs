// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::location::Position;

/// A character along with its position in the source text.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct CharWithPosition {
    pub character: char,
    pub position: Position,
}

impl CharWithPosition {
    pub fn new(character: char, position: Position) -> Self {
        Self {
            character,
            position,
        }
    }
}

/// Yields each character of the upstream iterator along with its position.
///
/// Only `'\n'` starts a new line, so a `"\r\n"` pair is counted as
/// one line break whose `'\r'` sits at the end of the previous line.
pub struct CharsWithPositionIter<I>
where
    I: Iterator<Item = char>,
{
    upstream: I,
    current_position: Position,
}

impl<I> CharsWithPositionIter<I>
where
    I: Iterator<Item = char>,
{
    pub fn new(upstream: I) -> Self {
        Self {
            upstream,
            current_position: Position::default(),
        }
    }
}

impl<I> Iterator for CharsWithPositionIter<I>
where
    I: Iterator<Item = char>,
{
    type Item = CharWithPosition;

    fn next(&mut self) -> Option<Self::Item> {
        let character = self.upstream.next()?;
        let position = self.current_position;

        self.current_position.index += 1;
        if character == '\n' {
            self.current_position.line += 1;
            self.current_position.column = 0;
        } else {
            self.current_position.column += 1;
        }

        Some(CharWithPosition::new(character, position))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        char_with_position::{CharWithPosition, CharsWithPositionIter},
        location::Position,
    };

    #[test]
    fn test_chars_with_position_iter() {
        let chars: Vec<CharWithPosition> = CharsWithPositionIter::new("a\r\nbc\nd".chars()).collect();

        assert_eq!(
            chars,
            vec![
                CharWithPosition::new('a', Position::new(0, 0, 0)),
                CharWithPosition::new('\r', Position::new(1, 0, 1)),
                CharWithPosition::new('\n', Position::new(2, 0, 2)),
                CharWithPosition::new('b', Position::new(3, 1, 0)),
                CharWithPosition::new('c', Position::new(4, 1, 1)),
                CharWithPosition::new('\n', Position::new(5, 1, 2)),
                CharWithPosition::new('d', Position::new(6, 2, 0)),
            ]
        );
    }

    #[test]
    fn test_empty_source() {
        let mut iter = CharsWithPositionIter::new("".chars());
        assert_eq!(iter.next(), None);
    }
}
