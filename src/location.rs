// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Position {
    pub index: usize,  // The absolute character index in the source.
    pub line: usize,   // The line number in the source (starting from 0).
    pub column: usize, // The column number within the current line (starting from 0).
}

impl Position {
    pub fn new(index: usize, line: usize, column: usize) -> Self {
        Self {
            index,
            line,
            column,
        }
    }
}

/// The place a token (or a diagnostic) comes from.
///
/// `line` of the position is the *logical* line, i.e. it honours
/// `#line` directives, while `index` always refers to the physical
/// character offset in the source text of `file_number`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Location {
    pub file_number: usize,
    pub position: Position,
    pub length: usize, // Number of characters.
}

impl Location {
    pub fn new(file_number: usize, position: Position, length: usize) -> Self {
        Self {
            file_number,
            position,
            length,
        }
    }

    pub fn from_detail(
        file_number: usize,
        index: usize,
        line: usize,
        column: usize,
        length: usize,
    ) -> Self {
        Self {
            file_number,
            position: Position::new(index, line, column),
            length,
        }
    }

    /// Shifts the logical line by `delta` lines (used by `#line`).
    pub fn shift_line(&mut self, delta: isize) {
        self.position.line = self.position.line.saturating_add_signed(delta);
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}, column {}",
            self.position.line + 1,
            self.position.column + 1
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::location::Location;

    #[test]
    fn test_shift_line() {
        let mut location = Location::from_detail(1, 30, 5, 0, 1);
        location.shift_line(94);
        assert_eq!(location.position.line, 99);

        location.shift_line(-200);
        assert_eq!(location.position.line, 0);
    }

    #[test]
    fn test_display() {
        let location = Location::from_detail(2, 17, 3, 8, 1);
        assert_eq!(location.to_string(), "line 4, column 9");
    }
}
