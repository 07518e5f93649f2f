// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::error::PreprocessError;

// The visible window of the source text.
//
// ```diagram
//                  /-- excerpt start in source text
//                  |
//                  |            |-- excerpt length
//                  v            v
// leading -->   ...sni[ppet]_text...  <-- trailing ellipsis
//                      ^^^^
//                      |  |-- highlight length
//                      |
//                      \----- highlight start in excerpt
// ```
struct Excerpt {
    leading_ellipsis: bool,
    trailing_ellipsis: bool,
    start: usize,
    length: usize,
    highlight_start: usize,
    highlight_length: usize,
}

const LEADING_LENGTH: usize = 15;
const WINDOW_LENGTH: usize = 40;

// Positions are counted in characters.
fn locate_excerpt(highlight_start: usize, highlight_length: usize, text_length: usize) -> Excerpt {
    let (leading_ellipsis, start) =
        if text_length < WINDOW_LENGTH || highlight_start < LEADING_LENGTH {
            (false, 0)
        } else if highlight_start + WINDOW_LENGTH > text_length {
            (true, text_length - WINDOW_LENGTH)
        } else {
            (true, highlight_start - LEADING_LENGTH)
        };

    let (trailing_ellipsis, length) = if start + WINDOW_LENGTH >= text_length {
        (false, text_length - start)
    } else {
        (true, WINDOW_LENGTH)
    };

    let highlight_start = highlight_start - start;
    Excerpt {
        leading_ellipsis,
        trailing_ellipsis,
        start,
        length,
        highlight_start,
        highlight_length: highlight_length.min(length.saturating_sub(highlight_start)),
    }
}

// Renders the excerpt line and the line which underlines the highlight.
fn render_excerpt(source_text: &str, excerpt: &Excerpt, message: &str) -> (String, String) {
    let mut excerpt_line = String::from("| ");
    let mut indication_line = String::from("| ");

    if excerpt.leading_ellipsis {
        excerpt_line.push_str("...");
        indication_line.push_str("   ");
    }

    excerpt_line.extend(
        source_text
            .chars()
            .skip(excerpt.start)
            .take(excerpt.length)
            .map(|c| if c == '\n' || c == '\t' { ' ' } else { c }),
    );

    if excerpt.trailing_ellipsis {
        excerpt_line.push_str("...");
    }

    indication_line.push_str(&" ".repeat(excerpt.highlight_start));
    indication_line.push_str(&"^".repeat(excerpt.highlight_length.max(1)));
    indication_line.push_str("___ ");
    indication_line.push_str(message);

    (excerpt_line, indication_line)
}

impl PreprocessError {
    /// Formats the error with an excerpt of the source text, e.g.
    ///
    /// ```text
    /// Error at line: 1, column: 7
    /// | #if 1 / 0 #endif
    /// |       ^___ Division by zero in the conditional expression.
    /// ```
    ///
    /// `source_text` must be the text of the file the error occurred in.
    pub fn with_source(&self, source_text: &str) -> String {
        let text_length = source_text.chars().count();

        match self {
            PreprocessError::UnexpectedEndOfDocument { message, .. } => {
                let excerpt = locate_excerpt(text_length, 0, text_length);
                let (excerpt_line, indication_line) =
                    render_excerpt(source_text, &excerpt, message);
                format!(
                    "Unexpected end of the document.\n{}\n{}",
                    excerpt_line, indication_line
                )
            }
            _ => match self.location() {
                Some(location) => {
                    let excerpt = locate_excerpt(
                        location.position.index.min(text_length),
                        location.length,
                        text_length,
                    );
                    let (excerpt_line, indication_line) =
                        render_excerpt(source_text, &excerpt, &self.to_string());
                    format!(
                        "Error at line: {}, column: {}\n{}\n{}",
                        location.position.line + 1,
                        location.position.column + 1,
                        excerpt_line,
                        indication_line
                    )
                }
                None => self.to_string(),
            },
        }
    }
}
