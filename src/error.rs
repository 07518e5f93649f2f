// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{fmt::Display, path::PathBuf};

use crate::location::Location;

/// Fatal preprocessing errors.
///
/// Non-fatal notifications (e.g. `#warning`) are reported as `Prompt`s instead.
#[derive(Debug)]
pub enum PreprocessError {
    // A macro is redefined with a different parameter list or body.
    RedefinitionConflict {
        name: String,
        location: Location,
        previous: Location,
    },

    // A function-like macro is invoked with the wrong number of arguments.
    MacroArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        location: Location,
    },

    // `#endif` without a matching `#if`-family directive.
    UnmatchedEndif(Location),

    // `#elif`/`#else` without an open block, or after the block's `#else`.
    MisplacedElse(Location),

    // A source unit ends while a conditional block is still open,
    // the location is the directive which opened the block.
    UnterminatedConditional(Location),

    UnknownDirective {
        name: String,
        location: Location,
    },

    // Raised by `#error`.
    UserDirectiveError {
        message: String,
        location: Location,
    },

    IncludeNotFound {
        path: String,
        location: Location,
    },

    IncludeRecursionLimit {
        path: String,
        depth: usize,
        location: Location,
    },

    DivisionByZero(Location),

    MalformedExpression {
        message: String,
        location: Location,
    },

    MalformedDirective {
        message: String,
        location: Location,
    },

    // The end of input is reached while collecting the arguments of a
    // function-like macro invocation.
    UnterminatedInvocation {
        name: String,
        location: Location,
    },

    // `#undef` of a name which is not defined, only raised when it is configured so.
    UndefinedMacro {
        name: String,
        location: Location,
    },

    // E.g. an unterminated block comment.
    UnexpectedEndOfDocument {
        message: String,
        location: Location,
    },

    Io {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl PreprocessError {
    pub fn location(&self) -> Option<&Location> {
        match self {
            PreprocessError::RedefinitionConflict { location, .. }
            | PreprocessError::MacroArityMismatch { location, .. }
            | PreprocessError::UnknownDirective { location, .. }
            | PreprocessError::UserDirectiveError { location, .. }
            | PreprocessError::IncludeNotFound { location, .. }
            | PreprocessError::IncludeRecursionLimit { location, .. }
            | PreprocessError::MalformedExpression { location, .. }
            | PreprocessError::MalformedDirective { location, .. }
            | PreprocessError::UnterminatedInvocation { location, .. }
            | PreprocessError::UndefinedMacro { location, .. }
            | PreprocessError::UnexpectedEndOfDocument { location, .. } => Some(location),
            PreprocessError::UnmatchedEndif(location)
            | PreprocessError::MisplacedElse(location)
            | PreprocessError::UnterminatedConditional(location)
            | PreprocessError::DivisionByZero(location) => Some(location),
            PreprocessError::Io { .. } => None,
        }
    }

    pub(crate) fn malformed_directive(message: &str, location: Location) -> Self {
        PreprocessError::MalformedDirective {
            message: message.to_owned(),
            location,
        }
    }

    pub(crate) fn malformed_expression(message: &str, location: Location) -> Self {
        PreprocessError::MalformedExpression {
            message: message.to_owned(),
            location,
        }
    }
}

impl Display for PreprocessError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PreprocessError::RedefinitionConflict { name, previous, .. } => write!(
                f,
                "Macro \"{}\" is redefined differently (previous definition at {}).",
                name, previous
            ),
            PreprocessError::MacroArityMismatch {
                name,
                expected,
                found,
                ..
            } => write!(
                f,
                "Macro \"{}\" expects {} argument(s), but {} were given.",
                name, expected, found
            ),
            PreprocessError::UnmatchedEndif(_) => {
                f.write_str("Directive \"#endif\" has no matching \"#if\".")
            }
            PreprocessError::MisplacedElse(_) => f.write_str(
                "Directive \"#elif\" or \"#else\" has no matching \"#if\", or follows \"#else\".",
            ),
            PreprocessError::UnterminatedConditional(_) => {
                f.write_str("Conditional block is not terminated by \"#endif\".")
            }
            PreprocessError::UnknownDirective { name, .. } => {
                write!(f, "Unknown directive \"#{}\".", name)
            }
            PreprocessError::UserDirectiveError { message, .. } => {
                write!(f, "#error {}", message)
            }
            PreprocessError::IncludeNotFound { path, .. } => {
                write!(f, "Cannot find the header file \"{}\".", path)
            }
            PreprocessError::IncludeRecursionLimit { path, depth, .. } => write!(
                f,
                "Including \"{}\" exceeds the maximum include depth {}.",
                path, depth
            ),
            PreprocessError::DivisionByZero(_) => {
                f.write_str("Division by zero in the conditional expression.")
            }
            PreprocessError::MalformedExpression { message, .. }
            | PreprocessError::MalformedDirective { message, .. }
            | PreprocessError::UnexpectedEndOfDocument { message, .. } => f.write_str(message),
            PreprocessError::UnterminatedInvocation { name, .. } => write!(
                f,
                "Unterminated argument list invoking macro \"{}\".",
                name
            ),
            PreprocessError::UndefinedMacro { name, .. } => {
                write!(f, "Macro \"{}\" is not defined.", name)
            }
            PreprocessError::Io { path, error } => {
                write!(f, "Cannot read file \"{}\": {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for PreprocessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreprocessError::Io { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// A `PreprocessError` together with the name of the file it occurred in.
#[derive(Debug)]
pub struct PreprocessFileError {
    pub file_name: String,
    pub error: PreprocessError,
}

impl PreprocessFileError {
    pub fn new(file_name: &str, error: PreprocessError) -> Self {
        Self {
            file_name: file_name.to_owned(),
            error,
        }
    }
}

impl Display for PreprocessFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.error.location() {
            Some(location) => write!(
                f,
                "{}:{}:{}: {}",
                self.file_name,
                location.position.line + 1,
                location.position.column + 1,
                self.error
            ),
            None => write!(f, "{}: {}", self.file_name, self.error),
        }
    }
}

impl std::error::Error for PreprocessFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        error::{PreprocessError, PreprocessFileError},
        location::Location,
    };

    #[test]
    fn test_display_file_error() {
        let error = PreprocessFileError::new(
            "shaders/lighting.hlsl",
            PreprocessError::UnknownDirective {
                name: "foo".to_owned(),
                location: Location::from_detail(1, 20, 2, 0, 1),
            },
        );

        assert_eq!(
            error.to_string(),
            "shaders/lighting.hlsl:3:1: Unknown directive \"#foo\"."
        );
    }

    #[test]
    fn test_io_error_has_no_location() {
        let error = PreprocessError::Io {
            path: "missing.hlsl".into(),
            error: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(error.location().is_none());
        assert!(std::error::Error::source(&error).is_some());
    }
}
