// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

use crate::location::Location;

/// `Prompt` is similar to `PreprocessError`, but is intended for user-facing messages
/// that do not stop the preprocessing, e.g. the text of a `#warning` directive.
#[derive(Debug, PartialEq, Clone)]
pub struct Prompt {
    pub level: PromptLevel,
    pub location: Option<Location>,
    pub message: String,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PromptLevel {
    Info,
    Warning,
}

impl Prompt {
    pub fn new(level: PromptLevel, message: &str, location: Option<Location>) -> Self {
        Self {
            level,
            location,
            message: message.to_owned(),
        }
    }
}

impl Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.level {
            PromptLevel::Info => "info",
            PromptLevel::Warning => "warning",
        };

        match &self.location {
            Some(location) => write!(f, "{}: {} ({})", level, self.message, location),
            None => write!(f, "{}: {}", level, self.message),
        }
    }
}
