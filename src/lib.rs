// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

mod char_with_position;
mod condition;
mod directive;
mod expander;
mod expression;
mod token_string;

pub mod context;
pub mod error;
pub mod error_printer;
pub mod include_handler;
pub mod lexer;
pub mod location;
pub mod macro_map;
pub mod memory_include_handler;
pub mod native_include_handler;
pub mod processor;
pub mod prompt;
pub mod token;

/// The file number of the pseudo file which holds the predefined macros,
/// the source file and the included files are numbered from 1.
pub const FILE_NUMBER_PREDEFINED: usize = 0;

pub use context::{Options, PragmaPolicy, PreprocessResult, UndefinePolicy};
pub use error::{PreprocessError, PreprocessFileError};
pub use include_handler::{IncludeHandler, IncludeRequest};
pub use location::Location;
pub use memory_include_handler::MemoryIncludeHandler;
pub use native_include_handler::NativeIncludeHandler;
pub use processor::{process_source_file, process_source_text};
pub use prompt::{Prompt, PromptLevel};
