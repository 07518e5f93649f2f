// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
};

use chrono::{DateTime, Local};

use crate::{
    FILE_NUMBER_PREDEFINED, error::PreprocessError, include_handler::IncludeHandler,
    macro_map::MacroMap, prompt::Prompt,
};

pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PragmaPolicy {
    /// Unknown pragmas are copied to the output verbatim, so that the
    /// compiler downstream can interpret them.
    PassThrough,
    Ignore,
}

/// What `#undef` of a name that is not defined does.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UndefinePolicy {
    Ignore,
    Warn,
    Error,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Options {
    /// Whether `#include "..."` looks up the directory of the including file first.
    /// For example, `#include "../common/light.hlsli"` is resolved using the
    /// directory of the current file as the base directory.
    pub resolve_relative_path: bool,

    pub max_include_depth: usize,
    pub pragma_policy: PragmaPolicy,
    pub undefine_missing: UndefinePolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            resolve_relative_path: true,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            pragma_policy: PragmaPolicy::PassThrough,
            undefine_missing: UndefinePolicy::Ignore,
        }
    }
}

/// Maps file numbers to display names.
///
/// Number 0 is the pseudo file of the predefined macros.
#[derive(Debug, PartialEq, Clone)]
pub struct FileTable {
    names: Vec<String>,
}

impl FileTable {
    pub fn new() -> Self {
        Self {
            names: vec!["<predefined>".to_owned()],
        }
    }

    pub fn add(&mut self, name: &str) -> usize {
        self.names.push(name.to_owned());
        self.names.len() - 1
    }

    pub fn name(&self, file_number: usize) -> Option<&str> {
        self.names.get(file_number).map(String::as_str)
    }

    /// All files except the predefined pseudo file.
    pub fn entries(&self) -> Vec<(usize, String)> {
        self.names
            .iter()
            .enumerate()
            .skip(FILE_NUMBER_PREDEFINED + 1)
            .map(|(number, name)| (number, name.clone()))
            .collect()
    }
}

impl Default for FileTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The values of `__DATE__` and `__TIME__`, captured once per run, so that
/// all occurrences within a run agree.
#[derive(Debug, PartialEq, Clone)]
pub struct Timestamp {
    pub date: String, // "Mmm dd yyyy", the day is padded with a space.
    pub time: String, // "hh:mm:ss"
}

impl Timestamp {
    pub fn now() -> Self {
        Self::from_date_time(&Local::now())
    }

    pub fn from_date_time(date_time: &DateTime<Local>) -> Self {
        Self {
            date: date_time.format("%b %e %Y").to_string(),
            time: date_time.format("%H:%M:%S").to_string(),
        }
    }
}

/// The `Context` struct holds all state of one preprocessing run, which is
/// shared by the source file and all files it includes.
pub struct Context<'a, T>
where
    T: IncludeHandler,
{
    pub include_handler: &'a T,
    pub options: &'a Options,
    pub macro_map: MacroMap,

    /// Canonical paths of the files with include-once semantics which have been processed.
    pub once_included: HashSet<PathBuf>,

    pub file_table: FileTable,
    pub timestamp: Timestamp,

    /// The current include depth, 0 for the source file.
    pub include_depth: usize,

    /// User-facing messages, warnings, or notifications.
    pub prompts: Vec<Prompt>,

    pub output: String,
}

impl<'a, T> Context<'a, T>
where
    T: IncludeHandler,
{
    pub fn from_key_values(
        include_handler: &'a T,
        options: &'a Options,
        predefinitions: &HashMap<String, String>,
    ) -> Result<Self, PreprocessError> {
        Ok(Self {
            include_handler,
            options,
            macro_map: MacroMap::from_key_values(predefinitions)?,
            once_included: HashSet::new(),
            file_table: FileTable::new(),
            timestamp: Timestamp::now(),
            include_depth: 0,
            prompts: vec![],
            output: String::new(),
        })
    }
}

/// The result of a successful run.
#[derive(Debug, PartialEq, Clone)]
pub struct PreprocessResult {
    pub output: String,
    pub prompts: Vec<Prompt>,

    /// File number and display name of the source file and every included file.
    pub files: Vec<(usize, String)>,
}

impl PreprocessResult {
    /// Exposes the output text as a sequential byte stream.
    pub fn output_reader(&self) -> impl std::io::Read + '_ {
        self.output.as_bytes()
    }
}
