// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::path::{Path, PathBuf};

use crate::include_handler::{IncludeHandler, normalize_path};

/// An include handler over the native file system.
pub struct NativeIncludeHandler {
    /// Directories to search for user headers, i.e. `#include "..."`.
    user_headers_directories: Vec<PathBuf>,

    /// Directories to search for system headers, i.e. `#include <...>`.
    system_headers_directories: Vec<PathBuf>,

    /// Treats every header as if it began with `#pragma once`.
    include_once: bool,
}

impl NativeIncludeHandler {
    pub fn new(user_headers_directories: &[&Path], system_headers_directories: &[&Path]) -> Self {
        Self {
            user_headers_directories: user_headers_directories
                .iter()
                .map(|&path| path.to_path_buf())
                .collect(),
            system_headers_directories: system_headers_directories
                .iter()
                .map(|&path| path.to_path_buf())
                .collect(),
            include_once: false,
        }
    }

    pub fn with_include_once(mut self, include_once: bool) -> Self {
        self.include_once = include_once;
        self
    }

    fn find_in(directories: &[PathBuf], header_file_path: &Path) -> Option<PathBuf> {
        directories
            .iter()
            .find_map(|directory| canonicalize_file(&directory.join(header_file_path)))
    }
}

// Symbolic links are followed, so that a file reached through different
// paths has one identity.
fn canonicalize_file(path: &Path) -> Option<PathBuf> {
    if !path.is_file() {
        return None;
    }

    match path.canonicalize() {
        Ok(canonical_path) => Some(canonical_path),
        Err(_) => Some(normalize_path(path)),
    }
}

impl IncludeHandler for NativeIncludeHandler {
    fn resolve_user_file(&self, header_file_path: &Path) -> Option<PathBuf> {
        Self::find_in(&self.user_headers_directories, header_file_path)
    }

    fn resolve_relative_file(
        &self,
        header_file_path: &Path,
        source_canonical_file_path: &Path,
    ) -> Option<PathBuf> {
        let directory = source_canonical_file_path.parent()?;
        canonicalize_file(&directory.join(header_file_path))
    }

    fn resolve_system_file(&self, header_file_path: &Path) -> Option<PathBuf> {
        Self::find_in(&self.system_headers_directories, header_file_path)
    }

    fn canonicalize(&self, source_file_path: &Path) -> PathBuf {
        source_file_path
            .canonicalize()
            .unwrap_or_else(|_| normalize_path(source_file_path))
    }

    fn load_file(&self, canonical_full_path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(canonical_full_path)
    }

    fn is_include_once(&self, _canonical_full_path: &Path) -> bool {
        self.include_once
    }
}
