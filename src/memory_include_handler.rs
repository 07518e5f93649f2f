// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use crate::include_handler::{IncludeHandler, normalize_path};

/// An include handler over an in-memory file system, e.g. for shader
/// libraries embedded in the host application, and for testing.
///
/// The simulated file system has the following structure:
/// - `/projects/test`: project root directory
/// - `/projects/test/src`: shader sources
/// - `/projects/test/include`: user header directory
/// - `/projects/test/src/common`: internal shared headers
/// - `/usr/include`: system header directory
pub struct MemoryIncludeHandler {
    /// Maps canonical file paths to their contents.
    files: HashMap<PathBuf, String>,

    /// Files with include-once semantics.
    include_once_files: HashSet<PathBuf>,

    user_directories: Vec<PathBuf>,
    system_directories: Vec<PathBuf>,
}

pub const MEMORY_PROJECT_ROOT: &str = "/projects/test";
pub const MEMORY_SYSTEM_ROOT: &str = "/usr/include";

impl MemoryIncludeHandler {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
            include_once_files: HashSet::new(),
            user_directories: vec![
                PathBuf::from("/projects/test/include"),
                PathBuf::from("/projects/test/src/common"),
            ],
            system_directories: vec![PathBuf::from(MEMORY_SYSTEM_ROOT)],
        }
    }

    /// Adds a file, `relative_path` is relative to the project root directory.
    /// Returns the canonical path of the file.
    pub fn add_user_file(&mut self, relative_path: &Path, content: &str) -> PathBuf {
        let path = normalize_path(&Path::new(MEMORY_PROJECT_ROOT).join(relative_path));
        self.files.insert(path.clone(), content.to_owned());
        path
    }

    /// Adds a file, `relative_path` is relative to the system header directory.
    /// Returns the canonical path of the file.
    pub fn add_system_file(&mut self, relative_path: &Path, content: &str) -> PathBuf {
        let path = normalize_path(&Path::new(MEMORY_SYSTEM_ROOT).join(relative_path));
        self.files.insert(path.clone(), content.to_owned());
        path
    }

    /// Gives the file include-once semantics.
    pub fn set_include_once(&mut self, canonical_full_path: &Path) {
        self.include_once_files
            .insert(canonical_full_path.to_path_buf());
    }

    fn find_in(&self, directories: &[PathBuf], header_file_path: &Path) -> Option<PathBuf> {
        directories
            .iter()
            .map(|directory| normalize_path(&directory.join(header_file_path)))
            .find(|path| self.files.contains_key(path))
    }
}

impl Default for MemoryIncludeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl IncludeHandler for MemoryIncludeHandler {
    fn resolve_user_file(&self, header_file_path: &Path) -> Option<PathBuf> {
        self.find_in(&self.user_directories, header_file_path)
    }

    fn resolve_relative_file(
        &self,
        header_file_path: &Path,
        source_canonical_file_path: &Path,
    ) -> Option<PathBuf> {
        let directory = source_canonical_file_path.parent()?;
        let path = normalize_path(&directory.join(header_file_path));
        self.files.contains_key(&path).then_some(path)
    }

    fn resolve_system_file(&self, header_file_path: &Path) -> Option<PathBuf> {
        self.find_in(&self.system_directories, header_file_path)
    }

    fn load_file(&self, canonical_full_path: &Path) -> Result<String, std::io::Error> {
        self.files.get(canonical_full_path).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "File not found")
        })
    }

    fn is_include_once(&self, canonical_full_path: &Path) -> bool {
        self.include_once_files.contains(canonical_full_path)
    }
}
