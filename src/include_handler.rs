// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{
    fmt::Display,
    path::{Component, Path, PathBuf},
};

/// The operand of an `#include` directive.
#[derive(Debug, PartialEq, Clone)]
pub enum IncludeRequest {
    /// `#include "path"`
    Quoted(PathBuf),

    /// `#include <path>`
    Angled(PathBuf),
}

impl IncludeRequest {
    pub fn path(&self) -> &Path {
        match self {
            IncludeRequest::Quoted(path) | IncludeRequest::Angled(path) => path,
        }
    }
}

impl Display for IncludeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncludeRequest::Quoted(path) => write!(f, "\"{}\"", path.display()),
            IncludeRequest::Angled(path) => write!(f, "<{}>", path.display()),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ResolvedInclude {
    pub canonical_full_path: PathBuf,
    pub is_system_file: bool,
}

impl ResolvedInclude {
    pub fn new(canonical_full_path: PathBuf, is_system_file: bool) -> Self {
        Self {
            canonical_full_path,
            is_system_file,
        }
    }
}

/// Locates and loads the files named by `#include` directives.
///
/// The canonical path returned by the `resolve_*` functions identifies a file,
/// two requests resolving to the same canonical path refer to the same file.
pub trait IncludeHandler {
    /// Resolves a header file path relative to the user header search directories.
    fn resolve_user_file(&self, header_file_path: &Path) -> Option<PathBuf>;

    /// Resolves a header file path relative to the directory of the including file.
    fn resolve_relative_file(
        &self,
        header_file_path: &Path,
        source_canonical_file_path: &Path,
    ) -> Option<PathBuf>;

    /// Resolves a header file path relative to the system header search directories.
    fn resolve_system_file(&self, header_file_path: &Path) -> Option<PathBuf>;

    /// Resolves an include request.
    ///
    /// A quoted path is looked up in the directory of the including file (if
    /// `resolve_relative` is true), then in the user header directories and at
    /// last in the system header directories. An angled path is only looked up
    /// in the system header directories.
    fn resolve(
        &self,
        request: &IncludeRequest,
        source_canonical_file_path: &Path,
        resolve_relative: bool,
    ) -> Option<ResolvedInclude> {
        match request {
            IncludeRequest::Quoted(header_file_path) => {
                if resolve_relative {
                    if let Some(path) =
                        self.resolve_relative_file(header_file_path, source_canonical_file_path)
                    {
                        return Some(ResolvedInclude::new(path, false));
                    }
                }

                if let Some(path) = self.resolve_user_file(header_file_path) {
                    return Some(ResolvedInclude::new(path, false));
                }

                self.resolve_system_file(header_file_path)
                    .map(|path| ResolvedInclude::new(path, true))
            }
            IncludeRequest::Angled(header_file_path) => self
                .resolve_system_file(header_file_path)
                .map(|path| ResolvedInclude::new(path, true)),
        }
    }

    /// The canonical path of the source file given to the preprocessor, it is
    /// compared with the resolved include paths, e.g. by `#pragma once`.
    fn canonicalize(&self, source_file_path: &Path) -> PathBuf {
        normalize_path(source_file_path)
    }

    /// Loads the text of a file given its canonical path.
    fn load_file(&self, canonical_full_path: &Path) -> Result<String, std::io::Error>;

    /// Whether the file is included at most once per run, as if it began
    /// with `#pragma once`.
    fn is_include_once(&self, _canonical_full_path: &Path) -> bool {
        false
    }
}

/// Resolves the `.` and `..` components of a path lexically,
/// without touching the file system.
///
/// `..` at the root stays at the root, a leading `..` of a relative path is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = vec![];

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use pretty_assertions::assert_eq;

    use crate::include_handler::{IncludeRequest, normalize_path};

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/projects/test/src/../header/./foo.hlsli")),
            PathBuf::from("/projects/test/header/foo.hlsli")
        );
        assert_eq!(
            normalize_path(Path::new("/../usr/include")),
            PathBuf::from("/usr/include")
        );
        assert_eq!(
            normalize_path(Path::new("../common/./a.h")),
            PathBuf::from("../common/a.h")
        );
        assert_eq!(normalize_path(Path::new("a/b/../../c")), PathBuf::from("c"));
    }

    #[test]
    fn test_include_request_display() {
        assert_eq!(
            IncludeRequest::Quoted(PathBuf::from("common/light.hlsli")).to_string(),
            "\"common/light.hlsli\""
        );
        assert_eq!(
            IncludeRequest::Angled(PathBuf::from("builtin.hlsli")).to_string(),
            "<builtin.hlsli>"
        );
    }
}
