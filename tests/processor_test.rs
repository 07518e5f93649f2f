// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{collections::HashMap, env, path::Path, path::PathBuf};

use pretty_assertions::assert_eq;

use shadepp::{
    MemoryIncludeHandler, NativeIncludeHandler, Options, PreprocessError, PreprocessFileError,
    PreprocessResult, PromptLevel, process_source_file, process_source_text,
};

/// Helpers to get the path to the test resources rootfs directory.
fn get_rootfs_path() -> PathBuf {
    // `env::current_dir()` returns the current Rust project's root folder
    let mut dir = env::current_dir().unwrap();
    dir.push("tests");
    dir.push("resources");
    dir.push("rootfs");
    dir.canonicalize().unwrap()
}

fn get_project_root_path() -> PathBuf {
    get_rootfs_path().join("projects/shaders")
}

/// Help function to create a NativeIncludeHandler for the test project.
fn get_include_handler() -> NativeIncludeHandler {
    let project_root_path = get_project_root_path();
    let system_include_path = get_rootfs_path().join("usr/include");

    NativeIncludeHandler::new(
        &[project_root_path.join("include").as_path()],
        &[system_include_path.as_path()],
    )
}

/// Help function to process a single source file with given predefinitions.
fn process_single_source_file(
    source_file_path_within_project_root: &str,
    predefinitions: &[(&str, &str)],
) -> Result<PreprocessResult, PreprocessFileError> {
    let include_handler = get_include_handler();
    let predefinitions: HashMap<String, String> = predefinitions
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    process_source_file(
        &include_handler,
        &Options::default(),
        &predefinitions,
        &get_project_root_path().join(source_file_path_within_project_root),
    )
}

#[test]
fn test_source_file_main() {
    let result = process_single_source_file("src/main.hlsl", &[]).unwrap();

    assert_eq!(
        result.output,
        concat!(
            "\n\n\n\n\n",
            "\n\n",
            "\nfloat3 shade_simple(float3 n) { return n * 1; }\n\n",
            "\n",
            "\n",
            "float4 main(float3 normal : NORMAL) : SV_Target {\n",
            "\n\n\n",
            "    return shade_simple(normal);\n",
            "\n\n\n",
            "}\n"
        )
    );

    // the second inclusion of "lighting.hlsli" is skipped
    let main_file = get_project_root_path().join("src/main.hlsl");
    assert_eq!(
        result.files,
        vec![
            (1, main_file.to_string_lossy().into_owned()),
            (2, "common/config.hlsli".to_owned()),
            (3, "hlsl_builtin.hlsli".to_owned()),
            (4, "lighting.hlsli".to_owned()),
        ]
    );
    assert!(result.prompts.is_empty());
}

#[test]
fn test_source_file_main_with_predefinitions() {
    let result = process_single_source_file(
        "src/main.hlsl",
        &[("LIGHT_COUNT", "4"), ("USE_SPECULAR", "")],
    )
    .unwrap();

    assert_eq!(
        result.output,
        concat!(
            "\n\n\n\n\n",
            "\n\n",
            "\nfloat3 shade_simple(float3 n) { return n * 4; }\n\n",
            "\n",
            "\n",
            "float4 main(float3 normal : NORMAL) : SV_Target {\n",
            "\n",
            "    return shade_full(normal);\n",
            "\n\n\n\n\n",
            "}\n"
        )
    );
}

#[test]
fn test_source_file_with_broken_header() {
    let error = process_single_source_file("src/broken_main.hlsl", &[]).unwrap_err();

    assert_eq!(error.file_name, "broken.hlsli");
    assert!(matches!(
        error.error,
        PreprocessError::MalformedExpression { location, .. } if location.position.line == 1
    ));
}

#[test]
fn test_source_file_not_found() {
    let error = process_single_source_file("src/missing.hlsl", &[]).unwrap_err();
    assert!(matches!(error.error, PreprocessError::Io { .. }));
}

#[test]
fn test_source_file_pragma_once_with_relative_path() {
    // the header includes the source file back
    let result = process_source_file(
        &get_include_handler(),
        &Options::default(),
        &HashMap::new(),
        Path::new("tests/resources/rootfs/projects/shaders/src/../src/once_main.hlsl"),
    )
    .unwrap();

    assert_eq!(result.output, "\nBODY\n\n\n\n\n\n");
    assert_eq!(
        result.files,
        vec![
            (
                1,
                "tests/resources/rootfs/projects/shaders/src/../src/once_main.hlsl".to_owned()
            ),
            (2, "once_helper.hlsli".to_owned()),
        ]
    );
}

#[test]
fn test_include_once_handler() {
    let include_handler = get_include_handler().with_include_once(true);
    let source_text = "#include \"lighting.hlsli\"\n#include <hlsl_builtin.hlsli>\n#include <hlsl_builtin.hlsli>\nAMBIENT";

    let result = process_source_text(
        &include_handler,
        &Options::default(),
        &HashMap::from([("LIGHT_COUNT".to_owned(), "2".to_owned())]),
        &get_project_root_path().join("src/inline.hlsl"),
        source_text,
    )
    .unwrap();

    assert_eq!(
        result.output,
        "\nfloat3 shade_simple(float3 n) { return n * 2; }\n\n\n\n\nfloat4(0.1, 0.1, 0.1, 1.0)"
    );
    assert_eq!(result.files.len(), 3);
}

#[test]
fn test_memory_include_handler() {
    let mut include_handler = MemoryIncludeHandler::new();
    include_handler.add_system_file(
        Path::new("platform.hlsli"),
        "#define PLATFORM_TARGET 5\n#warning Platform header is deprecated",
    );
    let common = include_handler.add_user_file(
        Path::new("src/common/math.hlsli"),
        "#define LERP(a, b, t) ((a) + ((b) - (a)) * (t))",
    );
    include_handler.set_include_once(&common);

    let source_text = "\
#include <platform.hlsli>
#include \"math.hlsli\"
#include \"common/math.hlsli\"
#if PLATFORM_TARGET >= 5
float blend = LERP(x, y, 0.5);
#endif";

    let result = process_source_text(
        &include_handler,
        &Options::default(),
        &HashMap::new(),
        Path::new("/projects/test/src/blend.hlsl"),
        source_text,
    )
    .unwrap();

    assert_eq!(
        result.output,
        "\n\n\n\n\nfloat blend = ((x) + ((y) - (x)) * (0.5));\n"
    );

    assert_eq!(result.prompts.len(), 1);
    assert_eq!(result.prompts[0].level, PromptLevel::Warning);
    assert_eq!(result.prompts[0].message, "Platform header is deprecated");
    assert_eq!(
        result.prompts[0]
            .location
            .map(|location| (location.file_number, location.position.line)),
        Some((2, 1))
    );
}

#[test]
fn test_error_display() {
    let include_handler = MemoryIncludeHandler::new();
    let error = process_source_text(
        &include_handler,
        &Options::default(),
        &HashMap::new(),
        Path::new("/projects/test/src/main.hlsl"),
        "float4 color;\n  #version 5",
    )
    .unwrap_err();

    assert_eq!(
        error.to_string(),
        "/projects/test/src/main.hlsl:2:4: Unknown directive \"#version\"."
    );

    let error = process_source_text(
        &include_handler,
        &Options::default(),
        &HashMap::from([("__FILE__".to_owned(), "1".to_owned())]),
        Path::new("/projects/test/src/main.hlsl"),
        "",
    )
    .unwrap_err();
    assert_eq!(error.file_name, "<predefined>");
}
