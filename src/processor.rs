// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{collections::HashMap, path::Path};

use crate::{
    FILE_NUMBER_PREDEFINED,
    condition::ConditionStack,
    context::{Context, Options, PragmaPolicy, PreprocessResult, UndefinePolicy},
    directive::{
        DirectiveKind, parse_define, parse_identifier_operand, parse_include_operand,
        parse_line_operand, split_directive_name,
    },
    error::{PreprocessError, PreprocessFileError},
    expander::{ExpansionType, Expander, TokenQueue},
    expression::evaluate,
    include_handler::IncludeHandler,
    lexer::lex_from_str,
    location::Location,
    macro_map::{MacroManipulationResult, is_reserved_name},
    prompt::{Prompt, PromptLevel},
    token::{Token, TokenKind},
    token_string::trim_tokens,
};

/// Preprocesses a shader source file.
///
/// The file is loaded through the include handler, so `source_file_path`
/// is a canonical path as understood by the handler, e.g.
/// `/projects/test/src/main.hlsl` for `MemoryIncludeHandler`.
pub fn process_source_file<T>(
    include_handler: &T,
    options: &Options,

    // The predefined macros, name to replacement text, e.g.
    // `"SHADER_MODEL" => "50"`, as given by `-D` options of the compiler.
    predefinitions: &HashMap<String, String>,

    source_file_path: &Path,
) -> Result<PreprocessResult, PreprocessFileError>
where
    T: IncludeHandler,
{
    let source_text = include_handler
        .load_file(source_file_path)
        .map_err(|error| {
            PreprocessFileError::new(
                &source_file_path.to_string_lossy(),
                PreprocessError::Io {
                    path: source_file_path.to_path_buf(),
                    error,
                },
            )
        })?;

    process_source_text(
        include_handler,
        options,
        predefinitions,
        source_file_path,
        &source_text,
    )
}

/// Preprocesses in-memory shader source text.
///
/// `source_file_path` names the text: it is the value of `__FILE__`, and
/// `#include "..."` is resolved relative to its directory.
pub fn process_source_text<T>(
    include_handler: &T,
    options: &Options,
    predefinitions: &HashMap<String, String>,
    source_file_path: &Path,
    source_text: &str,
) -> Result<PreprocessResult, PreprocessFileError>
where
    T: IncludeHandler,
{
    let context = Context::from_key_values(include_handler, options, predefinitions)
        .map_err(|error| PreprocessFileError::new("<predefined>", error))?;

    let mut processor = Processor {
        context,
        current_file_number: FILE_NUMBER_PREDEFINED,
    };

    let display_name = source_file_path.to_string_lossy();
    let file_number = processor.context.file_table.add(&display_name);
    let canonical_file_path = include_handler.canonicalize(source_file_path);

    if let Err(error) = processor.process_unit(file_number, &canonical_file_path, source_text) {
        let file_number = error
            .location()
            .map_or(processor.current_file_number, |location| location.file_number);
        let file_name = processor
            .context
            .file_table
            .name(file_number)
            .unwrap_or(display_name.as_ref());
        return Err(PreprocessFileError::new(file_name, error));
    }

    let Context {
        output,
        prompts,
        file_table,
        ..
    } = processor.context;

    Ok(PreprocessResult {
        output,
        prompts,
        files: file_table.entries(),
    })
}

struct Processor<'a, T>
where
    T: IncludeHandler,
{
    context: Context<'a, T>,

    // The file being processed, for errors without a location.
    current_file_number: usize,
}

impl<T> Processor<'_, T>
where
    T: IncludeHandler,
{
    fn expander(&self, expansion_type: ExpansionType) -> Expander<'_> {
        Expander::new(
            &self.context.macro_map,
            &self.context.file_table,
            &self.context.timestamp,
            expansion_type,
        )
    }

    // Processes the source file or an included file.
    //
    // Every line break of the text is copied to the output, so that the
    // lines of the output match the lines of the input.
    fn process_unit(
        &mut self,
        file_number: usize,
        canonical_file_path: &Path,
        source_text: &str,
    ) -> Result<(), PreprocessError> {
        self.current_file_number = file_number;

        let tokens = lex_from_str(source_text, file_number)?;
        let mut queue = TokenQueue::from_tokens(tokens);
        let mut conditions = ConditionStack::new();

        while let Some(item) = queue.pop_front() {
            match item.token.kind {
                TokenKind::DirectiveStart => {
                    let directive_location = item.token.location;
                    let (line, newline) = queue.take_line();
                    let line_breaks = count_line_breaks(&line);

                    self.process_directive(
                        &mut conditions,
                        &mut queue,
                        canonical_file_path,
                        directive_location,
                        line,
                    )?;

                    self.context.output.push_str(&"\n".repeat(line_breaks));
                    if let Some(newline) = newline {
                        self.context.output.push_str(&newline.text);
                    }
                }
                TokenKind::Newline => self.context.output.push_str(&item.token.text),
                _ if !conditions.is_active() => {
                    let line_breaks = count_line_breaks(std::slice::from_ref(&item.token));
                    self.context.output.push_str(&"\n".repeat(line_breaks));
                }
                TokenKind::Identifier => {
                    let expanded = self
                        .expander(ExpansionType::Normal)
                        .expand_identifier(&item, &mut queue)?;

                    match expanded {
                        Some(items) => {
                            for expanded_item in items {
                                self.context.output.push_str(&expanded_item.token.text);
                            }
                        }
                        None => self.context.output.push_str(&item.token.text),
                    }
                }
                _ => self.context.output.push_str(&item.token.text),
            }
        }

        conditions.finish()
    }

    fn process_directive(
        &mut self,
        conditions: &mut ConditionStack,
        queue: &mut TokenQueue,
        canonical_file_path: &Path,
        directive_location: Location,
        line: Vec<Token>,
    ) -> Result<(), PreprocessError> {
        // The null directive, i.e. `#` alone.
        let Some((name_token, operand)) = split_directive_name(line) else {
            return Ok(());
        };

        let kind = if name_token.kind == TokenKind::Identifier {
            DirectiveKind::from_name(&name_token.name())
        } else {
            None
        };

        let Some(kind) = kind else {
            if conditions.is_active() {
                return Err(PreprocessError::UnknownDirective {
                    name: name_token.text,
                    location: name_token.location,
                });
            }
            return Ok(());
        };

        let active = conditions.is_active();
        if active || kind.is_conditional() {
            log::trace!(
                "#{} at {} in file {}",
                name_token.text,
                directive_location,
                directive_location.file_number
            );
        }

        match kind {
            DirectiveKind::If => conditions.push_if(directive_location, || {
                self.evaluate_condition(operand, directive_location)
            }),
            DirectiveKind::Ifdef => conditions.push_if(directive_location, || {
                self.is_defined_operand(&operand, "ifdef", directive_location)
            }),
            DirectiveKind::Ifndef => conditions.push_if(directive_location, || {
                self.is_defined_operand(&operand, "ifndef", directive_location)
                    .map(|defined| !defined)
            }),
            DirectiveKind::Elif => conditions.elif(directive_location, || {
                self.evaluate_condition(operand, directive_location)
            }),
            DirectiveKind::Elifdef => conditions.elif(directive_location, || {
                self.is_defined_operand(&operand, "elifdef", directive_location)
            }),
            DirectiveKind::Elifndef => conditions.elif(directive_location, || {
                self.is_defined_operand(&operand, "elifndef", directive_location)
                    .map(|defined| !defined)
            }),
            DirectiveKind::Else => conditions.else_branch(directive_location),
            DirectiveKind::Endif => conditions.pop(directive_location).map(|_| ()),

            // Inactive regions only track the nesting of the conditional blocks.
            _ if !active => Ok(()),

            DirectiveKind::Define => self.process_define(&operand, directive_location),
            DirectiveKind::Undef => self.process_undefine(&operand, directive_location),
            DirectiveKind::Include => {
                self.process_include(operand, canonical_file_path, directive_location)
            }
            DirectiveKind::Pragma => {
                self.process_pragma(&operand, canonical_file_path, directive_location);
                Ok(())
            }
            DirectiveKind::Line => self.process_line(operand, queue, directive_location),
            DirectiveKind::Error => Err(PreprocessError::UserDirectiveError {
                message: render_message(&operand),
                location: directive_location,
            }),
            DirectiveKind::Warning => {
                self.add_warning(&render_message(&operand), directive_location);
                Ok(())
            }
        }
    }

    fn evaluate_condition(
        &self,
        operand: Vec<Token>,
        directive_location: Location,
    ) -> Result<bool, PreprocessError> {
        let expander = self.expander(ExpansionType::ConditionalExpression);
        let value = evaluate(operand, &expander, directive_location)?;
        Ok(value != 0)
    }

    fn is_defined_operand(
        &self,
        operand: &[Token],
        directive_name: &str,
        directive_location: Location,
    ) -> Result<bool, PreprocessError> {
        let token = parse_identifier_operand(operand, directive_name, directive_location)?;
        Ok(self
            .expander(ExpansionType::ConditionalExpression)
            .is_defined(&token.name()))
    }

    fn process_define(
        &mut self,
        operand: &[Token],
        directive_location: Location,
    ) -> Result<(), PreprocessError> {
        let (name, definition) = parse_define(operand, directive_location)?;

        if self.context.macro_map.define(&name, definition)? == MacroManipulationResult::Unchanged
        {
            log::trace!("macro \"{}\" is redefined identically", name);
        }

        Ok(())
    }

    fn process_undefine(
        &mut self,
        operand: &[Token],
        directive_location: Location,
    ) -> Result<(), PreprocessError> {
        let token = parse_identifier_operand(operand, "undef", directive_location)?;
        let name = token.name();

        if is_reserved_name(&name) {
            return Err(PreprocessError::malformed_directive(
                &format!("\"{}\" can not be undefined.", name),
                token.location,
            ));
        }

        if self.context.macro_map.undefine(&name) == MacroManipulationResult::NotFound {
            match self.context.options.undefine_missing {
                UndefinePolicy::Ignore => {}
                UndefinePolicy::Warn => self.add_warning(
                    &format!("Macro \"{}\" is not defined.", name),
                    token.location,
                ),
                UndefinePolicy::Error => {
                    return Err(PreprocessError::UndefinedMacro {
                        name: name.into_owned(),
                        location: token.location,
                    });
                }
            }
        }

        Ok(())
    }

    fn process_include(
        &mut self,
        operand: Vec<Token>,
        canonical_file_path: &Path,
        directive_location: Location,
    ) -> Result<(), PreprocessError> {
        // `#include "path"` and `#include <path>` are taken as they are,
        // any other operand is macro expanded first.
        let is_header_name = matches!(
            trim_tokens(&operand),
            [token] if token.kind == TokenKind::HeaderName
        );

        let request = if is_header_name {
            parse_include_operand(&operand, directive_location)?
        } else {
            let expanded = self
                .expander(ExpansionType::Normal)
                .expand_tokens(operand)?;
            parse_include_operand(&expanded, directive_location)?
        };

        let include_handler = self.context.include_handler;
        let Some(resolved) = include_handler.resolve(
            &request,
            canonical_file_path,
            self.context.options.resolve_relative_path,
        ) else {
            return Err(PreprocessError::IncludeNotFound {
                path: request.to_string(),
                location: directive_location,
            });
        };

        let header_file_path = resolved.canonical_full_path;
        if self.context.once_included.contains(&header_file_path) {
            log::debug!(
                "skip {}, it is included once already",
                header_file_path.display()
            );
            return Ok(());
        }

        if self.context.include_depth >= self.context.options.max_include_depth {
            return Err(PreprocessError::IncludeRecursionLimit {
                path: request.to_string(),
                depth: self.context.include_depth,
                location: directive_location,
            });
        }

        let header_text = include_handler
            .load_file(&header_file_path)
            .map_err(|error| PreprocessError::Io {
                path: header_file_path.clone(),
                error,
            })?;

        log::debug!(
            "include {} from {}, depth {}",
            header_file_path.display(),
            canonical_file_path.display(),
            self.context.include_depth + 1
        );

        let file_number = self
            .context
            .file_table
            .add(&request.path().to_string_lossy());
        let last_file_number = self.current_file_number;

        self.context.include_depth += 1;
        self.process_unit(file_number, &header_file_path, &header_text)?;
        self.context.include_depth -= 1;
        self.current_file_number = last_file_number;

        if include_handler.is_include_once(&header_file_path) {
            log::debug!("{} is include-once", header_file_path.display());
            self.context.once_included.insert(header_file_path);
        }

        Ok(())
    }

    fn process_pragma(
        &mut self,
        operand: &[Token],
        canonical_file_path: &Path,
        directive_location: Location,
    ) {
        let significant: Vec<&Token> = operand
            .iter()
            .filter(|token| !token.is_whitespace())
            .collect();

        if matches!(significant.as_slice(), [token] if token.is_identifier("once")) {
            log::debug!("{} has #pragma once", canonical_file_path.display());
            self.context
                .once_included
                .insert(canonical_file_path.to_path_buf());
            return;
        }

        match self.context.options.pragma_policy {
            PragmaPolicy::PassThrough => {
                // The pragma is written on one line, the line breaks inside
                // the directive are added by the caller.
                self.context.output.push_str("#pragma");
                for token in operand {
                    if token.kind == TokenKind::Whitespace || !token.is_whitespace() {
                        self.context.output.push_str(&token.text);
                    } else {
                        self.context.output.push(' ');
                    }
                }
            }
            PragmaPolicy::Ignore => {
                log::debug!("ignore #pragma at {}", directive_location);
            }
        }
    }

    // `#line N "name"` makes the next line report line N of file "name".
    fn process_line(
        &mut self,
        operand: Vec<Token>,
        queue: &mut TokenQueue,
        directive_location: Location,
    ) -> Result<(), PreprocessError> {
        let expanded = self
            .expander(ExpansionType::Normal)
            .expand_tokens(operand)?;
        let (line_number, file_name) = parse_line_operand(&expanded, directive_location)?;

        let file_number = match file_name {
            Some(file_name) => self.context.file_table.add(&file_name),
            None => directive_location.file_number,
        };

        let Some(next) = queue.peek(0) else {
            return Ok(());
        };

        // Lines are zero-based in locations.
        let line_delta = (line_number as isize - 1) - next.token.location.position.line as isize;
        queue.relocate(line_delta, file_number);
        Ok(())
    }

    fn add_warning(&mut self, message: &str, location: Location) {
        log::warn!("{}: {}", location, message);
        self.context
            .prompts
            .push(Prompt::new(PromptLevel::Warning, message, Some(location)));
    }
}

// The line breaks inside comments and line continuations.
fn count_line_breaks(tokens: &[Token]) -> usize {
    tokens
        .iter()
        .filter(|token| token.is_whitespace())
        .map(|token| token.text.matches('\n').count())
        .sum()
}

// The message of `#error` and `#warning` is the rest of the line as written.
fn render_message(operand: &[Token]) -> String {
    trim_tokens(operand)
        .iter()
        .map(|token| token.text.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::Path};

    use pretty_assertions::assert_eq;

    use crate::{
        context::{Options, PragmaPolicy, PreprocessResult, UndefinePolicy},
        error::{PreprocessError, PreprocessFileError},
        memory_include_handler::MemoryIncludeHandler,
        processor::process_source_text,
        prompt::PromptLevel,
    };

    const MAIN_FILE: &str = "/projects/test/src/main.hlsl";

    fn process_with(
        options: &Options,
        predefinitions: &[(&str, &str)],
        headers: &[(&str, &str)],
        source_text: &str,
    ) -> Result<PreprocessResult, PreprocessFileError> {
        let mut include_handler = MemoryIncludeHandler::new();
        for (path, content) in headers {
            include_handler.add_user_file(Path::new(path), content);
        }

        let predefinitions: HashMap<String, String> = predefinitions
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        process_source_text(
            &include_handler,
            options,
            &predefinitions,
            Path::new(MAIN_FILE),
            source_text,
        )
    }

    fn try_process(source_text: &str) -> Result<PreprocessResult, PreprocessFileError> {
        process_with(&Options::default(), &[], &[], source_text)
    }

    fn process(source_text: &str) -> String {
        try_process(source_text).unwrap().output
    }

    #[test]
    fn test_process_code_without_directive() {
        let source_text = "\
float4 main(float4 position : POSITION) : SV_Position {
    /* identity */ return position; // done
}
";
        assert_eq!(process(source_text), source_text);
    }

    #[test]
    fn test_process_define() {
        assert_eq!(
            process(
                "\
#define LIGHT_COUNT 4
#define SQUARE(x) ((x) * (x))
float lights[LIGHT_COUNT];
float area = SQUARE(radius + 1);"
            ),
            "\n\nfloat lights[4];\nfloat area = ((radius + 1) * (radius + 1));"
        );

        // identical redefinition
        assert_eq!(process("#define A 1\n#define A  1\nA"), "\n\n1");

        assert!(matches!(
            try_process("#define A 1\n#define A 2"),
            Err(PreprocessFileError { error: PreprocessError::RedefinitionConflict { name, .. }, .. }) if name == "A"
        ));
    }

    #[test]
    fn test_process_output_is_stable() {
        let output = process("#define ADD(a, b) a + b\nint x = ADD(1, 2);\n");
        assert_eq!(output, "\nint x = 1 + 2;\n");
        assert_eq!(process(&output), output);
    }

    #[test]
    fn test_process_invocation() {
        let definitions = "#define F(x, y) x + y\n#define SELF SELF + 1\n";

        assert_eq!(
            process(&format!("{}F(1,2) F((1,2),3)", definitions)),
            "\n\n1 + 2 (1,2) + 3"
        );

        // not an invocation without `(`
        assert_eq!(process(&format!("{}int F;", definitions)), "\n\nint F;");

        // recursion stops at the macro itself
        assert_eq!(process(&format!("{}SELF", definitions)), "\n\nSELF + 1");
        assert_eq!(process("#define APPLY(f) f(f)\nAPPLY(APPLY);"), "\nAPPLY(APPLY);");

        assert!(matches!(
            try_process(&format!("{}F(1)", definitions)),
            Err(PreprocessFileError { error: PreprocessError::MacroArityMismatch { expected: 2, found: 1, .. }, .. })
        ));
        assert!(matches!(
            try_process(&format!("{}F(1, (2)", definitions)),
            Err(PreprocessFileError { error: PreprocessError::UnterminatedInvocation { name, .. }, .. }) if name == "F"
        ));
    }

    #[test]
    fn test_process_predefinitions() {
        let result = process_with(
            &Options::default(),
            &[("SHADER_MODEL", "50"), ("USE_FOG", "")],
            &[],
            "#if SHADER_MODEL >= 50 && defined(USE_FOG)\nfog();\n#endif\nint m = SHADER_MODEL;",
        )
        .unwrap();
        assert_eq!(result.output, "\nfog();\n\nint m = 50;");
    }

    #[test]
    fn test_process_undefine() {
        assert_eq!(
            process("#define A 1\n#undef A\n#if A\nyes\n#else\nno\n#endif"),
            "\n\n\n\n\nno\n"
        );

        // undefined names are ignored by default
        assert_eq!(process("#undef NOTHING\nx"), "\nx");

        let options = Options {
            undefine_missing: UndefinePolicy::Warn,
            ..Options::default()
        };
        let result = process_with(&options, &[], &[], "#undef NOTHING").unwrap();
        assert_eq!(result.prompts.len(), 1);
        assert_eq!(result.prompts[0].level, PromptLevel::Warning);

        let options = Options {
            undefine_missing: UndefinePolicy::Error,
            ..Options::default()
        };
        assert!(matches!(
            process_with(&options, &[], &[], "#undef NOTHING"),
            Err(PreprocessFileError { error: PreprocessError::UndefinedMacro { name, .. }, .. }) if name == "NOTHING"
        ));

        assert!(matches!(
            try_process("#undef __LINE__"),
            Err(PreprocessFileError { error: PreprocessError::MalformedDirective { .. }, .. })
        ));
    }

    #[test]
    fn test_process_conditionals() {
        assert_eq!(
            process(
                "\
#define QUALITY 2
#if QUALITY == 1
low
#elif QUALITY == 2
medium
#elif QUALITY >= 2
high
#else
none
#endif"
            ),
            "\n\n\nmedium\n\n\n\n\n"
        );

        assert_eq!(
            process("#ifdef A\na\n#elifndef B\nnot b\n#endif"),
            "\n\n\nnot b\n"
        );

        // nested blocks in an inactive region are not evaluated
        assert_eq!(
            process("#if 0\n#if 1 / 0\n#error never\n#endif\n#bogus\n#endif\nend"),
            "\n\n\n\n\n\nend"
        );

        // `X` is not defined
        assert_eq!(
            process("#if defined(X) && X > 0\nx\n#endif\ndone"),
            "\n\n\ndone"
        );
    }

    #[test]
    fn test_process_conditional_errors() {
        assert!(matches!(
            try_process("#if 1\n#endif\n#endif"),
            Err(PreprocessFileError { error: PreprocessError::UnmatchedEndif(location), .. }) if location.position.line == 2
        ));
        assert!(matches!(
            try_process("#if 1\n#else\n#else\n#endif"),
            Err(PreprocessFileError { error: PreprocessError::MisplacedElse(_), .. })
        ));
        assert!(matches!(
            try_process("#else"),
            Err(PreprocessFileError { error: PreprocessError::MisplacedElse(_), .. })
        ));
        assert!(matches!(
            try_process("#if 1\n#if 0\n#endif"),
            Err(PreprocessFileError { error: PreprocessError::UnterminatedConditional(location), .. }) if location.position.line == 0
        ));
        assert!(matches!(
            try_process("#if 1 / 0\n#endif"),
            Err(PreprocessFileError { error: PreprocessError::DivisionByZero(_), .. })
        ));
        assert!(matches!(
            try_process("#ifdef\n#endif"),
            Err(PreprocessFileError { error: PreprocessError::MalformedDirective { .. }, .. })
        ));
    }

    #[test]
    fn test_process_error_and_warning() {
        let error = try_process("#if 1\n#error Shader model 5 is required\n#endif").unwrap_err();
        assert_eq!(error.file_name, MAIN_FILE);
        assert!(matches!(
            error.error,
            PreprocessError::UserDirectiveError { message, location } if message == "Shader model 5 is required" && location.position.line == 1
        ));

        let result = try_process("#warning Fallback path in use\nx").unwrap();
        assert_eq!(result.output, "\nx");
        assert_eq!(result.prompts.len(), 1);
        assert_eq!(result.prompts[0].message, "Fallback path in use");
        assert_eq!(
            result.prompts[0].location.map(|location| location.position.line),
            Some(0)
        );

        assert!(matches!(
            try_process("#shader main"),
            Err(PreprocessFileError { error: PreprocessError::UnknownDirective { name, .. }, .. }) if name == "shader"
        ));

        // the null directive
        assert_eq!(process("#\nx"), "\nx");
    }

    #[test]
    fn test_process_pragma() {
        assert_eq!(
            process("#pragma pack_matrix(row_major)\nfloat4x4 m;"),
            "#pragma pack_matrix(row_major)\nfloat4x4 m;"
        );

        let options = Options {
            pragma_policy: PragmaPolicy::Ignore,
            ..Options::default()
        };
        assert_eq!(
            process_with(&options, &[], &[], "#pragma warning(disable: 3571)\nx")
                .unwrap()
                .output,
            "\nx"
        );
    }

    #[test]
    fn test_process_include() {
        let headers = [
            ("include/lighting.hlsli", "#pragma once\nfloat3 light;"),
            ("src/common/config.hlsli", "#define LIGHTS 4"),
        ];
        let result = process_with(
            &Options::default(),
            &[],
            &headers,
            "#include \"lighting.hlsli\"\n#include \"common/config.hlsli\"\n#include <lighting.hlsli>\nLIGHTS",
        );

        // angled paths are only looked up in the system directories
        assert!(matches!(
            result,
            Err(PreprocessFileError { error: PreprocessError::IncludeNotFound { path, .. }, .. }) if path == "<lighting.hlsli>"
        ));

        let result = process_with(
            &Options::default(),
            &[],
            &headers,
            "#include \"lighting.hlsli\"\n#include \"../include/lighting.hlsli\"\n#include \"common/config.hlsli\"\nLIGHTS",
        )
        .unwrap();
        assert_eq!(result.output, "\nfloat3 light;\n\n\n4");
        assert_eq!(
            result.files,
            vec![
                (1, MAIN_FILE.to_owned()),
                (2, "lighting.hlsli".to_owned()),
                (3, "common/config.hlsli".to_owned()),
            ]
        );
    }

    #[test]
    fn test_process_include_with_macro() {
        let headers = [("include/material.hlsli", "float roughness;")];
        let result = process_with(
            &Options::default(),
            &[],
            &headers,
            "#define MATERIAL_HEADER \"material.hlsli\"\n#include MATERIAL_HEADER\n",
        )
        .unwrap();
        assert_eq!(result.output, "\nfloat roughness;\n");
    }

    #[test]
    fn test_process_include_errors() {
        let error = try_process("\n#include \"missing.hlsli\"").unwrap_err();
        assert!(matches!(
            error.error,
            PreprocessError::IncludeNotFound { path, location } if path == "\"missing.hlsli\"" && location.position.line == 1
        ));

        // an error in a header is reported with the name of the header
        let headers = [("include/broken.hlsli", "ok\n#if\n#endif")];
        let error = process_with(&Options::default(), &[], &headers, "#include \"broken.hlsli\"")
            .unwrap_err();
        assert_eq!(error.file_name, "broken.hlsli");
        assert!(matches!(
            error.error,
            PreprocessError::MalformedExpression { .. }
        ));

        // a header including itself
        let headers = [("include/self.hlsli", "#include \"self.hlsli\"")];
        let options = Options {
            max_include_depth: 3,
            ..Options::default()
        };
        assert!(matches!(
            process_with(&options, &[], &headers, "#include \"self.hlsli\""),
            Err(PreprocessFileError { error: PreprocessError::IncludeRecursionLimit { depth: 3, .. }, .. })
        ));
    }

    #[test]
    fn test_process_line() {
        assert_eq!(
            process("#line 100\n__LINE__\n__LINE__ __FILE__"),
            "\n100\n101 \"/projects/test/src/main.hlsl\""
        );

        let result = try_process("#define BASE 10\n#line BASE \"generated.hlsl\"\n__FILE__ __LINE__\n#error stop").unwrap_err();
        assert_eq!(result.file_name, "generated.hlsl");
        assert!(matches!(
            result.error,
            PreprocessError::UserDirectiveError { location, .. } if location.position.line == 10
        ));

        assert!(matches!(
            try_process("#line zero"),
            Err(PreprocessFileError { error: PreprocessError::MalformedDirective { .. }, .. })
        ));
    }

    #[test]
    fn test_process_keeps_line_numbers() {
        // line continuations in directives and comments in skipped regions
        assert_eq!(
            process("#define LONG 1 + \\\n 2\n#if 0\n/* a\n b */\n#endif\n__LINE__"),
            "\n\n\n\n\n\n7"
        );

        // an invocation spanning lines
        assert_eq!(
            process("#define ADD(a, b) a + b\nADD(1,\n2)\nend"),
            "\n1 + 2\n\nend"
        );
    }

    #[test]
    fn test_process_builtin_macros() {
        let output = process("__FILE__\n__LINE__");
        assert_eq!(output, "\"/projects/test/src/main.hlsl\"\n2");

        let output = process("__DATE__ __TIME__");
        // "Mmm dd yyyy" "hh:mm:ss"
        assert_eq!(output.len(), 13 + 1 + 10);
    }
}
