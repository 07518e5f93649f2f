// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::HashMap;

use crate::{
    FILE_NUMBER_PREDEFINED, error::PreprocessError, lexer::lex_from_str, location::Location,
    token::identifier_name, token_string::TokenString,
};

/// Macros computed by the preprocessor itself. They can not be defined or undefined.
pub const BUILTIN_MACROS: [&str; 4] = ["__FILE__", "__LINE__", "__DATE__", "__TIME__"];

/// The name of the variadic parameter in a macro body.
pub const VARIADIC_ARGUMENTS: &str = "__VA_ARGS__";

/// The variadic parameter in a parameter list.
pub const VARIADIC_PARAMETER: &str = "...";

pub fn is_reserved_name(name: &str) -> bool {
    name == "defined" || BUILTIN_MACROS.contains(&name)
}

#[derive(Debug, PartialEq, Clone)]
pub struct MacroDefinition {
    /// `None` for object-like macros, `Some` (possibly empty) for function-like ones.
    pub parameters: Option<Vec<String>>,

    /// The replacement list, leading and trailing whitespace trimmed.
    pub body: TokenString,

    /// Where the macro is defined.
    pub location: Location,
}

impl MacroDefinition {
    pub fn object_like(body: TokenString, location: Location) -> Self {
        Self {
            parameters: None,
            body: body.trimmed(),
            location,
        }
    }

    pub fn function_like(parameters: Vec<String>, body: TokenString, location: Location) -> Self {
        Self {
            parameters: Some(parameters),
            body: body.trimmed(),
            location,
        }
    }

    pub fn is_function_like(&self) -> bool {
        self.parameters.is_some()
    }

    pub fn is_variadic(&self) -> bool {
        matches!(&self.parameters, Some(parameters) if parameters.last().map(String::as_str) == Some(VARIADIC_PARAMETER))
    }

    /// Returns the index of the parameter which the body identifier `name` refers to.
    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        let parameters = self.parameters.as_ref()?;
        let name = if name == VARIADIC_ARGUMENTS {
            if !self.is_variadic() {
                return None;
            }
            VARIADIC_PARAMETER
        } else {
            name
        };
        parameters.iter().position(|parameter| parameter == name)
    }

    /// Two definitions are the same when their parameter lists are equal and
    /// their bodies are structurally equal, the locations are not compared.
    pub fn same_definition(&self, other: &MacroDefinition) -> bool {
        self.parameters == other.parameters && self.body.structurally_equals(&other.body)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum MacroManipulationResult {
    Success,
    Unchanged, // An identical definition already exists.
    NotFound,
}

#[derive(Debug, Default)]
pub struct MacroMap {
    macros: HashMap<String, MacroDefinition>,
}

impl MacroMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table of predefined object-like macros.
    ///
    /// The values are written in source code style, e.g. `"1"` is a number and
    /// `"\"abc\""` is a string literal, an empty value is allowed.
    pub fn from_key_values(
        predefinitions: &HashMap<String, String>,
    ) -> Result<Self, PreprocessError> {
        let mut macro_map = Self::new();

        // Sorted, so that a failure is reported deterministically.
        let mut keys: Vec<&String> = predefinitions.keys().collect();
        keys.sort();

        for key in keys {
            let location = Location::default();
            if is_reserved_name(key) {
                return Err(PreprocessError::malformed_directive(
                    &format!("Macro name \"{}\" is reserved.", key),
                    location,
                ));
            }

            let tokens = lex_from_str(&predefinitions[key], FILE_NUMBER_PREDEFINED)?;
            let definition =
                MacroDefinition::object_like(TokenString::from_tokens(tokens), location);
            macro_map.define(key, definition)?;
        }

        Ok(macro_map)
    }

    /// Adds a macro.
    ///
    /// Redefining a macro with an identical definition is allowed and changes nothing,
    /// a different definition is an error.
    pub fn define(
        &mut self,
        name: &str,
        definition: MacroDefinition,
    ) -> Result<MacroManipulationResult, PreprocessError> {
        let key = identifier_name(name).into_owned();

        if let Some(existing) = self.macros.get(&key) {
            return if existing.same_definition(&definition) {
                Ok(MacroManipulationResult::Unchanged)
            } else {
                Err(PreprocessError::RedefinitionConflict {
                    name: key,
                    location: definition.location,
                    previous: existing.location,
                })
            };
        }

        self.macros.insert(key, definition);
        Ok(MacroManipulationResult::Success)
    }

    /// Removes a macro, the caller decides what a missing name means.
    pub fn undefine(&mut self, name: &str) -> MacroManipulationResult {
        match self.macros.remove(identifier_name(name).as_ref()) {
            Some(_) => MacroManipulationResult::Success,
            None => MacroManipulationResult::NotFound,
        }
    }

    pub fn get(&self, name: &str) -> Option<&MacroDefinition> {
        self.macros.get(identifier_name(name).as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(identifier_name(name).as_ref())
    }
}
