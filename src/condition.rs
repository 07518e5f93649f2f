// Copyright (c) 2026 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{error::PreprocessError, location::Location};

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BranchState {
    // The enclosing region is active and no branch has been taken yet,
    // a later `#elif` or `#else` may still be taken.
    Pending,

    // The current branch is active.
    Taken,

    // A previous branch has been taken, the current one is inactive.
    Closed,

    // The enclosing region is inactive, no condition is ever evaluated.
    Skipped,
}

#[derive(Debug, PartialEq, Clone)]
pub struct IfBlock {
    /// The `#if`-family directive which opened the block.
    pub directive_location: Location,
    pub state: BranchState,
    pub seen_else: bool,
}

/// The stack of open conditional blocks of one source unit.
///
/// The empty stack stands for the always active top level. The conditions
/// are passed as closures, they are only called when the branch may
/// actually be taken, so that nothing in an inactive region is evaluated.
#[derive(Debug, Default)]
pub struct ConditionStack {
    blocks: Vec<IfBlock>,
}

impl ConditionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.blocks
            .last()
            .is_none_or(|block| block.state == BranchState::Taken)
    }

    /// Opens a block for `#if`, `#ifdef` or `#ifndef`.
    pub fn push_if<F>(&mut self, directive_location: Location, condition: F) -> Result<(), PreprocessError>
    where
        F: FnOnce() -> Result<bool, PreprocessError>,
    {
        let state = if !self.is_active() {
            BranchState::Skipped
        } else if condition()? {
            BranchState::Taken
        } else {
            BranchState::Pending
        };

        self.blocks.push(IfBlock {
            directive_location,
            state,
            seen_else: false,
        });
        Ok(())
    }

    /// Handles `#elif`, `#elifdef` and `#elifndef`.
    pub fn elif<F>(&mut self, directive_location: Location, condition: F) -> Result<(), PreprocessError>
    where
        F: FnOnce() -> Result<bool, PreprocessError>,
    {
        let block = self.current_block(directive_location)?;
        block.state = match block.state {
            BranchState::Pending => {
                if condition()? {
                    BranchState::Taken
                } else {
                    BranchState::Pending
                }
            }
            BranchState::Taken => BranchState::Closed,
            state @ (BranchState::Closed | BranchState::Skipped) => state,
        };
        Ok(())
    }

    /// Handles `#else`.
    pub fn else_branch(&mut self, directive_location: Location) -> Result<(), PreprocessError> {
        let block = self.current_block(directive_location)?;
        block.seen_else = true;
        block.state = match block.state {
            BranchState::Pending => BranchState::Taken,
            BranchState::Taken => BranchState::Closed,
            state @ (BranchState::Closed | BranchState::Skipped) => state,
        };
        Ok(())
    }

    /// Handles `#endif`.
    pub fn pop(&mut self, directive_location: Location) -> Result<IfBlock, PreprocessError> {
        self.blocks
            .pop()
            .ok_or(PreprocessError::UnmatchedEndif(directive_location))
    }

    /// Checks that all blocks are closed at the end of the source unit.
    pub fn finish(&self) -> Result<(), PreprocessError> {
        match self.blocks.last() {
            Some(block) => Err(PreprocessError::UnterminatedConditional(
                block.directive_location,
            )),
            None => Ok(()),
        }
    }

    // The block an `#elif` or `#else` belongs to, which must not have seen `#else`.
    fn current_block(&mut self, directive_location: Location) -> Result<&mut IfBlock, PreprocessError> {
        match self.blocks.last_mut() {
            Some(block) if !block.seen_else => Ok(block),
            _ => Err(PreprocessError::MisplacedElse(directive_location)),
        }
    }
}
