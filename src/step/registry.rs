// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Ordered registry of step definitions.
//!
//! The registry is populated once at startup and read-only during a run.
//! Resolution is a linear scan in registration order with a
//! first-match-wins policy: two overlapping patterns registered in different
//! orders legitimately resolve a step differently, and that tie-break is
//! part of the contract, so no dispatch table or specificity ranking is
//! allowed to replace the scan.

use std::fmt;

use futures::future::LocalBoxFuture;
use regex::Regex;

use crate::{
    error::{DynError, PatternError, ScenarioError},
    feature,
    step::pattern::StepPattern,
    Context,
};

/// Alias for a step implementation bound to a pattern.
pub type StepFn<World> = for<'a> fn(
    &'a mut World,
    Context,
) -> LocalBoxFuture<'a, Result<(), DynError>>;

/// One registered pattern-to-implementation binding.
pub struct StepDef<World> {
    pattern: StepPattern,
    regex: Regex,
    func: StepFn<World>,
}

impl<World> StepDef<World> {
    /// Pattern this definition was registered with.
    #[must_use]
    pub fn pattern(&self) -> &StepPattern {
        &self.pattern
    }
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for StepDef<World> {
    fn clone(&self) -> Self {
        Self {
            pattern: self.pattern.clone(),
            regex: self.regex.clone(),
            func: self.func,
        }
    }
}

impl<World> fmt::Debug for StepDef<World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDef")
            .field("pattern", &self.pattern)
            .field("func", &format!("{:p}", self.func))
            .finish()
    }
}

/// Ordered collection of [`StepDef`]s.
pub struct Registry<World> {
    defs: Vec<StepDef<World>>,
}

// Implemented manually to omit redundant `World: Debug` trait bound, imposed
// by `#[derive(Debug)]`.
impl<World> fmt::Debug for Registry<World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("defs", &self.defs).finish()
    }
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for Registry<World> {
    fn clone(&self) -> Self {
        Self { defs: self.defs.clone() }
    }
}

// Implemented manually to omit redundant `World: Default` trait bound,
// imposed by `#[derive(Default)]`.
impl<World> Default for Registry<World> {
    fn default() -> Self {
        Self { defs: Vec::new() }
    }
}

impl<World> Registry<World> {
    /// Creates a new empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered [`StepDef`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Indicates whether this [`Registry`] has no [`StepDef`]s yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Appends a [`StepDef`] binding the given `pattern` to `func`.
    ///
    /// Definitions are immutable once registered and keep their registration
    /// order forever.
    ///
    /// # Errors
    ///
    /// If the pattern fails to compile.
    pub fn register(
        &mut self,
        pattern: impl Into<StepPattern>,
        func: StepFn<World>,
    ) -> Result<(), PatternError> {
        let pattern = pattern.into();
        let regex = pattern.compile()?;
        self.defs.push(StepDef { pattern, regex, func });
        Ok(())
    }

    /// Builder-style [`Registry::register()`].
    ///
    /// # Errors
    ///
    /// If the pattern fails to compile.
    pub fn with(
        mut self,
        pattern: impl Into<StepPattern>,
        func: StepFn<World>,
    ) -> Result<Self, PatternError> {
        self.register(pattern, func)?;
        Ok(self)
    }

    /// Resolves the given [`Step`] against this [`Registry`].
    ///
    /// Scans definitions in registration order and returns the first one
    /// whose pattern matches the whole [`Step::text`], along with its
    /// captures in left-to-right order as untyped strings.
    ///
    /// Resolution is pure: neither the registry nor the step is mutated, so
    /// for a fixed registry and step text the result is always the same.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::StepNotFound`] if no definition matches; an
    /// unmatched step is an authoring defect and must surface, never be
    /// skipped.
    ///
    /// [`Step`]: feature::Step
    /// [`Step::text`]: feature::Step::text
    pub fn resolve(
        &self,
        step: &feature::Step,
    ) -> Result<Match<'_, World>, ScenarioError> {
        self.defs
            .iter()
            .find_map(|def| {
                def.regex.captures(&step.text).map(|caps| Match {
                    func: &def.func,
                    matches: caps
                        .iter()
                        .skip(1)
                        .map(|c| {
                            c.map_or_else(String::new, |m| {
                                m.as_str().to_owned()
                            })
                        })
                        .collect(),
                })
            })
            .ok_or_else(|| ScenarioError::step_not_found(&step.text))
    }
}

/// Successful resolution of one [`Step`] against a [`Registry`].
///
/// Transient: produced fresh per resolution attempt and never persisted.
///
/// [`Step`]: feature::Step
pub struct Match<'def, World> {
    /// Matched step implementation.
    pub func: &'def StepFn<World>,

    /// Extracted positional arguments, excluding the whole match.
    pub matches: Vec<String>,
}

// Implemented manually to omit redundant `World: Debug` trait bound, imposed
// by `#[derive(Debug)]`.
impl<World> fmt::Debug for Match<'_, World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("func", &format!("{:p}", *self.func))
            .field("matches", &self.matches)
            .finish()
    }
}
