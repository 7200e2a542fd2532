// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Hook registration and tag-based lookup.
//!
//! Hooks live in four append-only ordered lists, registered once at startup
//! and executed in registration order. Scenario-level hooks may carry an
//! optional tag filter, evaluated as a singleton [`has_any()`] expression
//! against the scenario's tags.
//!
//! [`has_any()`]: crate::tag::has_any

use std::fmt;

use futures::future::LocalBoxFuture;

use crate::{
    error::DynError,
    step::ScenarioInfo,
    tag::{self, TagOperand},
};

/// Alias for a hook executed before or after one scenario.
pub type ScenarioHookFn<World> = for<'a> fn(
    &'a mut World,
    &'a ScenarioInfo,
) -> LocalBoxFuture<'a, Result<(), DynError>>;

/// Alias for a hook executed once before or after the whole run.
pub type RunHookFn = fn() -> LocalBoxFuture<'static, Result<(), DynError>>;

/// One registered scenario-level hook.
pub struct ScenarioHook<World> {
    /// Optional tag the hook is restricted to.
    pub tag: Option<String>,

    /// The hook callback itself.
    pub func: ScenarioHookFn<World>,
}

impl<World> ScenarioHook<World> {
    /// Indicates whether this hook applies to a scenario carrying the given
    /// tags.
    #[must_use]
    pub fn applies_to<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.tag.as_ref().map_or(true, |t| {
            tag::has_any(tags, &[TagOperand::Tag(t.clone())])
        })
    }
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for ScenarioHook<World> {
    fn clone(&self) -> Self {
        Self { tag: self.tag.clone(), func: self.func }
    }
}

impl<World> fmt::Debug for ScenarioHook<World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioHook")
            .field("tag", &self.tag)
            .field("func", &format!("{:p}", self.func))
            .finish()
    }
}

/// The four append-only hook lists of one run.
pub struct Hooks<World> {
    /// Hooks run before each matching scenario, in registration order.
    pub(crate) before: Vec<ScenarioHook<World>>,

    /// Hooks run after each matching scenario, in registration order.
    pub(crate) after: Vec<ScenarioHook<World>>,

    /// Hooks run once before the whole run.
    pub(crate) before_all: Vec<RunHookFn>,

    /// Hooks run once after the whole run.
    pub(crate) after_all: Vec<RunHookFn>,
}

// Implemented manually to omit redundant `World: Default` trait bound,
// imposed by `#[derive(Default)]`.
impl<World> Default for Hooks<World> {
    fn default() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
            before_all: Vec::new(),
            after_all: Vec::new(),
        }
    }
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for Hooks<World> {
    fn clone(&self) -> Self {
        Self {
            before: self.before.clone(),
            after: self.after.clone(),
            before_all: self.before_all.clone(),
            after_all: self.after_all.clone(),
        }
    }
}

impl<World> fmt::Debug for Hooks<World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before)
            .field("after", &self.after)
            .field("before_all", &self.before_all.len())
            .field("after_all", &self.after_all.len())
            .finish()
    }
}

impl<World> Hooks<World> {
    /// Creates a new empty set of [`Hooks`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a before-scenario hook, optionally restricted to scenarios
    /// carrying the given tag.
    pub fn before(&mut self, tag: Option<String>, func: ScenarioHookFn<World>) {
        self.before.push(ScenarioHook { tag, func });
    }

    /// Appends an after-scenario hook, optionally restricted to scenarios
    /// carrying the given tag.
    pub fn after(&mut self, tag: Option<String>, func: ScenarioHookFn<World>) {
        self.after.push(ScenarioHook { tag, func });
    }

    /// Appends a hook running once before the whole run.
    pub fn before_all(&mut self, func: RunHookFn) {
        self.before_all.push(func);
    }

    /// Appends a hook running once after the whole run.
    pub fn after_all(&mut self, func: RunHookFn) {
        self.after_all.push(func);
    }
}
