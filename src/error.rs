// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Consolidated error handling types.

use std::time::Duration;

use derive_more::{Display, Error, From};

/// Alias for the boxed error type returned by user-supplied step
/// implementations and hooks.
pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Terminal error of a single [`Scenario`] execution.
///
/// One scenario failing never aborts its siblings (unless the host requested
/// fail-fast behavior), so this type is always scoped to exactly one
/// [`Scenario`].
///
/// [`Scenario`]: crate::Scenario
#[derive(Debug, Display, Error)]
pub enum ScenarioError {
    /// No registered step definition matched the step's text.
    ///
    /// Indicates either a missing implementation or a typo in the feature
    /// file. Both are authoring defects, so the offending text is carried
    /// verbatim instead of being silently skipped.
    #[display("no step implementation found for: {step_text}")]
    StepNotFound {
        /// The unmatched step text.
        #[error(not(source))]
        step_text: String,
    },

    /// The matched step implementation itself failed.
    ///
    /// Fatal to the remainder of that scenario's steps only.
    #[display("step failed: {step_text}: {cause}")]
    Step {
        /// Text of the failed step.
        step_text: String,
        /// The underlying failure reported by the implementation.
        cause: DynError,
    },

    /// A before/after hook failed.
    Hook(HookError),

    /// Creating the per-scenario [`World`] failed.
    ///
    /// [`World`]: crate::World
    #[display("failed to create world: {message}")]
    World {
        /// Rendered creation error.
        #[error(not(source))]
        message: String,
    },

    /// The host-imposed ceiling on [`LockCoordinator::wait_for_turn()`]
    /// elapsed.
    ///
    /// The coordinator itself never produces this: it is constructed by
    /// hosts wrapping the wait in their own timeout.
    ///
    /// [`LockCoordinator::wait_for_turn()`]:
    ///     crate::LockCoordinator::wait_for_turn()
    #[display("timed out after {timeout:?} waiting for the exclusive lock")]
    LockTimeout {
        /// The elapsed ceiling.
        #[error(not(source))]
        timeout: Duration,
    },
}

impl From<HookError> for ScenarioError {
    fn from(err: HookError) -> Self {
        Self::Hook(err)
    }
}

impl ScenarioError {
    /// Creates a [`ScenarioError::StepNotFound`].
    #[must_use]
    pub fn step_not_found(step_text: impl Into<String>) -> Self {
        Self::StepNotFound { step_text: step_text.into() }
    }

    /// Creates a [`ScenarioError::Step`] wrapping the underlying `cause`.
    #[must_use]
    pub fn step_failed(step_text: impl Into<String>, cause: DynError) -> Self {
        Self::Step { step_text: step_text.into(), cause }
    }
}

/// Failure of a registered hook.
///
/// Fatal to the scenario when raised by a before-scenario hook, and
/// logged-but-non-overriding when raised by an after-scenario hook once
/// another error is already recorded.
#[derive(Debug, Display, Error)]
#[display("{kind} hook failed: {cause}")]
pub struct HookError {
    /// Which hook list the failing hook was registered in.
    pub kind: HookKind,

    /// The underlying failure reported by the hook.
    pub cause: DynError,
}

/// Kind of a registered hook.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum HookKind {
    /// Hook running before every matching scenario.
    #[display("before-scenario")]
    Before,

    /// Hook running after every matching scenario.
    #[display("after-scenario")]
    After,

    /// Hook running once before the whole run.
    #[display("before-all")]
    BeforeAll,

    /// Hook running once after the whole run.
    #[display("after-all")]
    AfterAll,
}

/// Error of compiling a [`StepPattern`] at registration time.
///
/// [`StepPattern`]: crate::StepPattern
#[derive(Debug, Display, Error, From)]
pub enum PatternError {
    /// The pattern produced an invalid regular expression.
    #[display("invalid pattern: {_0}")]
    Regex(regex::Error),
}
