// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Behavior-driven test orchestration.
//!
//! This crate turns parsed [Gherkin] features into executed scenarios:
//! - a [`Registry`] of step definitions, resolved in registration order with
//!   [Cucumber Expression]-style parameters or plain regular expressions;
//! - tag expressions ([`TagFilter`], [`TagConfig`]) deciding which scenarios
//!   run, which are suppressed, and which take part in locking;
//! - a [`LockCoordinator`] serializing tag-marked exclusive scenarios in FIFO
//!   order while everything else runs freely;
//! - a [`Suite`] wiring it all together, running eligible scenarios against
//!   a fresh host-defined [`World`] each, with before/after hooks.
//!
//! The crate never drives a browser or any other system under test itself:
//! that lives behind the [`World`] implementation and the registered step
//! functions.
//!
//! [Cucumber Expression]: https://github.com/cucumber/cucumber-expressions
//! [Gherkin]: https://cucumber.io/docs/gherkin

pub mod error;
pub mod feature;
pub mod hook;
pub mod lock;
pub mod output;
pub mod runner;
pub mod step;
pub mod tag;
mod world;

/// Re-export of the underlying feature-file parser.
pub use gherkin;

#[doc(inline)]
pub use self::{
    error::{DynError, HookError, HookKind, PatternError, ScenarioError},
    feature::{DataTable, Feature, Scenario, Step, StepArg},
    hook::{Hooks, RunHookFn, ScenarioHook, ScenarioHookFn},
    lock::{LockCoordinator, LockState},
    output::Console,
    runner::{RunSummary, Suite},
    step::{Context, Match, Registry, ScenarioInfo, StepDef, StepFn, StepPattern},
    tag::{TagConfig, TagFilter, TagOperand},
    world::World,
};
