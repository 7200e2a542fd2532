// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step resolution: patterns, the ordered registry and the execution
//! context.
//!
//! - [`pattern`]: expression templates and regexes, compiled once at
//!   registration;
//! - [`registry`]: first-match-wins resolution against the ordered
//!   definition list;
//! - [`context`]: the [`Context`] handed to every matched implementation.

pub mod context;
pub mod pattern;
pub mod registry;

pub use context::{Context, ScenarioInfo};
pub use pattern::StepPattern;
pub use registry::{Match, Registry, StepDef, StepFn};
