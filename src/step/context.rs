// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Execution context handed to step implementations.

use std::collections::HashMap;

use crate::feature::{DataTable, Step};

/// Context for a step implementation invocation.
#[derive(Clone, Debug)]
pub struct Context {
    /// [`Step`] this invocation was resolved from, including any attached
    /// table or doc string.
    pub step: Step,

    /// Pattern captures of the [`Step::text`], in left-to-right order,
    /// excluding the whole match.
    pub matches: Vec<String>,

    /// Scenario-scoped information.
    pub info: ScenarioInfo,
}

impl Context {
    /// Returns the [`DataTable`] attached to the resolved [`Step`], if any.
    ///
    /// This is the always-last argument of a resolved step: it rides along
    /// regardless of which pattern kind matched.
    #[must_use]
    pub fn table(&self) -> Option<&DataTable> {
        self.step.table()
    }

    /// Returns the doc string attached to the resolved [`Step`], if any.
    #[must_use]
    pub fn doc_string(&self) -> Option<&str> {
        self.step.doc_string()
    }
}

/// Scenario-scoped context bag with a deliberately narrow set of well-known
/// keys, shared by every step and hook of one scenario.
#[derive(Clone, Debug, Default)]
pub struct ScenarioInfo {
    /// Name of the currently executing scenario.
    pub scenario: String,

    /// Title of the feature the scenario belongs to.
    pub feature: String,

    /// Metadata gathered from the scenario's matching tag configurations.
    pub metadata: HashMap<String, String>,
}
