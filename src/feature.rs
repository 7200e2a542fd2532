// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Data model consumed by the orchestration core.
//!
//! [`Feature`]s arrive here already parsed: either built by the host
//! directly, or converted from the [`gherkin`] crate's AST via
//! [`Feature::from_gherkin()`]. No syntax validation happens in this crate.

use std::collections::HashMap;

/// A named, tagged collection of [`Scenario`]s, parsed from one feature file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feature {
    /// Title of this [`Feature`].
    pub title: String,

    /// [Tag]s attached to this [`Feature`].
    ///
    /// Scenarios inherit these for filtering purposes.
    ///
    /// [Tag]: https://cucumber.io/docs/cucumber/api#tags
    pub tags: Vec<String>,

    /// [`Scenario`]s of this [`Feature`], in file order.
    pub scenarios: Vec<Scenario>,
}

impl Feature {
    /// Converts a parsed [`gherkin::Feature`] into this crate's model.
    ///
    /// [`Scenario`]s nested under [`Rule`]s are flattened into the
    /// [`Feature`], with the [`Rule`]'s tags merged into each of them.
    ///
    /// [`Rule`]: gherkin::Rule
    #[must_use]
    pub fn from_gherkin(feature: gherkin::Feature) -> Self {
        let mut scenarios: Vec<_> =
            feature.scenarios.into_iter().map(Scenario::from_gherkin).collect();
        for rule in feature.rules {
            scenarios.extend(rule.scenarios.into_iter().map(|sc| {
                let mut sc = Scenario::from_gherkin(sc);
                sc.tags.extend(rule.tags.iter().cloned());
                sc
            }));
        }
        Self { title: feature.name, tags: feature.tags, scenarios }
    }
}

/// A named, tagged ordered sequence of [`Step`]s representing one executable
/// test case.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scenario {
    /// Name of this [`Scenario`].
    ///
    /// Doubles as the identifier a [`LockState`] is keyed by.
    ///
    /// [`LockState`]: crate::LockState
    pub name: String,

    /// [Tag]s attached to this [`Scenario`] directly.
    ///
    /// [Tag]: https://cucumber.io/docs/cucumber/api#tags
    pub tags: Vec<String>,

    /// [`Step`]s of this [`Scenario`], in file order.
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Converts a parsed [`gherkin::Scenario`] into this crate's model.
    #[must_use]
    pub fn from_gherkin(scenario: gherkin::Scenario) -> Self {
        Self {
            name: scenario.name,
            tags: scenario.tags,
            steps: scenario.steps.into_iter().map(Step::from_gherkin).collect(),
        }
    }
}

/// One line of a [`Scenario`]'s behavior description.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Step {
    /// Literal text of this [`Step`] (without its keyword).
    pub text: String,

    /// Optional block argument attached to this [`Step`].
    pub arg: Option<StepArg>,
}

impl Step {
    /// Creates a new [`Step`] out of the given `text` with no block argument.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), arg: None }
    }

    /// Converts a parsed [`gherkin::Step`] into this crate's model.
    ///
    /// A data table takes precedence over a doc string, mirroring how the
    /// Gherkin grammar only ever yields one of them per step.
    #[must_use]
    pub fn from_gherkin(step: gherkin::Step) -> Self {
        let arg = if let Some(table) = step.table {
            Some(StepArg::Table(DataTable::new(table.rows)))
        } else {
            step.docstring.map(StepArg::DocString)
        };
        Self { text: step.value, arg }
    }

    /// Returns the [`DataTable`] attached to this [`Step`], if any.
    #[must_use]
    pub fn table(&self) -> Option<&DataTable> {
        match &self.arg {
            Some(StepArg::Table(table)) => Some(table),
            _ => None,
        }
    }

    /// Returns the doc string attached to this [`Step`], if any.
    #[must_use]
    pub fn doc_string(&self) -> Option<&str> {
        match &self.arg {
            Some(StepArg::DocString(doc)) => Some(doc),
            _ => None,
        }
    }
}

/// Block argument of a [`Step`].
///
/// Rides along unchanged as the always-last argument of a resolved step,
/// regardless of which pattern kind matched.
#[derive(Clone, Debug, PartialEq)]
pub enum StepArg {
    /// Tabular argument.
    Table(DataTable),

    /// Multiline text argument.
    DocString(String),
}

/// A data table attached to a [`Step`].
///
/// Provides convenience accessors over the raw rows.
///
/// # Example
///
/// ```rust
/// use gherkin_conductor::DataTable;
///
/// let table = DataTable::new(vec![
///     vec!["name".to_owned(), "age".to_owned()],
///     vec!["Alice".to_owned(), "30".to_owned()],
/// ]);
///
/// let hashes = table.hashes();
/// assert_eq!(hashes[0].get("name").map(String::as_str), Some("Alice"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTable {
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Creates a new [`DataTable`] from the given rows.
    #[must_use]
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Returns all rows, including the header row.
    #[must_use]
    pub fn raw(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns all rows below the header row.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }

    /// Returns every non-header row as a map keyed by the header row.
    ///
    /// Rows shorter than the header yield empty strings for the missing
    /// cells.
    #[must_use]
    pub fn hashes(&self) -> Vec<HashMap<String, String>> {
        let Some(header) = self.rows.first() else {
            return Vec::new();
        };
        self.rows[1..]
            .iter()
            .map(|row| {
                header
                    .iter()
                    .enumerate()
                    .map(|(i, key)| {
                        (key.clone(), row.get(i).cloned().unwrap_or_default())
                    })
                    .collect()
            })
            .collect()
    }

    /// Indicates whether this [`DataTable`] has no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Vec<String>>> for DataTable {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self::new(rows)
    }
}
