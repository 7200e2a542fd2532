// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Feature/suite orchestration.
//!
//! The [`Suite`] applies the eligibility gates (disabled-tag override, tag
//! filter, title filters), derives each eligible scenario's [`LockState`]
//! from its tag configurations, and hands scenarios to the executor,
//! optionally concurrently. One scenario's error never aborts its siblings
//! unless fail-fast was requested.

use std::{
    cell::RefCell,
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use futures::{stream, StreamExt as _};
use itertools::Itertools as _;
use regex::{Regex, RegexBuilder};

use crate::{
    error::{HookError, HookKind, PatternError, ScenarioError},
    feature::{Feature, Scenario},
    hook::{Hooks, RunHookFn, ScenarioHookFn},
    lock::{LockCoordinator, LockState},
    output::Console,
    runner::executor,
    step::{Registry, ScenarioInfo},
    tag::{self, TagConfig, TagFilter, TagOperand},
    World,
};

/// Orchestrator of a whole run.
///
/// Built once by the host out of a populated [`Registry`], hooks and
/// filters, then driven with [`Suite::run()`].
pub struct Suite<W> {
    registry: Registry<W>,
    hooks: Hooks<W>,
    coordinator: LockCoordinator,
    filter: TagFilter,
    configs: Vec<TagConfig>,
    scenario_filter: Option<Regex>,
    feature_filter: Option<Regex>,
    concurrency: Option<usize>,
    fail_fast: bool,
    console: Console,
}

// Implemented manually to omit redundant trait bounds on `W`.
impl<W> fmt::Debug for Suite<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("registry", &self.registry)
            .field("filter", &self.filter)
            .field("concurrency", &self.concurrency)
            .field("fail_fast", &self.fail_fast)
            .finish_non_exhaustive()
    }
}

impl<W: World> Default for Suite<W> {
    fn default() -> Self {
        Self::new(Registry::new())
    }
}

impl<W: World> Suite<W> {
    /// Creates a new [`Suite`] around the given step [`Registry`].
    #[must_use]
    pub fn new(registry: Registry<W>) -> Self {
        Self {
            registry,
            hooks: Hooks::new(),
            coordinator: LockCoordinator::new(),
            filter: TagFilter::default(),
            configs: Vec::new(),
            scenario_filter: None,
            feature_filter: None,
            concurrency: None,
            fail_fast: false,
            console: Console::new(),
        }
    }

    /// Adds a before-scenario hook, optionally restricted to the given tag.
    #[must_use]
    pub fn before(mut self, tag: Option<&str>, func: ScenarioHookFn<W>) -> Self {
        self.hooks.before(tag.map(ToOwned::to_owned), func);
        self
    }

    /// Adds an after-scenario hook, optionally restricted to the given tag.
    #[must_use]
    pub fn after(mut self, tag: Option<&str>, func: ScenarioHookFn<W>) -> Self {
        self.hooks.after(tag.map(ToOwned::to_owned), func);
        self
    }

    /// Adds a hook running once before anything else.
    #[must_use]
    pub fn before_all(mut self, func: RunHookFn) -> Self {
        self.hooks.before_all(func);
        self
    }

    /// Adds a hook running once after everything else, even after failures.
    #[must_use]
    pub fn after_all(mut self, func: RunHookFn) -> Self {
        self.hooks.after_all(func);
        self
    }

    /// Sets the raw tag-filter list, partitioned into include/exclude
    /// expressions as described on [`TagFilter::from_raw()`].
    #[must_use]
    pub fn tags(mut self, raw: impl IntoIterator<Item = TagOperand>) -> Self {
        self.filter = TagFilter::from_raw(raw);
        self
    }

    /// Sets the authored per-tag configurations (disable overrides, lock
    /// participation, metadata).
    #[must_use]
    pub fn tag_configs(mut self, configs: Vec<TagConfig>) -> Self {
        self.configs = configs;
        self
    }

    /// Restricts the run to scenarios whose name matches the given pattern,
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// If the pattern is not a valid regular expression.
    pub fn filter_scenario_name(
        mut self,
        pattern: &str,
    ) -> Result<Self, PatternError> {
        self.scenario_filter = Some(case_insensitive(pattern)?);
        Ok(self)
    }

    /// Restricts the run to features whose title matches the given pattern,
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// If the pattern is not a valid regular expression.
    pub fn filter_feature_title(
        mut self,
        pattern: &str,
    ) -> Result<Self, PatternError> {
        self.feature_filter = Some(case_insensitive(pattern)?);
        Ok(self)
    }

    /// Limits the number of concurrently executing scenarios.
    #[must_use]
    pub fn max_concurrent_scenarios(mut self, limit: Option<usize>) -> Self {
        self.concurrency = limit;
        self
    }

    /// Stops launching new scenarios after the first failure.
    #[must_use]
    pub fn fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// The [`LockCoordinator`] owned by this [`Suite`].
    #[must_use]
    pub fn coordinator(&self) -> &LockCoordinator {
        &self.coordinator
    }

    /// Runs every eligible [`Scenario`] of the given [`Feature`]s and
    /// aggregates the outcome.
    ///
    /// Scenario executions may interleave on the caller's executor; the
    /// returned future is not `Send`, matching the `LocalBoxFuture`-based
    /// step functions.
    pub async fn run(&self, features: &[Feature]) -> RunSummary {
        let mut summary = RunSummary::default();

        for hook in &self.hooks.before_all {
            if let Err(cause) = hook().await {
                let err = HookError { kind: HookKind::BeforeAll, cause };
                tracing::error!("{err}");
                summary.run_error = Some(err);
                self.run_after_all(&mut summary).await;
                return summary;
            }
        }

        let planned = self.collect(features, &mut summary);

        let stop = AtomicBool::new(false);
        let results = RefCell::new(Vec::new());
        {
            // Reborrowed so the `async move` blocks capture references and
            // only `plan` by value.
            let (stop, results) = (&stop, &results);
            stream::iter(planned)
                .for_each_concurrent(self.concurrency, |plan| async move {
                    if stop.load(Ordering::SeqCst) {
                        results
                            .borrow_mut()
                            .push((plan.scenario.name.clone(), None));
                        return;
                    }
                    let outcome = executor::run_scenario(
                        plan.scenario,
                        &plan.tags,
                        &self.registry,
                        &self.hooks,
                        &self.coordinator,
                        &plan.lock,
                        &plan.info,
                        &self.console,
                    )
                    .await;
                    if outcome.is_err() && self.fail_fast {
                        stop.store(true, Ordering::SeqCst);
                    }
                    results
                        .borrow_mut()
                        .push((plan.scenario.name.clone(), Some(outcome)));
                })
                .await;
        }

        for (name, outcome) in results.into_inner() {
            match outcome {
                None => summary.skipped += 1,
                Some(Ok(())) => summary.passed += 1,
                Some(Err(e)) => summary.failures.push((name, e)),
            }
        }

        self.run_after_all(&mut summary).await;
        summary
    }

    async fn run_after_all(&self, summary: &mut RunSummary) {
        for hook in &self.hooks.after_all {
            if let Err(cause) = hook().await {
                let err = HookError { kind: HookKind::AfterAll, cause };
                tracing::error!("{err}");
                if summary.run_error.is_none() {
                    summary.run_error = Some(err);
                }
            }
        }
    }

    /// Applies the eligibility gates and derives the lock state and context
    /// of every scenario that will actually run.
    ///
    /// Gate order per scenario: disabled-tag override first (a disabled tag
    /// always wins over any filter, and logs its configured reason), then
    /// the include/exclude tag filter over the union of feature and scenario
    /// tags, then the title filters.
    fn collect<'f>(
        &self,
        features: &'f [Feature],
        summary: &mut RunSummary,
    ) -> Vec<Planned<'f>> {
        let mut planned = Vec::new();
        for feature in features {
            if let Some(cfg) = tag::find_disabled(&feature.tags, &self.configs)
            {
                self.console.disabled(&cfg.tag, cfg.reason.as_deref());
                summary.disabled += feature.scenarios.len();
                continue;
            }
            if let Some(re) = &self.feature_filter {
                if !re.is_match(&feature.title) {
                    summary.filtered += feature.scenarios.len();
                    continue;
                }
            }

            for scenario in &feature.scenarios {
                // Scenarios inherit their feature's tags for filtering.
                let tags: Vec<String> = feature
                    .tags
                    .iter()
                    .chain(&scenario.tags)
                    .unique()
                    .cloned()
                    .collect();

                if let Some(cfg) = tag::find_disabled(&tags, &self.configs) {
                    self.console.disabled(&cfg.tag, cfg.reason.as_deref());
                    summary.disabled += 1;
                    continue;
                }
                if !self.filter.allows(&tags) {
                    summary.filtered += 1;
                    continue;
                }
                if let Some(re) = &self.scenario_filter {
                    if !re.is_match(&scenario.name) {
                        summary.filtered += 1;
                        continue;
                    }
                }

                planned.push(self.plan(feature, scenario, tags));
            }
        }
        planned
    }

    fn plan<'f>(
        &self,
        feature: &'f Feature,
        scenario: &'f Scenario,
        tags: Vec<String>,
    ) -> Planned<'f> {
        let mut lock = LockState::new(&scenario.name);
        let mut metadata = std::collections::HashMap::new();
        for cfg in tag::matching(&tags, &self.configs) {
            if cfg.exclusive {
                lock = lock.exclusive();
            }
            if cfg.ignores_lock {
                lock = lock.ignoring_lock();
            }
            metadata.extend(
                cfg.metadata.iter().map(|(k, v)| (k.clone(), v.clone())),
            );
        }

        let info = ScenarioInfo {
            scenario: scenario.name.clone(),
            feature: feature.title.clone(),
            metadata,
        };
        Planned { scenario, tags, lock, info }
    }
}

/// One scenario that passed every eligibility gate, ready to execute.
struct Planned<'f> {
    scenario: &'f Scenario,
    tags: Vec<String>,
    lock: LockState,
    info: ScenarioInfo,
}

/// Aggregated outcome of one [`Suite::run()`].
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Scenarios that ran to completion without an error.
    pub passed: usize,

    /// Scenarios skipped because fail-fast stopped the run.
    pub skipped: usize,

    /// Scenarios suppressed by a disabled tag.
    pub disabled: usize,

    /// Scenarios rejected by the tag or title filters.
    pub filtered: usize,

    /// Name and terminal error of every failed scenario.
    pub failures: Vec<(String, ScenarioError)>,

    /// Failure of a before-all/after-all hook, if any.
    pub run_error: Option<HookError>,
}

impl RunSummary {
    /// Number of failed scenarios.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Indicates whether the whole run succeeded.
    #[must_use]
    pub fn success(&self) -> bool {
        self.failures.is_empty() && self.run_error.is_none()
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, PatternError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(Into::into)
}
