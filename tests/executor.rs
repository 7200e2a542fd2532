// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Scenario execution protocol, end to end through a [`Suite`].

use std::{
    convert::Infallible,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use futures::future::LocalBoxFuture;
use gherkin_conductor::{
    Context, DynError, Feature, Registry, Scenario, ScenarioError,
    ScenarioInfo, Step, Suite, TagConfig,
};

struct TestWorld;

impl gherkin_conductor::World for TestWorld {
    type Error = Infallible;

    async fn new() -> Result<Self, Self::Error> {
        Ok(Self)
    }
}

type StepResult<'a> = LocalBoxFuture<'a, Result<(), DynError>>;

fn feature(scenarios: Vec<Scenario>) -> Feature {
    Feature { title: "test feature".to_owned(), tags: vec![], scenarios }
}

fn scenario(name: &str, tags: &[&str], steps: &[&str]) -> Scenario {
    Scenario {
        name: name.to_owned(),
        tags: tags.iter().map(ToString::to_string).collect(),
        steps: steps.iter().map(|s| Step::new(*s)).collect(),
    }
}

fn ok_step(_: &mut TestWorld, _: Context) -> StepResult<'_> {
    Box::pin(async { Ok(()) })
}

fn failing_step(_: &mut TestWorld, _: Context) -> StepResult<'_> {
    Box::pin(async { Err("boom".into()) })
}

#[tokio::test]
async fn first_step_failure_skips_the_remaining_steps() {
    static EXECUTED: AtomicUsize = AtomicUsize::new(0);

    fn counting_step(_: &mut TestWorld, _: Context) -> StepResult<'_> {
        Box::pin(async {
            _ = EXECUTED.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    let registry = Registry::new()
        .with("a passing step", counting_step)
        .and_then(|r| r.with("it explodes", failing_step))
        .expect("patterns should compile");
    let suite = Suite::new(registry);

    let features = [feature(vec![scenario(
        "short circuit",
        &[],
        &["a passing step", "it explodes", "a passing step"],
    )])];
    let summary = suite.run(&features).await;

    // Only the step before the failure ran.
    assert_eq!(EXECUTED.load(Ordering::SeqCst), 1);
    assert_eq!(summary.failed(), 1);
    assert!(matches!(
        &summary.failures[0].1,
        ScenarioError::Step { step_text, .. } if step_text == "it explodes",
    ));
}

#[tokio::test]
async fn unmatched_step_fails_the_scenario() {
    let registry =
        Registry::new().with("a known step", ok_step).expect("should compile");
    let suite = Suite::new(registry);

    let features =
        [feature(vec![scenario("typo", &[], &["an unknown step"])])];
    let summary = suite.run(&features).await;

    assert!(matches!(
        &summary.failures[0].1,
        ScenarioError::StepNotFound { step_text } if step_text == "an unknown step",
    ));
}

#[tokio::test]
async fn failing_before_hook_skips_steps_but_not_after_hooks() {
    static EXECUTED: AtomicUsize = AtomicUsize::new(0);
    static AFTER_RUNS: AtomicUsize = AtomicUsize::new(0);

    fn counting_step(_: &mut TestWorld, _: Context) -> StepResult<'_> {
        Box::pin(async {
            _ = EXECUTED.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn failing_before<'a>(
        _: &'a mut TestWorld,
        _: &'a ScenarioInfo,
    ) -> StepResult<'a> {
        Box::pin(async { Err("setup broke".into()) })
    }

    fn counting_after<'a>(
        _: &'a mut TestWorld,
        _: &'a ScenarioInfo,
    ) -> StepResult<'a> {
        Box::pin(async {
            _ = AFTER_RUNS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    let registry =
        Registry::new().with("a step", counting_step).expect("should compile");
    let suite = Suite::new(registry)
        .before(None, failing_before)
        .after(None, counting_after);

    let features = [feature(vec![scenario("aborted", &[], &["a step"])])];
    let summary = suite.run(&features).await;

    assert_eq!(EXECUTED.load(Ordering::SeqCst), 0);
    assert_eq!(AFTER_RUNS.load(Ordering::SeqCst), 1);
    assert!(matches!(&summary.failures[0].1, ScenarioError::Hook(_)));
}

#[tokio::test]
async fn after_hook_failure_never_overrides_a_step_failure() {
    fn failing_after<'a>(
        _: &'a mut TestWorld,
        _: &'a ScenarioInfo,
    ) -> StepResult<'a> {
        Box::pin(async { Err("teardown broke".into()) })
    }

    let registry = Registry::new()
        .with("it explodes", failing_step)
        .expect("should compile");
    let suite = Suite::new(registry).after(None, failing_after);

    let features =
        [feature(vec![scenario("both fail", &[], &["it explodes"])])];
    let summary = suite.run(&features).await;

    // The step failure is the reported one; the teardown failure is logged.
    assert_eq!(summary.failed(), 1);
    assert!(matches!(&summary.failures[0].1, ScenarioError::Step { .. }));
}

#[tokio::test]
async fn after_hook_failure_surfaces_when_nothing_else_failed() {
    fn failing_after<'a>(
        _: &'a mut TestWorld,
        _: &'a ScenarioInfo,
    ) -> StepResult<'a> {
        Box::pin(async { Err("teardown broke".into()) })
    }

    let registry =
        Registry::new().with("a step", ok_step).expect("should compile");
    let suite = Suite::new(registry).after(None, failing_after);

    let features =
        [feature(vec![scenario("green steps", &[], &["a step"])])];
    let summary = suite.run(&features).await;

    assert!(matches!(&summary.failures[0].1, ScenarioError::Hook(_)));
}

#[tokio::test]
async fn tagged_hooks_only_run_for_matching_scenarios() {
    static DB_HOOK_RUNS: AtomicUsize = AtomicUsize::new(0);

    fn db_before<'a>(
        _: &'a mut TestWorld,
        _: &'a ScenarioInfo,
    ) -> StepResult<'a> {
        Box::pin(async {
            _ = DB_HOOK_RUNS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    let registry =
        Registry::new().with("a step", ok_step).expect("should compile");
    let suite = Suite::new(registry).before(Some("db"), db_before);

    let features = [feature(vec![
        scenario("with db", &["db"], &["a step"]),
        scenario("without db", &[], &["a step"]),
    ])];
    let summary = suite.run(&features).await;

    assert_eq!(summary.passed, 2);
    assert_eq!(DB_HOOK_RUNS.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exclusive_scenarios_never_interleave_their_steps() {
    static EVENTS: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn recording_step(_: &mut TestWorld, ctx: Context) -> StepResult<'_> {
        Box::pin(async move {
            EVENTS.lock().unwrap().push(ctx.info.scenario.clone());
            Ok(())
        })
    }

    let registry =
        Registry::new().with("a step", recording_step).expect("should compile");
    let suite = Suite::new(registry)
        .tag_configs(vec![TagConfig::new("db").exclusive()]);

    let features = [feature(vec![
        scenario("first", &["db"], &["a step", "a step"]),
        scenario("second", &["db"], &["a step", "a step"]),
    ])];
    let summary = suite.run(&features).await;

    assert_eq!(summary.passed, 2);
    assert_eq!(
        *EVENTS.lock().unwrap(),
        ["first", "first", "second", "second"],
    );
}

#[tokio::test]
async fn failing_exclusive_scenario_releases_the_lock_to_its_successor() {
    static EVENTS: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn recording_step(_: &mut TestWorld, ctx: Context) -> StepResult<'_> {
        Box::pin(async move {
            EVENTS.lock().unwrap().push(ctx.info.scenario.clone());
            Ok(())
        })
    }

    fn recording_failure(_: &mut TestWorld, ctx: Context) -> StepResult<'_> {
        Box::pin(async move {
            EVENTS.lock().unwrap().push(ctx.info.scenario.clone());
            Err("boom".into())
        })
    }

    let registry = Registry::new()
        .with("a step", recording_step)
        .and_then(|r| r.with("it explodes", recording_failure))
        .expect("patterns should compile");
    let suite = Suite::new(registry)
        .tag_configs(vec![TagConfig::new("db").exclusive()]);

    let features = [feature(vec![
        scenario("failing holder", &["db"], &["it explodes", "a step"]),
        scenario("queued successor", &["db"], &["a step"]),
    ])];
    let summary = suite.run(&features).await;

    // The failure frees the lock; the waiter behind it still runs.
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.passed, 1);
    assert_eq!(
        *EVENTS.lock().unwrap(),
        ["failing holder", "queued successor"],
    );
}

#[tokio::test]
async fn fail_fast_skips_scenarios_after_the_first_failure() {
    let registry = Registry::new()
        .with("it explodes", failing_step)
        .and_then(|r| r.with("a step", ok_step))
        .expect("patterns should compile");
    let suite =
        Suite::new(registry).fail_fast().max_concurrent_scenarios(Some(1));

    let features = [feature(vec![
        scenario("fails", &[], &["it explodes"]),
        scenario("never starts", &[], &["a step"]),
    ])];
    let summary = suite.run(&features).await;

    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.passed, 0);
}

#[tokio::test]
async fn expression_parameters_reach_the_step_untyped() {
    static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn capture_step(_: &mut TestWorld, ctx: Context) -> StepResult<'_> {
        Box::pin(async move {
            CAPTURED.lock().unwrap().clone_from(&ctx.matches);
            Ok(())
        })
    }

    let registry = Registry::new()
        .with("{word} buys {int} {string} for {float}", capture_step)
        .expect("should compile");
    let suite = Suite::new(registry);

    let features = [feature(vec![scenario(
        "shopping",
        &[],
        &[r#"Alice buys 3 "cucumbers" for 4.50"#],
    )])];
    let summary = suite.run(&features).await;

    assert!(summary.success());
    assert_eq!(
        *CAPTURED.lock().unwrap(),
        ["Alice", "3", "cucumbers", "4.50"],
    );
}

#[tokio::test]
async fn tag_metadata_is_visible_in_the_scenario_context() {
    fn check_metadata(_: &mut TestWorld, ctx: Context) -> StepResult<'_> {
        Box::pin(async move {
            if ctx.info.metadata.get("suite").map(String::as_str)
                == Some("nightly")
            {
                Ok(())
            } else {
                Err("metadata missing".into())
            }
        })
    }

    let registry = Registry::new()
        .with("metadata is present", check_metadata)
        .expect("should compile");
    let suite = Suite::new(registry).tag_configs(vec![
        TagConfig::new("nightly").with_metadata("suite", "nightly"),
    ]);

    let features = [feature(vec![scenario(
        "carries metadata",
        &["nightly"],
        &["metadata is present"],
    )])];
    let summary = suite.run(&features).await;

    assert!(summary.success(), "failures: {:?}", summary.failures);
}

#[tokio::test]
async fn run_hooks_bracket_the_whole_run() {
    static ORDER: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    fn before_all() -> LocalBoxFuture<'static, Result<(), DynError>> {
        Box::pin(async {
            ORDER.lock().unwrap().push("before-all");
            Ok(())
        })
    }

    fn after_all() -> LocalBoxFuture<'static, Result<(), DynError>> {
        Box::pin(async {
            ORDER.lock().unwrap().push("after-all");
            Ok(())
        })
    }

    fn marking_step(_: &mut TestWorld, _: Context) -> StepResult<'_> {
        Box::pin(async {
            ORDER.lock().unwrap().push("step");
            Ok(())
        })
    }

    let registry =
        Registry::new().with("a step", marking_step).expect("should compile");
    let suite =
        Suite::new(registry).before_all(before_all).after_all(after_all);

    let features = [feature(vec![scenario("only", &[], &["a step"])])];
    let summary = suite.run(&features).await;

    assert!(summary.success());
    assert_eq!(*ORDER.lock().unwrap(), ["before-all", "step", "after-all"]);
}

#[tokio::test]
async fn failing_before_all_aborts_the_run_but_still_runs_after_all() {
    static EXECUTED: AtomicUsize = AtomicUsize::new(0);
    static AFTER_ALL_RUNS: AtomicUsize = AtomicUsize::new(0);

    fn failing_before_all() -> LocalBoxFuture<'static, Result<(), DynError>> {
        Box::pin(async { Err("global setup broke".into()) })
    }

    fn counting_after_all() -> LocalBoxFuture<'static, Result<(), DynError>> {
        Box::pin(async {
            _ = AFTER_ALL_RUNS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn counting_step(_: &mut TestWorld, _: Context) -> StepResult<'_> {
        Box::pin(async {
            _ = EXECUTED.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    let registry =
        Registry::new().with("a step", counting_step).expect("should compile");
    let suite = Suite::new(registry)
        .before_all(failing_before_all)
        .after_all(counting_after_all);

    let features = [feature(vec![scenario("never runs", &[], &["a step"])])];
    let summary = suite.run(&features).await;

    assert!(!summary.success());
    assert!(summary.run_error.is_some());
    assert_eq!(EXECUTED.load(Ordering::SeqCst), 0);
    assert_eq!(AFTER_ALL_RUNS.load(Ordering::SeqCst), 1);
}
