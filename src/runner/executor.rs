// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Execution of one scenario's lifecycle.

use crate::{
    error::{HookError, HookKind, ScenarioError},
    feature::Scenario,
    hook::Hooks,
    lock::{LockCoordinator, LockState},
    output::Console,
    step::{Context, Registry, ScenarioInfo},
    World,
};

/// Runs one [`Scenario`] to completion and returns its first error, if any.
///
/// The protocol, in order:
/// 1. enqueue the [`LockState`] (a no-op for non-exclusive scenarios, kept
///    unconditional so call sites stay uniform);
/// 2. create the [`World`];
/// 3. run matching before-hooks; a failure aborts before any step runs;
/// 4. per step, in file order: wait for the lock turn, resolve, invoke;
///    the first failure skips all remaining steps;
/// 5. run matching after-hooks regardless of prior failure;
/// 6. release the lock unconditionally, even on failure.
#[expect(clippy::too_many_arguments, reason = "internal seam")]
pub(crate) async fn run_scenario<W: World>(
    scenario: &Scenario,
    tags: &[String],
    registry: &Registry<W>,
    hooks: &Hooks<W>,
    coordinator: &LockCoordinator,
    lock: &LockState,
    info: &ScenarioInfo,
    console: &Console,
) -> Result<(), ScenarioError> {
    coordinator.enqueue(lock);
    let result = execute(
        scenario, tags, registry, hooks, coordinator, lock, info, console,
    )
    .await;
    coordinator.release(lock);
    result
}

#[expect(clippy::too_many_arguments, reason = "internal seam")]
async fn execute<W: World>(
    scenario: &Scenario,
    tags: &[String],
    registry: &Registry<W>,
    hooks: &Hooks<W>,
    coordinator: &LockCoordinator,
    lock: &LockState,
    info: &ScenarioInfo,
    console: &Console,
) -> Result<(), ScenarioError> {
    console.scenario_started(&scenario.name);

    let mut world = match W::new().await {
        Ok(world) => world,
        Err(e) => {
            return Err(ScenarioError::World { message: e.to_string() });
        }
    };

    let mut error: Option<ScenarioError> = None;

    for hook in hooks.before.iter().filter(|h| h.applies_to(tags)) {
        if let Err(cause) = (hook.func)(&mut world, info).await {
            error = Some(HookError { kind: HookKind::Before, cause }.into());
            break;
        }
    }

    if error.is_none() {
        for step in &scenario.steps {
            coordinator.wait_for_turn(lock).await;

            let failure = match registry.resolve(step) {
                Ok(found) => {
                    let ctx = Context {
                        step: step.clone(),
                        matches: found.matches,
                        info: info.clone(),
                    };
                    (found.func)(&mut world, ctx).await.err().map(|cause| {
                        ScenarioError::step_failed(&step.text, cause)
                    })
                }
                Err(e) => Some(e),
            };

            match failure {
                None => console.step_passed(&scenario.name, &step.text),
                Some(e) => {
                    console.step_failed(&scenario.name, &step.text);
                    error = Some(e);
                    // Remaining steps are skipped, not executed and not
                    // individually marked failed.
                    break;
                }
            }
        }
    }

    for hook in hooks.after.iter().filter(|h| h.applies_to(tags)) {
        if let Err(cause) = (hook.func)(&mut world, info).await {
            let hook_error = HookError { kind: HookKind::After, cause };
            if error.is_none() {
                error = Some(hook_error.into());
            } else {
                // Teardown failures never overwrite the original error.
                tracing::error!(
                    scenario = %scenario.name,
                    "{hook_error}",
                );
            }
        }
    }

    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
