// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Cross-scenario lock coordination.
//!
//! Scenarios that mutate shared external state declare themselves exclusive
//! and are serialized through a FIFO wait queue, while everything else runs
//! fully concurrent. The [`LockCoordinator`] is an explicitly-owned instance
//! handed to every scenario execution (never process-global), so independent
//! runs and coordinator unit tests cannot cross-contaminate.
//!
//! Internally all shared state lives behind one [`Mutex`] that is never held
//! across an await; suspended waiters park on one-shot channels and
//! re-subscribe whenever a holder-change notification names neither them nor
//! "empty".

use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::channel::oneshot;

/// Lock participation of one scenario execution.
///
/// Created at the start of a scenario's execution and owned by exactly one
/// executing scenario at a time; only the coordinator's queue and current
/// holder are shared.
#[derive(Clone, Debug)]
pub struct LockState {
    /// Identifier of the owning scenario (its name).
    id: String,

    /// Whether the owning scenario requires the exclusive lock.
    wants_exclusive: bool,

    /// Explicit escape hatch: run interleaved with the current holder.
    ignores_lock: bool,
}

impl LockState {
    /// Creates a new non-exclusive [`LockState`] for the scenario with the
    /// given `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), wants_exclusive: false, ignores_lock: false }
    }

    /// Marks the owning scenario as requiring the exclusive lock.
    #[must_use]
    pub fn exclusive(mut self) -> Self {
        self.wants_exclusive = true;
        self
    }

    /// Marks the owning scenario as bypassing the lock entirely.
    #[must_use]
    pub fn ignoring_lock(mut self) -> Self {
        self.ignores_lock = true;
        self
    }

    /// Identifier of the owning scenario.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the owning scenario requires the exclusive lock.
    #[must_use]
    pub fn wants_exclusive(&self) -> bool {
        self.wants_exclusive
    }
}

/// Queue phase of one exclusive scenario, terminal at [`Completed`].
///
/// [`Completed`]: Phase::Completed
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Waiting,
    Running,
    Completed,
}

#[derive(Debug)]
struct Entry {
    id: String,
    phase: Phase,
}

/// Notification sent to parked waiters on every holder change: the new
/// holder's id, or [`None`] once the queue emptied without a successor.
type HolderChange = Option<String>;

#[derive(Debug, Default)]
struct Inner {
    /// Scenario currently holding the exclusive lock.
    current: Option<String>,

    /// All exclusive scenarios, in enqueue order.
    queue: Vec<Entry>,

    /// One-shot subscriptions to the next holder change.
    waiters: Vec<oneshot::Sender<HolderChange>>,
}

/// Serializes scenarios flagged as exclusive while leaving all other
/// scenarios fully concurrent.
///
/// Guarantees, under concurrent [`enqueue()`]/[`wait_for_turn()`]/
/// [`release()`] calls from independent scenario executions:
/// - at most one scenario holds the exclusive lock at any instant;
/// - grant order equals enqueue order among scenarios still waiting (FIFO);
/// - once granted, a holder is never preempted;
/// - the coordinator itself never fails, and never deadlocks on a failing
///   holder as long as [`release()`] is called.
///
/// [`enqueue()`]: LockCoordinator::enqueue()
/// [`release()`]: LockCoordinator::release()
/// [`wait_for_turn()`]: LockCoordinator::wait_for_turn()
#[derive(Debug, Default)]
pub struct LockCoordinator {
    inner: Mutex<Inner>,
}

impl LockCoordinator {
    /// Creates a new idle [`LockCoordinator`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the given [`LockState`] with this coordinator.
    ///
    /// Non-exclusive scenarios are a no-op here (they never enter the queue
    /// or block anything), which keeps call sites uniform: every scenario
    /// enqueues exactly once before its first step.
    ///
    /// An exclusive scenario is granted the lock immediately when no holder
    /// exists, and queued as waiting otherwise.
    pub fn enqueue(&self, state: &LockState) {
        if !state.wants_exclusive {
            return;
        }

        let mut inner = self.lock_inner();
        let phase = if inner.current.is_none() {
            inner.current = Some(state.id.clone());
            tracing::debug!(scenario = %state.id, "exclusive lock granted");
            Phase::Running
        } else {
            Phase::Waiting
        };
        inner.queue.push(Entry { id: state.id.clone(), phase });
    }

    /// Waits until the owning scenario may execute its next step.
    ///
    /// Resolves immediately for scenarios that ignore or never wanted the
    /// lock, when no holder exists, or when the owning scenario is the
    /// holder itself. Otherwise parks on a one-shot holder-change
    /// subscription, re-subscribing while the announced holder is some other
    /// scenario: grant order follows queue order, not notification order.
    ///
    /// This is the sole suspension point of the crate and never busy-polls.
    /// The core imposes no wait ceiling; hosts may wrap this future in their
    /// own timeout and surface [`ScenarioError::LockTimeout`].
    ///
    /// [`ScenarioError::LockTimeout`]: crate::ScenarioError::LockTimeout
    pub async fn wait_for_turn(&self, state: &LockState) {
        if state.ignores_lock || !state.wants_exclusive {
            return;
        }

        loop {
            let rx = {
                let mut inner = self.lock_inner();
                let Some(holder) = inner.current.clone() else { return };
                if holder == state.id {
                    return;
                }
                if !inner.queue.iter().any(|e| e.id == holder) {
                    // The recorded holder never enqueued; nothing will ever
                    // release it, so clear it instead of waiting forever.
                    inner.current = None;
                    return;
                }
                tracing::debug!(
                    scenario = %state.id,
                    holder = %holder,
                    "waiting for exclusive scenario to complete",
                );
                let (tx, rx) = oneshot::channel();
                inner.waiters.push(tx);
                rx
            };

            match rx.await {
                Ok(Some(next)) if next == state.id => return,
                // Queue emptied without a successor.
                Ok(None) => return,
                // Someone else's turn (or a dropped notifier): re-subscribe.
                Ok(Some(_)) | Err(oneshot::Canceled) => {}
            }
        }
    }

    /// Releases the owning scenario's participation in this coordinator.
    ///
    /// Must be called unconditionally once per scenario, even on failure: a
    /// failing exclusive scenario still frees the lock for the next waiter.
    /// Promotes the first still-waiting exclusive entry in enqueue order and
    /// broadcasts its id to all parked waiters, or broadcasts "empty" when
    /// none remains. Never fails; dead subscribers are logged and skipped.
    pub fn release(&self, state: &LockState) {
        let (next_holder, waiters) = {
            let mut inner = self.lock_inner();
            let Some(entry) =
                inner.queue.iter_mut().find(|e| e.id == state.id)
            else {
                // Non-exclusive scenarios were never queued.
                return;
            };
            entry.phase = Phase::Completed;
            tracing::debug!(scenario = %state.id, "exclusive lock released");

            let next_holder = if let Some(next) =
                inner.queue.iter_mut().find(|e| e.phase == Phase::Waiting)
            {
                next.phase = Phase::Running;
                let id = next.id.clone();
                tracing::debug!(scenario = %id, "exclusive lock granted");
                inner.current = Some(id.clone());
                Some(id)
            } else {
                inner.current = None;
                None
            };
            (next_holder, std::mem::take(&mut inner.waiters))
        };

        for waiter in waiters {
            if waiter.send(next_holder.clone()).is_err() {
                tracing::warn!(
                    "lock waiter went away before its notification",
                );
            }
        }
    }

    /// Identifier of the scenario currently holding the exclusive lock, if
    /// any.
    #[must_use]
    pub fn current_holder(&self) -> Option<String> {
        self.lock_inner().current.clone()
    }

    /// Indicates whether no scenario holds or awaits the exclusive lock.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let inner = self.lock_inner();
        inner.current.is_none()
            && inner.queue.iter().all(|e| e.phase == Phase::Completed)
    }

    /// A panicked scenario future cannot corrupt the queue beyond what its
    /// missing `release()` would, so a poisoned guard is just taken over.
    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
