//! Deferred refresh scheduling
//!
//! The manager never calls `setTimeout`-style APIs directly. It asks a
//! [`Scheduler`] for a cancellable [`TimerHandle`] and keeps at most one of
//! them alive in a [`RefreshTimer`] slot.

use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Work run on the local event loop when a timer fires
pub type LocalTask = LocalBoxFuture<'static, ()>;

/// Handle to a pending timer.
///
/// Dropping a handle releases it without any guarantee about the timer;
/// only [`TimerHandle::cancel`] is sure to stop it.
pub trait TimerHandle {
    fn cancel(self: Box<Self>);
}

/// Runs a task once after a delay
pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: LocalTask) -> Box<dyn TimerHandle>;
}

/// Single-occupancy timer slot.
///
/// Every arm or cancel bumps the generation, so a task that fired for a
/// superseded timer can detect that it is stale and do nothing.
#[derive(Default)]
pub struct RefreshTimer {
    handle: Option<Box<dyn TimerHandle>>,
    generation: u64,
    due_at: Option<i64>,
}

impl std::fmt::Debug for RefreshTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTimer")
            .field("armed", &self.handle.is_some())
            .field("generation", &self.generation)
            .field("due_at", &self.due_at)
            .finish()
    }
}

impl RefreshTimer {
    /// Cancel any pending timer, then schedule a new one.
    ///
    /// `task` receives the generation it must present to [`Self::claim`].
    pub fn arm(
        &mut self,
        scheduler: &dyn Scheduler,
        delay: Duration,
        due_at: i64,
        task: impl FnOnce(u64) -> LocalTask,
    ) -> u64 {
        self.cancel();
        let generation = self.generation;
        self.handle = Some(scheduler.schedule(delay, task(generation)));
        self.due_at = Some(due_at);
        generation
    }

    /// Cancel the pending timer, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
        self.generation += 1;
        self.due_at = None;
    }

    /// Called by a firing task: returns `true` and releases the slot only if
    /// `generation` is still current.
    pub fn claim(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.handle.is_none() {
            return false;
        }
        // Detach without cancelling: the claiming task is the timer's own work
        drop(self.handle.take());
        self.due_at = None;
        true
    }

    pub const fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    /// Epoch second at which the pending refresh is due
    pub const fn due_at(&self) -> Option<i64> {
        self.due_at
    }
}

/// Tokio-backed scheduler for native hosts.
///
/// Tasks are spawned with [`tokio::task::spawn_local`], so the manager must
/// run inside a [`tokio::task::LocalSet`].
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[cfg(not(target_arch = "wasm32"))]
impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: LocalTask) -> Box<dyn TimerHandle> {
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        Box::new(TokioTimer(handle))
    }
}

#[cfg(not(target_arch = "wasm32"))]
struct TokioTimer(tokio::task::JoinHandle<()>);

#[cfg(not(target_arch = "wasm32"))]
impl TimerHandle for TokioTimer {
    fn cancel(self: Box<Self>) {
        self.0.abort();
    }
}

/// Scheduler whose timers only fire when told to.
///
/// Lets callers observe exactly which delays were requested and drive the
/// refresh path deterministically.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<ManualState>>,
}

#[derive(Default)]
struct ManualState {
    next_id: u64,
    pending: Vec<ManualEntry>,
    cancelled: usize,
}

struct ManualEntry {
    id: u64,
    delay: Duration,
    task: LocalTask,
}

struct ManualTimer {
    id: u64,
    state: Rc<RefCell<ManualState>>,
}

impl TimerHandle for ManualTimer {
    fn cancel(self: Box<Self>) {
        let mut state = self.state.borrow_mut();
        let before = state.pending.len();
        state.pending.retain(|entry| entry.id != self.id);
        if state.pending.len() < before {
            state.cancelled += 1;
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: LocalTask) -> Box<dyn TimerHandle> {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        state.pending.push(ManualEntry { id, delay, task });
        Box::new(ManualTimer {
            id,
            state: Rc::clone(&self.state),
        })
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers scheduled and not yet fired or cancelled
    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Number of timers cancelled before firing
    pub fn cancelled(&self) -> usize {
        self.state.borrow().cancelled
    }

    /// Delays of the pending timers, in scheduling order
    pub fn delays(&self) -> Vec<Duration> {
        self.state
            .borrow()
            .pending
            .iter()
            .map(|entry| entry.delay)
            .collect()
    }

    /// Remove the pending timer with the shortest delay and hand back its task
    pub fn fire_next(&self) -> Option<LocalTask> {
        let mut state = self.state.borrow_mut();
        let index = state
            .pending
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| entry.delay)
            .map(|(index, _)| index)?;
        Some(state.pending.remove(index).task)
    }

    /// Fire the next timer and run its task to completion
    pub async fn run_next(&self) -> bool {
        match self.fire_next() {
            Some(task) => {
                task.await;
                true
            }
            None => false,
        }
    }
}
