//! Browser timers and wall clock

use gloo::timers::callback::Timeout;
use std::time::Duration;
use storefront_session::{Clock, LocalTask, Scheduler, TimerHandle};
use wasm_bindgen_futures::spawn_local;

/// Largest delay `setTimeout` honours; anything longer fires immediately
const MAX_TIMEOUT_MS: u32 = i32::MAX as u32;

/// Schedules refresh work with `setTimeout`
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserScheduler;

struct BrowserTimer(Timeout);

impl TimerHandle for BrowserTimer {
    fn cancel(self: Box<Self>) {
        self.0.cancel();
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay: Duration, task: LocalTask) -> Box<dyn TimerHandle> {
        let millis = u32::try_from(delay.as_millis())
            .unwrap_or(MAX_TIMEOUT_MS)
            .min(MAX_TIMEOUT_MS);
        Box::new(BrowserTimer(Timeout::new(millis, move || spawn_local(task))))
    }
}

/// `Date.now()` in whole seconds
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now(&self) -> i64 {
        (js_sys::Date::now() / 1000.0) as i64
    }
}
