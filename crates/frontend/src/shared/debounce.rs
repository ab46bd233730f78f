//! Debounce для текстовых фильтров

use leptos::prelude::*;
use leptos::task::spawn_local;
use std::future::Future;

pub const DEFAULT_DEBOUNCE_MS: u32 = 500;

/// Generation-based debouncer.
///
/// Every event bumps the generation and gets a ticket due `delay_ms` later.
/// When a ticket's timer elapses it fires only if no newer event arrived,
/// so a burst of events produces a single action after the last one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Debouncer {
    delay_ms: u32,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebounceTicket {
    generation: u64,
    pub due_at_ms: f64,
}

impl Debouncer {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            generation: 0,
        }
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Registers an event at `now_ms`, cancelling whatever was pending
    pub fn schedule(&mut self, now_ms: f64) -> DebounceTicket {
        self.generation += 1;
        DebounceTicket {
            generation: self.generation,
            due_at_ms: now_ms + f64::from(self.delay_ms),
        }
    }

    /// Drops the pending ticket without scheduling a new one (e.g. on submit)
    pub fn cancel(&mut self) {
        self.generation += 1;
    }

    pub fn should_fire(&self, ticket: DebounceTicket) -> bool {
        ticket.generation == self.generation
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

/// Schedules `action` through the debouncer kept in `state`.
///
/// The timer runs on `gloo-timers`; when it elapses the ticket is checked
/// against the latest generation.
pub fn debounce(state: StoredValue<Debouncer>, action: impl FnOnce() + 'static) {
    let now = js_sys::Date::now();
    let mut ticket = None;
    state.update_value(|d| ticket = Some(d.schedule(now)));
    let Some(ticket) = ticket else { return };
    let delay = state.with_value(|d| d.delay_ms());

    let elapsed = gloo_timers::future::TimeoutFuture::new(delay);
    spawn_local(async move {
        fire_after(state, ticket, elapsed, action).await;
    });
}

/// Waits for `elapsed`, then runs `action` if `ticket` is still the latest.
/// Returns whether it ran.
pub async fn fire_after(
    state: StoredValue<Debouncer>,
    ticket: DebounceTicket,
    elapsed: impl Future<Output = ()>,
    action: impl FnOnce(),
) -> bool {
    elapsed.await;
    let latest = state
        .try_with_value(|d| d.should_fire(ticket))
        .unwrap_or(false);
    if latest {
        action();
    }
    latest
}
