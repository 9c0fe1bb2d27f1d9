//! Cancellable one-shot timers on a virtual clock.
//!
//! The host advances the clock once per frame; everything scheduled against the
//! queue fires in deadline order, ties broken by scheduling order. Nothing here
//! blocks or spawns threads.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle returned by [`TimerQueue::schedule`]; used to cancel the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// A timer that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub handle: TimerHandle,
    /// The deadline the timer was scheduled for.
    pub at: Duration,
    pub event: E,
}

/// Priority queue of pending timers carrying an event payload.
#[derive(Debug)]
pub struct TimerQueue<E> {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, u64), E>,
    deadlines: HashMap<u64, Duration>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Current clock value.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `event` to fire `delay` after the current clock value.
    pub fn schedule(&mut self, delay: Duration, event: E) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        let deadline = self.now + delay;
        self.pending.insert((deadline, id), event);
        self.deadlines.insert(id, deadline);
        TimerHandle(id)
    }

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.deadlines.remove(&handle.0) {
            Some(deadline) => self.pending.remove(&(deadline, handle.0)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    /// Number of timers still waiting.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest timer whose deadline is at or before `until`.
    ///
    /// The clock moves to that timer's deadline, so anything the caller
    /// schedules while handling it is relative to the moment it fired.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<E>> {
        let key = *self.pending.keys().next()?;
        if key.0 > until {
            return None;
        }
        let event = self.pending.remove(&key)?;
        self.deadlines.remove(&key.1);
        self.now = self.now.max(key.0);
        Some(Fired {
            handle: TimerHandle(key.1),
            at: key.0,
            event,
        })
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Fire everything due up to `until` and return the events in order.
    ///
    /// Callers that need to schedule follow-up timers while handling an event
    /// should loop over [`pop_due`](Self::pop_due) instead.
    pub fn drain_until(&mut self, until: Duration) -> Vec<Fired<E>> {
        let mut fired = Vec::new();
        while let Some(timer) = self.pop_due(until) {
            fired.push(timer);
        }
        self.set_now(until);
        fired
    }
}

/// A set of timer handles owned together and disposed together.
#[derive(Debug, Default, Clone)]
pub struct TimerGroup {
    handles: Vec<TimerHandle>,
}

impl TimerGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: TimerHandle) {
        self.handles.push(handle);
    }

    /// Forget a handle that has fired.
    pub fn forget(&mut self, handle: TimerHandle) {
        self.handles.retain(|h| *h != handle);
    }

    /// Cancel every handle in the group against `queue`. Returns how many were still pending.
    pub fn dispose<E>(&mut self, queue: &mut TimerQueue<E>) -> usize {
        self.handles
            .drain(..)
            .filter(|handle| queue.cancel(*handle))
            .count()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(ms(300), "late");
        queue.schedule(ms(100), "early");
        queue.schedule(ms(100), "early-second");
        let fired: Vec<_> = queue.drain_until(ms(1000)).into_iter().map(|f| f.event).collect();
        assert_eq!(fired, vec!["early", "early-second", "late"]);
        assert_eq!(queue.now(), ms(1000));
    }

    #[test]
    fn not_due_stays_pending() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(ms(500), ());
        assert!(queue.drain_until(ms(499)).is_empty());
        assert!(queue.is_pending(handle));
        assert_eq!(queue.drain_until(ms(500)).len(), 1);
        assert!(!queue.is_pending(handle));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(ms(10), 1);
        queue.schedule(ms(20), 2);
        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        let fired: Vec<_> = queue.drain_until(ms(100)).into_iter().map(|f| f.event).collect();
        assert_eq!(fired, vec![2]);
    }

    #[test]
    fn pop_due_moves_clock_to_deadline() {
        let mut queue = TimerQueue::new();
        queue.schedule(ms(900), "a");
        let fired = queue.pop_due(ms(5000)).expect("timer due");
        assert_eq!(fired.at, ms(900));
        assert_eq!(queue.now(), ms(900));
        queue.schedule(ms(900), "b");
        assert_eq!(queue.next_deadline(), Some(ms(1800)));
    }

    #[test]
    fn group_dispose_cancels_everything() {
        let mut queue = TimerQueue::new();
        let mut group = TimerGroup::new();
        group.push(queue.schedule(ms(10), ()));
        group.push(queue.schedule(ms(20), ()));
        let other = queue.schedule(ms(30), ());
        assert_eq!(group.dispose(&mut queue), 2);
        assert!(group.is_empty());
        assert_eq!(queue.len(), 1);
        assert!(queue.is_pending(other));
    }
}
