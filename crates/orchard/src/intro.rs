//! Opening growth of the tree.
//!
//! Shortly after the scene is ready the tree grows from nothing to full size; when it
//! finishes the intro is complete and fruit become clickable. If growth never starts
//! (the scene was not ready in time) the intro is forced complete after a fallback delay.

use crate::animation::{tree_growth, GROWTH_DURATION};
use crate::store::Store;
use engine_core::{TimerQueue, Transform};
use std::time::Duration;

pub const GROWTH_START_DELAY: Duration = Duration::from_millis(100);
pub const INTRO_FALLBACK: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntroEvent {
    StartGrowth,
    Fallback,
}

#[derive(Debug)]
pub struct IntroSequence {
    timers: TimerQueue<IntroEvent>,
    growth_started: Option<Duration>,
    complete: bool,
}

impl Default for IntroSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl IntroSequence {
    pub fn new() -> Self {
        let mut timers = TimerQueue::new();
        timers.schedule(GROWTH_START_DELAY, IntroEvent::StartGrowth);
        timers.schedule(INTRO_FALLBACK, IntroEvent::Fallback);
        Self {
            timers,
            growth_started: None,
            complete: false,
        }
    }

    /// Advance to `now` (time since the intro was created).
    pub fn update(&mut self, now: Duration, scene_ready: bool, store: &Store) {
        while let Some(fired) = self.timers.pop_due(now) {
            match fired.event {
                IntroEvent::StartGrowth if scene_ready => {
                    log::info!("Starting tree growth");
                    self.growth_started = Some(fired.at);
                }
                IntroEvent::StartGrowth => log::warn!("Scene not ready, tree growth skipped"),
                IntroEvent::Fallback if self.growth_started.is_none() => {
                    log::warn!("Tree growth never started, forcing intro complete");
                    self.finish(store);
                }
                IntroEvent::Fallback => {}
            }
        }
        self.timers.set_now(now);

        if let Some(start) = self.growth_started {
            if !self.complete && now.saturating_sub(start).as_secs_f32() >= GROWTH_DURATION {
                log::info!("Tree growth complete");
                self.finish(store);
            }
        }
    }

    /// Tree pose while growing; `None` before growth starts and after the intro.
    pub fn tree_transform(&self) -> Option<Transform> {
        match (self.growth_started, self.complete) {
            (Some(start), false) => Some(tree_growth(self.timers.now().saturating_sub(start).as_secs_f32())),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn growth_started(&self) -> bool {
        self.growth_started.is_some()
    }

    fn finish(&mut self, store: &Store) {
        self.complete = true;
        store.set_intro_complete(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn grows_then_completes() {
        let store = Store::new();
        let mut intro = IntroSequence::new();
        intro.update(ms(50), true, &store);
        assert!(!intro.growth_started());
        intro.update(ms(100), true, &store);
        assert!(intro.growth_started());
        assert_eq!(intro.tree_transform().map(|t| t.scale.x), Some(0.0));

        intro.update(ms(1600), true, &store);
        let scale = intro.tree_transform().map(|t| t.scale.x).unwrap();
        assert!(scale > 0.5 && scale < 1.0);
        assert!(!store.intro_complete());

        intro.update(ms(3100), true, &store);
        assert!(intro.is_complete());
        assert!(store.intro_complete());
        assert!(intro.tree_transform().is_none());
    }

    #[test]
    fn fallback_completes_when_growth_never_starts() {
        let store = Store::new();
        let mut intro = IntroSequence::new();
        intro.update(ms(200), false, &store);
        assert!(!intro.growth_started());
        intro.update(ms(4999), false, &store);
        assert!(!store.intro_complete());
        intro.update(ms(5000), false, &store);
        assert!(store.intro_complete());
    }

    #[test]
    fn fallback_does_not_cut_growth_short() {
        let store = Store::new();
        let mut intro = IntroSequence::new();
        intro.update(ms(100), true, &store);
        intro.update(ms(2000), true, &store);
        assert!(!store.intro_complete());
        intro.update(ms(5000), true, &store);
        assert!(store.intro_complete());
    }
}
