//! The reveal sequence that plays after a fruit is picked.
//!
//! `none → apple → crack → envelope → envelopeOpen → letter`, then back to `none`
//! on close. The first two steps run on timers and stop at the envelope, which waits
//! for a click. Three seconds after the letter appears its audio starts, once per
//! opening.
//!
//! Timers live on a virtual clock advanced by [`RevealOrchestrator::update`]. Every
//! timer of an opening belongs to that opening's session and is cancelled with it;
//! a timer that still fires for an old session or the wrong stage is ignored.

use crate::letters::Letter;
use crate::store::Store;
use audio::{AudioBackend, AudioPlayback, PlaybackState};
use engine_core::{TimerGroup, TimerHandle, TimerQueue};
use procgen::{generate_crack, CrackPattern};
use rand::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const APPLE_TO_CRACK: Duration = Duration::from_millis(900);
pub const CRACK_TO_ENVELOPE: Duration = Duration::from_millis(900);
pub const ENVELOPE_OPEN_TO_LETTER: Duration = Duration::from_millis(1000);
pub const LETTER_TO_AUDIO: Duration = Duration::from_millis(3000);
/// Time the closing view has to fade before the selection is dropped.
pub const CLEAR_SELECTION_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stage {
    #[default]
    None,
    Apple,
    Crack,
    Envelope,
    EnvelopeOpen,
    Letter,
}

impl Stage {
    /// Stage a timer moves to from this one, if any.
    fn timed_successor(self) -> Option<(Stage, Duration)> {
        match self {
            Stage::Apple => Some((Stage::Crack, APPLE_TO_CRACK)),
            Stage::Crack => Some((Stage::Envelope, CRACK_TO_ENVELOPE)),
            Stage::EnvelopeOpen => Some((Stage::Letter, ENVELOPE_OPEN_TO_LETTER)),
            Stage::None | Stage::Envelope | Stage::Letter => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::None => "none",
            Stage::Apple => "apple",
            Stage::Crack => "crack",
            Stage::Envelope => "envelope",
            Stage::EnvelopeOpen => "envelopeOpen",
            Stage::Letter => "letter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealEvent {
    Advance { session: u64, from: Stage, to: Stage },
    PlayAudio { session: u64 },
    ClearSelection,
}

#[derive(Debug)]
struct RevealSession {
    id: u64,
    letter: Arc<Letter>,
    stage: Stage,
    crack: CrackPattern,
    audio_started: bool,
    timers: TimerGroup,
}

pub struct RevealOrchestrator {
    store: Store,
    timers: TimerQueue<RevealEvent>,
    session: Option<RevealSession>,
    sessions_started: u64,
    pending_clear: Option<TimerHandle>,
    backend: Box<dyn AudioBackend>,
    audio: AudioPlayback,
    audio_dir: PathBuf,
    rng: StdRng,
}

impl RevealOrchestrator {
    pub fn new(store: Store, backend: Box<dyn AudioBackend>, audio_dir: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            store,
            timers: TimerQueue::new(),
            session: None,
            sessions_started: 0,
            pending_clear: None,
            backend,
            audio: AudioPlayback::new(),
            audio_dir: audio_dir.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Begin revealing `letter`, abandoning any opening in progress.
    pub fn select(&mut self, letter: Arc<Letter>) {
        if let Some(handle) = self.pending_clear.take() {
            self.timers.cancel(handle);
        }
        self.end_session();

        self.store.set_selected_letter(Some(letter.clone()));
        let path = letter.audio_file.as_ref().map(|file| self.audio_dir.join(file));
        self.audio.rebind(self.backend.as_mut(), path.as_deref());

        self.sessions_started += 1;
        log::info!("Revealing letter `{}` (session {})", letter.id, self.sessions_started);
        self.session = Some(RevealSession {
            id: self.sessions_started,
            letter,
            stage: Stage::None,
            crack: generate_crack(&mut self.rng),
            audio_started: false,
            timers: TimerGroup::new(),
        });
        self.enter(Stage::Apple);
    }

    /// The envelope opens only when clicked while waiting in `envelope`.
    pub fn click_envelope(&mut self) {
        if self.stage() == Stage::Envelope {
            self.enter(Stage::EnvelopeOpen);
        }
    }

    /// Leave the reveal immediately; the selection clears shortly after.
    pub fn close(&mut self) {
        if self.end_session() {
            log::debug!("Reveal closed");
        }
        self.audio.pause();
        if self.store.selected_letter().is_some() && self.pending_clear.is_none() {
            self.pending_clear = Some(self.timers.schedule(CLEAR_SELECTION_DELAY, RevealEvent::ClearSelection));
        }
    }

    /// Cancel button, available until the letter is shown.
    pub fn cancel(&mut self) {
        if !matches!(self.stage(), Stage::None | Stage::Letter) {
            self.close();
        }
    }

    /// Clicking the backdrop closes only a fully shown letter.
    pub fn dismiss_backdrop(&mut self) {
        if self.stage() == Stage::Letter {
            self.close();
        }
    }

    /// Move the clock to `now`, firing every timer due on the way.
    pub fn update(&mut self, now: Duration) {
        while let Some(fired) = self.timers.pop_due(now) {
            self.handle(fired.handle, fired.event);
        }
        self.timers.set_now(now);
        self.audio.update();
    }

    pub fn advance(&mut self, delta: Duration) {
        let now = self.timers.now() + delta;
        self.update(now);
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn stage(&self) -> Stage {
        self.session.as_ref().map_or(Stage::None, |s| s.stage)
    }

    pub fn letter(&self) -> Option<&Arc<Letter>> {
        self.session.as_ref().map(|s| &s.letter)
    }

    pub fn crack(&self) -> Option<&CrackPattern> {
        self.session.as_ref().map(|s| &s.crack)
    }

    pub fn audio_started(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.audio_started)
    }

    /// Timers still waiting on the clock, across sessions and selection clearing.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn playback(&self) -> &AudioPlayback {
        &self.audio
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.audio.state()
    }

    pub fn toggle_audio(&mut self) {
        self.audio.toggle();
    }

    pub fn play_audio(&mut self) {
        self.audio.play();
    }

    pub fn pause_audio(&mut self) {
        self.audio.pause();
    }

    pub fn seek_audio(&mut self, seconds: f64) {
        self.audio.seek(seconds);
    }

    pub fn restart_audio(&mut self) {
        self.audio.restart();
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn enter(&mut self, stage: Stage) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        log::debug!("Session {}: {} -> {}", session.id, session.stage.name(), stage.name());
        session.stage = stage;

        let next = match (stage, stage.timed_successor()) {
            (_, Some((to, delay))) => Some((
                delay,
                RevealEvent::Advance {
                    session: session.id,
                    from: stage,
                    to,
                },
            )),
            (Stage::Letter, None) => Some((LETTER_TO_AUDIO, RevealEvent::PlayAudio { session: session.id })),
            _ => None,
        };
        if let Some((delay, event)) = next {
            let handle = self.timers.schedule(delay, event);
            session.timers.push(handle);
        }
    }

    fn handle(&mut self, handle: TimerHandle, event: RevealEvent) {
        if let Some(session) = self.session.as_mut() {
            session.timers.forget(handle);
        }
        match event {
            RevealEvent::Advance { session, from, to } => {
                if self.is_current(session, from) {
                    self.enter(to);
                } else {
                    log::debug!("Ignoring stale {} -> {} for session {}", from.name(), to.name(), session);
                }
            }
            RevealEvent::PlayAudio { session } => {
                if !self.is_current(session, Stage::Letter) {
                    log::debug!("Ignoring stale audio start for session {}", session);
                    return;
                }
                if let Some(s) = self.session.as_mut() {
                    if s.audio_started {
                        return;
                    }
                    s.audio_started = true;
                }
                self.audio.play();
            }
            RevealEvent::ClearSelection => {
                self.pending_clear = None;
                self.store.set_selected_letter(None);
                self.audio.release();
            }
        }
    }

    fn is_current(&self, session: u64, stage: Stage) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.id == session && s.stage == stage)
    }

    /// Drop the active session and cancel its timers. Returns whether one existed.
    fn end_session(&mut self) -> bool {
        match self.session.take() {
            Some(mut session) => {
                let cancelled = session.timers.dispose(&mut self.timers);
                log::debug!("Session {} ended, {} timers cancelled", session.id, cancelled);
                true
            }
            None => false,
        }
    }
}
