//! Letter audio playback: a small state machine over a swappable audio backend.
//!
//! The adapter never panics and never returns errors to its caller. A source that
//! fails to open or play flips `has_error`, which hides the controls until a new
//! source is bound.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

/// One playable, seekable sound.
pub trait PlayableSource {
    /// Start or resume playback from the current position.
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    /// Jump to `seconds` from the start.
    fn seek(&mut self, seconds: f64);
    /// Current playback position in seconds.
    fn position(&self) -> f64;
    /// Total length, once known.
    fn duration(&self) -> Option<f64>;
    /// Playback reached the end on its own.
    fn is_finished(&self) -> bool;
}

/// Something that can open audio files into playable sources.
pub trait AudioBackend {
    fn open(&mut self, path: &Path) -> Result<Box<dyn PlayableSource>>;
}

/// Backend used when no output device is available. Every open fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentBackend;

impl AudioBackend for SilentBackend {
    fn open(&mut self, path: &Path) -> Result<Box<dyn PlayableSource>> {
        Err(anyhow!("no audio device available for {}", path.display()))
    }
}

/// Observable playback state for the control strip.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_time: f64,
    /// Zero until the source reports its length.
    pub duration: f64,
    pub has_error: bool,
}

/// Playback adapter bound to at most one source at a time.
#[derive(Default)]
pub struct AudioPlayback {
    source: Option<Box<dyn PlayableSource>>,
    path: Option<PathBuf>,
    state: PlaybackState,
}

impl std::fmt::Debug for AudioPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioPlayback")
            .field("path", &self.path)
            .field("bound", &self.source.is_some())
            .field("state", &self.state)
            .finish()
    }
}

impl AudioPlayback {
    /// Unbound adapter; every operation is a no-op until [`rebind`](Self::rebind).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(backend: &mut dyn AudioBackend, path: &Path) -> Self {
        let mut playback = Self::new();
        playback.rebind(backend, Some(path));
        playback
    }

    /// Tear down the current source, reset state and open `path` (if any).
    pub fn rebind(&mut self, backend: &mut dyn AudioBackend, path: Option<&Path>) {
        self.release();
        let Some(path) = path else {
            return;
        };
        self.path = Some(path.to_path_buf());
        match backend.open(path) {
            Ok(source) => {
                if let Some(duration) = source.duration() {
                    self.state.duration = duration;
                }
                log::debug!("Bound audio {} ({:.1}s)", path.display(), self.state.duration);
                self.source = Some(source);
            }
            Err(e) => {
                log::warn!("Audio unavailable for {}: {}", path.display(), e);
                self.state.has_error = true;
            }
        }
    }

    /// Stop and drop the source; state returns to its defaults.
    pub fn release(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.pause();
        }
        self.path = None;
        self.state = PlaybackState::default();
    }

    pub fn play(&mut self) {
        if self.state.has_error {
            return;
        }
        let Some(source) = self.source.as_mut() else {
            return;
        };
        match source.play() {
            Ok(()) => self.state.is_playing = true,
            Err(e) => {
                log::warn!("Audio playback failed: {}", e);
                self.state.has_error = true;
                self.state.is_playing = false;
            }
        }
    }

    pub fn pause(&mut self) {
        if let Some(source) = self.source.as_mut() {
            source.pause();
            self.state.is_playing = false;
        }
    }

    pub fn toggle(&mut self) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Seek and report the new position immediately, before the source catches up.
    pub fn seek(&mut self, seconds: f64) {
        let Some(source) = self.source.as_mut() else {
            return;
        };
        let mut target = seconds.max(0.0);
        if self.state.duration > 0.0 {
            target = target.min(self.state.duration);
        }
        source.seek(target);
        self.state.current_time = target;
    }

    pub fn restart(&mut self) {
        self.seek(0.0);
    }

    /// Per-frame refresh of position, duration and end-of-playback.
    pub fn update(&mut self) {
        let Some(source) = self.source.as_ref() else {
            return;
        };
        if self.state.duration <= 0.0 {
            if let Some(duration) = source.duration() {
                self.state.duration = duration;
            }
        }
        if self.state.is_playing {
            self.state.current_time = source.position();
            if source.is_finished() {
                log::debug!("Audio finished at {:.1}s", self.state.current_time);
                self.state.is_playing = false;
            }
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_bound(&self) -> bool {
        self.source.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The control strip is hidden after an error or while the length is unknown.
    pub fn controls_visible(&self) -> bool {
        !self.state.has_error && self.state.duration > 0.0
    }

    /// Fraction of the track played, in [0, 1].
    pub fn progress(&self) -> f64 {
        if self.state.duration > 0.0 {
            (self.state.current_time / self.state.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// `current / total` label for the control strip.
    pub fn clock_label(&self) -> String {
        format!(
            "{} / {}",
            format_clock(self.state.current_time),
            format_clock(self.state.duration)
        )
    }
}

/// Format seconds as `m:ss`; non-finite and negative values read as `0:00`.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}
