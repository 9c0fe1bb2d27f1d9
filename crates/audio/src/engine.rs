//! Kira-backed audio output.

use crate::ambient::{render_pad, AmbientOutput, PAD_SAMPLE_RATE};
use crate::playback::{AudioBackend, PlayableSource};
use crate::wav::encode_wav;
use anyhow::Result;
use kira::{
    manager::{backend::DefaultBackend, AudioManager, AudioManagerSettings},
    sound::{
        static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings},
        PlaybackState,
    },
    tween::Tween,
};
use std::cell::RefCell;
use std::io::Cursor;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

type SharedManager = Rc<RefCell<AudioManager<DefaultBackend>>>;

/// Owns the output device. Sources opened from it share the same manager.
pub struct AudioEngine {
    manager: SharedManager,
}

impl AudioEngine {
    pub fn new() -> Result<Self> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())?;
        log::info!("Audio output initialised");
        Ok(Self {
            manager: Rc::new(RefCell::new(manager)),
        })
    }

    /// Looping synthesized pad routed through this engine.
    pub fn ambient_output(&self) -> Result<Box<dyn AmbientOutput>> {
        let wav = encode_wav(&render_pad(PAD_SAMPLE_RATE, 1.0), PAD_SAMPLE_RATE);
        let data = StaticSoundData::from_cursor(Cursor::new(wav))?;
        Ok(Box::new(KiraAmbient {
            manager: self.manager.clone(),
            data,
            handle: None,
        }))
    }
}

impl AudioBackend for AudioEngine {
    fn open(&mut self, path: &Path) -> Result<Box<dyn PlayableSource>> {
        let data = StaticSoundData::from_file(path)?;
        Ok(Box::new(KiraTrack {
            manager: self.manager.clone(),
            data,
            handle: None,
            resume_at: 0.0,
        }))
    }
}

/// A decoded file. The sound is only handed to the mixer on first play.
struct KiraTrack {
    manager: SharedManager,
    data: StaticSoundData,
    handle: Option<StaticSoundHandle>,
    /// Where the next fresh start begins; tracks pauses and seeks made without a live sound.
    resume_at: f64,
}

impl KiraTrack {
    fn live_handle(&mut self) -> Option<&mut StaticSoundHandle> {
        self.handle.as_mut().filter(|h| h.state() != PlaybackState::Stopped)
    }
}

impl PlayableSource for KiraTrack {
    fn play(&mut self) -> Result<()> {
        if let Some(handle) = self.live_handle() {
            let _ = handle.resume(Tween::default());
            return Ok(());
        }
        let settings = StaticSoundSettings::new().start_position(self.resume_at);
        let handle = self.manager.borrow_mut().play(self.data.clone().with_settings(settings))?;
        self.handle = Some(handle);
        self.resume_at = 0.0;
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(handle) = self.live_handle() {
            let _ = handle.pause(Tween::default());
            let position = handle.position();
            self.resume_at = position;
        }
    }

    fn seek(&mut self, seconds: f64) {
        self.resume_at = seconds;
        if let Some(handle) = self.live_handle() {
            let _ = handle.seek_to(seconds);
        }
    }

    fn position(&self) -> f64 {
        match &self.handle {
            Some(handle) if handle.state() != PlaybackState::Stopped => handle.position(),
            Some(_) => self.duration().unwrap_or(0.0),
            None => self.resume_at,
        }
    }

    fn duration(&self) -> Option<f64> {
        Some(self.data.duration().as_secs_f64())
    }

    fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(false, |h| h.state() == PlaybackState::Stopped)
    }
}

impl Drop for KiraTrack {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            let _ = handle.stop(Tween::default());
        }
    }
}

/// The ambient pad playing on a loop through kira.
struct KiraAmbient {
    manager: SharedManager,
    data: StaticSoundData,
    handle: Option<StaticSoundHandle>,
}

impl AmbientOutput for KiraAmbient {
    fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        let settings = StaticSoundSettings::new().volume(0.0).loop_region(..);
        let handle = self.manager.borrow_mut().play(self.data.clone().with_settings(settings))?;
        self.handle = Some(handle);
        Ok(())
    }

    fn ramp_to(&mut self, volume: f64, over: Duration) {
        if let Some(handle) = self.handle.as_mut() {
            let _ = handle.set_volume(
                volume,
                Tween {
                    duration: over,
                    ..Default::default()
                },
            );
        }
    }

    fn stop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            let _ = handle.stop(Tween::default());
        }
    }
}
