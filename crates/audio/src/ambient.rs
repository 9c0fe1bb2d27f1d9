//! Background pad: two soft sine partials looping under the scene.

use anyhow::Result;
use std::f32::consts::TAU;
use std::time::Duration;

/// A2 and E3, a perfect fifth.
pub const PAD_FREQUENCIES: [f32; 2] = [110.0, 165.0];
pub const PAD_SAMPLE_RATE: u32 = 44_100;
/// Gain of the pad when not muted.
pub const AMBIENT_VOLUME: f64 = 0.02;
pub const AMBIENT_RAMP: Duration = Duration::from_millis(500);

/// Render `seconds` of the pad at full scale. Both partials complete whole cycles in
/// one second, so a one-second render loops without a click.
pub fn render_pad(sample_rate: u32, seconds: f32) -> Vec<f32> {
    let count = (sample_rate as f32 * seconds).round() as usize;
    let norm = 1.0 / PAD_FREQUENCIES.len() as f32;
    (0..count)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            PAD_FREQUENCIES.iter().map(|f| (TAU * f * t).sin()).sum::<f32>() * norm
        })
        .collect()
}

/// Where the pad is played.
pub trait AmbientOutput {
    /// Begin looping at zero gain. Calling again while playing does nothing.
    fn start(&mut self) -> Result<()>;
    /// Linear gain ramp.
    fn ramp_to(&mut self, volume: f64, over: Duration);
    fn stop(&mut self);
}

/// Starts the pad once the intro has finished and the visitor has chosen a letter,
/// then follows the mute flag.
pub struct AmbientSound {
    output: Option<Box<dyn AmbientOutput>>,
    intro_complete: bool,
    has_gesture: bool,
    muted: bool,
    playing: bool,
}

impl AmbientSound {
    pub fn new(output: Box<dyn AmbientOutput>) -> Self {
        Self {
            output: Some(output),
            intro_complete: false,
            has_gesture: false,
            muted: false,
            playing: false,
        }
    }

    /// No output device; all calls only track state.
    pub fn disabled() -> Self {
        Self {
            output: None,
            intro_complete: false,
            has_gesture: false,
            muted: false,
            playing: false,
        }
    }

    pub fn set_intro_complete(&mut self, complete: bool) {
        self.intro_complete = complete;
        self.try_start();
    }

    /// A letter was selected; this counts as the user gesture that unlocks audio.
    pub fn notify_selection(&mut self) {
        self.has_gesture = true;
        self.try_start();
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.muted == muted {
            return;
        }
        self.muted = muted;
        let target = self.target_volume();
        if let (true, Some(output)) = (self.playing, self.output.as_mut()) {
            output.ramp_to(target, AMBIENT_RAMP);
        }
    }

    pub fn target_volume(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            AMBIENT_VOLUME
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn stop(&mut self) {
        if let Some(output) = self.output.as_mut() {
            output.stop();
        }
        self.playing = false;
    }

    fn try_start(&mut self) {
        if self.playing || !self.intro_complete || !self.has_gesture {
            return;
        }
        let target = self.target_volume();
        let Some(output) = self.output.as_mut() else {
            return;
        };
        match output.start() {
            Ok(()) => {
                output.ramp_to(target, AMBIENT_RAMP);
                self.playing = true;
                log::debug!("Ambient pad started at gain {}", target);
            }
            Err(e) => {
                log::warn!("Ambient pad unavailable: {}", e);
                // Do not retry every selection.
                self.output = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        starts: u32,
        ramps: Vec<f64>,
        stops: u32,
    }

    struct FakeOutput(Rc<RefCell<Log>>);

    impl AmbientOutput for FakeOutput {
        fn start(&mut self) -> Result<()> {
            self.0.borrow_mut().starts += 1;
            Ok(())
        }
        fn ramp_to(&mut self, volume: f64, over: Duration) {
            assert_eq!(over, AMBIENT_RAMP);
            self.0.borrow_mut().ramps.push(volume);
        }
        fn stop(&mut self) {
            self.0.borrow_mut().stops += 1;
        }
    }

    fn ambient() -> (AmbientSound, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        (AmbientSound::new(Box::new(FakeOutput(log.clone()))), log)
    }

    #[test]
    fn waits_for_intro_and_gesture() {
        let (mut pad, log) = ambient();
        pad.notify_selection();
        assert!(!pad.is_playing());
        pad.set_intro_complete(true);
        assert!(pad.is_playing());
        pad.notify_selection();
        assert_eq!(log.borrow().starts, 1);
        assert_eq!(log.borrow().ramps, vec![AMBIENT_VOLUME]);
        pad.stop();
        assert!(!pad.is_playing());
        assert_eq!(log.borrow().stops, 1);
    }

    #[test]
    fn mute_ramps_to_silence_and_back() {
        let (mut pad, log) = ambient();
        pad.set_muted(true);
        pad.set_intro_complete(true);
        pad.notify_selection();
        pad.set_muted(false);
        pad.set_muted(false);
        assert_eq!(log.borrow().ramps, vec![0.0, AMBIENT_VOLUME]);
    }

    #[test]
    fn disabled_pad_never_plays() {
        let mut pad = AmbientSound::disabled();
        pad.set_intro_complete(true);
        pad.notify_selection();
        assert!(!pad.is_playing());
    }

    #[test]
    fn pad_loops_seamlessly() {
        let samples = render_pad(8000, 1.0);
        assert_eq!(samples.len(), 8000);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
        // The sample after the last one would be sample zero again.
        let next = PAD_FREQUENCIES.iter().map(|f| (TAU * f * 1.0).sin()).sum::<f32>() / 2.0;
        assert!((next - samples[0]).abs() < 1e-3);
    }
}
