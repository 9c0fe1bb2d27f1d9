//! Headless host: wires the scene, fruit, reveal and sound together and drives them
//! from text commands.

use crate::config::AppConfig;
use crate::fruit::{FruitController, FruitNode};
use crate::letters::{Letter, LetterSet};
use crate::reveal::{RevealOrchestrator, Stage};
use crate::scene::TreeScene;
use crate::store::{StateChange, Store, SubscriptionId};
use crate::unlock::ripens_on;
use audio::{AmbientSound, AudioBackend, AudioEngine, SilentBackend};
use chrono::NaiveDateTime;
use engine_core::Time;
use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// One line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Hover(String),
    Leave(String),
    Click(String),
    /// Open the envelope.
    Open,
    Cancel,
    Close,
    Backdrop,
    Mute,
    Play,
    Pause,
    Seek(f64),
    Restart,
    Wait(Duration),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
    #[error("`{0}` needs {1}")]
    MissingArgument(&'static str, &'static str),
    #[error("`{0}` is not a number")]
    BadNumber(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Unknown(String::new()));
        };
        let arg = words.next();
        let id = |name| arg.map(str::to_string).ok_or(CommandError::MissingArgument(name, "a fruit id"));
        let number = |name| {
            let raw = arg.ok_or(CommandError::MissingArgument(name, "a number"))?;
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| CommandError::BadNumber(raw.to_string()))
        };

        Ok(match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => Command::List,
            "hover" => Command::Hover(id("hover")?),
            "leave" => Command::Leave(id("leave")?),
            "click" | "pick" => Command::Click(id("click")?),
            "open" => Command::Open,
            "cancel" => Command::Cancel,
            "close" => Command::Close,
            "backdrop" => Command::Backdrop,
            "mute" => Command::Mute,
            "play" => Command::Play,
            "pause" => Command::Pause,
            "seek" => Command::Seek(number("seek")?),
            "restart" => Command::Restart,
            "wait" => {
                let ms = number("wait")?;
                let duration = Duration::try_from_secs_f64(ms / 1000.0)
                    .map_err(|_| CommandError::BadNumber(ms.to_string()))?;
                Command::Wait(duration)
            }
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        })
    }
}

pub const HELP: &str = "\
commands:
  list                 letters on the tree
  hover ID / leave ID  move the pointer onto / off a fruit
  click ID             pick a ripe fruit
  open                 open the envelope
  cancel               leave before the letter is shown
  close                close the reveal
  backdrop             click outside the letter
  mute                 toggle sound
  play / pause         letter audio
  seek SECS / restart  move within the letter audio
  wait MS              let time pass
  status               current state
  quit";

/// Where letter audio and the ambient pad go.
pub struct AudioOutputs {
    pub backend: Box<dyn AudioBackend>,
    pub ambient: AmbientSound,
}

impl AudioOutputs {
    pub fn silent() -> Self {
        Self {
            backend: Box::new(SilentBackend),
            ambient: AmbientSound::disabled(),
        }
    }

    /// Open the default output device, or fall back to silence.
    pub fn open() -> Self {
        let engine = match AudioEngine::new() {
            Ok(engine) => engine,
            Err(e) => {
                log::warn!("No audio output: {}", e);
                return Self::silent();
            }
        };
        let ambient = match engine.ambient_output() {
            Ok(output) => AmbientSound::new(output),
            Err(e) => {
                log::warn!("Ambient pad unavailable: {}", e);
                AmbientSound::disabled()
            }
        };
        Self {
            backend: Box::new(engine),
            ambient,
        }
    }
}

pub struct App {
    config: AppConfig,
    store: Store,
    letters: LetterSet,
    scene: TreeScene,
    fruit: FruitController,
    reveal: RevealOrchestrator,
    ambient: Rc<RefCell<AmbientSound>>,
    time: Time,
    stage: Stage,
    subscription: SubscriptionId,
}

impl App {
    pub fn new(config: AppConfig, letters: LetterSet, outputs: AudioOutputs, now: NaiveDateTime) -> Self {
        let store = Store::new();
        let ambient = Rc::new(RefCell::new(outputs.ambient));
        let pad = ambient.clone();
        let subscription = store.subscribe(move |change| {
            let mut pad = pad.borrow_mut();
            match change {
                StateChange::IntroComplete(done) => pad.set_intro_complete(*done),
                StateChange::SelectedLetter(Some(_)) => pad.notify_selection(),
                StateChange::Muted(muted) => pad.set_muted(*muted),
                StateChange::SelectedLetter(None) | StateChange::HoveredFruit(_) => {}
            }
        });
        store.set_muted(config.muted);

        let mut scene = TreeScene::new(store.clone(), &config);
        scene.build(&letters, now);

        Self {
            fruit: FruitController::new(store.clone(), config.seed.wrapping_add(2)),
            reveal: RevealOrchestrator::new(store.clone(), outputs.backend, &config.audio_dir, config.seed.wrapping_add(3)),
            config,
            store,
            letters,
            scene,
            ambient,
            time: Time::new(),
            stage: Stage::None,
            subscription,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn scene(&self) -> &TreeScene {
        &self.scene
    }

    pub fn reveal(&self) -> &RevealOrchestrator {
        &self.reveal
    }

    pub fn ambient_playing(&self) -> bool {
        self.ambient.borrow().is_playing()
    }

    /// Run one command and return what it printed. `Quit` is left to the caller.
    pub fn execute(&mut self, command: Command) -> Vec<String> {
        let mut out = Vec::new();
        match command {
            Command::List => {
                for letter in self.letters.iter() {
                    out.push(self.describe(letter));
                }
            }
            Command::Hover(id) => {
                self.fruit.on_hover(self.scene.world_mut(), &id);
                match self.fruit.tooltip(self.scene.world(), &id) {
                    Some(tip) => out.push(format!("[{}]", tip)),
                    None => out.push(format!("nothing to show for `{}`", id)),
                }
            }
            Command::Leave(id) => self.fruit.on_hover_end(self.scene.world_mut(), &id),
            Command::Click(id) => {
                let time = self.scene.time();
                if !self.fruit.on_click(self.scene.world_mut(), &id, time, &mut self.reveal) {
                    out.push(format!("`{}` cannot be picked right now", id));
                }
                self.report_stage(&mut out);
            }
            Command::Open => {
                self.reveal.click_envelope();
                self.report_stage(&mut out);
            }
            Command::Cancel => {
                self.reveal.cancel();
                self.report_stage(&mut out);
            }
            Command::Close => {
                self.reveal.close();
                self.report_stage(&mut out);
            }
            Command::Backdrop => {
                self.reveal.dismiss_backdrop();
                self.report_stage(&mut out);
            }
            Command::Mute => {
                self.store.toggle_muted();
                out.push(if self.store.is_muted() { "muted" } else { "unmuted" }.to_string());
            }
            Command::Play => self.reveal.play_audio(),
            Command::Pause => self.reveal.pause_audio(),
            Command::Seek(seconds) => self.reveal.seek_audio(seconds),
            Command::Restart => self.reveal.restart_audio(),
            Command::Wait(duration) => self.wait(duration, &mut out),
            Command::Status => out.extend(self.status()),
            Command::Help => out.push(HELP.to_string()),
            Command::Quit => {}
        }
        out
    }

    /// Step the frame loop through `duration`.
    ///
    /// Frames never exceed the clock's max delta, so the full duration always elapses.
    pub fn wait(&mut self, duration: Duration, out: &mut Vec<String>) {
        let frame = self.config.frame_duration().min(self.time.max_delta());
        let mut left = duration;
        while !left.is_zero() {
            let step = frame.min(left);
            left -= step;
            if self.config.realtime {
                std::thread::sleep(step);
            }
            self.tick(step, out);
        }
    }

    /// Re-check ripeness against the wall clock.
    pub fn refresh_ripeness(&mut self, now: NaiveDateTime) -> Vec<String> {
        self.scene
            .refresh_ripeness(now)
            .into_iter()
            .map(|id| format!("`{}` has ripened", id))
            .collect()
    }

    fn tick(&mut self, step: Duration, out: &mut Vec<String>) {
        let was_complete = self.store.intro_complete();
        let frame = self.time.advance(step);
        self.scene.update(&frame);
        self.reveal.update(frame.elapsed);
        if !was_complete && self.store.intro_complete() {
            out.push("the tree has grown; fruit can be picked".to_string());
        }
        self.report_stage(out);
    }

    fn report_stage(&mut self, out: &mut Vec<String>) {
        let stage = self.reveal.stage();
        if stage == self.stage {
            return;
        }
        self.stage = stage;
        out.push(format!("stage: {}", stage.name()));
        if stage == Stage::Letter {
            if let Some(letter) = self.reveal.letter().cloned() {
                out.extend(render_letter(&letter));
            }
        }
    }

    fn describe(&self, letter: &Letter) -> String {
        let ripe = self
            .scene
            .world()
            .query::<&FruitNode>()
            .iter()
            .find(|(_, n)| n.letter.id == letter.id)
            .map_or(false, |(_, n)| n.unlocked);
        let state = if ripe { "ripe".to_string() } else { ripens_on(letter) };
        format!("{:<16} {:<10} {:<32} {}", letter.id, letter.branch.name(), letter.title, state)
    }

    fn status(&self) -> Vec<String> {
        let playback = self.reveal.playback();
        let state = playback.state();
        let shared = self.store.snapshot();
        let mut lines = vec![
            format!("time {:.2}s, intro {}", self.scene.time(), if shared.intro_complete { "complete" } else { "running" }),
            format!("stage {}", self.reveal.stage().name()),
            format!(
                "selected {}",
                shared.selected_letter.map_or("-".to_string(), |l| l.id.clone())
            ),
            format!(
                "hovered {}, cursor {:?}",
                shared.hovered_fruit_id.unwrap_or_else(|| "-".to_string()),
                self.fruit.cursor()
            ),
            format!(
                "sound {}, pad {}",
                if shared.is_muted { "muted" } else { "on" },
                if self.ambient_playing() { "playing" } else { "idle" }
            ),
        ];
        if playback.controls_visible() {
            lines.push(format!(
                "audio {} {} ({:.0}%)",
                if state.is_playing { "playing" } else { "paused" },
                playback.clock_label(),
                playback.progress() * 100.0
            ));
        } else if state.has_error {
            lines.push("audio unavailable".to_string());
        }
        lines
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
        self.ambient.borrow_mut().stop();
    }
}

/// The letter as shown once the envelope has opened.
pub fn render_letter(letter: &Letter) -> Vec<String> {
    let mut lines = vec![String::new(), format!("  {}", letter.title)];
    if !letter.date.is_empty() {
        lines.push(format!("  {}", letter.date));
    }
    for paragraph in letter.paragraphs() {
        lines.push(String::new());
        lines.extend(paragraph.lines().map(|l| format!("  {}", l)));
    }
    lines.push(String::new());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::letters::tests::letter;
    use chrono::NaiveDate;

    fn app() -> App {
        let config = AppConfig {
            leaf_density: 0.05,
            realtime: false,
            ..Default::default()
        };
        let letters = LetterSet::new(vec![letter("a", true, "2024-01-01"), letter("z", true, "2099-01-01")]).unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 5, 5)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap();
        App::new(config, letters, AudioOutputs::silent(), now)
    }

    fn run(app: &mut App, line: &str) -> Vec<String> {
        app.execute(line.parse().unwrap())
    }

    #[test]
    fn parses_commands() {
        assert_eq!("click a".parse(), Ok(Command::Click("a".into())));
        assert_eq!("wait 250".parse(), Ok(Command::Wait(Duration::from_millis(250))));
        assert_eq!("seek 1.5".parse(), Ok(Command::Seek(1.5)));
        assert_eq!("QUIT".parse(), Ok(Command::Quit));
        assert_eq!("click".parse::<Command>(), Err(CommandError::MissingArgument("click", "a fruit id")));
        assert_eq!("seek x".parse::<Command>(), Err(CommandError::BadNumber("x".into())));
        assert_eq!("dance".parse::<Command>(), Err(CommandError::Unknown("dance".into())));
    }

    #[test]
    fn full_reveal_from_commands() {
        let mut app = app();
        let early = run(&mut app, "click a");
        assert!(early[0].contains("cannot be picked"));

        let grown = run(&mut app, "wait 3200");
        assert!(grown.iter().any(|l| l.contains("tree has grown")));

        let picked = run(&mut app, "click a");
        assert_eq!(picked, vec!["stage: apple".to_string()]);
        let waited = run(&mut app, "wait 2000");
        assert_eq!(waited, vec!["stage: crack".to_string(), "stage: envelope".to_string()]);

        run(&mut app, "open");
        let shown = run(&mut app, "wait 1000");
        assert_eq!(shown[0], "stage: letter");
        assert!(shown.iter().any(|l| l.contains("Letter a")));
        assert!(shown.iter().any(|l| l.contains("still second.")));

        run(&mut app, "backdrop");
        run(&mut app, "wait 400");
        assert!(app.store().selected_letter().is_none());
        assert_eq!(app.reveal().stage(), Stage::None);
    }

    #[test]
    fn locked_fruit_lists_its_date() {
        let mut app = app();
        let listing = run(&mut app, "list");
        assert_eq!(listing.len(), 2);
        assert!(listing[0].ends_with("ripe"));
        assert!(listing[1].ends_with("Ripens on January 1, 2099"));
        let tip = run(&mut app, "hover z");
        assert_eq!(tip, vec!["[Ripens on January 1, 2099]".to_string()]);
    }

    #[test]
    fn slow_tick_rate_still_waits_the_full_duration() {
        let config = AppConfig {
            leaf_density: 0.05,
            realtime: false,
            tick_rate: 2,
            ..Default::default()
        };
        let letters = LetterSet::new(vec![letter("a", true, "2024-01-01")]).unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 5, 5)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap();
        let mut app = App::new(config, letters, AudioOutputs::silent(), now);

        let grown = run(&mut app, "wait 3200");
        assert!(grown.iter().any(|l| l.contains("tree has grown")));
        run(&mut app, "click a");
        run(&mut app, "wait 1800");
        assert_eq!(app.reveal().stage(), Stage::Envelope);
        assert_eq!(app.reveal().now(), Duration::from_millis(5000));
    }

    #[test]
    fn status_reports_shared_state() {
        let mut app = app();
        run(&mut app, "wait 3200");
        run(&mut app, "click a");
        run(&mut app, "mute");
        let status = run(&mut app, "status");
        assert!(status[0].ends_with("intro complete"));
        assert_eq!(status[2], "selected a");
        assert!(status[4].starts_with("sound muted"));
    }

    #[test]
    fn mute_toggles_store() {
        let mut app = app();
        assert_eq!(run(&mut app, "mute"), vec!["muted".to_string()]);
        assert!(app.store().is_muted());
        assert_eq!(run(&mut app, "mute"), vec!["unmuted".to_string()]);
    }
}
