//! The memory tree: letters hanging as fruit on a procedurally grown tree, revealed
//! one at a time through a short choreographed sequence.

pub mod animation;
pub mod app;
pub mod config;
pub mod fruit;
pub mod intro;
pub mod letters;
pub mod particles;
pub mod reveal;
pub mod scene;
pub mod store;
pub mod unlock;

pub use app::{App, AudioOutputs, Command, CommandError};
pub use config::AppConfig;
pub use letters::{Branch, Letter, LetterDataError, LetterSet, Palette};
pub use reveal::{RevealOrchestrator, Stage};
pub use scene::TreeScene;
pub use store::{AppState, StateChange, Store};
