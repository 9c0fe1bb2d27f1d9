//! Letter audio playback and the ambient pad, with a kira output backend.

pub mod ambient;
pub mod engine;
pub mod playback;
pub mod wav;

pub use ambient::{render_pad, AmbientOutput, AmbientSound, AMBIENT_RAMP, AMBIENT_VOLUME};
pub use engine::AudioEngine;
pub use playback::{format_clock, AudioBackend, AudioPlayback, PlayableSource, PlaybackState, SilentBackend};
pub use wav::encode_wav;

// Re-export for convenience
pub use kira;
