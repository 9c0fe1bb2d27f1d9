//! Time management for the frame loop.

use std::time::Duration;

/// Snapshot handed to per-frame callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Total elapsed time since the clock started.
    pub elapsed: Duration,
    /// Duration of the last frame.
    pub delta: Duration,
    /// Frame index (starts at 1 for the first update).
    pub frame: u64,
}

impl FrameTime {
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

/// Manages frame timing and delta time calculation.
///
/// The clock is stepped manually (`advance`), which is how headless runs and tests
/// keep timing deterministic.
#[derive(Debug)]
pub struct Time {
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
    /// Upper bound for a single frame delta, so a stalled process does not
    /// fast-forward every animation at once.
    max_delta: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            max_delta: Duration::from_millis(250),
        }
    }

    /// Step the clock by an explicit delta.
    pub fn advance(&mut self, delta: Duration) -> FrameTime {
        self.delta = delta.min(self.max_delta);
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.frame()
    }

    /// Current frame snapshot.
    pub fn frame(&self) -> FrameTime {
        FrameTime {
            elapsed: self.elapsed,
            delta: self.delta,
            frame: self.frame_count,
        }
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get total elapsed time as Duration.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the current FPS (averaged over last frame).
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }

    /// Largest delta a single frame may report.
    pub fn max_delta(&self) -> Duration {
        self.max_delta
    }

    /// Set the largest delta a single frame may report.
    pub fn set_max_delta(&mut self, max_delta: Duration) {
        self.max_delta = max_delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates_elapsed_and_frames() {
        let mut time = Time::new();
        time.advance(Duration::from_millis(16));
        let frame = time.advance(Duration::from_millis(16));
        assert_eq!(frame.elapsed, Duration::from_millis(32));
        assert_eq!(frame.delta, Duration::from_millis(16));
        assert_eq!(frame.frame, 2);
    }

    #[test]
    fn advance_clamps_long_frames() {
        let mut time = Time::new();
        time.set_max_delta(Duration::from_millis(100));
        let frame = time.advance(Duration::from_secs(3));
        assert_eq!(frame.delta, Duration::from_millis(100));
        assert_eq!(time.elapsed(), Duration::from_millis(100));
        assert_eq!(time.max_delta(), Duration::from_millis(100));
    }
}
