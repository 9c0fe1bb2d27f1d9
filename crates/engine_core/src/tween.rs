//! Easing curves and single-value tweens.

/// Easing curves, named after the power family used by common tween libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    #[default]
    Linear,
    /// Quadratic ease-in.
    Power1In,
    /// Quadratic ease-out.
    Power1Out,
    /// Cubic ease-in.
    Power2In,
    /// Cubic ease-out.
    Power2Out,
}

impl Ease {
    /// Map linear progress `t` in [0, 1] through the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1In => t * t,
            Ease::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::Power2In => t * t * t,
            Ease::Power2Out => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// A scalar tween from `from` to `to`, starting `delay` seconds after its origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub delay: f32,
    pub duration: f32,
    pub ease: Ease,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: f32, ease: Ease) -> Self {
        Self {
            from,
            to,
            delay: 0.0,
            duration,
            ease,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    /// Linear progress at `t` seconds after the origin, in [0, 1].
    pub fn progress(&self, t: f32) -> f32 {
        if self.duration <= 0.0 {
            return if t >= self.delay { 1.0 } else { 0.0 };
        }
        ((t - self.delay) / self.duration).clamp(0.0, 1.0)
    }

    /// Value at `t` seconds after the origin.
    pub fn sample(&self, t: f32) -> f32 {
        let eased = self.ease.apply(self.progress(t));
        self.from + (self.to - self.from) * eased
    }

    /// Time (from the origin) at which the tween settles.
    pub fn end_time(&self) -> f32 {
        self.delay + self.duration.max(0.0)
    }

    pub fn is_finished(&self, t: f32) -> bool {
        t >= self.end_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eases_hit_endpoints() {
        for ease in [Ease::Linear, Ease::Power1In, Ease::Power1Out, Ease::Power2In, Ease::Power2Out] {
            assert_eq!(ease.apply(0.0), 0.0);
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn ease_in_lags_and_ease_out_leads() {
        assert!(Ease::Power2In.apply(0.5) < 0.5);
        assert!(Ease::Power2Out.apply(0.5) > 0.5);
    }

    #[test]
    fn tween_respects_delay() {
        let tween = Tween::new(1.0, 0.6, 0.3, Ease::Power2In).with_delay(0.6);
        assert_eq!(tween.sample(0.0), 1.0);
        assert_eq!(tween.sample(0.6), 1.0);
        assert!((tween.sample(0.9) - 0.6).abs() < 1e-6);
        assert!(tween.is_finished(1.0));
        assert!(!tween.is_finished(0.7));
    }
}
