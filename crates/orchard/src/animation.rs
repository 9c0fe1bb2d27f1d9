//! Idle motion of the tree and everything on it.
//!
//! Each function maps elapsed scene time (seconds) and a rest pose to the pose for
//! this frame, so callers can sample any instant without carrying state.

use engine_core::{Ease, Transform, Tween};
use glam::Vec3;
use procgen::LeafInstance;

/// Length of the tree's growth at startup, in seconds.
pub const GROWTH_DURATION: f32 = 3.0;

/// Per-fruit time offset, so neighbouring fruit do not swing in step.
pub fn fruit_phase(id: &str) -> f32 {
    id.chars().count() as f32 * 0.5
}

/// A hanging fruit swinging gently from its stem.
pub fn fruit_sway(time: f32, phase: f32, rest: Vec3) -> Transform {
    let t = time + phase;
    let position = Vec3::new(
        rest.x + (t * 0.5).sin() * 0.02,
        rest.y + (t * 0.7).sin() * 0.01,
        rest.z,
    );
    let euler = Vec3::new((t * 0.4 + 0.5).sin() * 0.04, 0.0, (t * 0.6).sin() * 0.08);
    Transform::from_position_euler(position, euler)
}

/// Opacity of the aura around a fruit. Only ripe fruit pulse.
pub fn glow_opacity(time: f32, phase: f32, unlocked: bool, hovered: bool) -> f32 {
    let t = time + phase;
    let (base, pulse) = if unlocked { (0.25, (t * 2.0).sin() * 0.1) } else { (0.1, 0.0) };
    base + pulse + if hovered { 0.3 } else { 0.0 }
}

/// Slow breathing and sway of the whole tree once it has grown.
pub fn tree_breathing(time: f32) -> Transform {
    let breathe = (time * 0.5).sin() * 0.02;
    let sway = (time * 0.3).sin() * 0.05;
    Transform::from_position_euler(Vec3::ZERO, Vec3::new(0.0, 0.0, sway)).with_scale(Vec3::new(1.0, 1.0 + breathe, 1.0))
}

/// Uniform scale of the tree `time` seconds into its growth.
pub fn tree_growth(time: f32) -> Transform {
    let scale = Tween::new(0.0, 1.0, GROWTH_DURATION, Ease::Power2Out).sample(time);
    Transform::default().with_scale(Vec3::splat(scale))
}

/// Canopy leaf moved by three layered gusts around its rest pose.
pub fn leaf_wind(time: f32, leaf: &LeafInstance) -> Transform {
    let phase = leaf.phase;
    let wind1 = (time * 0.8 + phase).sin() * 0.05;
    let wind2 = (time * 1.3 + phase * 1.5).sin() * 0.03;
    let wind3 = (time * 2.1 + phase * 0.7).sin() * 0.02;

    let position = leaf.position + Vec3::new(wind1 * 0.3, wind2.abs() * 0.2, 0.0);
    let euler = leaf.rotation + Vec3::new(wind3, 0.0, wind1 + wind2);
    Transform::from_parts(position, euler, leaf.scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sway_stays_close_to_rest() {
        let rest = Vec3::new(1.0, 4.0, -0.5);
        for i in 0..200 {
            let pose = fruit_sway(i as f32 * 0.1, fruit_phase("apple"), rest);
            assert!((pose.position - rest).length() <= 0.0224);
            assert_eq!(pose.position.z, rest.z);
            assert!(pose.is_finite());
        }
    }

    #[test]
    fn glow_depends_on_ripeness_and_hover() {
        assert_eq!(glow_opacity(1.0, 0.0, false, false), 0.1);
        assert!((glow_opacity(1.0, 0.0, false, true) - 0.4).abs() < 1e-6);
        let ripe = glow_opacity(0.3, 0.0, true, false);
        assert!((0.15..=0.35).contains(&ripe));
    }

    #[test]
    fn growth_eases_to_full_size() {
        assert_eq!(tree_growth(0.0).scale, Vec3::ZERO);
        let half = tree_growth(1.5).scale.x;
        assert!(half > 0.5 && half < 1.0);
        assert_eq!(tree_growth(3.0).scale, Vec3::ONE);
        assert_eq!(tree_growth(10.0).scale, Vec3::ONE);
    }

    #[test]
    fn breathing_only_stretches_vertically() {
        let pose = tree_breathing(3.1);
        assert_eq!(pose.scale.x, 1.0);
        assert!((pose.scale.y - 1.0).abs() <= 0.02);
        assert!(pose.euler().z.abs() <= 0.05 + 1e-6);
    }

    #[test]
    fn leaf_wind_keeps_scale() {
        let leaf = LeafInstance {
            position: Vec3::new(0.0, 4.0, 1.0),
            rotation: Vec3::new(0.2, 0.1, -0.3),
            scale: 0.15,
            color_index: 1,
            phase: 2.0,
        };
        let pose = leaf_wind(7.5, &leaf);
        assert_eq!(pose.scale, Vec3::splat(0.15));
        assert!((pose.position - leaf.position).length() < 0.05);
    }
}
