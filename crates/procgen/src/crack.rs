//! Lightning-style crack that splits the fruit before the envelope emerges.
//!
//! Coordinates are in a 2D overlay space centred on the fruit, y growing downwards
//! from -60 to 60.

use glam::Vec2;
use rand::prelude::*;
use std::f32::consts::PI;
use std::fmt::Write;

pub const CRACK_TOP: f32 = -60.0;
pub const CRACK_BOTTOM: f32 = 60.0;
pub const CRACK_SEGMENTS: usize = 10;
pub const CRACK_BRANCHES: usize = 4;

/// Secondary crack forking off the main path.
#[derive(Debug, Clone, PartialEq)]
pub struct CrackBranch {
    pub start: Vec2,
    pub control: Vec2,
    pub end: Vec2,
    /// Reveal delay in seconds after the crack stage begins.
    pub delay: f32,
}

impl CrackBranch {
    pub fn svg_path(&self) -> String {
        format!(
            "M {} {} Q {} {} {} {}",
            fmt_coord(self.start.x),
            fmt_coord(self.start.y),
            fmt_coord(self.control.x),
            fmt_coord(self.control.y),
            fmt_coord(self.end.x),
            fmt_coord(self.end.y)
        )
    }
}

/// Main lightning path plus its forks, regenerated for every opening.
#[derive(Debug, Clone, PartialEq)]
pub struct CrackPattern {
    pub main: Vec<Vec2>,
    pub branches: Vec<CrackBranch>,
}

impl CrackPattern {
    pub fn main_svg_path(&self) -> String {
        svg_path(&self.main)
    }
}

/// Zig-zag polyline from `start_y` to `end_y` whose endpoints sit on x = 0.
///
/// Interior points alternate direction, each step scaled by a random amplitude in
/// [15, 40) and a factor in [0.5, 1), then nudged by up to ±5.
pub fn generate_lightning_path<R: Rng>(rng: &mut R, start_y: f32, end_y: f32, segments: usize) -> Vec<Vec2> {
    let segments = segments.max(1);
    let mut points = Vec::with_capacity(segments + 1);
    let mut x = 0.0;
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let y = start_y + (end_y - start_y) * t;
        if i == 0 || i == segments {
            points.push(Vec2::new(0.0, y));
            continue;
        }
        let amplitude = 15.0 + rng.gen::<f32>() * 25.0;
        let direction = if i % 2 == 0 { 1.0 } else { -1.0 };
        x += direction * amplitude * (0.5 + rng.gen::<f32>() * 0.5);
        x += (rng.gen::<f32>() - 0.5) * 10.0;
        points.push(Vec2::new(x, y));
    }
    points
}

/// Full crack: main path and exactly four forks from interior points 2..=7.
pub fn generate_crack<R: Rng>(rng: &mut R) -> CrackPattern {
    let main = generate_lightning_path(rng, CRACK_TOP, CRACK_BOTTOM, CRACK_SEGMENTS);
    let branches = (0..CRACK_BRANCHES)
        .map(|i| {
            let start = main[2 + rng.gen_range(0..6)];
            let length = 20.0 + rng.gen::<f32>() * 30.0;
            let angle = (rng.gen::<f32>() - 0.5) * PI * 0.6;
            // Forks lean away from the axis on whichever side they start.
            let side = if start.x > 0.0 { 1.0 } else { -1.0 };
            let end = Vec2::new(
                start.x + angle.cos() * length * side,
                start.y + angle.sin() * length * 0.5,
            );
            let mid = (start + end) * 0.5;
            let control = Vec2::new(mid.x + (rng.gen::<f32>() - 0.5) * 15.0, mid.y);
            CrackBranch {
                start,
                control,
                end,
                delay: 0.1 + i as f32 * 0.05,
            }
        })
        .collect();
    CrackPattern { main, branches }
}

/// Smooth SVG path through `points` using quadratic and smooth-quadratic commands.
pub fn svg_path(points: &[Vec2]) -> String {
    if points.len() < 2 {
        return String::new();
    }
    let mut path = format!("M {} {}", fmt_coord(points[0].x), fmt_coord(points[0].y));
    for pair in points.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let mid = (prev + curr) * 0.5;
        let _ = write!(
            path,
            " Q {} {} {} {} T {} {}",
            fmt_coord(prev.x),
            fmt_coord(mid.y),
            fmt_coord(mid.x),
            fmt_coord(mid.y),
            fmt_coord(curr.x),
            fmt_coord(curr.y)
        );
    }
    path
}

fn fmt_coord(v: f32) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lightning_endpoints_on_axis() {
        let mut rng = StdRng::seed_from_u64(12);
        let path = generate_lightning_path(&mut rng, -60.0, 60.0, 10);
        assert_eq!(path.len(), 11);
        assert_eq!(path[0], Vec2::new(0.0, -60.0));
        assert_eq!(path[10], Vec2::new(0.0, 60.0));
        for (i, p) in path.iter().enumerate() {
            assert!((p.y - (-60.0 + 12.0 * i as f32)).abs() < 1e-4);
        }
    }

    #[test]
    fn zig_zag_steps_are_bounded() {
        let mut rng = StdRng::seed_from_u64(99);
        let path = generate_lightning_path(&mut rng, -60.0, 60.0, 10);
        for pair in path[..10].windows(2) {
            let step = (pair[1].x - pair[0].x).abs();
            assert!(step <= 45.0, "step {} too large", step);
        }
    }

    #[test]
    fn crack_has_four_forks_from_interior_points() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let crack = generate_crack(&mut rng);
            assert_eq!(crack.branches.len(), 4);
            for (i, branch) in crack.branches.iter().enumerate() {
                assert!(crack.main[2..8].contains(&branch.start));
                let length = branch.end.distance(branch.start);
                assert!(length <= 50.0 + 1e-3);
                assert!((branch.delay - (0.1 + 0.05 * i as f32)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn svg_path_is_smooth_quadratic() {
        let path = svg_path(&[Vec2::new(0.0, -60.0), Vec2::new(10.0, -48.0), Vec2::new(0.0, -36.0)]);
        assert!(path.starts_with("M 0 -60 Q 0 -54 5 -54 T 10 -48"));
        assert_eq!(path.matches(" T ").count(), 2);
        assert_eq!(svg_path(&[Vec2::ZERO]), "");
    }

    #[test]
    fn fork_path_starts_at_fork() {
        let branch = CrackBranch {
            start: Vec2::new(-12.5, -36.0),
            control: Vec2::new(-20.0, -30.0),
            end: Vec2::new(-30.0, -24.0),
            delay: 0.1,
        };
        assert_eq!(branch.svg_path(), "M -12.5 -36 Q -20 -30 -30 -24");
    }
}
