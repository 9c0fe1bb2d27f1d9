//! Parametric 3D curves, arc-length sampling and Frenet frames.

use crate::mesh::safe_normalize;
use glam::{Quat, Vec3};

/// Number of samples used to build the arc-length table.
const ARC_LENGTH_DIVISIONS: usize = 200;

/// A curve parameterised on `t` in [0, 1].
pub trait Curve3 {
    /// Point at raw parameter `t`.
    fn point(&self, t: f32) -> Vec3;

    /// Cumulative arc lengths at `divisions + 1` evenly spaced parameters.
    fn arc_lengths(&self, divisions: usize) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        for i in 1..=divisions {
            let p = self.point(i as f32 / divisions as f32);
            sum += p.distance(last);
            lengths.push(sum);
            last = p;
        }
        lengths
    }

    fn length(&self) -> f32 {
        self.arc_lengths(ARC_LENGTH_DIVISIONS).last().copied().unwrap_or(0.0)
    }

    /// Map a fraction of arc length `u` to the raw parameter `t`.
    fn u_to_t(&self, u: f32) -> f32 {
        let lengths = self.arc_lengths(ARC_LENGTH_DIVISIONS);
        u_to_t_with(&lengths, u)
    }

    /// Point at arc-length fraction `u`.
    fn point_at(&self, u: f32) -> Vec3 {
        self.point(self.u_to_t(u))
    }

    /// Unit tangent at raw parameter `t` (finite difference).
    fn tangent(&self, t: f32) -> Vec3 {
        let delta = 1e-4;
        let t1 = (t - delta).max(0.0);
        let t2 = (t + delta).min(1.0);
        safe_normalize(self.point(t2) - self.point(t1)).unwrap_or(Vec3::Y)
    }

    /// Unit tangent at arc-length fraction `u`.
    fn tangent_at(&self, u: f32) -> Vec3 {
        self.tangent(self.u_to_t(u))
    }

    /// `divisions + 1` points at evenly spaced raw parameters.
    fn points(&self, divisions: usize) -> Vec<Vec3> {
        (0..=divisions)
            .map(|i| self.point(i as f32 / divisions as f32))
            .collect()
    }
}

fn u_to_t_with(lengths: &[f32], u: f32) -> f32 {
    let count = lengths.len();
    if count < 2 {
        return u.clamp(0.0, 1.0);
    }
    let total = lengths[count - 1];
    if total <= 0.0 {
        return u.clamp(0.0, 1.0);
    }
    let target = u.clamp(0.0, 1.0) * total;
    // First index whose length is >= target.
    let i = lengths.partition_point(|&l| l < target).min(count - 1);
    if i == 0 {
        return 0.0;
    }
    let before = lengths[i - 1];
    let segment = lengths[i] - before;
    let fraction = if segment > 0.0 { (target - before) / segment } else { 0.0 };
    ((i - 1) as f32 + fraction) / (count - 1) as f32
}

/// Centripetal Catmull-Rom spline through a list of control points.
#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRom {
    pub points: Vec<Vec3>,
}

impl CatmullRom {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }
}

impl Curve3 for CatmullRom {
    fn point(&self, t: f32) -> Vec3 {
        let pts = &self.points;
        let l = pts.len();
        match l {
            0 => return Vec3::ZERO,
            1 => return pts[0],
            _ => {}
        }

        let p = (l - 1) as f32 * t.clamp(0.0, 1.0);
        let mut int_point = p.floor() as usize;
        let mut weight = p - int_point as f32;
        if int_point >= l - 1 {
            int_point = l - 2;
            weight = 1.0;
        }

        let p0 = if int_point > 0 {
            pts[int_point - 1]
        } else {
            2.0 * pts[0] - pts[1]
        };
        let p1 = pts[int_point];
        let p2 = pts[int_point + 1];
        let p3 = if int_point + 2 < l {
            pts[int_point + 2]
        } else {
            2.0 * pts[l - 1] - pts[l - 2]
        };

        let mut dt0 = p0.distance_squared(p1).powf(0.25);
        let mut dt1 = p1.distance_squared(p2).powf(0.25);
        let mut dt2 = p2.distance_squared(p3).powf(0.25);
        if dt1 < 1e-4 {
            dt1 = 1.0;
        }
        if dt0 < 1e-4 {
            dt0 = dt1;
        }
        if dt2 < 1e-4 {
            dt2 = dt1;
        }

        let t1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
        let t2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

        let c0 = p1;
        let c1 = t1;
        let c2 = -3.0 * p1 + 3.0 * p2 - 2.0 * t1 - t2;
        let c3 = 2.0 * p1 - 2.0 * p2 + t1 + t2;
        let w = weight;
        c0 + c1 * w + c2 * (w * w) + c3 * (w * w * w)
    }
}

/// Quadratic Bézier segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticBezier {
    pub start: Vec3,
    pub control: Vec3,
    pub end: Vec3,
}

impl QuadraticBezier {
    pub fn new(start: Vec3, control: Vec3, end: Vec3) -> Self {
        Self { start, control, end }
    }
}

impl Curve3 for QuadraticBezier {
    fn point(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let k = 1.0 - t;
        self.start * (k * k) + self.control * (2.0 * k * t) + self.end * (t * t)
    }
}

/// Per-sample orientation along a curve.
#[derive(Debug, Clone, Default)]
pub struct FrenetFrames {
    pub tangents: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub binormals: Vec<Vec3>,
}

/// Frames at `segments + 1` arc-length positions, propagated by parallel transport
/// so the cross-section never flips along gentle bends.
pub fn frenet_frames(curve: &dyn Curve3, segments: usize) -> FrenetFrames {
    let segments = segments.max(1);
    let tangents: Vec<Vec3> = (0..=segments)
        .map(|i| curve.tangent_at(i as f32 / segments as f32))
        .collect();

    let mut normals = Vec::with_capacity(segments + 1);
    let mut binormals = Vec::with_capacity(segments + 1);

    // Seed the first normal from the axis least aligned with the tangent.
    let t0 = tangents[0];
    let abs = t0.abs();
    let axis = if abs.x <= abs.y && abs.x <= abs.z {
        Vec3::X
    } else if abs.y <= abs.z {
        Vec3::Y
    } else {
        Vec3::Z
    };
    let side = safe_normalize(t0.cross(axis)).unwrap_or(Vec3::X);
    let n0 = safe_normalize(t0.cross(side)).unwrap_or(Vec3::Z);
    normals.push(n0);
    binormals.push(t0.cross(n0));

    for i in 1..=segments {
        let mut normal = normals[i - 1];
        if let Some(axis) = safe_normalize(tangents[i - 1].cross(tangents[i])) {
            let theta = tangents[i - 1].dot(tangents[i]).clamp(-1.0, 1.0).acos();
            normal = Quat::from_axis_angle(axis, theta) * normal;
        }
        normals.push(normal);
        binormals.push(tangents[i].cross(normal));
    }

    FrenetFrames {
        tangents,
        normals,
        binormals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catmull_rom_passes_through_control_points() {
        let curve = CatmullRom::new(vec![
            Vec3::ZERO,
            Vec3::new(0.05, 0.8, 0.02),
            Vec3::new(-0.03, 1.6, -0.01),
            Vec3::new(0.0, 2.4, 0.0),
        ]);
        assert!(curve.point(0.0).distance(Vec3::ZERO) < 1e-5);
        assert!(curve.point(1.0 / 3.0).distance(Vec3::new(0.05, 0.8, 0.02)) < 1e-4);
        assert!(curve.point(1.0).distance(Vec3::new(0.0, 2.4, 0.0)) < 1e-5);
    }

    #[test]
    fn arc_length_sampling_is_even() {
        let curve = QuadraticBezier::new(Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0), Vec3::new(4.0, 4.0, 0.0));
        let total = curve.length();
        let a = curve.point_at(0.25);
        let b = curve.point_at(0.5);
        let first = curve.point_at(0.0).distance(a);
        let second = a.distance(b);
        // Chords on a gently curved path approximate equal arc steps.
        assert!((first - second).abs() < total * 0.02);
    }

    #[test]
    fn frames_are_orthonormal() {
        let curve = QuadraticBezier::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 0.5), Vec3::new(3.0, 2.5, -1.0));
        let frames = frenet_frames(&curve, 16);
        assert_eq!(frames.tangents.len(), 17);
        for i in 0..=16 {
            let (t, n, b) = (frames.tangents[i], frames.normals[i], frames.binormals[i]);
            assert!(t.dot(n).abs() < 1e-3);
            assert!(t.dot(b).abs() < 1e-3);
            assert!((n.length() - 1.0).abs() < 1e-3);
        }
    }
}
