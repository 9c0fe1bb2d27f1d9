//! Swept tube surfaces: stems, roots, branches.

use crate::curve::{frenet_frames, Curve3};
use crate::mesh::{grid_indices, MeshData};
use glam::Vec2;
use std::f32::consts::TAU;

/// Cross-section and sampling parameters for [`sweep_tube`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TubeParams {
    /// Rings along the curve.
    pub tubular_segments: u32,
    /// Vertices around each ring.
    pub radial_segments: u32,
    /// Radius at the curve start.
    pub radius_start: f32,
    /// Radius at the curve end.
    pub radius_end: f32,
    /// Amplitude of the `sin(8t)` longitudinal irregularity.
    pub irregularity: f32,
    /// Amplitude of the `cos(3θ)` ripple around the section.
    pub ripple: f32,
}

impl TubeParams {
    /// Constant-radius smooth tube.
    pub fn uniform(tubular_segments: u32, radius: f32, radial_segments: u32) -> Self {
        Self {
            tubular_segments,
            radial_segments,
            radius_start: radius,
            radius_end: radius,
            irregularity: 0.0,
            ripple: 0.0,
        }
    }

    /// Tapering branch with bark-like irregularity.
    pub fn tapered(tubular_segments: u32, radius_start: f32, radius_end: f32) -> Self {
        Self {
            tubular_segments,
            radial_segments: 12,
            radius_start,
            radius_end,
            irregularity: 0.08,
            ripple: 0.05,
        }
    }

    /// Section radius at arc fraction `t` and angle `theta`.
    pub fn radius(&self, t: f32, theta: f32) -> f32 {
        let base = self.radius_start + (self.radius_end - self.radius_start) * t;
        let irregular = 1.0 + (t * 8.0).sin() * self.irregularity;
        base * irregular * (1.0 + (theta * 3.0).cos() * self.ripple)
    }
}

/// Sweep a circular cross-section along `curve` using Frenet frames.
///
/// Open-ended: no caps. Normals are recomputed from the displaced surface.
pub fn sweep_tube(curve: &dyn Curve3, params: &TubeParams) -> MeshData {
    let segments = params.tubular_segments.max(1);
    let radial = params.radial_segments.max(3);
    let frames = frenet_frames(curve, segments as usize);
    let mut mesh = MeshData::with_capacity(
        ((segments + 1) * (radial + 1)) as usize,
        (segments * radial * 6) as usize,
    );

    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let center = curve.point_at(t);
        let n = frames.normals[i as usize];
        let b = frames.binormals[i as usize];
        for j in 0..=radial {
            let theta = j as f32 / radial as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            // Winding with the grid indices keeps faces pointing away from the curve.
            let dir = n * cos - b * sin;
            let r = params.radius(t, theta);
            mesh.push_vertex(center + dir * r, dir, Vec2::new(j as f32 / radial as f32, t));
        }
    }

    mesh.indices = grid_indices(segments, radial);
    mesh.compute_vertex_normals();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::QuadraticBezier;
    use glam::Vec3;

    #[test]
    fn tube_tapers_from_base_to_tip() {
        let curve = QuadraticBezier::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 2.0, 0.0));
        let params = TubeParams {
            ripple: 0.0,
            irregularity: 0.0,
            ..TubeParams::tapered(8, 0.2, 0.05)
        };
        let mesh = sweep_tube(&curve, &params);
        assert!(mesh.is_well_formed());
        let ring = params.radial_segments as usize + 1;
        let base_r = mesh.positions[0].distance(curve.point_at(0.0));
        let tip_r = mesh.positions[mesh.vertex_count() - ring].distance(curve.point_at(1.0));
        assert!((base_r - 0.2).abs() < 1e-3);
        assert!((tip_r - 0.05).abs() < 1e-3);
    }

    #[test]
    fn tube_vertices_finite() {
        let curve = QuadraticBezier::new(Vec3::ZERO, Vec3::new(0.5, 0.2, 0.1), Vec3::new(1.0, 0.0, 0.0));
        let mesh = sweep_tube(&curve, &TubeParams::uniform(16, 0.015, 8));
        assert!(mesh.is_finite());
        assert_eq!(mesh.triangle_count(), 16 * 8 * 2);
    }

    #[test]
    fn tube_normals_point_outward() {
        let curve = QuadraticBezier::new(Vec3::ZERO, Vec3::new(0.2, 1.0, 0.0), Vec3::new(0.0, 2.0, 0.3));
        let mesh = sweep_tube(&curve, &TubeParams::uniform(12, 0.1, 10));
        let ring = 11;
        // Interior rings only; end rings have one-sided neighbourhoods.
        for i in ring..mesh.vertex_count() - ring {
            let t = (i / ring) as f32 / 12.0;
            let center = curve.point_at(t);
            let outward = (mesh.positions[i] - center).normalize();
            assert!(mesh.normals[i].dot(outward) > 0.5);
        }
    }
}
