//! Trunk, root flares and the base collar.

use crate::curve::{CatmullRom, Curve3};
use crate::mesh::{grid_indices, MeshData};
use crate::tube::{sweep_tube, TubeParams};
use glam::{Vec2, Vec3};
use rand::prelude::*;
use std::f32::consts::{PI, TAU};

pub const TRUNK_HEIGHT: f32 = 4.0;
pub const TRUNK_HEIGHT_SEGMENTS: u32 = 40;
pub const TRUNK_RADIAL_SEGMENTS: u32 = 24;

pub const TRUNK_TINT: u32 = 0x4a3828;
pub const ROOT_TINT: u32 = 0x3d2d1e;
pub const COLLAR_TINT: u32 = 0x2d2015;

/// Slightly meandering centre line of the trunk.
pub fn trunk_curve() -> CatmullRom {
    CatmullRom::new(vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.05, 0.8, 0.02),
        Vec3::new(-0.03, 1.6, -0.01),
        Vec3::new(0.02, 2.4, 0.03),
        Vec3::new(-0.02, 3.2, -0.02),
        Vec3::new(0.01, TRUNK_HEIGHT, 0.01),
    ])
}

/// Trunk radius at height fraction `t` and angle `theta`.
pub fn trunk_radius(t: f32, theta: f32) -> f32 {
    let base = 0.45 - t * 0.25 + (t * PI * 4.0).sin() * 0.02;
    let irregularity = 1.0 + (theta * 3.0 + t * 5.0).sin() * 0.05 + (theta * 7.0).cos() * 0.03;
    base * irregularity
}

/// Horizontal rings stacked along the trunk curve, tapering towards the top.
pub fn generate_trunk() -> MeshData {
    let curve = trunk_curve();
    let rows = TRUNK_HEIGHT_SEGMENTS;
    let cols = TRUNK_RADIAL_SEGMENTS;
    let points = curve.points(rows as usize);

    let mut mesh = MeshData::with_capacity(((rows + 1) * (cols + 1)) as usize, (rows * cols * 6) as usize);
    for (i, point) in points.iter().enumerate() {
        let t = i as f32 / rows as f32;
        for j in 0..=cols {
            let theta = j as f32 / cols as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            let r = trunk_radius(t, theta);
            mesh.push_vertex(
                Vec3::new(point.x + cos * r, point.y, point.z + sin * r),
                Vec3::new(cos, 0.0, sin),
                Vec2::new(j as f32 / cols as f32, t),
            );
        }
    }
    mesh.indices = grid_indices(rows, cols);
    mesh.compute_vertex_normals();
    mesh
}

/// One root flare spreading out from the trunk base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootSpec {
    pub angle: f32,
    pub length: f32,
    pub thickness: f32,
}

impl RootSpec {
    pub fn curve(&self) -> CatmullRom {
        let (sin, cos) = self.angle.sin_cos();
        let at = |f: f32, y: f32| Vec3::new(cos * self.length * f, y, sin * self.length * f);
        CatmullRom::new(vec![Vec3::ZERO, at(0.4, -0.1), at(0.7, -0.15), at(1.0, -0.2)])
    }

    /// Root tube, lifted so it emerges just above ground level.
    pub fn mesh(&self) -> MeshData {
        let mut mesh = sweep_tube(&self.curve(), &TubeParams::uniform(12, self.thickness, 8));
        for p in mesh.positions.iter_mut() {
            p.y += 0.1;
        }
        mesh
    }
}

/// Eight roots spaced evenly around the base with jittered heading and size.
pub fn generate_roots<R: Rng>(rng: &mut R) -> Vec<RootSpec> {
    (0..8)
        .map(|i| RootSpec {
            angle: i as f32 / 8.0 * TAU + rng.gen::<f32>() * 0.3,
            length: 0.4 + rng.gen::<f32>() * 0.3,
            thickness: 0.06 + rng.gen::<f32>() * 0.04,
        })
        .collect()
}

/// Flat torus hugging the trunk where it meets the ground.
pub fn generate_collar() -> MeshData {
    let (radius, tube) = (0.48, 0.12);
    let (rows, cols) = (TRUNK_RADIAL_SEGMENTS, 8u32);
    let mut mesh = MeshData::with_capacity(((rows + 1) * (cols + 1)) as usize, (rows * cols * 6) as usize);
    for i in 0..=rows {
        let u = i as f32 / rows as f32 * TAU;
        let ring = Vec3::new(u.cos(), 0.0, u.sin());
        for j in 0..=cols {
            let v = j as f32 / cols as f32 * TAU;
            let dir = ring * v.cos() - Vec3::Y * v.sin();
            let p = ring * radius + dir * tube + Vec3::new(0.0, 0.05, 0.0);
            mesh.push_vertex(p, dir, Vec2::new(i as f32 / rows as f32, j as f32 / cols as f32));
        }
    }
    mesh.indices = grid_indices(rows, cols);
    mesh.compute_vertex_normals();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trunk_tapers_and_reaches_full_height() {
        let trunk = generate_trunk();
        assert!(trunk.is_finite() && trunk.is_well_formed());
        assert_eq!(trunk.vertex_count(), 41 * 25);
        let (min, max) = trunk.bounds();
        assert!(min.y.abs() < 1e-5);
        assert!((max.y - TRUNK_HEIGHT).abs() < 1e-4);
        assert!(trunk_radius(0.0, 0.0) > trunk_radius(1.0, 0.0));
    }

    #[test]
    fn trunk_normals_face_out() {
        let trunk = generate_trunk();
        let stride = 25;
        let p = trunk.positions[stride * 20 + 3];
        let n = trunk.normals[stride * 20 + 3];
        assert!(Vec3::new(p.x, 0.0, p.z).normalize().dot(n) > 0.7);
    }

    #[test]
    fn roots_ring_the_base() {
        let mut rng = StdRng::seed_from_u64(2);
        let roots = generate_roots(&mut rng);
        assert_eq!(roots.len(), 8);
        for (i, root) in roots.iter().enumerate() {
            let slot = i as f32 / 8.0 * TAU;
            assert!(root.angle >= slot && root.angle < slot + 0.3);
            assert!((0.4..0.7).contains(&root.length));
            assert!((0.06..0.1).contains(&root.thickness));
            assert!(root.mesh().is_finite());
        }
    }

    #[test]
    fn collar_sits_at_ground() {
        let collar = generate_collar();
        let (min, max) = collar.bounds();
        assert!(min.y < 0.0 && max.y > 0.1);
        assert!((max.x - 0.6).abs() < 1e-3);
    }
}
