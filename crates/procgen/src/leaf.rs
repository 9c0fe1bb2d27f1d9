//! Leaf surfaces and canopy leaf placement.

use crate::mesh::MeshData;
use crate::textures::hex_rgb;
use glam::{Vec2, Vec3};
use rand::prelude::*;
use std::f32::consts::{PI, TAU};

/// Cubic Bézier segment in the leaf plane: (control1, control2, end).
/// Each segment starts where the previous one ended; the outline starts at the origin.
pub type OutlineSegment = [Vec2; 3];

/// Shape and fold parameters for one leaf silhouette.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafStyle {
    pub outline: [OutlineSegment; 4],
    /// Samples per Bézier segment.
    pub divisions: u32,
    /// Interior rings between the centre and the outline.
    pub rings: u32,
    /// Amplitude of the `sin(πy)` curl along the midrib.
    pub curl: f32,
    /// Depth of the cup fold across the blade (`-|x|·cup`).
    pub cup: f32,
    /// Amplitude of the `sin(2π|x|)` cross wave.
    pub cross_wave: f32,
    /// Height of the serration teeth along the edge.
    pub serration: f32,
    /// Number of teeth along the whole outline.
    pub teeth: u32,
}

impl LeafStyle {
    /// Canopy leaf: serrated teardrop, unit length, midrib curl and cup fold.
    pub fn canopy() -> Self {
        Self {
            outline: [
                [Vec2::new(0.3, 0.15), Vec2::new(0.5, 0.4), Vec2::new(0.35, 0.7)],
                [Vec2::new(0.25, 0.85), Vec2::new(0.1, 0.95), Vec2::new(0.0, 1.0)],
                [Vec2::new(-0.1, 0.95), Vec2::new(-0.25, 0.85), Vec2::new(-0.35, 0.7)],
                [Vec2::new(-0.5, 0.4), Vec2::new(-0.3, 0.15), Vec2::new(0.0, 0.0)],
            ],
            divisions: 8,
            rings: 3,
            curl: 0.15,
            cup: 0.1,
            cross_wave: 0.0,
            serration: 0.012,
            teeth: 24,
        }
    }

    /// Small leaf on an apple stem: half length, softer wave across the blade.
    pub fn stem() -> Self {
        Self {
            outline: [
                [Vec2::new(0.12, 0.03), Vec2::new(0.22, 0.12), Vec2::new(0.18, 0.32)],
                [Vec2::new(0.12, 0.42), Vec2::new(0.04, 0.48), Vec2::new(0.0, 0.5)],
                [Vec2::new(-0.04, 0.48), Vec2::new(-0.12, 0.42), Vec2::new(-0.18, 0.32)],
                [Vec2::new(-0.22, 0.12), Vec2::new(-0.12, 0.03), Vec2::new(0.0, 0.0)],
            ],
            divisions: 12,
            rings: 2,
            curl: 0.1,
            cup: 0.0,
            cross_wave: 0.02,
            serration: 0.004,
            teeth: 20,
        }
    }

    fn fold(&self, p: Vec2) -> f32 {
        (p.y * PI).sin() * self.curl - p.x.abs() * self.cup + (p.x.abs() * TAU).sin() * self.cross_wave
    }
}

fn cubic(p0: Vec2, c1: Vec2, c2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let k = 1.0 - t;
    p0 * (k * k * k) + c1 * (3.0 * k * k * t) + c2 * (3.0 * k * t * t) + p3 * (t * t * t)
}

/// Closed, counter-clockwise outline without the repeated start point, serrations applied.
pub fn leaf_outline(style: &LeafStyle) -> Vec<Vec2> {
    let divisions = style.divisions.max(2);
    let mut points = Vec::with_capacity((divisions * 4) as usize);
    let mut start = Vec2::ZERO;
    for [c1, c2, end] in style.outline {
        for i in 0..divisions {
            points.push(cubic(start, c1, c2, end, i as f32 / divisions as f32));
        }
        start = end;
    }

    let height = points.iter().fold(0.0_f32, |h, p| h.max(p.y));
    let center = Vec2::new(0.0, height * 0.45);
    let count = points.len() as f32;
    for (k, p) in points.iter_mut().enumerate() {
        let along = k as f32 / count;
        let tooth = 1.0 - ((along * style.teeth as f32).fract() - 0.5).abs() * 2.0;
        // Teeth fade out at the petiole and the tip.
        let envelope = if height > 0.0 { (p.y / height * PI).sin() } else { 0.0 };
        let outward = (*p - center).normalize_or_zero();
        *p += outward * tooth * envelope * style.serration;
    }
    points
}

/// Triangulate the outline with interior rings and fold it into 3D.
pub fn generate_leaf(style: &LeafStyle) -> MeshData {
    let outline = leaf_outline(style);
    let n = outline.len() as u32;
    let rings = style.rings.max(1);

    let (min, max) = outline.iter().fold(
        (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
        |(lo, hi), p| (lo.min(*p), hi.max(*p)),
    );
    let extent = (max - min).max(Vec2::splat(1e-6));
    let center = Vec2::new(0.0, max.y * 0.45);

    let mut mesh = MeshData::with_capacity((1 + n * rings) as usize, (n * (rings * 2 - 1) * 3) as usize);
    let lift = |p: Vec2| Vec3::new(p.x, p.y, style.fold(p));
    let uv = |p: Vec2| (p - min) / extent;

    mesh.push_vertex(lift(center), Vec3::Z, uv(center));
    for r in 1..=rings {
        let f = r as f32 / rings as f32;
        for p in &outline {
            let q = center + (*p - center) * f;
            mesh.push_vertex(lift(q), Vec3::Z, uv(q));
        }
    }

    let ring_start = |r: u32| 1 + (r - 1) * n;
    for k in 0..n {
        let next = (k + 1) % n;
        mesh.indices.extend_from_slice(&[0, ring_start(1) + k, ring_start(1) + next]);
    }
    for r in 1..rings {
        let inner = ring_start(r);
        let outer = ring_start(r + 1);
        for k in 0..n {
            let next = (k + 1) % n;
            mesh.indices.extend_from_slice(&[inner + k, outer + k, outer + next]);
            mesh.indices.extend_from_slice(&[inner + k, outer + next, inner + next]);
        }
    }

    mesh.compute_vertex_normals();
    mesh
}

/// Leaf colour variants, deep to light green.
pub const LEAF_COLORS: [u32; 4] = [0x2d5016, 0x3a6b1e, 0x4a7d28, 0x385f1d];

pub fn leaf_color(index: u8) -> Vec3 {
    hex_rgb(LEAF_COLORS[index as usize % LEAF_COLORS.len()])
}

/// A spherical region of the canopy that leaves are scattered into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafCluster {
    pub center: Vec3,
    pub density: u32,
    pub radius: f32,
}

const fn cluster(x: f32, y: f32, z: f32, density: u32, radius: f32) -> LeafCluster {
    LeafCluster {
        center: Vec3::new(x, y, z),
        density,
        radius,
    }
}

/// Canopy anchors: primary ends, secondary ends, twig ends, then core fill.
pub const CANOPY_CLUSTERS: [LeafCluster; 29] = [
    cluster(-1.8, 3.8, 0.5, 170, 1.2),
    cluster(1.9, 4.0, 0.3, 180, 1.25),
    cluster(0.3, 4.2, 1.6, 160, 1.15),
    cluster(-0.2, 4.0, -1.5, 164, 1.2),
    cluster(0.8, 4.5, 0.8, 150, 1.1),
    cluster(-1.0, 4.3, -0.8, 144, 1.05),
    cluster(-2.4, 3.6, 1.2, 124, 1.0),
    cluster(2.2, 3.8, -1.0, 130, 1.05),
    cluster(-0.5, 4.8, 0.5, 116, 0.95),
    cluster(1.2, 4.6, 1.3, 124, 1.0),
    cluster(-1.5, 4.4, -1.2, 116, 0.95),
    cluster(0.2, 4.7, -1.4, 110, 0.92),
    cluster(-2.6, 3.3, 0.3, 80, 0.8),
    cluster(2.4, 3.5, 0.8, 84, 0.82),
    cluster(-1.2, 5.0, 0.2, 70, 0.75),
    cluster(0.8, 5.1, -0.3, 76, 0.78),
    cluster(-0.6, 4.9, 1.0, 70, 0.75),
    cluster(1.5, 4.8, -0.8, 74, 0.77),
    cluster(0.0, 4.3, 0.0, 140, 1.1),
    cluster(-1.3, 4.1, 0.9, 110, 0.95),
    cluster(1.3, 4.2, -0.5, 110, 0.95),
    cluster(0.5, 3.9, 1.2, 100, 0.9),
    cluster(-0.8, 4.5, -0.6, 104, 0.92),
    cluster(0.3, 4.6, 0.3, 96, 0.88),
    cluster(0.0, 4.7, 0.0, 90, 0.85),
    cluster(-0.5, 3.8, -0.3, 84, 0.82),
    cluster(0.5, 4.3, 0.5, 80, 0.8),
    cluster(-0.3, 4.1, 0.4, 76, 0.78),
    cluster(0.3, 3.9, -0.5, 72, 0.76),
];

/// One placed canopy leaf. `rotation` is XYZ Euler in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafInstance {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
    pub color_index: u8,
    /// Persistent wind-sway phase in [0, 2π).
    pub phase: f32,
}

/// Scatter leaves through `clusters`, `density_scale` times each cluster's density.
///
/// Radii use a cube root so leaves fill the volume evenly instead of bunching at
/// the centre; the vertical axis is flattened to keep clusters cloud-shaped.
pub fn generate_leaf_clusters<R: Rng>(rng: &mut R, clusters: &[LeafCluster], density_scale: f32) -> Vec<LeafInstance> {
    let total: u32 = clusters.iter().map(|c| c.density).sum();
    let mut leaves = Vec::with_capacity((total as f32 * density_scale.max(0.0)) as usize);

    for cluster in clusters {
        let count = (cluster.density as f32 * density_scale.max(0.0)).round() as u32;
        for _ in 0..count {
            let phi = rng.gen::<f32>() * TAU;
            let theta = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
            let r = cluster.radius * rng.gen::<f32>().cbrt();

            let offset = Vec3::new(
                r * theta.sin() * phi.cos(),
                r * theta.sin() * phi.sin() * 0.6,
                r * theta.cos(),
            );
            let position = cluster.center + offset;

            let rotation = Vec3::new(
                (rng.gen::<f32>() - 0.5) * 0.6 + 0.3,
                offset.z.atan2(offset.x) + PI,
                (rng.gen::<f32>() - 0.5) * 0.8,
            );

            leaves.push(LeafInstance {
                position,
                rotation,
                scale: 0.12 + rng.gen::<f32>() * 0.08,
                color_index: rng.gen_range(0..LEAF_COLORS.len() as u8),
                phase: rng.gen::<f32>() * TAU,
            });
        }
    }
    leaves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_is_closed_loop_without_duplicate() {
        let outline = leaf_outline(&LeafStyle::canopy());
        assert_eq!(outline.len(), 32);
        assert!(outline[0].length() < 1e-6);
        let tip = outline.iter().fold(0.0_f32, |h, p| h.max(p.y));
        assert!((tip - 1.0).abs() < 0.02);
    }

    #[test]
    fn leaf_faces_forward_and_curls() {
        let leaf = generate_leaf(&LeafStyle::canopy());
        assert!(leaf.is_well_formed() && leaf.is_finite());
        let avg = leaf.normals.iter().copied().sum::<Vec3>() / leaf.vertex_count() as f32;
        assert!(avg.z > 0.5, "leaf normals should face +Z, got {:?}", avg);
        let (min, max) = leaf.bounds();
        assert!(max.z - min.z > 0.05);
    }

    #[test]
    fn cluster_leaves_stay_inside_their_sphere() {
        let mut rng = StdRng::seed_from_u64(9);
        let leaves = generate_leaf_clusters(&mut rng, &CANOPY_CLUSTERS[..2], 1.0);
        assert_eq!(leaves.len(), 170 + 180);
        for leaf in &leaves[..170] {
            let d = leaf.position - CANOPY_CLUSTERS[0].center;
            assert!(d.length() <= CANOPY_CLUSTERS[0].radius + 1e-4);
            assert!(leaf.phase >= 0.0 && leaf.phase < TAU);
            assert!(leaf.scale >= 0.12 && leaf.scale <= 0.2);
        }
    }

    #[test]
    fn density_scale_thins_the_canopy() {
        let mut rng = StdRng::seed_from_u64(1);
        let full: u32 = CANOPY_CLUSTERS.iter().map(|c| c.density).sum();
        let half = generate_leaf_clusters(&mut rng, &CANOPY_CLUSTERS, 0.5);
        assert!((half.len() as i64 - (full / 2) as i64).abs() < CANOPY_CLUSTERS.len() as i64);
    }
}
