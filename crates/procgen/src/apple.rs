//! Apple fruit surfaces: body, stem and stem leaf.
//!
//! Each body starts from a unit UV sphere and is displaced into an oblate,
//! five-lobed apple with a stem cavity on top and a shallow calyx dimple below.
//! A per-instance phase seed drives a cheap trigonometric noise field so no two
//! apples share the same silhouette.

use crate::curve::CatmullRom;
use crate::leaf::{generate_leaf, LeafStyle};
use crate::mesh::{uv_sphere, MeshData};
use crate::tube::{sweep_tube, TubeParams};
use glam::Vec3;
use rand::prelude::*;

/// Parameters for [`generate_apple`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppleConfig {
    pub seed: u64,
    pub width_segments: u32,
    pub height_segments: u32,
    /// Vertical squash applied before any indenting.
    pub flatten: f32,
    /// Depth of the stem cavity.
    pub stem_indent: f32,
    /// Depth of the calyx dimple at the bottom.
    pub bottom_indent: f32,
    /// Amplitude of the five-fold lobe perturbation.
    pub lobe_amplitude: f32,
    /// Amplitude of the large-scale asymmetry noise.
    pub asymmetry: f32,
    /// Amplitude of the micro-surface noise.
    pub surface_noise: f32,
}

impl Default for AppleConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            width_segments: 64,
            height_segments: 64,
            flatten: 0.82,
            stem_indent: 0.35,
            bottom_indent: 0.12,
            lobe_amplitude: 0.025,
            asymmetry: 0.025,
            surface_noise: 0.008,
        }
    }
}

impl AppleConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }
}

/// Three-sinusoid noise field with a phase seed.
#[derive(Debug, Clone, Copy)]
struct TrigNoise {
    phase: f32,
}

impl TrigNoise {
    fn sample(&self, p: Vec3, freq: f32) -> f32 {
        let s = self.phase;
        (p.x * freq + s).sin() * (p.y * freq + s * 0.7).cos() * (p.z * freq + s * 1.3).sin()
    }
}

/// Generate an apple body of unit-ish radius.
pub fn generate_apple(config: &AppleConfig) -> MeshData {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = TrigNoise {
        phase: rng.gen::<f32>() * 1000.0,
    };

    let mut mesh = uv_sphere(1.0, config.width_segments, config.height_segments);
    for p in mesh.positions.iter_mut() {
        *p = displace(*p, config, &noise);
    }
    mesh.compute_vertex_normals();
    mesh
}

fn displace(p: Vec3, config: &AppleConfig, noise: &TrigNoise) -> Vec3 {
    let (mut x, mut y, mut z) = (p.x, p.y * config.flatten, p.z);
    let dist_from_axis = (x * x + z * z).sqrt();

    if y > 0.25 {
        let top = y - 0.25;
        y -= top * top;
        y -= (-dist_from_axis * dist_from_axis * 10.0).exp() * config.stem_indent;
        // Shoulder ridge around the cavity.
        y += (-(dist_from_axis - 0.15).powi(2) * 40.0).exp() * 0.03;
    }

    if y < -0.5 {
        y += (-dist_from_axis * dist_from_axis * 5.0).exp() * config.bottom_indent;
    }

    let asym = noise.sample(Vec3::new(x, y, z), 3.0) * config.asymmetry;
    x += asym;
    z += asym * 0.8;

    let angle = z.atan2(x);
    let lobe = 1.0 + (angle * 5.0).sin() * config.lobe_amplitude * (1.0 - y.abs());
    x *= lobe;
    z *= lobe;

    let surface = noise.sample(Vec3::new(x, y, z) * 15.0, 1.0) * config.surface_noise;
    let v = Vec3::new(x, y, z);
    let len = v.length();
    if len > 0.01 {
        v + v / len * surface
    } else {
        v
    }
}

/// Slightly crooked stem rising 0.2 units from the cavity.
pub fn generate_stem() -> MeshData {
    let curve = CatmullRom::new(vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.008, 0.05, 0.004),
        Vec3::new(-0.003, 0.1, 0.008),
        Vec3::new(0.006, 0.15, 0.003),
        Vec3::new(0.002, 0.2, -0.002),
    ]);
    sweep_tube(&curve, &TubeParams::uniform(16, 0.015, 8))
}

/// The small leaf attached to the stem.
pub fn generate_stem_leaf() -> MeshData {
    generate_leaf(&LeafStyle::stem())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(seed: u64) -> AppleConfig {
        AppleConfig {
            width_segments: 24,
            height_segments: 24,
            ..AppleConfig::with_seed(seed)
        }
    }

    #[test]
    fn same_seed_same_vertices() {
        let a = generate_apple(&small(42));
        let b = generate_apple(&small(42));
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.normals, b.normals);
    }

    #[test]
    fn different_seed_different_vertices() {
        let a = generate_apple(&small(1));
        let b = generate_apple(&small(2));
        assert_ne!(a.positions, b.positions);
    }

    #[test]
    fn apple_vertices_are_finite() {
        for seed in 0..8 {
            let apple = generate_apple(&small(seed));
            assert!(apple.is_finite(), "seed {} produced non-finite data", seed);
            assert!(apple.is_well_formed());
        }
    }

    #[test]
    fn apple_is_oblate_with_stem_cavity() {
        let apple = generate_apple(&AppleConfig::with_seed(7));
        let (min, max) = apple.bounds();
        let height = max.y - min.y;
        let width = max.x - min.x;
        assert!(height < width, "apple should be wider than tall");
        // The top pole sits below the shoulder because of the cavity.
        let top_pole = apple.positions[0];
        assert!(top_pole.y < max.y - 0.1);
    }

    #[test]
    fn stem_and_leaf_are_usable() {
        let stem = generate_stem();
        assert!(stem.is_finite() && stem.is_well_formed());
        let (_, max) = stem.bounds();
        assert!(max.y > 0.18);
        let leaf = generate_stem_leaf();
        assert!(leaf.is_finite() && leaf.triangle_count() > 0);
    }
}
