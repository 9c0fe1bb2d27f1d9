//! Indexed triangle mesh data produced by every generator.

use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// Vectors shorter than this are never normalised.
pub const NORMAL_EPSILON: f32 = 1e-6;

/// CPU-side surface data: positions, normals, uvs and triangle indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        index
    }

    /// Recompute smooth vertex normals from area-weighted face normals.
    ///
    /// Vertices whose accumulated normal is degenerate keep their previous normal.
    pub fn compute_vertex_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let face = (self.positions[b] - self.positions[a]).cross(self.positions[c] - self.positions[a]);
            accumulated[a] += face;
            accumulated[b] += face;
            accumulated[c] += face;
        }
        self.normals.resize(self.positions.len(), Vec3::Y);
        for (normal, sum) in self.normals.iter_mut().zip(accumulated) {
            if let Some(n) = safe_normalize(sum) {
                *normal = n;
            }
        }
    }

    /// Every position, normal and uv component is finite.
    pub fn is_finite(&self) -> bool {
        self.positions.iter().all(|p| p.is_finite())
            && self.normals.iter().all(|n| n.is_finite())
            && self.uvs.iter().all(|uv| uv.is_finite())
    }

    /// Indices reference existing vertices and form whole triangles.
    pub fn is_well_formed(&self) -> bool {
        let count = self.positions.len() as u32;
        self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| i < count)
            && self.normals.len() == self.positions.len()
            && self.uvs.len() == self.positions.len()
    }

    /// Axis-aligned bounds as (min, max).
    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.positions.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), p| (min.min(*p), max.max(*p)),
        )
    }

    /// Append another mesh, offsetting its indices.
    pub fn append(&mut self, other: &MeshData) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.uvs.extend_from_slice(&other.uvs);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }
}

/// Normalise unless the vector is too short to have a meaningful direction.
pub fn safe_normalize(v: Vec3) -> Option<Vec3> {
    let len = v.length();
    if len > NORMAL_EPSILON && len.is_finite() {
        Some(v / len)
    } else {
        None
    }
}

/// Triangle indices for a `(rows + 1) x (cols + 1)` vertex grid laid out row-major.
pub fn grid_indices(rows: u32, cols: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity((rows * cols * 6) as usize);
    for i in 0..rows {
        for j in 0..cols {
            let a = i * (cols + 1) + j;
            let b = a + cols + 1;
            let c = a + 1;
            let d = b + 1;
            indices.extend_from_slice(&[a, b, c, c, b, d]);
        }
    }
    indices
}

/// UV sphere with poles on the Y axis; degenerate pole triangles are skipped.
pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut mesh = MeshData::with_capacity(
        ((width_segments + 1) * (height_segments + 1)) as usize,
        (width_segments * height_segments * 6) as usize,
    );

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let dir = Vec3::new(
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            );
            mesh.push_vertex(dir * radius, dir, Vec2::new(u, 1.0 - v));
        }
    }

    let stride = width_segments + 1;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * stride + ix + 1;
            let b = iy * stride + ix;
            let c = (iy + 1) * stride + ix;
            let d = (iy + 1) * stride + ix + 1;
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_is_well_formed_and_unit() {
        let sphere = uv_sphere(1.0, 16, 12);
        assert!(sphere.is_well_formed());
        assert_eq!(sphere.vertex_count(), 17 * 13);
        for p in &sphere.positions {
            assert!((p.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn recomputed_sphere_normals_point_outward() {
        let mut sphere = uv_sphere(2.0, 24, 16);
        sphere.compute_vertex_normals();
        for (p, n) in sphere.positions.iter().zip(&sphere.normals) {
            assert!(n.dot(p.normalize()) > 0.9);
        }
    }

    #[test]
    fn degenerate_vectors_are_not_normalised() {
        assert!(safe_normalize(Vec3::ZERO).is_none());
        assert!(safe_normalize(Vec3::splat(1e-9)).is_none());
        assert_eq!(safe_normalize(Vec3::new(0.0, 3.0, 0.0)), Some(Vec3::Y));
    }

    #[test]
    fn grid_indices_cover_every_quad() {
        let indices = grid_indices(2, 3);
        assert_eq!(indices.len(), 2 * 3 * 6);
        assert!(indices.iter().all(|&i| i < 3 * 4));
    }
}
