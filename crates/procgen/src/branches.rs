//! Branch topology: primary scaffolds, secondaries and twigs as bent Bézier tubes.

use crate::curve::{Curve3, QuadraticBezier};
use crate::mesh::MeshData;
use crate::textures::hex_rgb;
use crate::tube::{sweep_tube, TubeParams};
use glam::Vec3;
use rand::prelude::*;
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    Primary,
    Secondary,
    Twig,
}

impl BranchKind {
    /// Rings along the tube.
    pub fn tubular_segments(self) -> u32 {
        match self {
            BranchKind::Primary => 16,
            BranchKind::Secondary => 12,
            BranchKind::Twig => 8,
        }
    }

    /// How strongly the midpoint is pulled along the rise of the segment.
    fn bend(self) -> f32 {
        match self {
            BranchKind::Primary => 0.2,
            BranchKind::Secondary => 0.25,
            BranchKind::Twig => 0.15,
        }
    }
}

/// One scaffold row: attachment height on the trunk, heading, elevation, length, base radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaffold {
    pub height: f32,
    pub angle: f32,
    pub elevation: f32,
    pub length: f32,
    pub radius: f32,
}

pub const PRIMARY_SCAFFOLDS: [Scaffold; 6] = [
    Scaffold { height: 3.2, angle: PI * 0.25, elevation: 0.6, length: 2.2, radius: 0.12 },
    Scaffold { height: 3.0, angle: PI * 0.75, elevation: 0.55, length: 2.0, radius: 0.11 },
    Scaffold { height: 3.4, angle: PI * 1.25, elevation: 0.5, length: 2.3, radius: 0.13 },
    Scaffold { height: 3.1, angle: PI * 1.75, elevation: 0.6, length: 2.1, radius: 0.11 },
    Scaffold { height: 3.6, angle: PI * 0.5, elevation: 0.7, length: 1.8, radius: 0.09 },
    Scaffold { height: 3.5, angle: PI * 1.5, elevation: 0.65, length: 1.9, radius: 0.1 },
];

/// A single branch segment ready for meshing.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSegment {
    pub kind: BranchKind,
    pub curve: QuadraticBezier,
    pub radius_start: f32,
    pub radius_end: f32,
    /// Heading in the XZ plane, radians.
    pub angle: f32,
    /// Bark tint with a small per-branch brightness variation.
    pub color: Vec3,
    pub roughness: f32,
}

impl BranchSegment {
    pub fn end(&self) -> Vec3 {
        self.curve.end
    }

    pub fn tube_params(&self) -> TubeParams {
        TubeParams::tapered(self.kind.tubular_segments(), self.radius_start, self.radius_end)
    }

    pub fn mesh(&self) -> MeshData {
        sweep_tube(&self.curve, &self.tube_params())
    }
}

const BRANCH_BARK: u32 = 0x4a3828;

fn bent_curve<R: Rng>(rng: &mut R, start: Vec3, end: Vec3, bend: f32) -> QuadraticBezier {
    let mut mid = start.lerp(end, 0.5);
    mid.y += (end.y - start.y) * bend * (0.5 + rng.gen::<f32>() * 0.5);
    mid.x += (rng.gen::<f32>() - 0.5) * 0.3;
    mid.z += (rng.gen::<f32>() - 0.5) * 0.3;
    QuadraticBezier::new(start, mid, end)
}

fn segment<R: Rng>(rng: &mut R, kind: BranchKind, start: Vec3, end: Vec3, radii: (f32, f32), angle: f32) -> BranchSegment {
    let curve = bent_curve(rng, start, end, kind.bend());
    BranchSegment {
        kind,
        curve,
        radius_start: radii.0,
        radius_end: radii.1,
        angle,
        color: hex_rgb(BRANCH_BARK) * (0.95 + rng.gen::<f32>() * 0.1),
        roughness: 0.85 + rng.gen::<f32>() * 0.1,
    }
}

/// Parametric point drawn inside slot `index` of `count` slots spanning `[from, from + span)`.
fn slot_parameter<R: Rng>(rng: &mut R, index: usize, count: usize, from: f32, span: f32) -> f32 {
    let width = span / count as f32;
    from + width * index as f32 + rng.gen::<f32>() * width
}

/// Build the full branch hierarchy: every primary, then its secondaries, each followed
/// by its twigs.
pub fn generate_branch_structure<R: Rng>(rng: &mut R) -> Vec<BranchSegment> {
    let mut branches = Vec::with_capacity(PRIMARY_SCAFFOLDS.len() * 7);

    for scaffold in &PRIMARY_SCAFFOLDS {
        let start = Vec3::new(0.0, scaffold.height, 0.0);
        let end = start
            + Vec3::new(
                scaffold.angle.cos() * scaffold.length,
                scaffold.elevation.sin() * scaffold.length * 0.5,
                scaffold.angle.sin() * scaffold.length,
            );
        let primary = segment(
            rng,
            BranchKind::Primary,
            start,
            end,
            (scaffold.radius, scaffold.radius * 0.4),
            scaffold.angle,
        );
        let primary_curve = primary.curve;
        branches.push(primary);

        let secondaries = rng.gen_range(1..=2);
        for i in 0..secondaries {
            let t = slot_parameter(rng, i, secondaries, 0.4, 0.5);
            let origin = primary_curve.point_at(t);
            let angle = scaffold.angle + (rng.gen::<f32>() - 0.5) * PI * 0.6;
            let length = scaffold.length * (0.5 + rng.gen::<f32>() * 0.3);
            let elevation = scaffold.elevation * (0.7 + rng.gen::<f32>() * 0.4);
            let end = origin
                + Vec3::new(
                    angle.cos() * length,
                    elevation.sin() * length * 0.4,
                    angle.sin() * length,
                );
            let secondary = segment(
                rng,
                BranchKind::Secondary,
                origin,
                end,
                (scaffold.radius * 0.45, scaffold.radius * 0.12),
                angle,
            );
            let secondary_curve = secondary.curve;
            branches.push(secondary);

            let twigs = rng.gen_range(1..=2);
            for j in 0..twigs {
                let tt = slot_parameter(rng, j, twigs, 0.5, 0.4);
                let origin = secondary_curve.point_at(tt);
                let twig_angle = angle + (rng.gen::<f32>() - 0.5) * PI * 0.8;
                let twig_length = length * (0.3 + rng.gen::<f32>() * 0.3);
                let end = origin
                    + Vec3::new(
                        twig_angle.cos() * twig_length,
                        rng.gen::<f32>() * 0.3 * twig_length,
                        twig_angle.sin() * twig_length,
                    );
                branches.push(segment(
                    rng,
                    BranchKind::Twig,
                    origin,
                    end,
                    (scaffold.radius * 0.15, scaffold.radius * 0.03),
                    twig_angle,
                ));
            }
        }
    }

    branches
}

/// Mesh every segment into one combined surface.
pub fn branch_mesh(branches: &[BranchSegment]) -> MeshData {
    let mut mesh = MeshData::default();
    for branch in branches {
        mesh.append(&branch.mesh());
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(branches: &[BranchSegment], kind: BranchKind) -> usize {
        branches.iter().filter(|b| b.kind == kind).count()
    }

    #[test]
    fn hierarchy_has_expected_fan_out() {
        let mut rng = StdRng::seed_from_u64(3);
        let branches = generate_branch_structure(&mut rng);
        let primaries = count(&branches, BranchKind::Primary);
        let secondaries = count(&branches, BranchKind::Secondary);
        let twigs = count(&branches, BranchKind::Twig);
        assert_eq!(primaries, 6);
        assert!((6..=12).contains(&secondaries));
        assert!(twigs >= secondaries && twigs <= secondaries * 2);
        assert_eq!(branches[0].kind, BranchKind::Primary);
    }

    #[test]
    fn children_start_on_their_parent() {
        let mut rng = StdRng::seed_from_u64(11);
        let branches = generate_branch_structure(&mut rng);
        let mut parent: Option<&BranchSegment> = None;
        for b in &branches {
            match b.kind {
                BranchKind::Primary => {
                    assert_eq!(b.curve.start.x, 0.0);
                    parent = Some(b);
                }
                BranchKind::Secondary => {
                    let p = parent.map(|p| p.curve).unwrap_or(b.curve);
                    let closest = (0..=100)
                        .map(|i| p.point(i as f32 / 100.0).distance(b.curve.start))
                        .fold(f32::MAX, f32::min);
                    assert!(closest < 0.05);
                }
                BranchKind::Twig => assert!(b.radius_start < b.radius_end * 6.0),
            }
        }
    }

    #[test]
    fn same_seed_same_structure() {
        let a = generate_branch_structure(&mut StdRng::seed_from_u64(5));
        let b = generate_branch_structure(&mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn combined_mesh_is_finite() {
        let mut rng = StdRng::seed_from_u64(8);
        let branches = generate_branch_structure(&mut rng);
        let mesh = branch_mesh(&branches);
        assert!(mesh.is_finite() && mesh.is_well_formed());
    }
}
