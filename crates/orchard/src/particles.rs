//! Pollen motes drifting up around the tree.

use glam::Vec3;
use rand::prelude::*;
use std::f32::consts::{PI, TAU};

pub const PARTICLE_COUNT: usize = 200;
/// Motes above this height start again from the ground.
pub const CEILING: f32 = 12.0;
/// Horizontal distance beyond which motes are pulled back in.
pub const CONTAINMENT_RADIUS: f32 = 15.0;
const PULL_IN: f32 = 0.9;
pub const PARTICLE_COLOR: u32 = 0xf5a8b8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    /// Units per second.
    pub velocity: Vec3,
    pub size: f32,
}

#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
}

impl ParticleField {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self::with_count(rng, PARTICLE_COUNT)
    }

    pub fn with_count<R: Rng>(rng: &mut R, count: usize) -> Self {
        let particles = (0..count)
            .map(|_| {
                let radius = 5.0 + rng.gen::<f32>() * 10.0;
                let theta = rng.gen::<f32>() * TAU;
                let phi = rng.gen::<f32>() * PI;
                Particle {
                    position: Vec3::new(
                        radius * phi.sin() * theta.cos(),
                        rng.gen::<f32>() * 10.0,
                        radius * phi.sin() * theta.sin(),
                    ),
                    velocity: Vec3::new(
                        (rng.gen::<f32>() - 0.5) * 0.6,
                        0.3 + rng.gen::<f32>() * 0.6,
                        (rng.gen::<f32>() - 0.5) * 0.6,
                    ),
                    size: 0.02 + rng.gen::<f32>() * 0.05,
                }
            })
            .collect();
        Self { particles }
    }

    /// Drift every mote by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.position += p.velocity * dt;
            if p.position.y > CEILING {
                p.position.y = 0.0;
            }
            let horizontal = Vec3::new(p.position.x, 0.0, p.position.z).length();
            if horizontal > CONTAINMENT_RADIUS {
                p.position.x *= PULL_IN;
                p.position.z *= PULL_IN;
            }
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawns_inside_the_shell() {
        let field = ParticleField::new(&mut StdRng::seed_from_u64(1));
        assert_eq!(field.len(), PARTICLE_COUNT);
        for p in field.particles() {
            assert!(p.position.length() <= 15.0 + 10.0);
            assert!((0.0..10.0).contains(&p.position.y));
            assert!(p.velocity.y >= 0.3 && p.velocity.y <= 0.9);
        }
    }

    #[test]
    fn motes_wrap_at_the_ceiling() {
        let mut field = ParticleField::with_count(&mut StdRng::seed_from_u64(2), 1);
        field.particles[0] = Particle {
            position: Vec3::new(1.0, 11.9, 0.0),
            velocity: Vec3::new(0.0, 0.6, 0.0),
            size: 0.05,
        };
        field.update(0.5);
        assert_eq!(field.particles()[0].position.y, 0.0);
    }

    #[test]
    fn motes_stay_contained() {
        let mut field = ParticleField::new(&mut StdRng::seed_from_u64(3));
        for _ in 0..6000 {
            field.update(1.0 / 60.0);
        }
        for p in field.particles() {
            let horizontal = Vec3::new(p.position.x, 0.0, p.position.z).length();
            assert!(horizontal <= CONTAINMENT_RADIUS + 0.1);
            assert!(p.position.y <= CEILING);
        }
    }
}
