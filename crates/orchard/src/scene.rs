//! The tree scene: static geometry, fruit entities and everything that moves each frame.

use crate::animation::{leaf_wind, tree_breathing};
use crate::config::AppConfig;
use crate::fruit::{refresh_ripeness, spawn_fruit, update_fruit, FruitNode, StemMeshes};
use crate::intro::IntroSequence;
use crate::letters::LetterSet;
use crate::particles::ParticleField;
use crate::store::Store;
use chrono::NaiveDateTime;
use engine_core::{FrameTime, Transform};
use hecs::World;
use procgen::{
    branch_mesh, generate_branch_structure, generate_collar, generate_leaf, generate_leaf_clusters, generate_roots,
    generate_trunk, BarkTextureGenerator, BarkTextures, BranchSegment, LeafInstance, LeafStyle, MeshData,
    CANOPY_CLUSTERS,
};
use rand::prelude::*;
use std::path::{Path, PathBuf};

/// Static tree geometry, generated once.
#[derive(Debug, Clone)]
pub struct TreeGeometry {
    pub trunk: MeshData,
    pub collar: MeshData,
    pub roots: Vec<MeshData>,
    pub branches: Vec<BranchSegment>,
    /// Every branch tube merged into one mesh.
    pub branch_mesh: MeshData,
    /// Shared canopy leaf, instanced at every [`LeafInstance`].
    pub leaf: MeshData,
    pub leaves: Vec<LeafInstance>,
    pub bark: BarkTextures,
}

impl TreeGeometry {
    pub fn generate(seed: u64, leaf_density: f32) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let roots = generate_roots(&mut rng).iter().map(|r| r.mesh()).collect();
        let branches = generate_branch_structure(&mut rng);
        let leaves = generate_leaf_clusters(&mut rng, &CANOPY_CLUSTERS, leaf_density);
        let bark = BarkTextureGenerator::new(rng.gen()).generate();
        log::info!(
            "Generated tree: {} branches, {} leaves",
            branches.len(),
            leaves.len()
        );
        Self {
            trunk: generate_trunk(),
            collar: generate_collar(),
            roots,
            branch_mesh: branch_mesh(&branches),
            branches,
            leaf: generate_leaf(&LeafStyle::canopy()),
            leaves,
            bark,
        }
    }
}

pub struct TreeScene {
    store: Store,
    seed: u64,
    leaf_density: f32,
    geometry: Option<TreeGeometry>,
    world: World,
    intro: IntroSequence,
    particles: ParticleField,
    tree_transform: Transform,
    leaf_poses: Vec<Transform>,
    time: f32,
}

impl TreeScene {
    pub fn new(store: Store, config: &AppConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed ^ 0x9e37_79b9);
        Self {
            store,
            seed: config.seed,
            leaf_density: config.leaf_density,
            geometry: None,
            world: World::new(),
            intro: IntroSequence::new(),
            particles: ParticleField::new(&mut rng),
            tree_transform: Transform::default(),
            leaf_poses: Vec::new(),
            time: 0.0,
        }
    }

    /// Generate the tree and hang one fruit per letter.
    pub fn build(&mut self, letters: &LetterSet, now: NaiveDateTime) {
        let geometry = TreeGeometry::generate(self.seed, self.leaf_density);
        self.leaf_poses = geometry.leaves.iter().map(|l| leaf_wind(0.0, l)).collect();
        self.geometry = Some(geometry);

        self.world.clear();
        let stems = StemMeshes::generate();
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(1));
        for letter in letters.iter() {
            spawn_fruit(&mut self.world, letter.clone(), now, rng.gen(), &stems);
        }
        log::info!("Scene built with {} fruit", letters.len());
    }

    pub fn is_built(&self) -> bool {
        self.geometry.is_some()
    }

    /// Per-frame hook. Before [`build`](Self::build) only the intro clock runs.
    pub fn update(&mut self, frame: &FrameTime) {
        let ready = self.is_built();
        self.intro.update(frame.elapsed, ready, &self.store);
        if !ready {
            return;
        }
        self.time = frame.elapsed_seconds();

        self.tree_transform = match self.intro.tree_transform() {
            Some(growing) => growing,
            None if self.intro.is_complete() => tree_breathing(self.time),
            None => Transform::default(),
        };

        if let Some(geometry) = &self.geometry {
            for (pose, leaf) in self.leaf_poses.iter_mut().zip(&geometry.leaves) {
                *pose = leaf_wind(self.time, leaf);
            }
        }
        update_fruit(&mut self.world, &self.store, self.time);
        self.particles.update(frame.delta_seconds());
    }

    /// Re-check which fruit are ripe. Returns ids that ripened since the last check.
    pub fn refresh_ripeness(&mut self, now: NaiveDateTime) -> Vec<String> {
        let ripened = refresh_ripeness(&mut self.world, now);
        for id in &ripened {
            log::info!("Letter `{}` has ripened", id);
        }
        ripened
    }

    /// Write the bark maps as PNGs into `dir`. Does nothing before [`build`](Self::build).
    pub fn export_textures(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let Some(geometry) = &self.geometry else {
            return Ok(Vec::new());
        };
        std::fs::create_dir_all(dir)?;
        let color = dir.join("bark_color.png");
        let bump = dir.join("bark_bump.png");
        geometry.bark.color.save_png(&color)?;
        geometry.bark.bump.save_png(&bump)?;
        Ok(vec![color, bump])
    }

    pub fn geometry(&self) -> Option<&TreeGeometry> {
        self.geometry.as_ref()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn tree_transform(&self) -> Transform {
        self.tree_transform
    }

    pub fn leaf_poses(&self) -> &[Transform] {
        &self.leaf_poses
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn intro(&self) -> &IntroSequence {
        &self.intro
    }

    /// Scene time of the last update, in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Fruit sorted by id, with current pose and ripeness.
    pub fn fruit_poses(&self) -> Vec<(String, Transform, bool)> {
        let mut fruit: Vec<_> = self
            .world
            .query::<(&FruitNode, &Transform)>()
            .iter()
            .map(|(_, (node, t))| (node.letter.id.clone(), *t, node.unlocked))
            .collect();
        fruit.sort_by(|a, b| a.0.cmp(&b.0));
        fruit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::letters::tests::letter;
    use chrono::NaiveDate;
    use engine_core::Time;
    use std::time::Duration;

    fn letters() -> LetterSet {
        LetterSet::new(vec![letter("a", true, "2024-01-01"), letter("b", true, "2040-01-01")]).unwrap()
    }

    fn today() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap()
    }

    fn config() -> AppConfig {
        AppConfig {
            leaf_density: 0.05,
            ..Default::default()
        }
    }

    #[test]
    fn update_before_build_leaves_visuals_alone() {
        let store = Store::new();
        let mut scene = TreeScene::new(store.clone(), &config());
        let mut time = Time::new();
        let before: Vec<_> = scene.particles().particles().to_vec();
        for _ in 0..10 {
            scene.update(&time.advance(Duration::from_millis(16)));
        }
        assert!(!scene.is_built());
        assert_eq!(scene.particles().particles(), before.as_slice());
        assert_eq!(scene.tree_transform(), Transform::default());
    }

    #[test]
    fn build_spawns_fruit_and_geometry() {
        let mut scene = TreeScene::new(Store::new(), &config());
        scene.build(&letters(), today());
        let geometry = scene.geometry().unwrap();
        assert_eq!(geometry.roots.len(), 8);
        assert!(geometry.trunk.is_finite() && geometry.branch_mesh.is_finite());
        assert_eq!(scene.leaf_poses().len(), geometry.leaves.len());

        let fruit = scene.fruit_poses();
        assert_eq!(fruit.len(), 2);
        assert!(fruit[0].2 && !fruit[1].2);

        let dir = std::env::temp_dir().join("memory_tree_scene_textures");
        let written = scene.export_textures(&dir).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|p| p.exists()));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn intro_runs_through_the_scene() {
        let store = Store::new();
        let mut scene = TreeScene::new(store.clone(), &config());
        scene.build(&letters(), today());
        let mut time = Time::new();
        scene.update(&time.advance(Duration::from_millis(100)));
        assert_eq!(scene.tree_transform().scale, glam::Vec3::ZERO);
        for _ in 0..20 {
            scene.update(&time.advance(Duration::from_millis(160)));
        }
        assert!(store.intro_complete());
        assert!((scene.tree_transform().scale.y - 1.0).abs() <= 0.02);
    }
}
