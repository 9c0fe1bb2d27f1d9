//! Fruit entities: what hangs on the tree, how it reacts to the pointer, and the
//! fall when picked.

use crate::animation::{fruit_phase, fruit_sway, glow_opacity};
use crate::letters::{Letter, STEM_LEAF_COLOR};
use crate::reveal::RevealOrchestrator;
use crate::store::Store;
use crate::unlock::{is_unlocked, ripens_on};
use chrono::NaiveDateTime;
use engine_core::{Ease, Transform, Tween};
use glam::Vec3;
use hecs::{Entity, World};
use procgen::{generate_apple, generate_stem, generate_stem_leaf, hex_rgb, AppleConfig, MeshData};
use rand::prelude::*;
use std::sync::Arc;

/// Distance a picked fruit drops.
pub const FALL_DISTANCE: f32 = 5.0;
pub const FALL_DURATION: f32 = 0.9;
/// Scale a picked fruit shrinks to by the end of its drop.
pub const FALL_SCALE: f32 = 0.6;

/// A fruit's letter and ripeness.
#[derive(Debug, Clone)]
pub struct FruitNode {
    pub letter: Arc<Letter>,
    pub unlocked: bool,
    pub phase: f32,
}

impl FruitNode {
    pub fn new(letter: Arc<Letter>, now: NaiveDateTime) -> Self {
        Self {
            unlocked: is_unlocked(&letter, now),
            phase: fruit_phase(&letter.id),
            letter,
        }
    }

    pub fn rest_position(&self) -> Vec3 {
        self.letter.position()
    }

    pub fn body_color(&self) -> Vec3 {
        self.letter.body_color(self.unlocked)
    }

    pub fn glow_color(&self) -> Vec3 {
        self.letter.glow_color(self.unlocked)
    }

    pub fn stem_color(&self) -> Vec3 {
        hex_rgb(self.letter.palette().stem)
    }
}

/// Pointer and pick state.
#[derive(Debug, Clone, Default)]
pub struct FruitInteraction {
    /// Highlighted by the pointer; ripe fruit only.
    pub hovered: bool,
    /// The pointer is over the fruit, ripe or not.
    pub pointer_over: bool,
    pub fall: Option<FallAnimation>,
    /// Aura opacity for this frame.
    pub glow: f32,
}

/// Geometry of one fruit. The stem and its leaf are shared by every fruit.
#[derive(Debug, Clone)]
pub struct FruitMeshes {
    pub body: Arc<MeshData>,
    pub stem: Arc<MeshData>,
    pub stem_leaf: Arc<MeshData>,
}

/// The parts a fruit is drawn from, placed relative to the fruit's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FruitPart {
    Body,
    Stem,
    StemLeaf,
    /// Back-facing aura sphere.
    Glow,
    /// Soft contact shadow under the body.
    Shadow,
    /// Waxy specular spots, ripe fruit only.
    Highlight(u8),
}

impl FruitPart {
    pub fn local_transform(self) -> Transform {
        match self {
            FruitPart::Body => Transform::default().with_scale(Vec3::splat(0.16)),
            FruitPart::Stem => Transform::from_position(Vec3::new(0.0, 0.1, 0.0)),
            FruitPart::StemLeaf => {
                Transform::from_parts(Vec3::new(0.02, 0.18, 0.01), Vec3::new(0.25, 0.6, -0.35), 0.14)
            }
            FruitPart::Glow => Transform::default().with_scale(Vec3::splat(0.21)),
            FruitPart::Shadow => Transform::from_parts(
                Vec3::new(0.0, -0.13, 0.0),
                Vec3::new(-std::f32::consts::FRAC_PI_2, 0.0, 0.0),
                0.09,
            ),
            FruitPart::Highlight(0) => {
                Transform::from_position(Vec3::new(-0.035, 0.055, 0.11)).with_scale(Vec3::new(0.032, 0.042, 0.018))
            }
            FruitPart::Highlight(1) => {
                Transform::from_position(Vec3::new(-0.055, 0.025, 0.095)).with_scale(Vec3::new(0.018, 0.022, 0.01))
            }
            FruitPart::Highlight(_) => {
                Transform::from_position(Vec3::new(0.08, -0.02, 0.08)).with_scale(Vec3::new(0.012, 0.015, 0.008))
            }
        }
    }

    /// Parts drawn for a fruit in the given ripeness.
    pub fn visible(unlocked: bool) -> Vec<FruitPart> {
        let mut parts = vec![
            FruitPart::Body,
            FruitPart::Stem,
            FruitPart::StemLeaf,
            FruitPart::Glow,
            FruitPart::Shadow,
        ];
        if unlocked {
            parts.extend((0..3).map(FruitPart::Highlight));
        }
        parts
    }

    pub fn color(self, node: &FruitNode) -> Vec3 {
        match self {
            FruitPart::Body => node.body_color(),
            FruitPart::Stem => node.stem_color(),
            FruitPart::StemLeaf => hex_rgb(STEM_LEAF_COLOR),
            FruitPart::Glow => node.glow_color(),
            FruitPart::Shadow => Vec3::ZERO,
            FruitPart::Highlight(_) => Vec3::ONE,
        }
    }

    /// Fixed opacity; the aura's is animated instead.
    pub fn opacity(self) -> f32 {
        match self {
            FruitPart::Shadow => 0.12,
            FruitPart::Highlight(0) => 0.55,
            FruitPart::Highlight(1) => 0.35,
            FruitPart::Highlight(_) => 0.2,
            FruitPart::Glow => 0.18,
            _ => 1.0,
        }
    }
}

/// One-shot drop of a picked fruit, in seconds since the click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallAnimation {
    /// Scene time of the click.
    pub started: f32,
    pub x: f32,
    pub z: f32,
    wobble: [Tween; 2],
    drift: [Tween; 2],
    drop: Tween,
    shrink: Tween,
}

impl FallAnimation {
    /// Start from the fruit's pose at the click; it ends `FALL_DISTANCE` below `rest_y`.
    pub fn new<R: Rng>(rng: &mut R, started: f32, from: &Transform, rest_y: f32) -> Self {
        let rot = from.euler();
        let wobble_x = rot.x + (rng.gen::<f32>() - 0.5) * 0.2;
        let wobble_z = rot.z + (rng.gen::<f32>() - 0.5) * 0.3;
        let drift_z = rot.z + (rng.gen::<f32>() - 0.5) * 0.5;
        let drift_x = rot.x + (rng.gen::<f32>() - 0.5) * 0.4;
        Self {
            started,
            x: from.position.x,
            z: from.position.z,
            wobble: [
                Tween::new(rot.x, wobble_x, 0.15, Ease::Power1Out),
                Tween::new(rot.z, wobble_z, 0.15, Ease::Power1Out),
            ],
            drift: [
                Tween::new(wobble_x, drift_x, FALL_DURATION, Ease::Power1In).with_delay(0.15),
                Tween::new(wobble_z, drift_z, FALL_DURATION, Ease::Power1In).with_delay(0.15),
            ],
            drop: Tween::new(from.position.y, rest_y - FALL_DISTANCE, FALL_DURATION, Ease::Power2In),
            shrink: Tween::new(from.scale.x, FALL_SCALE, 0.3, Ease::Power2In).with_delay(FALL_DURATION - 0.3),
        }
    }

    pub fn sample(&self, now: f32) -> Transform {
        let t = now - self.started;
        let (rx, rz) = if t < self.drift[0].delay {
            (self.wobble[0].sample(t), self.wobble[1].sample(t))
        } else {
            (self.drift[0].sample(t), self.drift[1].sample(t))
        };
        Transform::from_parts(
            Vec3::new(self.x, self.drop.sample(t), self.z),
            Vec3::new(rx, 0.0, rz),
            self.shrink.sample(t),
        )
    }

    pub fn is_finished(&self, now: f32) -> bool {
        let t = now - self.started;
        self.drift.iter().all(|tw| tw.is_finished(t)) && self.drop.is_finished(t) && self.shrink.is_finished(t)
    }
}

/// Pointer cursor requested by the fruit under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Auto,
    Pointer,
}

/// Stem geometry generated once and handed to every fruit.
#[derive(Debug, Clone)]
pub struct StemMeshes {
    pub stem: Arc<MeshData>,
    pub leaf: Arc<MeshData>,
}

impl StemMeshes {
    pub fn generate() -> Self {
        Self {
            stem: Arc::new(generate_stem()),
            leaf: Arc::new(generate_stem_leaf()),
        }
    }
}

/// Spawn one fruit for `letter`, with a body of its own.
pub fn spawn_fruit(world: &mut World, letter: Arc<Letter>, now: NaiveDateTime, seed: u64, stems: &StemMeshes) -> Entity {
    let body = generate_apple(&AppleConfig::with_seed(seed));
    let node = FruitNode::new(letter, now);
    let transform = Transform::from_position(node.rest_position());
    world.spawn((
        node,
        FruitInteraction::default(),
        FruitMeshes {
            body: Arc::new(body),
            stem: stems.stem.clone(),
            stem_leaf: stems.leaf.clone(),
        },
        transform,
    ))
}

pub fn find_fruit(world: &World, id: &str) -> Option<Entity> {
    world
        .query::<&FruitNode>()
        .iter()
        .find(|(_, node)| node.letter.id == id)
        .map(|(e, _)| e)
}

/// Pointer handling for fruit. Owns the cursor state.
pub struct FruitController {
    store: Store,
    cursor: Cursor,
    rng: StdRng,
}

impl FruitController {
    pub fn new(store: Store, seed: u64) -> Self {
        Self {
            store,
            cursor: Cursor::Auto,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Pointer entered the fruit. Only ripe fruit highlight.
    pub fn on_hover(&mut self, world: &mut World, id: &str) -> bool {
        let Some(entity) = find_fruit(world, id) else {
            return false;
        };
        let Ok((node, interaction)) = world.query_one_mut::<(&FruitNode, &mut FruitInteraction)>(entity) else {
            return false;
        };
        interaction.pointer_over = true;
        if !node.unlocked {
            return false;
        }
        interaction.hovered = true;
        self.store.set_hovered_fruit(Some(node.letter.id.clone()));
        self.cursor = Cursor::Pointer;
        true
    }

    pub fn on_hover_end(&mut self, world: &mut World, id: &str) {
        if let Some(entity) = find_fruit(world, id) {
            if let Ok(interaction) = world.query_one_mut::<&mut FruitInteraction>(entity) {
                interaction.hovered = false;
                interaction.pointer_over = false;
            }
        }
        self.store.set_hovered_fruit(None);
        self.cursor = Cursor::Auto;
    }

    /// Pick a ripe fruit once the intro has finished. Returns whether a reveal started.
    pub fn on_click(&mut self, world: &mut World, id: &str, now: f32, reveal: &mut RevealOrchestrator) -> bool {
        if !self.store.intro_complete() {
            return false;
        }
        let Some(entity) = find_fruit(world, id) else {
            log::debug!("Click on unknown fruit `{}`", id);
            return false;
        };
        let Ok((node, interaction, transform)) =
            world.query_one_mut::<(&FruitNode, &mut FruitInteraction, &Transform)>(entity)
        else {
            return false;
        };
        if !node.unlocked {
            return false;
        }

        reveal.select(node.letter.clone());
        if interaction.fall.is_none() {
            interaction.fall = Some(FallAnimation::new(&mut self.rng, now, transform, node.rest_position().y));
        }
        true
    }

    /// Tooltip text for a fruit: its title while highlighted, or when it ripens.
    pub fn tooltip(&self, world: &World, id: &str) -> Option<String> {
        let entity = find_fruit(world, id)?;
        let mut query = world.query_one::<(&FruitNode, &FruitInteraction)>(entity).ok()?;
        let (node, interaction) = query.get()?;
        if !node.unlocked {
            let label = interaction.pointer_over.then(|| ripens_on(&node.letter));
            return label;
        }
        let highlighted = self.store.hovered_fruit_id().as_deref() == Some(node.letter.id.as_str());
        let title = (interaction.hovered && highlighted).then(|| node.letter.title.clone());
        title
    }
}

/// Per-frame fruit motion: sway while hanging, the fall once picked.
///
/// A finished fall returns to the branch once its letter is no longer selected.
pub fn update_fruit(world: &mut World, store: &Store, time: f32) {
    let intro_complete = store.intro_complete();
    let selected = store.selected_letter().map(|l| l.id.clone());
    for (_, (node, interaction, transform)) in world.query_mut::<(&FruitNode, &mut FruitInteraction, &mut Transform)>() {
        if let Some(fall) = interaction.fall {
            let done = fall.is_finished(time);
            if !done || selected.as_deref() == Some(node.letter.id.as_str()) {
                *transform = fall.sample(time);
                continue;
            }
            interaction.fall = None;
        }
        if intro_complete {
            *transform = fruit_sway(time, node.phase, node.rest_position());
            interaction.glow = glow_opacity(time, node.phase, node.unlocked, interaction.hovered);
        }
    }
}

/// Re-evaluate ripeness against `now`. Returns the ids that just ripened.
pub fn refresh_ripeness(world: &mut World, now: NaiveDateTime) -> Vec<String> {
    let mut ripened = Vec::new();
    for (_, node) in world.query_mut::<&mut FruitNode>() {
        let unlocked = is_unlocked(&node.letter, now);
        if unlocked && !node.unlocked {
            ripened.push(node.letter.id.clone());
        }
        node.unlocked = unlocked;
    }
    ripened
}
