//! Procedural generation for the tree, its fruit and the reveal crack.
//!
//! Every generator is pure: randomness comes from an explicitly seeded RNG passed in
//! by the caller, so the same seed always yields the same geometry.

pub mod apple;
pub mod branches;
pub mod crack;
pub mod curve;
pub mod leaf;
pub mod mesh;
pub mod textures;
pub mod trunk;
pub mod tube;

pub use apple::*;
pub use branches::*;
pub use crack::*;
pub use curve::*;
pub use leaf::*;
pub use mesh::*;
pub use textures::*;
pub use trunk::*;
pub use tube::*;
