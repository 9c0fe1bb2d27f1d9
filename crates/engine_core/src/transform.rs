//! Transform component and utilities for spatial positioning.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Position plus XYZ Euler angles (radians), unit scale.
    pub fn from_position_euler(position: Vec3, euler: Vec3) -> Self {
        Self {
            position,
            rotation: euler_to_quat(euler),
            ..Default::default()
        }
    }

    /// Position, XYZ Euler angles and uniform scale.
    pub fn from_parts(position: Vec3, euler: Vec3, scale: f32) -> Self {
        Self {
            position,
            rotation: euler_to_quat(euler),
            scale: Vec3::splat(scale),
        }
    }

    /// Builder-style scale override.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Create the model matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Rotation back as XYZ Euler angles.
    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    /// Compose `self` (child) under `parent`.
    pub fn under(&self, parent: &Transform) -> Transform {
        Transform {
            position: parent.position + parent.rotation * (parent.scale * self.position),
            rotation: parent.rotation * self.rotation,
            scale: parent.scale * self.scale,
        }
    }

    /// Get the up direction (positive Y).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

/// XYZ-order Euler angles to quaternion (the order scene graphs default to).
pub fn euler_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euler_roundtrip_small_angles() {
        let t = Transform::from_position_euler(Vec3::ZERO, Vec3::new(0.1, -0.2, 0.05));
        let e = t.euler();
        assert!((e - Vec3::new(0.1, -0.2, 0.05)).length() < 1e-5);
    }

    #[test]
    fn child_under_scaled_parent() {
        let parent = Transform::from_position(Vec3::new(0.0, 1.0, 0.0)).with_scale(Vec3::splat(2.0));
        let child = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let world = child.under(&parent);
        assert!((world.position - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-6);
        assert_eq!(world.scale, Vec3::splat(2.0));
    }
}
