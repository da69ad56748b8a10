use glam::{EulerRot, Mat4, Quat, Vec3};

/// Position, Euler rotation (radians, XYZ order) and scale of a scene object
///
/// Rotation is kept as raw Euler angles so per-frame increments accumulate
/// without wrapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Object3d {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Object3d {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Local-to-parent matrix (translate * rotate * scale)
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

impl Default for Object3d {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Node-local transform as stored in glTF and written by animation channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trs {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Trs {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Trs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_matrix() {
        assert_eq!(Object3d::IDENTITY.matrix(), Mat4::IDENTITY);
        assert_eq!(Trs::IDENTITY.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_scale_then_translate() {
        let obj = Object3d::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::splat(2.0));
        let p = obj.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(3.0, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_y_rotation_turns_x_towards_negative_z() {
        let obj = Object3d::new(
            Vec3::ZERO,
            Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            Vec3::ONE,
        );
        let p = obj.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }
}
