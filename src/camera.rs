use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;
use crate::traits::Viewport;

/// Perspective camera that always faces a target point
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl PerspectiveCamera {
    /// Camera for a freshly mounted container, placed on +Z looking at the origin
    pub fn new(config: &CameraConfig, viewport: Viewport) -> Self {
        Self {
            fov: config.fov_degrees.to_radians(),
            aspect: viewport.aspect(),
            near: config.near,
            far: config.far,
            position: Vec3::new(0.0, 0.0, config.distance),
            target: Vec3::ZERO,
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Move the camera in its XY plane to follow the pointer, then face the origin
    ///
    /// Z is left untouched.
    pub fn follow_pointer(&mut self, x: f32, y: f32, viewport: Viewport, scale: f32) {
        let ndc = normalize_pointer(x, y, viewport);
        self.position.x = ndc.x * scale;
        self.position.y = ndc.y * scale;
        self.look_at(Vec3::ZERO);
    }
}

/// Map a container-relative pointer position to [-1, 1] on both axes
///
/// Screen Y grows downwards, so it is flipped to match world Y.
pub fn normalize_pointer(x: f32, y: f32, viewport: Viewport) -> Vec2 {
    Vec2::new(
        (x / viewport.width as f32) * 2.0 - 1.0,
        -(y / viewport.height as f32) * 2.0 + 1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(width: u32, height: u32) -> PerspectiveCamera {
        PerspectiveCamera::new(&CameraConfig::default(), Viewport::new(width, height))
    }

    #[test]
    fn test_new_camera_projection_settings() {
        let cam = camera(800, 600);
        assert!((cam.fov - 75f32.to_radians()).abs() < 1e-6);
        assert_eq!(cam.near, 0.1);
        assert_eq!(cam.far, 1000.0);
        assert_eq!(cam.aspect, 800.0 / 600.0);
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn test_view_projection_is_finite() {
        let vp = camera(1920, 1080).view_projection();
        assert!(vp.is_finite());
    }

    #[test]
    fn test_normalize_pointer_corners() {
        let vp = Viewport::new(200, 100);
        assert_eq!(normalize_pointer(0.0, 0.0, vp), Vec2::new(-1.0, 1.0));
        assert_eq!(normalize_pointer(200.0, 100.0, vp), Vec2::new(1.0, -1.0));
        assert_eq!(normalize_pointer(100.0, 50.0, vp), Vec2::ZERO);
    }

    #[test]
    fn test_follow_pointer_keeps_z_and_faces_origin() {
        let vp = Viewport::new(400, 400);
        let mut cam = camera(400, 400);
        cam.follow_pointer(300.0, 100.0, vp, 2.0);

        assert_eq!(cam.position, Vec3::new(1.0, 1.0, 10.0));
        assert_eq!(cam.target, Vec3::ZERO);
        let expected = (Vec3::ZERO - cam.position).normalize();
        assert!((cam.forward() - expected).length() < 1e-6);
    }
}
