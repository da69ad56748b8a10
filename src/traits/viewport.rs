/// Pixel size of the host container, measured once at mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; not finite for a zero-height container
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Size clamped to at least one pixel, for GPU texture allocation
    pub fn texture_extent(&self) -> (u32, u32) {
        (self.width.max(1), self.height.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stores_dimensions() {
        let vp = Viewport::new(1920, 1080);
        assert_eq!(vp.width, 1920);
        assert_eq!(vp.height, 1080);
    }

    #[test]
    fn test_aspect_ratio() {
        let test_cases = [(640, 480), (1280, 720), (1920, 1080), (300, 900)];

        for (width, height) in test_cases {
            let vp = Viewport::new(width, height);
            assert_eq!(vp.aspect(), width as f32 / height as f32);
        }
    }

    #[test]
    fn test_zero_height_aspect_is_not_finite() {
        assert!(!Viewport::new(100, 0).aspect().is_finite());
    }

    #[test]
    fn test_texture_extent_never_zero() {
        assert_eq!(Viewport::new(0, 0).texture_extent(), (1, 1));
        assert_eq!(Viewport::new(640, 480).texture_extent(), (640, 480));
    }
}
