/// Split a 0xRRGGBB colour into normalized sRGB channels
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Convert one sRGB channel to linear space
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// 0xRRGGBB to linear RGB scaled by intensity, ready for a light uniform
pub fn hex_to_linear(hex: u32, intensity: f32) -> [f32; 3] {
    let [r, g, b] = hex_to_rgb(hex);
    [
        srgb_to_linear(r) * intensity,
        srgb_to_linear(g) * intensity,
        srgb_to_linear(b) * intensity,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb_white() {
        let rgb = hex_to_rgb(0xffffff);
        assert!((rgb[0] - 1.0).abs() < 0.001);
        assert!((rgb[1] - 1.0).abs() < 0.001);
        assert!((rgb[2] - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_hex_to_rgb_ambient_grey() {
        let rgb = hex_to_rgb(0x404040);
        for c in rgb {
            assert!((c - 64.0 / 255.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_hex_to_rgb_channel_order() {
        let rgb = hex_to_rgb(0xff0080);
        assert!((rgb[0] - 1.0).abs() < 0.001);
        assert!(rgb[1].abs() < 0.001);
        assert!((rgb[2] - 128.0 / 255.0).abs() < 0.001);
    }

    #[test]
    fn test_srgb_to_linear_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 0.0001);
        // Mid grey is darker in linear space
        assert!(srgb_to_linear(0.5) < 0.5);
    }

    #[test]
    fn test_hex_to_linear_scales_by_intensity() {
        let full = hex_to_linear(0xffffff, 1.0);
        let half = hex_to_linear(0xffffff, 0.5);
        assert!((half[0] - full[0] * 0.5).abs() < 0.0001);
    }
}
