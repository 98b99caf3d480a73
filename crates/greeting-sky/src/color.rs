//! sRGB hex colors to linear RGB.

use glam::Vec3;

/// Convert a `0xRRGGBB` sRGB color to linear RGB in `[0, 1]`.
pub fn hex_to_linear(hex: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_and_black() {
        assert!(hex_to_linear(0xffffff).abs_diff_eq(Vec3::ONE, 1e-6));
        assert_eq!(hex_to_linear(0x000000), Vec3::ZERO);
    }

    #[test]
    fn test_mid_gray_is_darker_in_linear() {
        let c = hex_to_linear(0x808080);
        assert!((c.x - 0.2159).abs() < 1e-3, "got {}", c.x);
        assert_eq!(c.x, c.y);
        assert_eq!(c.y, c.z);
    }

    #[test]
    fn test_channel_order() {
        let c = hex_to_linear(0xff0000);
        assert!(c.abs_diff_eq(Vec3::X, 1e-6));
        let c = hex_to_linear(0x0000ff);
        assert!(c.abs_diff_eq(Vec3::Z, 1e-6));
    }
}
