//! Color definitions for the compass screen
//!
//! RGB565 throughout. To convert from 8-bit RGB: R>>3, G>>2, B>>3.

use embedded_graphics::pixelcolor::Rgb565;

// ============================================================================
// Surfaces
// ============================================================================

/// Screen background - very dark gray-blue
pub const COLOR_BACKGROUND: Rgb565 = Rgb565::new(18 >> 3, 23 >> 2, 24 >> 3);

/// Dial face - slightly lighter than background
pub const COLOR_DIAL_FACE: Rgb565 = Rgb565::new(26 >> 3, 32 >> 2, 33 >> 3);

/// Dial ring and minor ticks
pub const COLOR_DIAL_RING: Rgb565 = Rgb565::new(90 >> 3, 104 >> 2, 108 >> 3);

/// Halo at rest - dark teal
pub const COLOR_HALO_DIM: Rgb565 = Rgb565::new(29 >> 3, 47 >> 2, 43 >> 3);

/// Halo at full pulse - bright teal-green
pub const COLOR_HALO_BRIGHT: Rgb565 = Rgb565::new(95 >> 3, 185 >> 2, 141 >> 3);

// ============================================================================
// Needle
// ============================================================================

/// North half of the needle - muted red
pub const COLOR_NEEDLE_NORTH: Rgb565 = Rgb565::new(220 >> 3, 80 >> 2, 80 >> 3);

/// South half of the needle - light gray
pub const COLOR_NEEDLE_SOUTH: Rgb565 = Rgb565::new(170 >> 3, 176 >> 2, 178 >> 3);

// ============================================================================
// Text
// ============================================================================

/// Pure white - maximum brightness in RGB565
pub const WHITE: Rgb565 = Rgb565::new(31, 63, 31);

/// Light gray - for secondary text
pub const LIGHT_GRAY: Rgb565 = Rgb565::new(21, 42, 21);

/// Cardinal label accent - warm orange
pub const COLOR_ACCENT: Rgb565 = Rgb565::new(200 >> 3, 145 >> 2, 85 >> 3);

/// Status line when something needs the user's attention
pub const COLOR_WARNING: Rgb565 = Rgb565::new(230 >> 3, 190 >> 2, 90 >> 3);

/// Linear blend between two colors, `t` in `[0, 1]`.
pub fn blend(from: Rgb565, to: Rgb565, t: f32) -> Rgb565 {
    use embedded_graphics::pixelcolor::RgbColor;

    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| -> u8 { libm::roundf(a as f32 + (b as f32 - a as f32) * t) as u8 };

    Rgb565::new(
        mix(from.r(), to.r()),
        mix(from.g(), to.g()),
        mix(from.b(), to.b()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(COLOR_HALO_DIM, COLOR_HALO_BRIGHT, 0.0), COLOR_HALO_DIM);
        assert_eq!(blend(COLOR_HALO_DIM, COLOR_HALO_BRIGHT, 1.0), COLOR_HALO_BRIGHT);
        assert_eq!(blend(COLOR_HALO_DIM, COLOR_HALO_BRIGHT, 5.0), COLOR_HALO_BRIGHT);
    }
}
