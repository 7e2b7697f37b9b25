//! Core UI traits and screen geometry

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Physical display width in pixels
pub const DISPLAY_WIDTH_PX: u16 = 320;

/// Physical display height in pixels
pub const DISPLAY_HEIGHT_PX: u16 = 240;

/// Margins kept clear of rounded corners and bezel overlap
pub const SAFE_AREA_INSETS: Insets = Insets::uniform(8);

/// Per-edge inset in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insets {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Insets {
    pub const fn uniform(px: u32) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }

    /// Shrink `bounds` by these insets, never below zero size.
    pub fn apply(&self, bounds: Rectangle) -> Rectangle {
        let width = bounds
            .size
            .width
            .saturating_sub(self.left + self.right);
        let height = bounds
            .size
            .height
            .saturating_sub(self.top + self.bottom);

        Rectangle::new(
            bounds.top_left + Point::new(self.left as i32, self.top as i32),
            Size::new(width, height),
        )
    }
}

/// Trait for any UI element that can be drawn
pub trait Drawable {
    /// Draw the element to the display within its bounds
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error>;

    /// Get the bounds of this drawable element
    fn bounds(&self) -> Rectangle;

    /// Check if this element needs to be redrawn
    fn is_dirty(&self) -> bool;

    /// Mark this element as clean (already drawn)
    fn mark_clean(&mut self);

    /// Mark this element as dirty (needs redraw)
    fn mark_dirty(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insets_shrink_bounds() {
        let screen = Rectangle::new(Point::zero(), Size::new(320, 240));
        let safe = SAFE_AREA_INSETS.apply(screen);

        assert_eq!(safe.top_left, Point::new(8, 8));
        assert_eq!(safe.size, Size::new(304, 224));
    }

    #[test]
    fn insets_never_underflow() {
        let tiny = Rectangle::new(Point::new(3, 3), Size::new(4, 4));
        assert_eq!(Insets::uniform(10).apply(tiny).size, Size::zero());
    }
}
