//! Shared UI building blocks: drawing traits, screen geometry and colors

pub mod colors;
pub mod core;

pub use self::core::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, Drawable, Insets, SAFE_AREA_INSETS};
