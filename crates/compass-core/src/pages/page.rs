// src/pages/page.rs
//! Core page abstraction for full-screen UI pages.
//!
//! A page owns its layout, state and dirty tracking. The host loop calls
//! these methods in a fixed order:
//!
//! 1. **`on_activate`**: once, when the page is mounted on screen.
//! 2. **`update`**: once per frame to advance internal state.
//! 3. **`draw_page`**: when `is_dirty()` is true, followed by `mark_clean`.
//! 4. **`on_deactivate`**: once, when the page leaves the screen.

use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

pub trait Page {
    /// Human-readable title (may appear in headers or debug logs).
    fn title(&self) -> &str;

    /// Called once when this page becomes visible.
    fn on_activate(&mut self) {}

    /// Called once when this page stops being visible.
    fn on_deactivate(&mut self) {}

    /// Advance per-frame state (sensors, animations, timers) to `now`.
    fn update(&mut self, now: Instant);

    /// Render the entire page to the given display target.
    fn draw_page<D: DrawTarget<Color = Rgb565>>(&mut self, display: &mut D)
    -> Result<(), D::Error>;

    /// Bounding rectangle of this page (typically the full screen).
    fn bounds(&self) -> Rectangle;

    /// Whether the page needs redrawing.
    fn is_dirty(&self) -> bool;

    /// Clear the dirty flag after a successful draw.
    fn mark_clean(&mut self);

    /// Force the page to be redrawn on the next frame.
    fn mark_dirty(&mut self);
}
