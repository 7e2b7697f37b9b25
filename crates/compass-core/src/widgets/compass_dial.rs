//! Compass dial widget
//!
//! Draws a [`CompassSnapshot`]: pulsing halo, dial ring with ticks and fixed
//! N/E/S/W markers, a two-tone needle, the numeric heading, the cardinal
//! label and a one-line status message. Holds no logic beyond layout.
//!
//! The needle is drawn at `-rotation`: as the device turns clockwise the
//! needle swings counter-clockwise, so it keeps pointing at magnetic north.

use core::fmt::Write;

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, ascii::FONT_6X10, iso_8859_1};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Circle, Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, Triangle,
};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::ui::Drawable;
use crate::ui::colors::{
    COLOR_ACCENT, COLOR_DIAL_FACE, COLOR_DIAL_RING, COLOR_HALO_BRIGHT, COLOR_HALO_DIM,
    COLOR_NEEDLE_NORTH, COLOR_NEEDLE_SOUTH, COLOR_WARNING, LIGHT_GRAY, WHITE, blend,
};
use crate::view_model::{Availability, CompassSnapshot};

/// Shown once the capability probe reports no magnetometer
pub const SENSOR_UNAVAILABLE_MESSAGE: &str = "Magnetometer not available on this device";

/// Default status when nothing needs attention
pub const ALIGN_INSTRUCTION: &str = "Hold device flat and turn to align";

/// Height reserved at the bottom for the status line
const STATUS_LINE_HEIGHT_PX: u32 = 14;

/// Largest share of the width the dial may take; the rest is the readout column
const MAX_DIAL_WIDTH_RATIO: f32 = 0.6;

/// Gap between the dial ring and the halo at rest
const HALO_GAP_PX: u32 = 3;

/// How far the halo grows at full pulse
const HALO_MAX_SPREAD_PX: u32 = 8;

const RING_STROKE_PX: u32 = 2;
const HALO_STROKE_PX: u32 = 2;

const TICK_COUNT: u16 = 12;
const MAJOR_TICK_LEN_PX: f32 = 10.0;
const MINOR_TICK_LEN_PX: f32 = 5.0;

/// Distance of the N/E/S/W markers inside the ring
const CARDINAL_MARKER_INSET_PX: f32 = 22.0;

/// Needle tip distance inside the ring
const NEEDLE_TIP_INSET_PX: f32 = 14.0;
const NEEDLE_HALF_WIDTH_PX: f32 = 6.0;
const HUB_DIAMETER_PX: u32 = 8;

/// Vertical offset of the heading and cardinal readouts from the dial centre
const READOUT_OFFSET_PX: i32 = 14;

const FIXED_MARKERS: [(&str, f32); 4] = [("N", 0.0), ("E", 90.0), ("S", 180.0), ("W", 270.0)];

/// Pick the status message by priority: unavailable sensor, platform
/// advisory, calibration hint, then the default instruction.
pub fn status_line<'a>(snapshot: &CompassSnapshot, advisory: Option<&'a str>) -> &'a str {
    if snapshot.availability == Availability::Unavailable {
        return SENSOR_UNAVAILABLE_MESSAGE;
    }
    if let Some(advisory) = advisory {
        return advisory;
    }
    if let Some(hint) = snapshot.calibration_hint {
        return hint;
    }
    ALIGN_INSTRUCTION
}

/// Point at `radius` from `center`, `angle_deg` clockwise from screen-up.
fn polar(center: Point, radius: f32, angle_deg: f32) -> Point {
    let angle = angle_deg.to_radians();
    Point::new(
        center.x + libm::roundf(radius * libm::sinf(angle)) as i32,
        center.y - libm::roundf(radius * libm::cosf(angle)) as i32,
    )
}

fn centered_text<'a>(
    text: &'a str,
    position: Point,
    font: &'a MonoFont<'a>,
    color: Rgb565,
) -> Text<'a, MonoTextStyle<'a, Rgb565>> {
    Text::with_text_style(
        text,
        position,
        MonoTextStyle::new(font, color),
        TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build(),
    )
}

pub struct CompassDial {
    bounds: Rectangle,
    center: Point,
    radius: u32,
    readout_center: Point,
    status_position: Point,
    snapshot: CompassSnapshot,
    advisory: Option<&'static str>,
    dirty: bool,
}

impl CompassDial {
    pub fn new(bounds: Rectangle) -> Self {
        let dial_area_height = bounds.size.height.saturating_sub(STATUS_LINE_HEIGHT_PX);
        let max_width = (bounds.size.width as f32 * MAX_DIAL_WIDTH_RATIO) as u32;
        let diameter = dial_area_height.min(max_width);

        let outer_margin = HALO_GAP_PX + HALO_MAX_SPREAD_PX + HALO_STROKE_PX;
        let radius = (diameter / 2).saturating_sub(outer_margin);
        let outer = (radius + outer_margin) as i32;

        let center = Point::new(
            bounds.top_left.x + outer,
            bounds.top_left.y + (dial_area_height / 2) as i32,
        );

        let column_left = center.x + outer;
        let column_right = bounds.top_left.x + bounds.size.width as i32;
        let readout_center = Point::new((column_left + column_right) / 2, center.y);

        let status_position = Point::new(
            bounds.center().x,
            bounds.top_left.y + bounds.size.height as i32 - (STATUS_LINE_HEIGHT_PX / 2) as i32,
        );

        Self {
            bounds,
            center,
            radius,
            readout_center,
            status_position,
            snapshot: CompassSnapshot::default(),
            advisory: None,
            dirty: true,
        }
    }

    /// Replace the displayed state; marks dirty only on change.
    pub fn set_state(&mut self, snapshot: CompassSnapshot, advisory: Option<&'static str>) {
        if snapshot != self.snapshot || advisory != self.advisory {
            self.snapshot = snapshot;
            self.advisory = advisory;
            self.dirty = true;
        }
    }

    pub fn snapshot(&self) -> &CompassSnapshot {
        &self.snapshot
    }

    pub fn dial_center(&self) -> Point {
        self.center
    }

    pub fn dial_radius(&self) -> u32 {
        self.radius
    }

    pub fn status_text(&self) -> &'static str {
        status_line(&self.snapshot, self.advisory)
    }

    fn draw_halo<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        let pulse = self.snapshot.pulse.clamp(0.0, 1.0);
        let spread = libm::roundf(pulse * HALO_MAX_SPREAD_PX as f32) as u32;
        let diameter = 2 * (self.radius + HALO_GAP_PX + spread);

        Circle::with_center(self.center, diameter)
            .into_styled(PrimitiveStyle::with_stroke(
                blend(COLOR_HALO_DIM, COLOR_HALO_BRIGHT, pulse),
                HALO_STROKE_PX,
            ))
            .draw(display)
    }

    fn draw_face<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        let face_style = PrimitiveStyleBuilder::new()
            .fill_color(COLOR_DIAL_FACE)
            .stroke_color(COLOR_DIAL_RING)
            .stroke_width(RING_STROKE_PX)
            .build();
        Circle::with_center(self.center, 2 * self.radius + 1)
            .into_styled(face_style)
            .draw(display)?;

        let tick_style = PrimitiveStyle::with_stroke(COLOR_DIAL_RING, 1);
        let outer = self.radius as f32 - RING_STROKE_PX as f32;
        for i in 0..TICK_COUNT {
            let angle = i as f32 * (360.0 / TICK_COUNT as f32);
            let len = if i % 3 == 0 {
                MAJOR_TICK_LEN_PX
            } else {
                MINOR_TICK_LEN_PX
            };

            Line::new(
                polar(self.center, outer, angle),
                polar(self.center, outer - len, angle),
            )
            .into_styled(tick_style)
            .draw(display)?;
        }

        let marker_radius = self.radius as f32 - CARDINAL_MARKER_INSET_PX;
        for (label, angle) in FIXED_MARKERS {
            let color = if angle == 0.0 { COLOR_ACCENT } else { LIGHT_GRAY };
            centered_text(
                label,
                polar(self.center, marker_radius, angle),
                &FONT_6X10,
                color,
            )
            .draw(display)?;
        }

        Ok(())
    }

    fn draw_needle<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        let angle = -self.snapshot.rotation;
        let length = self.radius as f32 - NEEDLE_TIP_INSET_PX;
        let base_left = polar(self.center, NEEDLE_HALF_WIDTH_PX, angle - 90.0);
        let base_right = polar(self.center, NEEDLE_HALF_WIDTH_PX, angle + 90.0);

        Triangle::new(base_left, base_right, polar(self.center, length, angle + 180.0))
            .into_styled(PrimitiveStyle::with_fill(COLOR_NEEDLE_SOUTH))
            .draw(display)?;
        Triangle::new(base_left, base_right, polar(self.center, length, angle))
            .into_styled(PrimitiveStyle::with_fill(COLOR_NEEDLE_NORTH))
            .draw(display)?;

        Circle::with_center(self.center, HUB_DIAMETER_PX)
            .into_styled(PrimitiveStyle::with_fill(WHITE))
            .draw(display)?;

        Ok(())
    }

    fn draw_readouts<D: DrawTarget<Color = Rgb565>>(
        &self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let mut heading: heapless::String<8> = heapless::String::new();
        match self.snapshot.heading {
            Some(deg) => write!(heading, "{}°", deg).ok(),
            None => heading.push_str("--°").ok(),
        };

        centered_text(
            &heading,
            self.readout_center - Point::new(0, READOUT_OFFSET_PX),
            &iso_8859_1::FONT_10X20,
            WHITE,
        )
        .draw(display)?;

        let cardinal = self.snapshot.cardinal.map_or("--", |c| c.label());
        centered_text(
            cardinal,
            self.readout_center + Point::new(0, READOUT_OFFSET_PX),
            &iso_8859_1::FONT_10X20,
            COLOR_ACCENT,
        )
        .draw(display)?;

        let status = self.status_text();
        let color = if status == ALIGN_INSTRUCTION {
            LIGHT_GRAY
        } else {
            COLOR_WARNING
        };
        centered_text(status, self.status_position, &FONT_6X10, color).draw(display)?;

        Ok(())
    }
}

impl Drawable for CompassDial {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        self.draw_halo(display)?;
        self.draw_face(display)?;
        self.draw_needle(display)?;
        self.draw_readouts(display)?;
        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        self.bounds
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::Cardinal;
    use crate::view_model::CALIBRATION_HINT;
    use core::convert::Infallible;

    use alloc::vec;
    use alloc::vec::Vec;

    const ADVISORY: &str = "Simulated sensor";

    struct TestDisplay {
        size: Size,
        pixels: Vec<Option<Rgb565>>,
    }

    impl TestDisplay {
        fn new(size: Size) -> Self {
            Self {
                size,
                pixels: vec![None; (size.width * size.height) as usize],
            }
        }

        fn pixel(&self, p: Point) -> Option<Rgb565> {
            self.pixels[(p.y as u32 * self.size.width + p.x as u32) as usize]
        }
    }

    impl OriginDimensions for TestDisplay {
        fn size(&self) -> Size {
            self.size
        }
    }

    impl DrawTarget for TestDisplay {
        type Color = Rgb565;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(p, color) in pixels {
                if p.x >= 0
                    && p.y >= 0
                    && (p.x as u32) < self.size.width
                    && (p.y as u32) < self.size.height
                {
                    self.pixels[(p.y as u32 * self.size.width + p.x as u32) as usize] =
                        Some(color);
                }
            }
            Ok(())
        }
    }

    fn dial() -> CompassDial {
        CompassDial::new(Rectangle::new(Point::new(8, 48), Size::new(304, 184)))
    }

    fn active(rotation: f32) -> CompassSnapshot {
        CompassSnapshot {
            availability: Availability::Available,
            heading: Some(0),
            cardinal: Some(Cardinal::N),
            rotation,
            ..Default::default()
        }
    }

    #[test]
    fn status_priority() {
        let unavailable = CompassSnapshot {
            availability: Availability::Unavailable,
            calibration_hint: Some(CALIBRATION_HINT),
            ..Default::default()
        };
        assert_eq!(status_line(&unavailable, Some(ADVISORY)), SENSOR_UNAVAILABLE_MESSAGE);

        let hinted = CompassSnapshot {
            availability: Availability::Available,
            calibration_hint: Some(CALIBRATION_HINT),
            ..Default::default()
        };
        assert_eq!(status_line(&hinted, Some(ADVISORY)), ADVISORY);
        assert_eq!(status_line(&hinted, None), CALIBRATION_HINT);

        assert_eq!(status_line(&active(0.0), None), ALIGN_INSTRUCTION);
        assert_eq!(status_line(&CompassSnapshot::default(), None), ALIGN_INSTRUCTION);
    }

    #[test]
    fn layout_fits_bounds() {
        let dial = dial();
        let outer = (dial.dial_radius() + HALO_GAP_PX + HALO_MAX_SPREAD_PX + HALO_STROKE_PX) as i32;
        let bounds = dial.bounds();

        assert!(dial.dial_radius() > 40);
        assert!(dial.dial_center().x - outer >= bounds.top_left.x);
        assert!(dial.dial_center().y - outer >= bounds.top_left.y);
        assert!(dial.dial_center().y + outer <= bounds.top_left.y + bounds.size.height as i32);
        assert!(dial.readout_center.x > dial.dial_center().x + outer);
    }

    #[test]
    fn needle_counter_rotates() {
        let mut dial = dial();
        let probe_radius = dial.dial_radius() as f32 / 2.0;

        dial.set_state(active(0.0), None);
        let mut display = TestDisplay::new(Size::new(320, 240));
        dial.draw(&mut display).unwrap();
        let up = polar(dial.dial_center(), probe_radius, 0.0);
        assert_eq!(display.pixel(up), Some(COLOR_NEEDLE_NORTH));

        // Device facing east: north is to the left
        dial.set_state(active(90.0), None);
        let mut display = TestDisplay::new(Size::new(320, 240));
        dial.draw(&mut display).unwrap();
        let left = polar(dial.dial_center(), probe_radius, -90.0);
        assert_eq!(display.pixel(left), Some(COLOR_NEEDLE_NORTH));
        let right = polar(dial.dial_center(), probe_radius, 90.0);
        assert_eq!(display.pixel(right), Some(COLOR_NEEDLE_SOUTH));
    }

    #[test]
    fn set_state_marks_dirty_only_on_change() {
        let mut dial = dial();
        dial.set_state(active(10.0), None);
        dial.mark_clean();

        dial.set_state(active(10.0), None);
        assert!(!dial.is_dirty());

        dial.set_state(active(10.0), Some(ADVISORY));
        assert!(dial.is_dirty());
        assert_eq!(dial.status_text(), ADVISORY);
    }
}
