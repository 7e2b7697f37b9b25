//! Compass page
//!
//! Full-screen host for the compass: title and subtitle across the top of
//! the safe area, the dial widget filling the rest. Mounting the page mounts
//! the view model; leaving it releases the magnetometer.

use embassy_time::Instant;
use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_6X10, ascii::FONT_10X20};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use embedded_layout::align::{Align, horizontal, vertical};

use crate::pages::page::Page;
use crate::sensors::Magnetometer;
use crate::ui::colors::{COLOR_BACKGROUND, LIGHT_GRAY, WHITE};
use crate::ui::{Drawable, SAFE_AREA_INSETS};
use crate::view_model::CompassViewModel;
use crate::widgets::CompassDial;

const TITLE: &str = "Compass";
const SUBTITLE: &str = "Live magnetometer heading";

/// Height of the large title font
const TITLE_HEIGHT_PX: u32 = 20;

/// Gap between title and subtitle in pixels
const TITLE_GAP_PX: u32 = 4;

/// Height of the small subtitle font
const SUBTITLE_HEIGHT_PX: u32 = 10;

/// Space between the header block and the dial
const HEADER_BOTTOM_GAP_PX: u32 = 6;

const PAGE_HEADER_HEIGHT_PX: u32 =
    TITLE_HEIGHT_PX + TITLE_GAP_PX + SUBTITLE_HEIGHT_PX + HEADER_BOTTOM_GAP_PX;

pub struct CompassPage<M: Magnetometer> {
    bounds: Rectangle,
    safe_area: Rectangle,
    view_model: CompassViewModel<M>,
    dial: CompassDial,
    advisory: Option<&'static str>,
    dirty: bool,
}

impl<M: Magnetometer> CompassPage<M> {
    pub fn new(bounds: Rectangle, view_model: CompassViewModel<M>) -> Self {
        let safe_area = SAFE_AREA_INSETS.apply(bounds);
        let dial_bounds = Rectangle::new(
            safe_area.top_left + Point::new(0, PAGE_HEADER_HEIGHT_PX as i32),
            Size::new(
                safe_area.size.width,
                safe_area.size.height.saturating_sub(PAGE_HEADER_HEIGHT_PX),
            ),
        );

        Self {
            bounds,
            safe_area,
            view_model,
            dial: CompassDial::new(dial_bounds),
            advisory: None,
            dirty: true,
        }
    }

    /// Platform warning shown above the calibration hint, e.g. when the
    /// sensor is simulated.
    pub fn with_advisory(mut self, advisory: &'static str) -> Self {
        self.advisory = Some(advisory);
        self
    }

    pub fn set_advisory(&mut self, advisory: Option<&'static str>) {
        self.advisory = advisory;
    }

    pub fn advisory(&self) -> Option<&'static str> {
        self.advisory
    }

    pub fn view_model(&self) -> &CompassViewModel<M> {
        &self.view_model
    }

    pub fn view_model_mut(&mut self) -> &mut CompassViewModel<M> {
        &mut self.view_model
    }

    pub fn dial(&self) -> &CompassDial {
        &self.dial
    }

    fn draw_header<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        let title_area = Rectangle::new(
            self.safe_area.top_left,
            Size::new(self.safe_area.size.width, TITLE_HEIGHT_PX),
        );
        Text::with_baseline(
            TITLE,
            Point::zero(),
            MonoTextStyle::new(&FONT_10X20, WHITE),
            Baseline::Top,
        )
        .align_to(&title_area, horizontal::Center, vertical::Top)
        .draw(display)?;

        let subtitle_area = Rectangle::new(
            title_area.top_left + Point::new(0, (TITLE_HEIGHT_PX + TITLE_GAP_PX) as i32),
            Size::new(self.safe_area.size.width, SUBTITLE_HEIGHT_PX),
        );
        Text::with_baseline(
            SUBTITLE,
            Point::zero(),
            MonoTextStyle::new(&FONT_6X10, LIGHT_GRAY),
            Baseline::Top,
        )
        .align_to(&subtitle_area, horizontal::Center, vertical::Top)
        .draw(display)?;

        Ok(())
    }
}

impl<M: Magnetometer> Page for CompassPage<M> {
    fn title(&self) -> &str {
        TITLE
    }

    fn on_activate(&mut self) {
        self.view_model.mount();
        self.dirty = true;
    }

    fn on_deactivate(&mut self) {
        self.view_model.unmount();
    }

    fn update(&mut self, now: Instant) {
        self.view_model.update(now);
        self.dial.set_state(self.view_model.snapshot(now), self.advisory);
    }

    fn draw_page<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        Drawable::draw(self, display)
    }

    fn bounds(&self) -> Rectangle {
        Drawable::bounds(self)
    }

    fn is_dirty(&self) -> bool {
        Drawable::is_dirty(self)
    }

    fn mark_clean(&mut self) {
        Drawable::mark_clean(self)
    }

    fn mark_dirty(&mut self) {
        Drawable::mark_dirty(self)
    }
}

impl<M: Magnetometer> Drawable for CompassPage<M> {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        // Clear background.
        self.bounds
            .into_styled(PrimitiveStyle::with_fill(COLOR_BACKGROUND))
            .draw(display)?;

        self.draw_header(display)?;
        self.dial.draw(display)?;

        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        self.bounds
    }

    fn is_dirty(&self) -> bool {
        self.dirty || self.dial.is_dirty()
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
        self.dial.mark_clean();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.dial.mark_dirty();
    }
}
