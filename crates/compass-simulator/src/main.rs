//! Desktop simulator for the compass-rs heading screen.
//!
//! Renders the compass page in an SDL2 window via `embedded-graphics-simulator`
//! and feeds it from a simulated magnetometer that the keyboard can turn and
//! disturb, so the screen can be exercised without hardware.
//!
//! An optional TOML configuration file may be given as the first argument;
//! any field it leaves out keeps its default.
//!
//! # Key bindings
//!
//! | Key         | Action                                   |
//! |-------------|------------------------------------------|
//! | Left/Right  | Turn the device 15°                      |
//! | Space       | Toggle auto-spin                         |
//! | I           | Toggle magnetic interference             |
//! | A           | Toggle the advisory (on at start)        |
//! | M           | Unmount / remount the screen             |
//! | 1           | Remount with the sensor available        |
//! | 2           | Remount with no sensor                   |
//! | 3           | Remount with a failing capability probe  |
//! | Q / Esc     | Quit                                     |

use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{error, info, warn};
use thiserror_no_std::Error;

use compass_core::config::{CompassConfig, ConfigError};
use compass_core::pages::{CompassPage, Page};
use compass_core::sensors::{SimulatedAvailability, SimulatedMagnetometer};
use compass_core::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use compass_core::view_model::CompassViewModel;

// ---------------------------------------------------------------------------
// Display constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

// ---------------------------------------------------------------------------
// Simulated device
// ---------------------------------------------------------------------------

/// Rotation applied per arrow key press.
const TURN_STEP_DEG: f32 = 15.0;

/// Auto-spin speed when toggled on.
const SPIN_RATE_DEG_PER_SEC: f32 = 30.0;

/// Shown in place of the default instruction while toggled on.
const SIMULATOR_ADVISORY: &str = "Simulated sensor: readings are synthetic";

type SimulatedPage = CompassPage<SimulatedMagnetometer>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
enum LoadError {
    #[error("cannot read file: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value: {0}")]
    Invalid(#[from] ConfigError),
}

/// Parse and validate a TOML configuration.
fn parse_config(text: &str) -> Result<CompassConfig, LoadError> {
    let config: CompassConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration named on the command line, or the defaults.
fn load_config() -> CompassConfig {
    let Some(path) = std::env::args().nth(1) else {
        info!("No config file given, using defaults");
        return CompassConfig::default();
    };

    let loaded = std::fs::read_to_string(&path)
        .map_err(LoadError::from)
        .and_then(|text| parse_config(&text));

    match loaded {
        Ok(config) => {
            info!("Loaded config from {}", path);
            config
        }
        Err(e) => {
            warn!("Config {} rejected ({}), using defaults", path, e);
            CompassConfig::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Page helpers
// ---------------------------------------------------------------------------

/// Full-screen bounding rectangle.
fn screen_bounds() -> Rectangle {
    Rectangle::new(
        Point::zero(),
        Size::new(DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_PX as u32),
    )
}

/// Every reading here is synthetic, so the page starts with the advisory on.
fn create_page(config: CompassConfig) -> SimulatedPage {
    let sensor = SimulatedMagnetometer::new(config.convention);
    CompassPage::new(screen_bounds(), CompassViewModel::new(sensor, config))
        .with_advisory(SIMULATOR_ADVISORY)
}

/// Leave the screen, swap the simulated hardware, and come back.
fn remount(page: &mut SimulatedPage, availability: SimulatedAvailability) {
    info!("Remounting with sensor {:?}", availability);
    Page::on_deactivate(page);
    page.view_model_mut()
        .magnetometer_mut()
        .set_availability(availability);
    Page::on_activate(page);
}

/// Apply a key press. Returns `false` when the simulator should exit.
fn handle_key(page: &mut SimulatedPage, keycode: Keycode) -> bool {
    match keycode {
        Keycode::Q | Keycode::Escape => return false,
        Keycode::Left => page.view_model_mut().magnetometer_mut().rotate_by(-TURN_STEP_DEG),
        Keycode::Right => page.view_model_mut().magnetometer_mut().rotate_by(TURN_STEP_DEG),
        Keycode::Space => {
            let sensor = page.view_model_mut().magnetometer_mut();
            let rate = if sensor.spin_rate() == 0.0 {
                SPIN_RATE_DEG_PER_SEC
            } else {
                0.0
            };
            sensor.set_spin_rate(rate);
            info!("Auto-spin {} deg/s", rate);
        }
        Keycode::I => {
            let sensor = page.view_model_mut().magnetometer_mut();
            let enabled = !sensor.interference();
            sensor.set_interference(enabled);
        }
        Keycode::A => {
            let advisory = match page.advisory() {
                Some(_) => None,
                None => Some(SIMULATOR_ADVISORY),
            };
            info!("Advisory {}", if advisory.is_some() { "on" } else { "off" });
            page.set_advisory(advisory);
        }
        Keycode::M => {
            if page.view_model().is_mounted() {
                Page::on_deactivate(page);
            } else {
                Page::on_activate(page);
            }
        }
        Keycode::Num1 | Keycode::Kp1 => remount(page, SimulatedAvailability::Available),
        Keycode::Num2 | Keycode::Kp2 => remount(page, SimulatedAvailability::Unavailable),
        Keycode::Num3 | Keycode::Kp3 => remount(page, SimulatedAvailability::ProbeFails),
        _ => {}
    }

    true
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting compass-rs simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: ←/→=Turn  Space=Spin  I=Interference  A=Advisory  M=Mount  1/2/3=Sensor  Q=Quit");

    let config = load_config();
    info!("{:?}", config);

    // SDL2 display and window
    let mut display = SimulatorDisplay::<Rgb565>::new(Size::new(
        DISPLAY_WIDTH_PX as u32,
        DISPLAY_HEIGHT_PX as u32,
    ));

    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("Compass Simulator", &output_settings);

    let mut page = create_page(config);
    Page::on_activate(&mut page);

    // Monotonic clock handed to the page; core never reads time itself
    let start = Instant::now();
    let now = || embassy_time::Instant::from_micros(start.elapsed().as_micros() as u64);

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    Page::update(&mut page, now());
    let _ = Page::draw_page(&mut page, &mut display);
    Page::mark_clean(&mut page);
    window.update(&display);

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = Instant::now();

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::KeyDown { keycode, .. } => {
                    if !handle_key(&mut page, keycode) {
                        break 'running;
                    }
                }
                _ => {}
            }
        }

        // --- Page update tick ---------------------------------------------
        Page::update(&mut page, now());

        // --- Render -------------------------------------------------------
        if Page::is_dirty(&page) {
            if let Err(e) = Page::draw_page(&mut page, &mut display) {
                error!("Draw error: {:?}", e);
            }
            Page::mark_clean(&mut page);
        }

        window.update(&display);

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    Page::on_deactivate(&mut page);
    info!("Simulator exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_core::heading::HeadingConvention;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = parse_config(
            r#"
            update_interval_ms = 50
            convention = "north_referenced"
            "#,
        )
        .unwrap();

        let defaults = CompassConfig::default();
        assert_eq!(config.update_interval_ms, 50);
        assert_eq!(config.convention, HeadingConvention::NorthReferenced);
        assert_eq!(config.rotation_duration_ms, defaults.rotation_duration_ms);
        assert_eq!(config.calibration_band, defaults.calibration_band);
    }

    #[test]
    fn invalid_band_is_rejected() {
        let result = parse_config(
            r#"
            [calibration_band]
            low = 80.0
            high = 20.0
            "#,
        );
        assert!(matches!(result, Err(LoadError::Invalid(_))));
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let error = LoadError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(error.to_string().starts_with("cannot read file:"));
    }

    #[test]
    fn page_starts_with_advisory() {
        let mut page = create_page(CompassConfig::default());
        assert_eq!(page.advisory(), Some(SIMULATOR_ADVISORY));

        assert!(handle_key(&mut page, Keycode::A));
        assert_eq!(page.advisory(), None);
        assert!(handle_key(&mut page, Keycode::A));
        assert_eq!(page.advisory(), Some(SIMULATOR_ADVISORY));
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(matches!(
            parse_config("update_interval_ms = "),
            Err(LoadError::Parse(_))
        ));
    }
}
