//! Hardware-independent core library for compass-rs
//!
//! This crate contains all platform-agnostic logic for the compass screen:
//! heading math, the magnetometer stream, the view model, animation
//! primitives, and the dial widget and page that render them.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod animation;
pub mod config;
pub mod heading;
pub mod pages;
pub mod sensors;
pub mod ui;
pub mod view_model;
pub mod widgets;

pub use config::{CompassConfig, ConfigError};
pub use heading::{Cardinal, HeadingConvention};
pub use view_model::{Availability, CompassPhase, CompassSnapshot, CompassViewModel};
