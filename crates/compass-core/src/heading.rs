//! Heading math for turning magnetometer vectors into compass readings
//!
//! Everything here is a pure function over degrees. Headings are always
//! normalized into `[0, 360)`; deltas are the signed shortest rotation in
//! `(-180, 180]`.

use serde::{Deserialize, Serialize};

/// Full turn in degrees
const FULL_TURN_DEG: f32 = 360.0;

/// Width of one cardinal bucket (8 labels around the rose)
const CARDINAL_BUCKET_DEG: f32 = 45.0;

/// Axis mapping used to turn the horizontal field components into a heading.
///
/// Which one is "correct" depends on how the magnetometer is mounted relative
/// to the screen, so both are selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingConvention {
    /// `atan2(y, x) + 90°`. A field along +X reads 90° (east).
    #[default]
    EastReferenced,
    /// `atan2(-x, y)` with no offset. A field along +X reads 270° (west).
    NorthReferenced,
}

impl HeadingConvention {
    /// Horizontal components `(x, y)` of a field of `strength` that this
    /// convention reads back as `heading_deg`.
    pub fn horizontal_components(self, heading_deg: f32, strength: f32) -> (f32, f32) {
        match self {
            HeadingConvention::EastReferenced => {
                let angle = (heading_deg - 90.0).to_radians();
                (strength * libm::cosf(angle), strength * libm::sinf(angle))
            }
            HeadingConvention::NorthReferenced => {
                let angle = heading_deg.to_radians();
                (-strength * libm::sinf(angle), strength * libm::cosf(angle))
            }
        }
    }
}

/// The eight compass points, clockwise from north
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinal {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Cardinal {
    /// Ordered rose used for bucket lookup
    pub const ALL: [Cardinal; 8] = [
        Cardinal::N,
        Cardinal::NE,
        Cardinal::E,
        Cardinal::SE,
        Cardinal::S,
        Cardinal::SW,
        Cardinal::W,
        Cardinal::NW,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Cardinal::N => "N",
            Cardinal::NE => "NE",
            Cardinal::E => "E",
            Cardinal::SE => "SE",
            Cardinal::S => "S",
            Cardinal::SW => "SW",
            Cardinal::W => "W",
            Cardinal::NW => "NW",
        }
    }
}

/// Wrap any angle into `[0, 360)`.
pub fn normalize_degrees(deg: f32) -> f32 {
    let wrapped = libm::fmodf(libm::fmodf(deg, FULL_TURN_DEG) + FULL_TURN_DEG, FULL_TURN_DEG);
    // -0.0 and rounding at the top edge both land here
    if wrapped >= FULL_TURN_DEG || wrapped == 0.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation taking `from_deg` onto `to_deg`, in `(-180, 180]`.
///
/// Adding the result to an unwrapped rotation never moves it more than half a
/// turn, so animated transitions never sweep the long way through 0°/360°.
pub fn shortest_delta(from_deg: f32, to_deg: f32) -> f32 {
    let from = normalize_degrees(from_deg);
    let to = normalize_degrees(to_deg);
    let delta = libm::fmodf(to - from + 540.0, FULL_TURN_DEG) - 180.0;

    if delta <= -180.0 { delta + FULL_TURN_DEG } else { delta }
}

/// Heading in `[0, 360)` from the horizontal field components.
pub fn heading_from_vector(convention: HeadingConvention, x: f32, y: f32) -> f32 {
    let degrees = match convention {
        HeadingConvention::EastReferenced => libm::atan2f(y, x).to_degrees() + 90.0,
        HeadingConvention::NorthReferenced => libm::atan2f(-x, y).to_degrees(),
    };

    normalize_degrees(degrees)
}

/// Nearest of the eight compass points.
pub fn cardinal_from_heading(deg: f32) -> Cardinal {
    let bucket = libm::roundf(normalize_degrees(deg) / CARDINAL_BUCKET_DEG) as usize;
    Cardinal::ALL[bucket % Cardinal::ALL.len()]
}
