pub mod compass_dial;

pub use compass_dial::{ALIGN_INSTRUCTION, CompassDial, SENSOR_UNAVAILABLE_MESSAGE, status_line};
