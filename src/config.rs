//! Configuration shared by the picker session and the backends
//!
//! Defaults are constants; the parsed command line becomes an immutable
//! [`Config`] before the display is opened.

use crate::common::OutputFormat;
use crate::sample::AverageMethod;

/// Default side of the sampled square (in pixels)
pub const DEFAULT_SAMPLE_SIZE: u32 = 1;

/// Largest accepted sample side; X11 image requests carry 16-bit sizes
pub const MAX_SAMPLE_SIZE: u32 = u16::MAX as u32;

/// Mouse button that picks a color
pub const PICK_BUTTON: u8 = 1;

/// Mouse button that ends the session
pub const CANCEL_BUTTON: u8 = 3;

/// Glyph of the crosshair cursor in the X11 `cursor` font
pub const CROSSHAIR_GLYPH: u16 = 34;

/// Settings for one run of the picker
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Side of the sampled square
    pub size: u32,
    /// How picked colors are printed
    pub format: OutputFormat,
    /// Keep picking after each left click
    pub multiple: bool,
    /// Sample at the pointer right away instead of waiting for a click
    pub immediate: bool,
    pub method: AverageMethod,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size: DEFAULT_SAMPLE_SIZE,
            format: OutputFormat::default(),
            multiple: false,
            immediate: false,
            method: AverageMethod::default(),
        }
    }
}
