//! =============================================================================
//! COMMON.RS - Types et formatage des couleurs
//! COMMON.RS - Color types and formatting
//! =============================================================================
//!
//! Ce module contient le type couleur et les formats de sortie.
//! This module contains the color type and the output formats.

use clap::ValueEnum;
use serde::Serialize;

use crate::error::PickerResult;

// =============================================================================
// COULEUR
// COLOR
// =============================================================================

/// Couleur RGB 8 bits par canal
/// 8-bit per channel RGB color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packs the color as `0x00RRGGBB`
    #[inline]
    pub const fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Inverse of [`Rgb::packed`]; the top byte is ignored
    #[inline]
    pub const fn from_packed(value: u32) -> Self {
        Self {
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        }
    }
}

// =============================================================================
// FORMATS DE SORTIE
// OUTPUT FORMATS
// =============================================================================

/// Format d'affichage d'une couleur
/// Display format of a picked color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `#rrggbb`
    #[default]
    Html,
    /// `0xrrggbb`
    Hex,
    /// `rgb(r, g, b)`
    Rgb,
    /// `{"hex":"#rrggbb","r":..,"g":..,"b":..}`
    Json,
}

#[derive(Serialize)]
struct JsonColor {
    hex: String,
    #[serde(flatten)]
    rgb: Rgb,
}

/// Formate une couleur RGB en chaîne hexadécimale
/// Formats an RGB color as a hex string
///
/// # Returns
/// Chaîne au format "#rrggbb" / String in "#rrggbb" format
#[inline]
pub fn format_hex_color(color: Rgb) -> String {
    format!("#{:06x}", color.packed())
}

/// Formate une couleur selon le format demandé
/// Formats a color in the requested format
pub fn format_color(color: Rgb, format: OutputFormat) -> PickerResult<String> {
    let text = match format {
        OutputFormat::Html => format_hex_color(color),
        OutputFormat::Hex => format!("0x{:06x}", color.packed()),
        OutputFormat::Rgb => format!("rgb({}, {}, {})", color.r, color.g, color.b),
        OutputFormat::Json => serde_json::to_string(&JsonColor {
            hex: format_hex_color(color),
            rgb: color,
        })?,
    };
    Ok(text)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed() {
        assert_eq!(Rgb::new(10, 20, 30).packed(), 0x000A141E);
        assert_eq!(Rgb::from_packed(0xFF112233), Rgb::new(0x11, 0x22, 0x33));
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex_color(Rgb::new(255, 0, 128)), "#ff0080");
        // Noir / Black
        assert_eq!(format_hex_color(Rgb::new(0, 0, 0)), "#000000");
        assert_eq!(format_hex_color(Rgb::new(0, 0, 1)), "#000001");
    }

    #[test]
    fn test_format_variants() {
        let color = Rgb::new(0x11, 0x22, 0x33);
        assert_eq!(format_color(color, OutputFormat::Html).unwrap(), "#112233");
        assert_eq!(format_color(color, OutputFormat::Hex).unwrap(), "0x112233");
        assert_eq!(format_color(color, OutputFormat::Rgb).unwrap(), "rgb(17, 34, 51)");
    }

    #[test]
    fn test_format_json() {
        let text = format_color(Rgb::new(1, 2, 255), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["hex"], "#0102ff");
        assert_eq!(value["r"], 1);
        assert_eq!(value["g"], 2);
        assert_eq!(value["b"], 255);
    }
}
