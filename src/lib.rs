// =============================================================================
// lib.rs - Sélecteur de couleur X11
// lib.rs - X11 color picker
// =============================================================================

// =============================================================================
// MODULES
// =============================================================================

/// Arguments de ligne de commande
/// Command line arguments
pub mod cli;

/// Types et formatage des couleurs
/// Color types and formatting
pub mod common;

/// Configuration partagée (constantes)
/// Shared configuration (constants)
pub mod config;

/// Types d'erreurs
/// Error types
pub mod error;

/// Session de sélection et implémentations par plateforme
/// Picking session and platform implementations
pub mod picker;

/// Extraction et moyenne des pixels
/// Pixel extraction and averaging
pub mod sample;

pub use common::{OutputFormat, Rgb};
pub use config::Config;
pub use error::{PickerError, PickerResult, SampleError, SampleResult};
pub use picker::{Backend, Picker, PointerEvent};
pub use sample::{characterize, extract, AverageMethod, ChannelMask, ChannelMasks, RawImage, Sample};
