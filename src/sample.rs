//! Pixel sampling: channel mask arithmetic, sample extraction and averaging.
//!
//! A [`Sample`] always stores 4 bytes per pixel. Byte 0 is unused, bytes 1, 2
//! and 3 hold red, green and blue.

use crate::common::Rgb;
use crate::error::{SampleError, SampleResult};

/// Depth of every sample produced by [`extract`]
pub const SAMPLE_DEPTH: u32 = 32;

// =============================================================================
// CHANNEL MASKS
// =============================================================================

/// Width and position of a channel inside a raw pixel value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelMask {
    /// Number of bits in the channel
    pub width: u32,
    /// Position of the lowest bit of the channel
    pub shift: u32,
}

/// Computes the width and shift of a channel bitmask.
///
/// A zero mask yields `(0, 0)`.
#[inline]
pub fn characterize(mask: u32) -> ChannelMask {
    ChannelMask {
        width: mask.count_ones(),
        shift: (mask.wrapping_sub(1) & !mask).count_ones() & 31,
    }
}

/// Red, green and blue masks of the display's pixel format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl ChannelMasks {
    /// The usual 24-bit TrueColor layout
    pub const RGB888: ChannelMasks = ChannelMasks {
        red: 0x00FF_0000,
        green: 0x0000_FF00,
        blue: 0x0000_00FF,
    };

    /// Splits a raw pixel value into its three channels
    #[inline]
    pub fn split(&self, pixel: u32) -> Rgb {
        Rgb::new(
            channel_value(pixel, self.red),
            channel_value(pixel, self.green),
            channel_value(pixel, self.blue),
        )
    }
}

#[inline]
fn channel_value(pixel: u32, mask: u32) -> u8 {
    ((pixel & mask) >> characterize(mask).shift) as u8
}

// =============================================================================
// RAW IMAGES
// =============================================================================

/// Pixel source returned by a display backend
pub trait RawImage {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Raw pixel value at (x, y). Callers stay within `width × height`.
    fn pixel(&self, x: u32, y: u32) -> u32;
}

// =============================================================================
// SAMPLE
// =============================================================================

/// Square grid of sampled pixels
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sample {
    size: u32,
    depth: u32,
    data: Vec<u8>,
}

impl Sample {
    /// Zeroed sample of `size × size` pixels at [`SAMPLE_DEPTH`]
    pub fn new(size: u32) -> Self {
        Self::with_depth(size, SAMPLE_DEPTH)
    }

    /// Zeroed sample with an explicit depth
    pub fn with_depth(size: u32, depth: u32) -> Self {
        let bytes_per_pixel = depth.div_ceil(8) as usize;
        let pixels = size as usize * size as usize;
        Self {
            size,
            depth,
            data: vec![0; pixels * bytes_per_pixel],
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.depth.div_ceil(8) as usize
    }

    pub fn pixel_count(&self) -> usize {
        self.size as usize * self.size as usize
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Color stored at pixel index `i` (row-major)
    pub fn pixel(&self, i: usize) -> Option<Rgb> {
        if self.depth != SAMPLE_DEPTH {
            return None;
        }
        let slot = self.data.get(i * 4..i * 4 + 4)?;
        Some(Rgb::new(slot[1], slot[2], slot[3]))
    }

    /// Writes `color` into bytes 1..=3 of pixel slot `i`
    pub fn set_pixel(&mut self, i: usize, color: Rgb) {
        debug_assert_eq!(self.depth, SAMPLE_DEPTH);
        let slot = &mut self.data[i * 4..i * 4 + 4];
        slot[1] = color.r;
        slot[2] = color.g;
        slot[3] = color.b;
    }

    fn check_valid(&self) -> SampleResult<()> {
        if self.is_empty() || self.size == 0 {
            return Err(SampleError::InvalidSample("empty sample".into()));
        }
        if self.depth != SAMPLE_DEPTH {
            return Err(SampleError::InvalidSample(format!(
                "depth {} (expected {})",
                self.depth, SAMPLE_DEPTH
            )));
        }
        Ok(())
    }

    /// Averages every pixel of the sample into one color
    pub fn average(&self, method: AverageMethod) -> SampleResult<Rgb> {
        self.check_valid()?;
        match method {
            AverageMethod::ArithmeticMean => Ok(self.arithmetic_mean()),
        }
    }

    fn arithmetic_mean(&self) -> Rgb {
        let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
        for slot in self.data.chunks_exact(4) {
            r += slot[1] as u64;
            g += slot[2] as u64;
            b += slot[3] as u64;
        }
        let count = self.pixel_count() as f64;
        let round = |sum: u64| (sum as f64 / count + 0.5) as u8;
        Rgb::new(round(r), round(g), round(b))
    }
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Reads a `size × size` grid from the image origin into a new [`Sample`].
pub fn extract(image: &impl RawImage, masks: ChannelMasks, size: u32) -> SampleResult<Sample> {
    if size == 0 {
        return Err(SampleError::InvalidSample("sample size must be at least 1".into()));
    }
    if image.width() < size || image.height() < size {
        return Err(SampleError::InvalidSample(format!(
            "image is {}x{}, need {}x{}",
            image.width(),
            image.height(),
            size,
            size
        )));
    }

    let mut sample = Sample::new(size);
    for y in 0..size {
        for x in 0..size {
            let i = (y * size + x) as usize;
            sample.set_pixel(i, masks.split(image.pixel(x, y)));
        }
    }
    Ok(sample)
}

// =============================================================================
// AVERAGING
// =============================================================================

/// Method used to combine the pixels of a sample
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum AverageMethod {
    #[default]
    ArithmeticMean = 0,
}

impl TryFrom<u32> for AverageMethod {
    type Error = SampleError;

    fn try_from(value: u32) -> SampleResult<Self> {
        match value {
            0 => Ok(AverageMethod::ArithmeticMean),
            other => Err(SampleError::UnsupportedMethod(other)),
        }
    }
}

/// Averages a sample given a raw method number
pub fn average_raw(sample: &Sample, method: u32) -> SampleResult<Rgb> {
    sample.average(AverageMethod::try_from(method)?)
}
