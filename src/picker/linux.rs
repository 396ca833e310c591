//! Linux implementation of the Color Picker
//!
//! Talks to the X server with x11rb: grabs the pointer on the root window with
//! a crosshair cursor, waits for button presses and reads pixels back with
//! GetImage in ZPixmap format.

// =============================================================================
// IMPORTS
// =============================================================================

use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::xproto::{
    ConnectionExt as _, Cursor, EventMask, GrabMode, GrabStatus, ImageFormat, ImageOrder,
    Window,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::{CURRENT_TIME, NONE};

use super::{Backend, PointerEvent};
use crate::config::CROSSHAIR_GLYPH;
use crate::error::{PickerError, PickerResult, SampleError};
use crate::sample::{ChannelMasks, RawImage};

impl From<ConnectionError> for PickerError {
    fn from(err: ConnectionError) -> Self {
        PickerError::Connection(err.to_string())
    }
}

impl From<ReplyError> for PickerError {
    fn from(err: ReplyError) -> Self {
        PickerError::Connection(err.to_string())
    }
}

impl From<ReplyOrIdError> for PickerError {
    fn from(err: ReplyOrIdError) -> Self {
        PickerError::Connection(err.to_string())
    }
}

// =============================================================================
// ZPIXMAP IMAGES
// =============================================================================

/// Pixels returned by GetImage in ZPixmap format
#[derive(Clone, Debug)]
pub struct ZPixmap {
    width: u32,
    height: u32,
    bits_per_pixel: u32,
    stride: usize,
    lsb_first: bool,
    data: Vec<u8>,
}

impl ZPixmap {
    /// Wraps raw image data; rows are padded to `scanline_pad` bits.
    ///
    /// Only byte-aligned pixel formats (8, 16, 24 and 32 bits) are supported.
    pub fn new(
        width: u32,
        height: u32,
        bits_per_pixel: u32,
        scanline_pad: u32,
        lsb_first: bool,
        data: Vec<u8>,
    ) -> PickerResult<Self> {
        if !matches!(bits_per_pixel, 8 | 16 | 24 | 32) {
            return Err(SampleError::InvalidSample(format!(
                "unsupported {bits_per_pixel} bits per pixel"
            ))
            .into());
        }
        let pad = scanline_pad.max(8);
        let stride = ((width * bits_per_pixel).div_ceil(pad) * pad / 8) as usize;
        if data.len() < stride * height as usize {
            return Err(SampleError::InvalidSample(format!(
                "image data too short: {} bytes for {width}x{height}",
                data.len()
            ))
            .into());
        }
        Ok(Self {
            width,
            height,
            bits_per_pixel,
            stride,
            lsb_first,
            data,
        })
    }
}

impl RawImage for ZPixmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        let bytes_per_pixel = (self.bits_per_pixel / 8) as usize;
        let offset = y as usize * self.stride + x as usize * bytes_per_pixel;
        let bytes = &self.data[offset..offset + bytes_per_pixel];
        if self.lsb_first {
            bytes.iter().rev().fold(0, |acc, &b| (acc << 8) | b as u32)
        } else {
            bytes.iter().fold(0, |acc, &b| (acc << 8) | b as u32)
        }
    }
}

// =============================================================================
// BACKEND
// =============================================================================

/// Connection to the X server plus the root window state the picker needs
pub struct X11Backend {
    conn: RustConnection,
    root: Window,
    screen_size: (u32, u32),
    masks: ChannelMasks,
    cursor: Cursor,
    grabbed: bool,
}

impl X11Backend {
    /// Connects to the display named by `$DISPLAY`
    pub fn connect() -> PickerResult<Self> {
        let (conn, screen_num) =
            x11rb::connect(None).map_err(|err| PickerError::DisplayConnect(err.to_string()))?;

        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let screen_size = (
            u32::from(screen.width_in_pixels),
            u32::from(screen.height_in_pixels),
        );
        let visual = screen
            .allowed_depths
            .iter()
            .flat_map(|depth| depth.visuals.iter())
            .find(|visual| visual.visual_id == screen.root_visual);
        let masks = match visual {
            Some(visual) => ChannelMasks {
                red: visual.red_mask,
                green: visual.green_mask,
                blue: visual.blue_mask,
            },
            None => {
                warn!(visual = screen.root_visual, "root visual not found, assuming RGB888");
                ChannelMasks::RGB888
            }
        };

        let cursor = create_crosshair(&conn)?;
        debug!(screen_num, root, ?screen_size, ?masks, "connected to X server");

        Ok(Self {
            conn,
            root,
            screen_size,
            masks,
            cursor,
            grabbed: false,
        })
    }

    fn decode(&self, reply_depth: u8, size: u32, data: Vec<u8>) -> PickerResult<ZPixmap> {
        let setup = self.conn.setup();
        let format = setup
            .pixmap_formats
            .iter()
            .find(|format| format.depth == reply_depth)
            .ok_or_else(|| {
                SampleError::InvalidSample(format!("no pixmap format for depth {reply_depth}"))
            })?;
        ZPixmap::new(
            size,
            size,
            u32::from(format.bits_per_pixel),
            u32::from(format.scanline_pad),
            setup.image_byte_order == ImageOrder::LSB_FIRST,
            data,
        )
    }
}

/// Creates the crosshair cursor from the server's `cursor` font
fn create_crosshair(conn: &RustConnection) -> Result<Cursor, ReplyOrIdError> {
    let font = conn.generate_id()?;
    conn.open_font(font, b"cursor")?;
    let cursor = conn.generate_id()?;
    conn.create_glyph_cursor(
        cursor,
        font,
        font,
        CROSSHAIR_GLYPH,
        CROSSHAIR_GLYPH + 1,
        0,
        0,
        0,
        0xFFFF,
        0xFFFF,
        0xFFFF,
    )?;
    conn.close_font(font)?;
    Ok(cursor)
}

impl Backend for X11Backend {
    type Image = ZPixmap;

    fn grab_pointer(&mut self) -> PickerResult<()> {
        let reply = self
            .conn
            .grab_pointer(
                false,
                self.root,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                self.cursor,
                CURRENT_TIME,
            )?
            .reply()?;
        if reply.status != GrabStatus::SUCCESS {
            return Err(PickerError::GrabFailed(format!("{:?}", reply.status)));
        }
        self.grabbed = true;
        Ok(())
    }

    fn ungrab(&mut self) -> PickerResult<()> {
        if self.grabbed {
            self.conn.ungrab_pointer(CURRENT_TIME)?;
            self.conn.flush()?;
            self.grabbed = false;
        }
        Ok(())
    }

    fn next_event(&mut self) -> PickerResult<PointerEvent> {
        let event = match self.conn.wait_for_event()? {
            Event::ButtonPress(press) => PointerEvent::ButtonPress {
                button: press.detail,
                x: i32::from(press.root_x),
                y: i32::from(press.root_y),
            },
            Event::Error(err) => {
                warn!(?err, "X11 error");
                PointerEvent::Other
            }
            _ => PointerEvent::Other,
        };
        Ok(event)
    }

    fn query_pointer(&mut self) -> PickerResult<(i32, i32)> {
        let reply = self.conn.query_pointer(self.root)?.reply()?;
        Ok((i32::from(reply.root_x), i32::from(reply.root_y)))
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen_size
    }

    fn fetch_image(&mut self, x: i32, y: i32, size: u32) -> PickerResult<ZPixmap> {
        let fetch_error = || PickerError::ImageFetch { x, y };
        let (Ok(req_x), Ok(req_y), Ok(req_size)) =
            (i16::try_from(x), i16::try_from(y), u16::try_from(size))
        else {
            return Err(fetch_error());
        };

        let reply = self
            .conn
            .get_image(ImageFormat::Z_PIXMAP, self.root, req_x, req_y, req_size, req_size, !0)?
            .reply();
        match reply {
            Ok(reply) if !reply.data.is_empty() => self.decode(reply.depth, size, reply.data),
            Ok(_) => Err(fetch_error()),
            Err(ReplyError::X11Error(err)) => {
                debug!(?err, "GetImage failed");
                Err(fetch_error())
            }
            Err(ReplyError::ConnectionError(err)) => Err(err.into()),
        }
    }

    fn channel_masks(&self) -> ChannelMasks {
        self.masks
    }
}

impl Drop for X11Backend {
    fn drop(&mut self) {
        if let Err(err) = self.ungrab() {
            debug!(%err, "ungrab on drop failed");
        }
        let _ = self.conn.free_cursor(self.cursor);
        let _ = self.conn.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zpixmap_32bpp_lsb() {
        let data = vec![0x33, 0x22, 0x11, 0x00, 0xFF, 0xEE, 0xDD, 0x00];
        let image = ZPixmap::new(2, 1, 32, 32, true, data).unwrap();
        assert_eq!(image.pixel(0, 0), 0x00112233);
        assert_eq!(image.pixel(1, 0), 0x00DDEEFF);
    }

    #[test]
    fn test_zpixmap_32bpp_msb() {
        let data = vec![0x00, 0x11, 0x22, 0x33];
        let image = ZPixmap::new(1, 1, 32, 32, false, data).unwrap();
        assert_eq!(image.pixel(0, 0), 0x00112233);
    }

    #[test]
    fn test_zpixmap_24bpp_padded_rows() {
        // 1 pixel of 24 bits, rows padded to 32 bits
        let data = vec![0x03, 0x02, 0x01, 0xAA, 0x06, 0x05, 0x04, 0xAA];
        let image = ZPixmap::new(1, 2, 24, 32, true, data).unwrap();
        assert_eq!(image.pixel(0, 0), 0x010203);
        assert_eq!(image.pixel(0, 1), 0x040506);
    }

    #[test]
    fn test_zpixmap_16bpp() {
        let data = vec![0x1F, 0xF8, 0xE0, 0x07];
        let image = ZPixmap::new(2, 1, 16, 32, true, data).unwrap();
        assert_eq!(image.pixel(0, 0), 0xF81F);
        assert_eq!(image.pixel(1, 0), 0x07E0);
    }

    #[test]
    fn test_zpixmap_rejects_bad_input() {
        assert!(ZPixmap::new(1, 1, 4, 32, true, vec![0; 4]).is_err());
        assert!(ZPixmap::new(2, 2, 32, 32, true, vec![0; 12]).is_err());
    }

    #[test]
    fn test_zpixmap_feeds_extract() {
        let data = vec![0x33, 0x22, 0x11, 0x00];
        let image = ZPixmap::new(1, 1, 32, 32, true, data).unwrap();
        let sample = crate::sample::extract(&image, ChannelMasks::RGB888, 1).unwrap();
        let color = sample.average(Default::default()).unwrap();
        assert_eq!(crate::common::format_hex_color(color), "#112233");
    }
}
