// =============================================================================
// picker/mod.rs - Picking session and display backends
// =============================================================================

use std::io::Write;

use tracing::{debug, info, warn};

use crate::common::{format_color, format_hex_color, Rgb};
use crate::config::{Config, CANCEL_BUTTON, PICK_BUTTON};
use crate::error::PickerResult;
use crate::sample::{extract, ChannelMasks, RawImage};

/// Implémentation X11
/// X11 implementation
#[cfg(target_os = "linux")]
pub mod linux;

// =============================================================================
// BACKEND
// =============================================================================

/// Pointer input as seen by the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEvent {
    /// A mouse button went down at root coordinates (x, y)
    ButtonPress { button: u8, x: i32, y: i32 },
    /// Anything the session does not act on
    Other,
}

/// What a picking session needs from the display server
pub trait Backend {
    type Image: RawImage;

    /// Takes exclusive control of the pointer
    fn grab_pointer(&mut self) -> PickerResult<()>;

    /// Releases a grab taken by [`Backend::grab_pointer`]
    fn ungrab(&mut self) -> PickerResult<()>;

    /// Blocks until the next input event
    fn next_event(&mut self) -> PickerResult<PointerEvent>;

    /// Current pointer position in root coordinates
    fn query_pointer(&mut self) -> PickerResult<(i32, i32)>;

    /// Width and height of the root window
    fn screen_size(&self) -> (u32, u32);

    /// Fetches a `size × size` block whose top-left corner is (x, y)
    fn fetch_image(&mut self, x: i32, y: i32, size: u32) -> PickerResult<Self::Image>;

    /// Channel masks of the display's pixel format
    fn channel_masks(&self) -> ChannelMasks;
}

/// Top-left corner of a `size × size` square centered on (x, y), kept inside
/// the screen when the screen is large enough to hold it.
pub fn sample_origin(x: i32, y: i32, size: u32, screen: (u32, u32)) -> (i32, i32) {
    let half = (size / 2) as i32;
    let clamp = |pos: i32, extent: u32| {
        let max = extent.saturating_sub(size) as i32;
        (pos - half).clamp(0, max)
    };
    (clamp(x, screen.0), clamp(y, screen.1))
}

// =============================================================================
// SESSION
// =============================================================================

/// One picking session over a display backend
pub struct Picker<B: Backend> {
    backend: B,
    config: Config,
}

impl<B: Backend> Picker<B> {
    pub fn new(backend: B, config: Config) -> Self {
        Self { backend, config }
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Samples the square centered on (x, y) and averages it
    pub fn sample_at(&mut self, x: i32, y: i32) -> PickerResult<Rgb> {
        let size = self.config.size;
        let (ox, oy) = sample_origin(x, y, size, self.backend.screen_size());
        let image = self.backend.fetch_image(ox, oy, size)?;
        let masks = self.backend.channel_masks();
        let sample = extract(&image, masks, size)?;
        let color = sample.average(self.config.method)?;
        debug!(x, y, size, color = %format_hex_color(color), "got image");
        Ok(color)
    }

    /// Runs the session, writing one line per picked color to `out`.
    ///
    /// Returns the number of colors written. The pointer grab is released on
    /// every exit path.
    pub fn run<W: Write>(&mut self, out: &mut W) -> PickerResult<usize> {
        if self.config.immediate {
            return self.pick_at_pointer(out);
        }

        self.backend.grab_pointer()?;
        info!(multiple = self.config.multiple, "pointer grabbed, waiting for click");
        let picked = self.event_loop(out);
        let released = self.backend.ungrab();
        let picked = picked?;
        released?;
        Ok(picked)
    }

    fn pick_at_pointer<W: Write>(&mut self, out: &mut W) -> PickerResult<usize> {
        let (x, y) = self.backend.query_pointer()?;
        match self.sample_at(x, y) {
            Ok(color) => {
                self.report(out, color)?;
                Ok(1)
            }
            Err(err) if err.is_recoverable() => {
                warn!("{err}");
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }

    fn event_loop<W: Write>(&mut self, out: &mut W) -> PickerResult<usize> {
        let mut picked = 0;
        loop {
            match self.backend.next_event()? {
                PointerEvent::ButtonPress { button: PICK_BUTTON, x, y } => {
                    match self.sample_at(x, y) {
                        Ok(color) => {
                            self.report(out, color)?;
                            picked += 1;
                            if !self.config.multiple {
                                break;
                            }
                        }
                        Err(err) if err.is_recoverable() => warn!("{err}"),
                        Err(err) => return Err(err),
                    }
                }
                PointerEvent::ButtonPress { button: CANCEL_BUTTON, .. } => {
                    debug!(picked, "cancelled");
                    break;
                }
                PointerEvent::ButtonPress { button, .. } => debug!(button, "ignoring button"),
                PointerEvent::Other => {}
            }
        }
        Ok(picked)
    }

    fn report<W: Write>(&self, out: &mut W, color: Rgb) -> PickerResult<()> {
        writeln!(out, "{}", format_color(color, self.config.format)?)?;
        out.flush()?;
        Ok(())
    }
}

// =============================================================================
// FONCTION PUBLIQUE
// PUBLIC FUNCTION
// =============================================================================

/// Lance le color picker natif selon la plateforme
/// Launches the native color picker based on the platform
pub fn run<W: Write>(config: Config, out: &mut W) -> PickerResult<usize> {
    #[cfg(target_os = "linux")]
    {
        let backend = linux::X11Backend::connect()?;
        Picker::new(backend, config).run(out)
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = (config, out);
        Err(crate::error::PickerError::DisplayConnect(
            "unsupported platform".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::OutputFormat;
    use crate::error::PickerError;
    use std::collections::VecDeque;

    struct FakeImage {
        size: u32,
        pixel: u32,
    }

    impl RawImage for FakeImage {
        fn width(&self) -> u32 {
            self.size
        }

        fn height(&self) -> u32 {
            self.size
        }

        fn pixel(&self, _x: u32, _y: u32) -> u32 {
            self.pixel
        }
    }

    /// Scripted backend: replays events and serves a single pixel value
    struct FakeBackend {
        events: VecDeque<PointerEvent>,
        pixel: u32,
        pointer: (i32, i32),
        fail_at: Option<(i32, i32)>,
        grabbed: bool,
        grabs: usize,
        fetches: Vec<(i32, i32, u32)>,
    }

    impl FakeBackend {
        fn new(events: Vec<PointerEvent>, pixel: u32) -> Self {
            Self {
                events: events.into(),
                pixel,
                pointer: (0, 0),
                fail_at: None,
                grabbed: false,
                grabs: 0,
                fetches: Vec::new(),
            }
        }
    }

    impl Backend for FakeBackend {
        type Image = FakeImage;

        fn grab_pointer(&mut self) -> PickerResult<()> {
            self.grabbed = true;
            self.grabs += 1;
            Ok(())
        }

        fn ungrab(&mut self) -> PickerResult<()> {
            self.grabbed = false;
            Ok(())
        }

        fn next_event(&mut self) -> PickerResult<PointerEvent> {
            self.events
                .pop_front()
                .ok_or_else(|| PickerError::Connection("no more events".into()))
        }

        fn query_pointer(&mut self) -> PickerResult<(i32, i32)> {
            Ok(self.pointer)
        }

        fn screen_size(&self) -> (u32, u32) {
            (100, 100)
        }

        fn fetch_image(&mut self, x: i32, y: i32, size: u32) -> PickerResult<FakeImage> {
            self.fetches.push((x, y, size));
            if self.fail_at == Some((x, y)) {
                return Err(PickerError::ImageFetch { x, y });
            }
            Ok(FakeImage { size, pixel: self.pixel })
        }

        fn channel_masks(&self) -> ChannelMasks {
            ChannelMasks::RGB888
        }
    }

    fn click(button: u8, x: i32, y: i32) -> PointerEvent {
        PointerEvent::ButtonPress { button, x, y }
    }

    fn run_session(backend: FakeBackend, config: Config) -> (PickerResult<usize>, String, FakeBackend) {
        let mut out = Vec::new();
        let mut picker = Picker::new(backend, config);
        let result = picker.run(&mut out);
        (result, String::from_utf8(out).unwrap(), picker.into_backend())
    }

    #[test]
    fn test_single_pick() {
        let backend = FakeBackend::new(vec![PointerEvent::Other, click(1, 10, 20), click(1, 30, 40)], 0x00112233);
        let (result, out, backend) = run_session(backend, Config::default());
        assert_eq!(result.unwrap(), 1);
        assert_eq!(out, "#112233\n");
        assert_eq!(backend.fetches, vec![(10, 20, 1)]);
        assert_eq!(backend.grabs, 1);
        assert!(!backend.grabbed);
        // the second click was never consumed
        assert_eq!(backend.events.len(), 1);
    }

    #[test]
    fn test_multiple_until_right_click() {
        let events = vec![click(1, 1, 1), click(2, 5, 5), click(1, 2, 2), click(3, 0, 0), click(1, 3, 3)];
        let config = Config { multiple: true, ..Config::default() };
        let (result, out, backend) = run_session(FakeBackend::new(events, 0x00FF0080), config);
        assert_eq!(result.unwrap(), 2);
        assert_eq!(out, "#ff0080\n#ff0080\n");
        assert!(!backend.grabbed);
    }

    #[test]
    fn test_right_click_cancels() {
        let (result, out, backend) = run_session(FakeBackend::new(vec![click(3, 0, 0)], 0), Config::default());
        assert_eq!(result.unwrap(), 0);
        assert!(out.is_empty());
        assert!(backend.fetches.is_empty());
    }

    #[test]
    fn test_fetch_failure_skips_click() {
        let mut backend = FakeBackend::new(vec![click(1, 7, 7), click(1, 8, 8)], 0x00010203);
        backend.fail_at = Some((7, 7));
        let (result, out, backend) = run_session(backend, Config::default());
        assert_eq!(result.unwrap(), 1);
        assert_eq!(out, "#010203\n");
        assert_eq!(backend.fetches.len(), 2);
    }

    #[test]
    fn test_grab_released_on_error() {
        // event stream ends with a connection error
        let (result, _, backend) = run_session(FakeBackend::new(vec![PointerEvent::Other], 0), Config::default());
        assert!(matches!(result, Err(PickerError::Connection(_))));
        assert!(!backend.grabbed);
    }

    #[test]
    fn test_immediate_mode() {
        let mut backend = FakeBackend::new(Vec::new(), 0x00ABCDEF);
        backend.pointer = (50, 60);
        let config = Config { immediate: true, format: OutputFormat::Rgb, ..Config::default() };
        let (result, out, backend) = run_session(backend, config);
        assert_eq!(result.unwrap(), 1);
        assert_eq!(out, "rgb(171, 205, 239)\n");
        assert_eq!(backend.grabs, 0);
        assert_eq!(backend.fetches, vec![(50, 60, 1)]);
    }

    #[test]
    fn test_sample_is_centered() {
        let config = Config { size: 5, ..Config::default() };
        let (result, _, backend) = run_session(FakeBackend::new(vec![click(1, 50, 50)], 0), config);
        assert_eq!(result.unwrap(), 1);
        assert_eq!(backend.fetches, vec![(48, 48, 5)]);
    }

    #[test]
    fn test_sample_origin_clamped() {
        let screen = (100, 80);
        assert_eq!(sample_origin(0, 0, 5, screen), (0, 0));
        assert_eq!(sample_origin(99, 79, 5, screen), (95, 75));
        assert_eq!(sample_origin(10, 10, 1, screen), (10, 10));
        assert_eq!(sample_origin(50, 40, 200, screen), (0, 0));
    }
}
