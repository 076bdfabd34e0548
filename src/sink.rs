//! Pixel sink: the narrow interface through which a finished frame reaches
//! hardware. A mock implementation backs the no-hardware run mode and the
//! viewer path when nothing physical is attached.

use crate::color::Rgbw;
use crate::errors::EngineError;
use std::sync::{Arc, Mutex};

/// Abstract driver that accepts a full RGBW frame and pushes it to
/// hardware (or, for [`MockSink`], simply remembers it).
pub trait PixelSink: Send {
    fn pixel_count(&self) -> usize;

    /// Push `frame` to the strand. `frame.len()` is always exactly
    /// `pixel_count()` — the render loop guarantees this.
    fn show(&mut self, frame: &[Rgbw]) -> Result<(), EngineError>;
}

/// In-memory sink used for local development and for the hardware-less
/// run mode. Stores the last frame behind a mutex so tests (and, if ever
/// needed, a debug endpoint) can observe exactly what was pushed.
pub struct MockSink {
    pixel_count: usize,
    last_frame: Arc<Mutex<Vec<Rgbw>>>,
}

impl MockSink {
    pub fn new(pixel_count: usize) -> Self {
        Self {
            pixel_count,
            last_frame: Arc::new(Mutex::new(vec![Rgbw::BLACK; pixel_count])),
        }
    }

    /// A handle other code (tests, a future debug endpoint) can use to read
    /// the last frame the mock sink was shown.
    pub fn frame_handle(&self) -> Arc<Mutex<Vec<Rgbw>>> {
        Arc::clone(&self.last_frame)
    }
}

impl PixelSink for MockSink {
    fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    fn show(&mut self, frame: &[Rgbw]) -> Result<(), EngineError> {
        debug_assert_eq!(frame.len(), self.pixel_count);
        let mut guard = self.last_frame.lock().unwrap();
        guard.clear();
        guard.extend_from_slice(frame);
        Ok(())
    }
}

#[cfg(feature = "hardware")]
pub mod hardware {
    //! Real hardware backend. The strand is addressed as a single row of
    //! `N` pixels on an `rpi-led-matrix` canvas — the narrow interface
    //! spec.md asks for doesn't require the matrix driver to understand
    //! scale/hex geometry, only to accept `N` ordered colors per tick.
    //! RGBW is approximated on the RGB-only matrix hardware by additively
    //! blending the white channel into each color channel (see
    //! DESIGN.md).

    use super::PixelSink;
    use crate::color::Rgbw;
    use crate::errors::EngineError;
    use rpi_led_matrix::{LedCanvas, LedColor, LedMatrix, LedMatrixOptions, LedRuntimeOptions};

    pub struct MatrixSink {
        matrix: LedMatrix,
        canvas: LedCanvas,
        pixel_count: usize,
    }

    impl MatrixSink {
        pub fn new(pixel_count: usize) -> Result<Self, EngineError> {
            let mut options = LedMatrixOptions::new();
            options.set_rows(1);
            options.set_cols(pixel_count as u32);
            options.set_hardware_mapping("adafruit-hat");
            options
                .set_pwm_bits(8)
                .map_err(|e| EngineError::Driver(e.to_string()))?;
            options.set_pwm_lsb_nanoseconds(130);

            let mut rt_options = LedRuntimeOptions::new();
            rt_options.set_gpio_slowdown(2);

            let matrix = LedMatrix::new(Some(options), Some(rt_options))
                .map_err(|e| EngineError::Driver(e.to_string()))?;
            let canvas = matrix.offscreen_canvas();

            Ok(Self {
                matrix,
                canvas,
                pixel_count,
            })
        }
    }

    fn blend_white(c: Rgbw) -> LedColor {
        LedColor {
            red: c.r.saturating_add(c.w),
            green: c.g.saturating_add(c.w),
            blue: c.b.saturating_add(c.w),
        }
    }

    impl PixelSink for MatrixSink {
        fn pixel_count(&self) -> usize {
            self.pixel_count
        }

        fn show(&mut self, frame: &[Rgbw]) -> Result<(), EngineError> {
            if frame.len() != self.pixel_count {
                return Err(EngineError::Driver(format!(
                    "expected {} pixels, got {}",
                    self.pixel_count,
                    frame.len()
                )));
            }
            for (i, &color) in frame.iter().enumerate() {
                self.canvas.set(i as i32, 0, &blend_white(color));
            }
            // `swap` consumes the drawn canvas and hands back the
            // previously-displayed one to draw into next tick.
            let next = self.matrix.swap(std::mem::replace(
                &mut self.canvas,
                self.matrix.offscreen_canvas(),
            ));
            self.canvas = next;
            Ok(())
        }
    }
}
