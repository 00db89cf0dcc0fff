// Status indicator on an addressable LED strip.
//
// The whole strip shows one solid color reflecting controller state.
// Write failures are logged and dropped so the indicator can never block
// actuation.

use std::io::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serialport::SerialPort;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub const BOOT: Rgb = Rgb::new(255, 0, 255);
pub const READY: Rgb = Rgb::new(0, 255, 0);
pub const STOPPED: Rgb = Rgb::new(0, 0, 255);
pub const COMMAND_RECEIVED: Rgb = Rgb::new(255, 255, 255);
pub const LOW_SELECTED: Rgb = Rgb::new(255, 255, 0);
pub const HIGH_SELECTED: Rgb = Rgb::new(255, 0, 0);
pub const AUXILIARY: Rgb = Rgb::new(0, 255, 255);

#[derive(Debug, thiserror::Error)]
pub enum IndicatorError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A strip that can be filled with one color and latched
pub trait IndicatorStrip: Send {
    fn show(&mut self, color: Rgb) -> Result<(), IndicatorError>;
}

impl<T: IndicatorStrip + ?Sized> IndicatorStrip for Box<T> {
    fn show(&mut self, color: Rgb) -> Result<(), IndicatorError> {
        (**self).show(color)
    }
}

/// No strip fitted
#[derive(Debug, Default)]
pub struct NullStrip;

impl IndicatorStrip for NullStrip {
    fn show(&mut self, color: Rgb) -> Result<(), IndicatorError> {
        debug!("Indicator (no hardware): {:?}", color);
        Ok(())
    }
}

/// Adalight-protocol strip on a serial port
pub struct SerialStrip {
    port: Box<dyn SerialPort>,
    pixels: usize,
}

impl SerialStrip {
    pub const BAUDRATE: u32 = 115_200;

    pub fn open(port_name: &str, pixels: usize) -> Result<Self, IndicatorError> {
        info!("Opening LED strip on {} ({} pixels)", port_name, pixels);
        let port = serialport::new(port_name, Self::BAUDRATE)
            .timeout(Duration::from_millis(100))
            .open()?;
        Ok(Self { port, pixels })
    }

    /// Header "Ada", count-1 as big-endian u16, checksum, then RGB per pixel
    fn build_frame(pixels: usize, color: Rgb) -> Vec<u8> {
        let count = pixels.saturating_sub(1) as u16;
        let [hi, lo] = count.to_be_bytes();

        let mut frame = Vec::with_capacity(6 + pixels * 3);
        frame.extend_from_slice(b"Ada");
        frame.extend_from_slice(&[hi, lo, hi ^ lo ^ 0x55]);
        for _ in 0..pixels {
            frame.extend_from_slice(&[color.r, color.g, color.b]);
        }
        frame
    }
}

impl IndicatorStrip for SerialStrip {
    fn show(&mut self, color: Rgb) -> Result<(), IndicatorError> {
        let frame = Self::build_frame(self.pixels, color);
        self.port.write_all(&frame)?;
        self.port.flush()?;
        Ok(())
    }
}

/// Solid-color status indicator
pub struct Indicator<S: IndicatorStrip> {
    strip: S,
    color: Rgb,
}

impl<S: IndicatorStrip> Indicator<S> {
    pub fn new(strip: S) -> Self {
        Self {
            strip,
            color: Rgb::default(),
        }
    }

    /// Fill every pixel with `(r, g, b)` and latch it
    pub fn set_color(&mut self, r: u8, g: u8, b: u8) {
        self.show(Rgb::new(r, g, b));
    }

    fn show(&mut self, color: Rgb) {
        self.color = color;
        if let Err(e) = self.strip.show(color) {
            warn!("Indicator write failed: {}", e);
        }
    }

    pub fn boot(&mut self) {
        self.show(BOOT);
    }

    pub fn ready(&mut self) {
        self.show(READY);
    }

    pub fn stopped(&mut self) {
        self.show(STOPPED);
    }

    pub fn command_received(&mut self) {
        self.show(COMMAND_RECEIVED);
    }

    pub fn low_selected(&mut self) {
        self.show(LOW_SELECTED);
    }

    pub fn high_selected(&mut self) {
        self.show(HIGH_SELECTED);
    }

    pub fn auxiliary(&mut self) {
        self.show(AUXILIARY);
    }

    /// Last color sent to the strip
    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn strip(&self) -> &S {
        &self.strip
    }
}
