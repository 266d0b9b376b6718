//! Pixel sinks: where finished frames go

use std::io::{self, Write};

use crate::color::Color;

/// Output device for merged frames
pub trait PixelSink {
    /// Number of addressable pixels
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stage a pixel for the next [`show`](PixelSink::show)
    fn set_pixel(&mut self, index: usize, color: Color);

    /// Push the staged frame to the device
    fn show(&mut self) -> io::Result<()>;

    /// Global output brightness in [0, 1]
    fn brightness(&self) -> f32;

    fn set_brightness(&mut self, brightness: f32);

    /// Turn the device off and free it; no further frames follow
    fn release(&mut self);
}

/// Headless sink that records every shown frame
#[derive(Debug, Clone)]
pub struct MemorySink {
    staged: Vec<Color>,
    frames: Vec<Vec<Color>>,
    brightness: f32,
    released: bool,
}

impl MemorySink {
    pub fn new(len: usize) -> Self {
        Self {
            staged: vec![Color::BLACK; len],
            frames: Vec::new(),
            brightness: 1.0,
            released: false,
        }
    }

    pub fn frames(&self) -> &[Vec<Color>] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&[Color]> {
        self.frames.last().map(Vec::as_slice)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl PixelSink for MemorySink {
    fn len(&self) -> usize {
        self.staged.len()
    }

    fn set_pixel(&mut self, index: usize, color: Color) {
        if let Some(pixel) = self.staged.get_mut(index) {
            *pixel = color;
        }
    }

    fn show(&mut self) -> io::Result<()> {
        self.frames.push(self.staged.clone());
        Ok(())
    }

    fn brightness(&self) -> f32 {
        self.brightness
    }

    fn set_brightness(&mut self, brightness: f32) {
        self.brightness = brightness.clamp(0.0, 1.0);
    }

    fn release(&mut self) {
        self.released = true;
    }
}

/// Terminal preview using 24-bit ANSI background colors, one cell per pixel
#[derive(Debug)]
pub struct AnsiSink<W: Write> {
    out: W,
    staged: Vec<Color>,
    brightness: f32,
}

impl<W: Write> AnsiSink<W> {
    pub fn new(out: W, len: usize) -> Self {
        Self {
            out,
            staged: vec![Color::BLACK; len],
            brightness: 1.0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Displayed RGB: color over black, scaled by brightness
    fn displayed(&self, color: Color) -> (u8, u8, u8) {
        let scale = f64::from(color.alpha() * self.brightness);
        let level = |c: u8| (f64::from(c) * scale) as u8;
        (level(color.r), level(color.g), level(color.b))
    }
}

impl<W: Write> PixelSink for AnsiSink<W> {
    fn len(&self) -> usize {
        self.staged.len()
    }

    fn set_pixel(&mut self, index: usize, color: Color) {
        if let Some(pixel) = self.staged.get_mut(index) {
            *pixel = color;
        }
    }

    fn show(&mut self) -> io::Result<()> {
        let mut line = String::with_capacity(self.staged.len() * 20 + 8);
        line.push('\r');
        for color in &self.staged {
            let (r, g, b) = self.displayed(*color);
            line.push_str(&format!("\x1b[48;2;{r};{g};{b}m "));
        }
        line.push_str("\x1b[0m");
        self.out.write_all(line.as_bytes())?;
        self.out.flush()
    }

    fn brightness(&self) -> f32 {
        self.brightness
    }

    fn set_brightness(&mut self, brightness: f32) {
        self.brightness = brightness.clamp(0.0, 1.0);
    }

    fn release(&mut self) {
        self.staged.iter_mut().for_each(|p| *p = Color::BLACK);
        if let Err(e) = self.show().and_then(|_| self.out.write_all(b"\n")) {
            log::warn!("Failed to blank terminal preview: {e}");
        }
    }
}
