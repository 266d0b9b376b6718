//! Layered real-time renderer
//!
//! The controller owns an ordered stack of layers, each a pixel buffer with an
//! optional effect. Every tick it advances the effects, merges the layers from
//! the base upward and pushes the result to a [`PixelSink`]. Other threads
//! steer it through a [`ControllerHandle`]; commands are applied only between
//! ticks.

pub mod command;
pub mod sink;

pub use command::{Command, ControllerHandle};
pub use sink::{AnsiSink, MemorySink, PixelSink};

use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};

use crate::color::{self, Color};
use crate::effects::{BoxedEffect, EffectKind};
use crate::error::{Result, StripError};
use crate::settings::StripSettings;

/// How an upper layer combines with everything below it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Alpha-composite on top; opaque pixels replace
    #[default]
    Overwrite,
    /// Saturating sum
    Add,
    /// Channel mean
    Blend,
    /// Channel product / 255
    Multiply,
}

impl MergeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMode::Overwrite => "overwrite",
            MergeMode::Add => "add",
            MergeMode::Blend => "blend",
            MergeMode::Multiply => "multiply",
        }
    }

    fn apply(self, under: Color, over: Color) -> Color {
        match self {
            MergeMode::Overwrite => color::alpha_composite(under, over),
            MergeMode::Add => color::add(under, over),
            MergeMode::Blend => color::blend(under, over),
            MergeMode::Multiply => color::multiply(under, over),
        }
    }
}

impl FromStr for MergeMode {
    type Err = StripError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(MergeMode::Overwrite),
            "add" => Ok(MergeMode::Add),
            "blend" => Ok(MergeMode::Blend),
            "multiply" => Ok(MergeMode::Multiply),
            other => Err(StripError::construction(
                "merge mode",
                format!("`{other}` is not one of overwrite, add, blend, multiply"),
            )),
        }
    }
}

/// Merge layer buffers bottom to top
///
/// Sentinel pixels in the base become opaque black; sentinel pixels in upper
/// layers leave the result untouched.
pub fn merge<'a>(layers: impl IntoIterator<Item = &'a [Color]>, mode: MergeMode) -> Vec<Color> {
    let mut layers = layers.into_iter();
    let Some(base) = layers.next() else {
        return Vec::new();
    };
    let mut result: Vec<Color> = base
        .iter()
        .map(|c| if c.is_none() { Color::BLACK } else { *c })
        .collect();
    for layer in layers {
        for (out, pixel) in result.iter_mut().zip(layer) {
            if !pixel.is_none() {
                *out = mode.apply(*out, *pixel);
            }
        }
    }
    result
}

/// Loop state; `Stopped` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Built but never run
    Idle,
    Running,
    Paused,
    Stopped,
}

/// A pixel buffer plus the effect that paints it
#[derive(Debug)]
pub struct Layer {
    pixels: Vec<Color>,
    effect: Option<BoxedEffect>,
}

impl Layer {
    fn empty(n: usize) -> Self {
        Self {
            pixels: vec![Color::NONE; n],
            effect: None,
        }
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn has_effect(&self) -> bool {
        self.effect.is_some()
    }

    /// Advance the layer's effect; a static effect renders once and retires
    fn advance(&mut self, dt: f64) {
        let Some(effect) = self.effect.as_mut() else {
            return;
        };
        match effect.kind() {
            EffectKind::Static => {
                effect.tick(&mut self.pixels, 0.0);
                self.effect = None;
            }
            EffectKind::Dynamic => effect.tick(&mut self.pixels, dt),
        }
    }
}

/// Layer stack, merge policy and tick loop
#[derive(Debug)]
pub struct Controller {
    layers: Vec<Layer>,
    current: usize,
    merge: MergeMode,
    tick_period: Duration,
    pixel_count: usize,
    brightness: f32,
    state: RunState,
    last_tick: Option<Instant>,
    sender: Sender<Command>,
    commands: Receiver<Command>,
}

impl Controller {
    pub fn new(pixel_count: usize, ticks_per_second: f64) -> Result<Self> {
        if pixel_count == 0 {
            return Err(StripError::construction("pixel count", "must be at least 1"));
        }
        if !ticks_per_second.is_finite() || ticks_per_second <= 0.0 {
            return Err(StripError::construction(
                "tick rate",
                format!("{ticks_per_second} must be a positive number"),
            ));
        }
        let (sender, commands) = unbounded();
        Ok(Self {
            layers: vec![Layer::empty(pixel_count)],
            current: 0,
            merge: MergeMode::default(),
            tick_period: Duration::from_secs_f64(1.0 / ticks_per_second),
            pixel_count,
            brightness: 1.0,
            state: RunState::Idle,
            last_tick: None,
            sender,
            commands,
        })
    }

    pub fn from_settings(settings: &StripSettings) -> Result<Self> {
        let mut controller = Self::new(settings.pixel_count, settings.ticks_per_second)?;
        controller.set_merge_mode(settings.merge);
        controller.set_brightness(settings.brightness);
        Ok(controller)
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle::new(self.sender.clone())
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn current_layer(&self) -> usize {
        self.current
    }

    pub fn merge_mode(&self) -> MergeMode {
        self.merge
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Install an effect on the current layer
    pub fn set_effect(&mut self, effect: BoxedEffect) {
        self.layers[self.current].effect = Some(effect);
    }

    /// Insert an empty layer above the current one and make it current
    pub fn add_layer(&mut self) {
        self.layers
            .insert(self.current + 1, Layer::empty(self.pixel_count));
        self.current += 1;
    }

    /// Remove the current layer; the stack never drops below one layer
    pub fn delete_layer(&mut self) {
        self.layers.remove(self.current);
        if self.layers.is_empty() {
            self.layers.push(Layer::empty(self.pixel_count));
        }
        self.current = self.current.saturating_sub(1).min(self.layers.len() - 1);
    }

    pub fn clear_layer(&mut self) {
        self.layers[self.current] = Layer::empty(self.pixel_count);
    }

    pub fn reset_layers(&mut self) {
        self.layers = vec![Layer::empty(self.pixel_count)];
        self.current = 0;
    }

    /// Select the current layer, clamped to the stack
    pub fn set_layer(&mut self, index: usize) {
        self.current = index.min(self.layers.len() - 1);
    }

    pub fn set_merge_mode(&mut self, mode: MergeMode) {
        self.merge = mode;
    }

    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = brightness.clamp(0.0, 1.0);
    }

    /// Pausing before `run` makes the loop start paused
    pub fn pause(&mut self) {
        if matches!(self.state, RunState::Idle | RunState::Running) {
            self.state = RunState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.state = RunState::Running;
            // Time spent paused does not count
            self.last_tick = None;
        }
    }

    pub fn stop(&mut self) {
        self.state = RunState::Stopped;
    }

    /// Advance every layer by `dt` seconds and merge the stack
    pub fn step(&mut self, dt: f64) -> Vec<Color> {
        for layer in &mut self.layers {
            layer.advance(dt);
        }
        merge(self.layers.iter().map(|l| l.pixels.as_slice()), self.merge)
    }

    fn apply(&mut self, command: Command) {
        log::debug!("Applying {command:?}");
        match command {
            Command::SetEffect(effect) => self.set_effect(effect),
            Command::AddLayer => self.add_layer(),
            Command::DeleteLayer => self.delete_layer(),
            Command::ClearLayer => self.clear_layer(),
            Command::ResetLayers => self.reset_layers(),
            Command::SetLayer(index) => self.set_layer(index),
            Command::SetMergeMode(mode) => self.set_merge_mode(mode),
            Command::SetBrightness(brightness) => self.set_brightness(brightness),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Stop => self.stop(),
        }
    }

    /// Apply every queued command
    pub fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }
    }

    /// Drive `sink` until a stop command arrives or the sink fails
    pub fn run(&mut self, sink: &mut dyn PixelSink) -> Result<()> {
        if sink.len() != self.pixel_count {
            return Err(StripError::invariant(format!(
                "sink has {} pixels, controller has {}",
                sink.len(),
                self.pixel_count
            )));
        }
        if self.state == RunState::Stopped {
            log::warn!("Controller was already stopped, not running");
            sink.release();
            return Ok(());
        }
        log::info!(
            "Controller running: {} pixels, {:.1} ticks/s, {} merge",
            self.pixel_count,
            1.0 / self.tick_period.as_secs_f64(),
            self.merge.as_str()
        );
        if self.state == RunState::Idle {
            self.state = RunState::Running;
        }
        self.last_tick = None;

        loop {
            self.drain_commands();
            match self.state {
                RunState::Stopped => break,
                RunState::Paused => {
                    self.last_tick = None;
                    thread::sleep(self.tick_period);
                    continue;
                }
                RunState::Idle | RunState::Running => {}
            }

            let now = Instant::now();
            let dt = self
                .last_tick
                .map_or(0.0, |last| now.duration_since(last).as_secs_f64());
            self.last_tick = Some(now);

            let frame = self.step(dt);
            if sink.brightness() != self.brightness {
                sink.set_brightness(self.brightness);
            }
            for (i, color) in frame.into_iter().enumerate() {
                sink.set_pixel(i, color);
            }
            if let Err(e) = sink.show() {
                log::error!("Pixel sink failed, stopping: {e}");
                self.state = RunState::Stopped;
                sink.release();
                return Err(StripError::Sink(e));
            }

            thread::sleep(self.tick_period);
        }

        sink.release();
        log::info!("Controller stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::*;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::io;
    use std::sync::Arc;

    /// Sink that asks the controller to stop after a number of frames
    struct StopAfter {
        inner: MemorySink,
        frames: usize,
        handle: ControllerHandle,
    }

    impl PixelSink for StopAfter {
        fn len(&self) -> usize {
            self.inner.len()
        }
        fn set_pixel(&mut self, index: usize, color: Color) {
            self.inner.set_pixel(index, color);
        }
        fn show(&mut self) -> io::Result<()> {
            self.inner.show()?;
            if self.inner.frames().len() == self.frames {
                self.handle.stop().ok();
            }
            Ok(())
        }
        fn brightness(&self) -> f32 {
            self.inner.brightness()
        }
        fn set_brightness(&mut self, brightness: f32) {
            self.inner.set_brightness(brightness);
        }
        fn release(&mut self) {
            self.inner.release();
        }
    }

    struct Broken(MemorySink);

    impl PixelSink for Broken {
        fn len(&self) -> usize {
            self.0.len()
        }
        fn set_pixel(&mut self, index: usize, color: Color) {
            self.0.set_pixel(index, color);
        }
        fn show(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "strip unplugged"))
        }
        fn brightness(&self) -> f32 {
            self.0.brightness()
        }
        fn set_brightness(&mut self, brightness: f32) {
            self.0.set_brightness(brightness);
        }
        fn release(&mut self) {
            self.0.release();
        }
    }

    fn color_strategy() -> impl Strategy<Value = Color> {
        prop_oneof![
            Just(Color::NONE),
            (any::<u8>(), any::<u8>(), any::<u8>(), 0.0f32..=1.0)
                .prop_map(|(r, g, b, a)| Color::rgba(r, g, b, a)),
        ]
    }

    #[test]
    fn test_static_fill_sets_pixels_and_retires() {
        let mut controller = Controller::new(8, 100.0).unwrap();
        controller.set_effect(solid(Color::GREEN));
        let frame = controller.step(0.1);
        assert_eq!(frame, vec![Color::GREEN; 8]);
        assert!(!controller.layers()[0].has_effect());
        // The painted buffer persists after the effect retires
        assert_eq!(controller.step(0.1), vec![Color::GREEN; 8]);
    }

    #[test]
    fn test_static_effect_ticks_once_with_zero_dt() {
        let counted = Counted::default();
        let ticks = counted.ticks.clone();
        let mut controller = Controller::new(4, 100.0).unwrap();
        controller.set_effect(Box::new(counted));
        controller.step(0.5);
        controller.step(0.5);
        assert_eq!(ticks.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dynamic_effect_gets_dt() {
        let mut controller = Controller::new(2, 100.0).unwrap();
        controller.set_effect(Box::new(Clock::default()));
        controller.step(2.0);
        let frame = controller.step(3.0);
        assert_eq!(frame[0].r, 5);
        assert!(controller.layers()[0].has_effect());
    }

    #[test]
    fn test_empty_base_is_black() {
        let mut controller = Controller::new(3, 100.0).unwrap();
        assert_eq!(controller.step(0.0), vec![Color::BLACK; 3]);
    }

    #[test]
    fn test_layer_management() {
        let mut controller = Controller::new(4, 100.0).unwrap();
        controller.add_layer();
        controller.add_layer();
        assert_eq!(controller.layers().len(), 3);
        assert_eq!(controller.current_layer(), 2);

        controller.set_layer(0);
        controller.add_layer();
        assert_eq!(controller.current_layer(), 1);
        assert_eq!(controller.layers().len(), 4);

        controller.set_layer(99);
        assert_eq!(controller.current_layer(), 3);

        controller.set_layer(0);
        controller.delete_layer();
        assert_eq!(controller.current_layer(), 0);
        assert_eq!(controller.layers().len(), 3);

        for _ in 0..5 {
            controller.delete_layer();
        }
        assert_eq!(controller.layers().len(), 1);
        assert_eq!(controller.current_layer(), 0);
    }

    #[test]
    fn test_upper_sentinels_show_through() {
        let mut controller = Controller::new(4, 100.0).unwrap();
        controller.set_effect(solid(Color::RED));
        controller.add_layer();
        controller.set_effect(Box::new(
            crate::effects::Crop::new(solid(Color::BLUE), 1, 2).unwrap(),
        ));
        let frame = controller.step(0.0);
        assert_eq!(frame, vec![Color::RED, Color::RED, Color::BLUE, Color::RED]);

        controller.clear_layer();
        assert_eq!(controller.step(0.0), vec![Color::RED; 4]);
        controller.reset_layers();
        assert_eq!(controller.step(0.0), vec![Color::BLACK; 4]);
    }

    #[test]
    fn test_overwrite_is_order_dependent() {
        let red = vec![Color::RED; 2];
        let green = vec![Color::GREEN; 2];
        let blue = vec![Color::BLUE; 2];
        let a = merge([&red[..], &green[..], &blue[..]], MergeMode::Overwrite);
        let b = merge([&blue[..], &red[..], &green[..]], MergeMode::Overwrite);
        assert_eq!(a, vec![Color::BLUE; 2]);
        assert_eq!(b, vec![Color::GREEN; 2]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_other_merge_modes() {
        let base = vec![Color::rgb(200, 100, 0)];
        let top = vec![Color::rgb(100, 100, 255)];
        assert_eq!(merge([&base[..], &top[..]], MergeMode::Add), vec![Color::rgb(255, 200, 255)]);
        assert_eq!(merge([&base[..], &top[..]], MergeMode::Blend), vec![Color::rgb(150, 100, 127)]);
        assert_eq!(merge([&base[..], &top[..]], MergeMode::Multiply), vec![Color::rgb(78, 39, 0)]);
    }

    #[test]
    fn test_merge_mode_parsing() {
        assert_eq!("ADD".parse::<MergeMode>().unwrap(), MergeMode::Add);
        assert_eq!(" blend ".parse::<MergeMode>().unwrap(), MergeMode::Blend);
        assert!("screen".parse::<MergeMode>().is_err());
        let json = serde_json::to_string(&MergeMode::Multiply).unwrap();
        assert_eq!(json, "\"multiply\"");
    }

    proptest! {
        #[test]
        fn prop_add_merge_order_independent(
            layers in prop::collection::vec(prop::collection::vec(color_strategy(), 6), 3)
        ) {
            let rgb = |frame: Vec<Color>| -> Vec<(u8, u8, u8)> {
                frame.into_iter().map(|c| (c.r, c.g, c.b)).collect()
            };
            let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
            let reference = rgb(merge(layers.iter().map(Vec::as_slice), MergeMode::Add));
            for order in orders {
                let merged = merge(order.iter().map(|&i| layers[i].as_slice()), MergeMode::Add);
                prop_assert_eq!(rgb(merged), reference.clone());
            }
        }
    }

    #[test]
    fn test_run_until_stopped() {
        let mut controller = Controller::new(3, 1000.0).unwrap();
        controller.set_effect(solid(Color::RED));
        let handle = controller.handle();
        let mut sink = StopAfter {
            inner: MemorySink::new(3),
            frames: 3,
            handle: handle.clone(),
        };
        handle.set_brightness(0.25).unwrap();
        controller.run(&mut sink).unwrap();
        assert_eq!(controller.state(), RunState::Stopped);
        assert_eq!(sink.inner.frames().len(), 3);
        assert_eq!(sink.inner.last_frame(), Some(&[Color::RED; 3][..]));
        assert_eq!(sink.inner.brightness(), 0.25);
        assert!(sink.inner.is_released());
    }

    #[test]
    fn test_run_rejects_mismatched_sink() {
        let mut controller = Controller::new(3, 1000.0).unwrap();
        let mut sink = MemorySink::new(4);
        assert!(matches!(controller.run(&mut sink), Err(StripError::Invariant(_))));
    }

    #[test]
    fn test_sink_failure_stops_loop() {
        let mut controller = Controller::new(2, 1000.0).unwrap();
        let mut sink = Broken(MemorySink::new(2));
        assert!(matches!(controller.run(&mut sink), Err(StripError::Sink(_))));
        assert_eq!(controller.state(), RunState::Stopped);
        assert!(sink.0.is_released());
    }

    #[test]
    fn test_pause_and_resume() {
        let mut controller = Controller::new(2, 100.0).unwrap();
        assert_eq!(controller.state(), RunState::Idle);
        controller.resume();
        assert_eq!(controller.state(), RunState::Idle);
        controller.pause();
        assert_eq!(controller.state(), RunState::Paused);
        controller.resume();
        assert_eq!(controller.state(), RunState::Running);
        assert!(controller.last_tick.is_none());
        controller.stop();
        controller.pause();
        controller.resume();
        assert_eq!(controller.state(), RunState::Stopped);
    }

    #[test]
    fn test_stop_is_terminal() {
        let mut controller = Controller::new(3, 1000.0).unwrap();
        controller.set_effect(solid(Color::RED));
        controller.stop();
        let mut sink = MemorySink::new(3);
        controller.run(&mut sink).unwrap();
        assert!(sink.frames().is_empty());
        assert!(sink.is_released());

        // A second run after a stop command shows nothing either
        let mut controller = Controller::new(3, 1000.0).unwrap();
        let handle = controller.handle();
        let mut first = StopAfter {
            inner: MemorySink::new(3),
            frames: 2,
            handle,
        };
        controller.run(&mut first).unwrap();
        assert_eq!(first.inner.frames().len(), 2);
        let mut second = MemorySink::new(3);
        controller.run(&mut second).unwrap();
        assert!(second.frames().is_empty());
        assert_eq!(controller.state(), RunState::Stopped);
    }

    /// Dynamic effect that records the total time it was given
    #[derive(Debug)]
    struct Stopwatch(Arc<Mutex<f64>>);

    impl crate::effects::Effect for Stopwatch {
        fn kind(&self) -> EffectKind {
            EffectKind::Dynamic
        }
        fn tick(&mut self, _pixels: &mut [Color], dt: f64) {
            *self.0.lock() += dt;
        }
        fn clone_effect(&self) -> BoxedEffect {
            Box::new(Stopwatch(Arc::new(Mutex::new(0.0))))
        }
    }

    /// Pauses after the first frame, resumes from another thread after
    /// `hold`, and stops after the third frame
    struct PauseOnce {
        inner: MemorySink,
        handle: ControllerHandle,
        hold: Duration,
    }

    impl PixelSink for PauseOnce {
        fn len(&self) -> usize {
            self.inner.len()
        }
        fn set_pixel(&mut self, index: usize, color: Color) {
            self.inner.set_pixel(index, color);
        }
        fn show(&mut self) -> io::Result<()> {
            self.inner.show()?;
            match self.inner.frames().len() {
                1 => {
                    self.handle.pause().ok();
                    let handle = self.handle.clone();
                    let hold = self.hold;
                    thread::spawn(move || {
                        thread::sleep(hold);
                        handle.resume().ok();
                    });
                }
                3 => {
                    self.handle.stop().ok();
                }
                _ => {}
            }
            Ok(())
        }
        fn brightness(&self) -> f32 {
            self.inner.brightness()
        }
        fn set_brightness(&mut self, brightness: f32) {
            self.inner.set_brightness(brightness);
        }
        fn release(&mut self) {
            self.inner.release();
        }
    }

    #[test]
    fn test_paused_time_is_not_seen_by_effects() {
        let elapsed = Arc::new(Mutex::new(0.0));
        let mut controller = Controller::new(2, 1000.0).unwrap();
        controller.set_effect(Box::new(Stopwatch(elapsed.clone())));
        let hold = Duration::from_millis(300);
        let mut sink = PauseOnce {
            inner: MemorySink::new(2),
            handle: controller.handle(),
            hold,
        };
        let started = Instant::now();
        controller.run(&mut sink).unwrap();
        assert!(started.elapsed() >= hold);
        assert_eq!(sink.inner.frames().len(), 3);
        // Two post-resume frames at a 1 ms cadence, nowhere near the pause
        let seen = *elapsed.lock();
        assert!(seen < 0.15, "effect saw {seen}s");
    }

    #[test]
    fn test_handle_after_drop() {
        let controller = Controller::new(2, 100.0).unwrap();
        let handle = controller.handle();
        drop(controller);
        assert!(matches!(handle.stop(), Err(StripError::ControllerGone)));
    }

    #[test]
    fn test_rejects_bad_construction() {
        assert!(Controller::new(0, 10.0).is_err());
        assert!(Controller::new(10, 0.0).is_err());
        assert!(Controller::new(10, f64::NAN).is_err());
    }
}
