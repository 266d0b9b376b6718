//! Audio-reactive effect driven by an external spectrum feed
//!
//! Decoding and FFT analysis live outside the crate. A [`SpectrumFeed`]
//! delivers one set of normalized bins per tick; once it runs dry or fails
//! the effect turns static and the controller retires it.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};
use parking_lot::Mutex;

use super::{BoxedEffect, ChildEffect, Effect, EffectKind};
use crate::color::{Color, clamp};
use crate::error::Result;

/// Source of per-tick spectrum bins in [0, 1]
pub trait SpectrumFeed: Send + fmt::Debug {
    /// Bins covering the next `dt` seconds, `Ok(None)` once the source has ended
    fn next_bins(&mut self, dt: f64) -> Result<Option<Vec<f32>>>;
}

/// Feed backed by a channel; the newest frame wins, a disconnect ends the feed
#[derive(Debug)]
pub struct ChannelFeed {
    receiver: Receiver<Vec<f32>>,
    last: Vec<f32>,
}

impl ChannelFeed {
    pub fn new(receiver: Receiver<Vec<f32>>) -> Self {
        Self {
            receiver,
            last: Vec::new(),
        }
    }
}

impl SpectrumFeed for ChannelFeed {
    fn next_bins(&mut self, _dt: f64) -> Result<Option<Vec<f32>>> {
        let mut fresh = None;
        loop {
            match self.receiver.try_recv() {
                Ok(bins) => fresh = Some(bins),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if fresh.is_none() {
                        return Ok(None);
                    }
                    break;
                }
            }
        }
        if let Some(bins) = fresh {
            self.last = bins;
        }
        Ok(Some(self.last.clone()))
    }
}

/// Maps each pixel's spectrum bin to a position in the child's colors
#[derive(Debug)]
pub struct Spectrum {
    child: ChildEffect,
    feed: Arc<Mutex<Box<dyn SpectrumFeed>>>,
    ended: bool,
}

impl Spectrum {
    pub fn new(effect: BoxedEffect, feed: Box<dyn SpectrumFeed>) -> Self {
        Self {
            child: ChildEffect::new(effect),
            feed: Arc::new(Mutex::new(feed)),
            ended: false,
        }
    }

    fn finish(&mut self) {
        self.ended = true;
    }
}

impl Effect for Spectrum {
    fn kind(&self) -> EffectKind {
        if self.ended {
            EffectKind::Static
        } else {
            EffectKind::Dynamic
        }
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        if self.ended {
            return;
        }
        let next = self.feed.lock().next_bins(dt);
        let bins = match next {
            Ok(Some(bins)) => bins,
            Ok(None) => {
                log::info!("Spectrum feed ended, retiring effect");
                self.finish();
                return;
            }
            Err(e) => {
                log::warn!("Spectrum feed failed, retiring effect: {e}");
                self.finish();
                return;
            }
        };

        let base = self.child.render(pixels, dt);
        let n = pixels.len();
        if bins.is_empty() {
            pixels.copy_from_slice(base);
            return;
        }
        for (i, pixel) in pixels.iter_mut().enumerate() {
            let bin = bins[i * bins.len() / n];
            let level = clamp(f64::from(bin), 0.0, 1.0);
            *pixel = base[(level * (n - 1) as f64).round() as usize];
        }
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Self {
            child: self.child.clone_child(),
            feed: Arc::clone(&self.feed),
            ended: false,
        })
    }
}
