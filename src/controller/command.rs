//! Commands sent to a running controller from other threads

use crossbeam_channel::Sender;

use super::MergeMode;
use crate::effects::BoxedEffect;
use crate::error::{Result, StripError};

/// One controller operation, applied at the next tick boundary
#[derive(Debug)]
pub enum Command {
    SetEffect(BoxedEffect),
    AddLayer,
    DeleteLayer,
    ClearLayer,
    ResetLayers,
    SetLayer(usize),
    SetMergeMode(MergeMode),
    SetBrightness(f32),
    Pause,
    Resume,
    Stop,
}

/// Cloneable remote control for a [`Controller`](super::Controller)
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    sender: Sender<Command>,
}

impl ControllerHandle {
    pub(crate) fn new(sender: Sender<Command>) -> Self {
        Self { sender }
    }

    pub fn send(&self, command: Command) -> Result<()> {
        self.sender
            .send(command)
            .map_err(|_| StripError::ControllerGone)
    }

    pub fn set_effect(&self, effect: BoxedEffect) -> Result<()> {
        self.send(Command::SetEffect(effect))
    }

    pub fn add_layer(&self) -> Result<()> {
        self.send(Command::AddLayer)
    }

    pub fn delete_layer(&self) -> Result<()> {
        self.send(Command::DeleteLayer)
    }

    pub fn clear_layer(&self) -> Result<()> {
        self.send(Command::ClearLayer)
    }

    pub fn reset_layers(&self) -> Result<()> {
        self.send(Command::ResetLayers)
    }

    pub fn set_layer(&self, index: usize) -> Result<()> {
        self.send(Command::SetLayer(index))
    }

    pub fn set_merge_mode(&self, mode: MergeMode) -> Result<()> {
        self.send(Command::SetMergeMode(mode))
    }

    pub fn set_brightness(&self, brightness: f32) -> Result<()> {
        self.send(Command::SetBrightness(brightness))
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(Command::Resume)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }
}
