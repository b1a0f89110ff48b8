//! Capture state machine.
//!
//! Exactly one capture may be active at a time. The guarantee comes from
//! these transitions, not from locking: `idle → recording → stopping → idle`,
//! with cancellation allowed from `recording` and `stopping`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The phase the capture pipeline is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    /// No capture in progress.
    Idle,
    /// Audio is being captured.
    Recording,
    /// Capture has ended; the asset is being finalized.
    Stopping,
}

impl Default for CaptureState {
    fn default() -> Self {
        CaptureState::Idle
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureState::Idle => write!(f, "idle"),
            CaptureState::Recording => write!(f, "recording"),
            CaptureState::Stopping => write!(f, "stopping"),
        }
    }
}

/// Pure state machine governing the capture lifecycle.
///
/// The machine holds no audio; the app layer drives the device and asks the
/// machine whether each step is legal.
#[derive(Debug, Clone, Default)]
pub struct CaptureMachine {
    state: CaptureState,
}

impl CaptureMachine {
    /// Create a machine in the idle state.
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Whether a capture is currently active.
    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    /// Begin a capture.
    ///
    /// Starting while a capture is already active (or finalizing) is a
    /// no-op that returns the existing state, so a double-tap on the
    /// record button leaves exactly one capture running.
    pub fn start(&mut self) -> CaptureState {
        if self.state == CaptureState::Idle {
            self.state = CaptureState::Recording;
        }
        self.state
    }

    /// Begin stopping an active capture.
    ///
    /// Legal only from `recording`; anything else is a caller bug surfaced
    /// as [`Error::NoActiveRecording`].
    pub fn begin_stop(&mut self) -> Result<()> {
        if self.state != CaptureState::Recording {
            return Err(Error::NoActiveRecording);
        }
        self.state = CaptureState::Stopping;
        Ok(())
    }

    /// Complete the stop once the asset is finalized.
    pub fn finish(&mut self) -> Result<()> {
        if self.state != CaptureState::Stopping {
            return Err(Error::InvalidStateTransition {
                from: self.state,
                to: CaptureState::Idle,
            });
        }
        self.state = CaptureState::Idle;
        Ok(())
    }

    /// Discard an in-progress capture.
    ///
    /// Valid from `recording` or `stopping`; the in-progress asset is the
    /// caller's to delete.
    pub fn cancel(&mut self) -> Result<()> {
        match self.state {
            CaptureState::Recording | CaptureState::Stopping => {
                self.state = CaptureState::Idle;
                Ok(())
            }
            CaptureState::Idle => Err(Error::InvalidStateTransition {
                from: CaptureState::Idle,
                to: CaptureState::Idle,
            }),
        }
    }
}
