//! Asynchronous asset arrival
//!
//! Loads run outside the frame loop and report back through a [`LoadQueue`].
//! Every request takes a [`LoadTicket`] from the [`LoadTracker`]; when a
//! result arrives, only the newest ticket for its slot is accepted, so a slow
//! load can never overwrite a newer one.

use std::collections::HashMap;

use crossbeam::channel::{self, Receiver, Sender};
use thiserror::Error;

use crate::calibration::ReconstructionPose;
use crate::geometry::MeshError;
use crate::obj::{self, ObjError};
use crate::scene::{Drawable, TextureId};

/// Decode failure for a mesh, texture or pose record
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("mesh decode failed: {0}")]
    Obj(#[from] ObjError),
    #[error("invalid mesh: {0}")]
    Mesh(#[from] MeshError),
    #[error("pose record decode failed: {0}")]
    Pose(#[from] serde_json::Error),
    #[error("texture unavailable: {0}")]
    Texture(String),
    /// Reported by the host when fetching or unpacking fails
    #[error("fetch failed: {0}")]
    Fetch(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoadSlot {
    Head,
    Glasses(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub slot: LoadSlot,
    pub generation: u64,
}

/// Fully decoded result of one load
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub drawable: Drawable,
    /// Only meaningful for the head slot
    pub pose: Option<ReconstructionPose>,
}

/// Decode OBJ text and an optional pose record into a ready asset.
pub fn decode_asset(
    obj_text: &str,
    texture: TextureId,
    pose_json: Option<&str>,
) -> Result<LoadedAsset, AssetError> {
    let mesh = obj::parse_obj(obj_text)?;
    let pose = pose_json.map(ReconstructionPose::from_json).transpose()?;
    Ok(LoadedAsset {
        drawable: Drawable::new(mesh, texture),
        pose,
    })
}

#[derive(Debug)]
pub enum LoadEvent {
    Ready { ticket: LoadTicket, asset: LoadedAsset },
    Failed { ticket: LoadTicket, error: AssetError },
}

impl LoadEvent {
    pub fn ticket(&self) -> &LoadTicket {
        match self {
            LoadEvent::Ready { ticket, .. } | LoadEvent::Failed { ticket, .. } => ticket,
        }
    }
}

#[derive(Debug, Default)]
pub struct LoadTracker {
    latest: HashMap<LoadSlot, u64>,
    next_generation: u64,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket, superseding any outstanding one for the same slot.
    pub fn begin(&mut self, slot: LoadSlot) -> LoadTicket {
        self.next_generation += 1;
        let generation = self.next_generation;
        if let Some(old) = self.latest.insert(slot.clone(), generation) {
            log::debug!("load: {slot:?} generation {old} superseded by {generation}");
        }
        LoadTicket { slot, generation }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.latest.get(&ticket.slot) == Some(&ticket.generation)
    }

    /// Accept a completion. Stale and repeated completions are refused.
    pub fn finish(&mut self, ticket: &LoadTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.latest.remove(&ticket.slot);
        true
    }

    pub fn pending(&self) -> usize {
        self.latest.len()
    }
}

/// Completion channel between loaders and the frame loop
#[derive(Debug)]
pub struct LoadQueue {
    sender: Sender<LoadEvent>,
    receiver: Receiver<LoadEvent>,
}

impl LoadQueue {
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self { sender, receiver }
    }

    /// Handle for a loader; may be moved to another thread.
    pub fn sender(&self) -> Sender<LoadEvent> {
        self.sender.clone()
    }

    pub fn post(&self, event: LoadEvent) {
        // The queue owns a receiver, so the channel cannot be disconnected.
        let _ = self.sender.send(event);
    }

    /// Everything that has arrived so far, without blocking.
    pub fn drain(&self) -> Vec<LoadEvent> {
        self.receiver.try_iter().collect()
    }
}

impl Default for LoadQueue {
    fn default() -> Self {
        Self::new()
    }
}
