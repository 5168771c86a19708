//! Caller-owned viewer state
//!
//! [`Viewer`] is what a front end keeps between frames: the scene, the drag
//! and slider state, and the pending loads. Input handlers mutate it and the
//! frame callback turns it into matrices.

use crossbeam::channel::Sender;

use crate::calibration::RenderPass;
use crate::config::ViewerConfig;
use crate::input::{Axis, DragInput, GlassesOffset};
use crate::loader::{LoadEvent, LoadQueue, LoadSlot, LoadTicket, LoadTracker, LoadedAsset};
use crate::manager::SceneManager;
use crate::matrix::{self, Mat4};
use crate::scene::{DrawItem, SceneError};

/// A load that failed, for display to the user
#[derive(Debug, Clone, PartialEq)]
pub struct LoadNotice {
    pub slot: LoadSlot,
    pub message: String,
}

/// Interactive view: free orbit under a fixed camera
#[derive(Debug, Clone)]
pub struct Frame {
    pub projection: Mat4,
    pub items: Vec<DrawItem>,
    pub notices: Vec<LoadNotice>,
}

/// Calibrated view over the reference photograph
#[derive(Debug, Clone)]
pub struct ResultFrame {
    pub projection: Mat4,
    pub passes: Vec<RenderPass>,
}

#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    manager: SceneManager,
    drag: DragInput,
    offset: GlassesOffset,
    tracker: LoadTracker,
    queue: LoadQueue,
    aspect: f32,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            manager: SceneManager::new(&config),
            drag: DragInput::new(config.drag_sensitivity),
            offset: GlassesOffset::new(config.glasses_offset),
            tracker: LoadTracker::new(),
            queue: LoadQueue::new(),
            aspect: 1.0,
            config,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn manager(&self) -> &SceneManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SceneManager {
        &mut self.manager
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    // --- loading ---

    /// Start a load for `slot`. Whatever was in flight for it becomes stale.
    pub fn begin_load(&mut self, slot: LoadSlot) -> LoadTicket {
        self.tracker.begin(slot)
    }

    pub fn sender(&self) -> Sender<LoadEvent> {
        self.queue.sender()
    }

    pub fn post(&self, event: LoadEvent) {
        self.queue.post(event);
    }

    pub fn pending_loads(&self) -> usize {
        self.tracker.pending()
    }

    /// Apply every completed load that is still the latest for its slot.
    pub fn apply_loads(&mut self) -> Vec<LoadNotice> {
        let mut notices = Vec::new();
        for event in self.queue.drain() {
            if !self.tracker.finish(event.ticket()) {
                log::warn!(
                    "discarding stale load for {:?} (generation {})",
                    event.ticket().slot,
                    event.ticket().generation
                );
                continue;
            }
            match event {
                LoadEvent::Ready { ticket, asset } => {
                    if let Err(err) = self.apply_asset(&ticket.slot, asset) {
                        log::warn!("could not place {:?}: {err}", ticket.slot);
                    }
                }
                LoadEvent::Failed { ticket, error } => {
                    log::warn!("load of {:?} failed: {error}", ticket.slot);
                    notices.push(LoadNotice {
                        slot: ticket.slot,
                        message: error.to_string(),
                    });
                }
            }
        }
        notices
    }

    fn apply_asset(&mut self, slot: &LoadSlot, asset: LoadedAsset) -> Result<(), SceneError> {
        match slot {
            LoadSlot::Head => {
                self.manager.load_head(asset.drawable, asset.pose)?;
            }
            LoadSlot::Glasses(name) => {
                self.manager.register_glasses(name, asset.drawable)?;
                if self.manager.active_glasses().is_none() {
                    self.manager.select_glasses(name)?;
                }
            }
        }
        Ok(())
    }

    // --- input ---

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.drag.pointer_down(x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.drag.pointer_move(x, y)
    }

    pub fn pointer_up(&mut self) {
        self.drag.pointer_up();
    }

    pub fn nudge(&mut self, dx: f32, dy: f32) {
        self.drag.nudge(dx, dy);
    }

    pub fn head_angles(&self) -> (f32, f32) {
        (self.drag.angles.x, self.drag.angles.y)
    }

    pub fn glasses_offset(&self) -> GlassesOffset {
        self.offset
    }

    pub fn set_glasses_axis(&mut self, axis: Axis, value: f32) {
        self.offset.set_axis(axis, value);
    }

    pub fn select_glasses(&mut self, name: &str) -> Result<(), SceneError> {
        self.manager.select_glasses(name)
    }

    // --- frame ---

    pub fn projection(&self) -> Mat4 {
        matrix::perspective(self.config.fov_deg, self.aspect, self.config.near, self.config.far)
    }

    /// Per-frame update: apply loads, push input into the scene, lay it out.
    pub fn frame(&mut self) -> Result<Frame, SceneError> {
        let notices = self.apply_loads();

        self.manager
            .set_head_rotation(self.drag.angles.x, self.drag.angles.y);
        let GlassesOffset { x, y, z } = self.offset;
        self.manager.set_glasses_offset(x, y, z);

        Ok(Frame {
            projection: self.projection(),
            items: self.manager.draw_list()?,
            notices,
        })
    }

    /// The calibrated view, once a head with a pose record is present.
    pub fn result_frame(&self) -> Result<Option<ResultFrame>, SceneError> {
        let Some(view) = self.manager.calibrated_view(
            self.config.image_size,
            self.config.near,
            self.config.far,
            self.config.principal_point,
        ) else {
            return Ok(None);
        };
        let passes = self.manager.calibrated_passes(&view)?;
        Ok(Some(ResultFrame {
            projection: view.projection,
            passes,
        }))
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}
