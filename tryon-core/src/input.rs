//! Pointer-drag rotation and glasses offset sliders.

use crate::transform::RotationState;

/// Head orbit driven by dragging: horizontal motion turns about Y,
/// vertical motion tilts about X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragInput {
    sensitivity: f32,
    dragging: bool,
    last: (f32, f32),
    /// Accumulated head orbit; Z is never touched
    pub angles: RotationState,
}

impl DragInput {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            dragging: false,
            last: (0.0, 0.0),
            angles: RotationState::zero(),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.dragging = true;
        self.last = (x, y);
    }

    /// Returns whether the angles changed.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        if !self.dragging {
            return false;
        }
        let dx = x - self.last.0;
        let dy = y - self.last.1;
        self.last = (x, y);

        self.nudge(dx, dy);
        true
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Apply a relative nudge as if dragged by `(dx, dy)` pixels.
    pub fn nudge(&mut self, dx: f32, dy: f32) {
        self.angles
            .rotate(dy * self.sensitivity, -dx * self.sensitivity, 0.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Three independent slider values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlassesOffset {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl GlassesOffset {
    pub fn new(offset: [f32; 3]) -> Self {
        Self {
            x: offset[0],
            y: offset[1],
            z: offset[2],
        }
    }

    pub fn set_axis(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    pub fn axis(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}
