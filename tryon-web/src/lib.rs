//! Tryon Web - WASM bindings for the glasses viewer
//!
//! The viewer state lives here; the page keeps the WebGL side (shaders,
//! buffers, textures) and asks for matrices once per animation frame.
//! Fetching and unpacking assets also stays in JavaScript: it announces a
//! load with `begin_*_load`, then hands the decoded text back with the
//! returned handle.

use std::collections::HashMap;

use tryon_core::loader::decode_asset;
use tryon_core::{
    AssetError, LoadEvent, LoadSlot, LoadTicket, Mat4, PassMode, TextureId, Viewer, ViewerConfig,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

fn flatten(matrices: impl IntoIterator<Item = Mat4>) -> Vec<f32> {
    matrices
        .into_iter()
        .flat_map(|m| tryon_core::matrix::to_column_major(&m))
        .collect()
}

/// Matrices for one frame, ready for `uniformMatrix4fv`
#[wasm_bindgen]
#[derive(Debug, Default)]
pub struct FrameData {
    projection: Vec<f32>,
    models: Vec<f32>,
    textures: Vec<u32>,
    depth_only: Vec<u8>,
    notices: Vec<String>,
}

#[wasm_bindgen]
impl FrameData {
    /// 16 floats, column-major
    pub fn projection(&self) -> Vec<f32> {
        self.projection.clone()
    }

    /// 16 floats per draw, column-major, in draw order
    pub fn models(&self) -> Vec<f32> {
        self.models.clone()
    }

    /// Texture key per draw; meshes are fetched by draw index
    pub fn textures(&self) -> Vec<u32> {
        self.textures.clone()
    }

    /// 1 where the draw writes depth only
    pub fn depth_only(&self) -> Vec<u8> {
        self.depth_only.clone()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Failed loads since the last frame
    pub fn notices(&self) -> Vec<String> {
        self.notices.clone()
    }
}

#[wasm_bindgen]
pub struct WebViewer {
    viewer: Viewer,
    canvas: Option<HtmlCanvasElement>,
    pending: HashMap<u32, LoadTicket>,
}

#[wasm_bindgen]
impl WebViewer {
    /// `config_json` takes the same keys as the terminal's `[viewer]` table.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WebViewer, JsValue> {
        let config = match config_json {
            Some(text) => ViewerConfig::from_json(&text)
                .map_err(|e| JsValue::from_str(&format!("invalid viewer config: {e}")))?,
            None => ViewerConfig::default(),
        };
        Ok(Self::with_config(config))
    }

    /// Bind to a canvas and size the viewer to it.
    pub fn attach(&mut self, canvas_id: &str) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element #{canvas_id}")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str(&format!("#{canvas_id} is not a canvas")))?;
        self.canvas = Some(canvas);
        self.resize_to_canvas();
        Ok(())
    }

    /// Match the drawing buffer to the canvas's CSS size times the device
    /// pixel ratio. Returns the new size as `[width, height]`.
    pub fn resize_to_canvas(&mut self) -> Vec<u32> {
        let Some(canvas) = &self.canvas else {
            return Vec::new();
        };
        let ratio = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
        let width = (canvas.client_width().max(0) as f64 * ratio).round() as u32;
        let height = (canvas.client_height().max(0) as f64 * ratio).round() as u32;
        if canvas.width() != width || canvas.height() != height {
            canvas.set_width(width);
            canvas.set_height(height);
        }
        self.viewer.resize(width, height);
        vec![width, height]
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewer.resize(width, height);
    }

    // --- loading ---

    /// Announce a head load; returns the handle for `finish_load`.
    pub fn begin_head_load(&mut self) -> Result<u32, JsValue> {
        self.begin(LoadSlot::Head)
            .ok_or_else(|| JsValue::from_str("load handles exhausted"))
    }

    pub fn begin_glasses_load(&mut self, name: &str) -> Result<u32, JsValue> {
        self.begin(LoadSlot::Glasses(name.to_owned()))
            .ok_or_else(|| JsValue::from_str("load handles exhausted"))
    }

    /// Hand over a fetched mesh (and the head's pose record). Decode errors
    /// are reported through the next frame's notices. Returns `false` for an
    /// unknown or already used handle.
    pub fn finish_load(
        &mut self,
        handle: u32,
        obj_text: &str,
        texture: u32,
        pose_json: Option<String>,
    ) -> bool {
        let Some(ticket) = self.pending.remove(&handle) else {
            log::warn!("finish_load: unknown handle {handle}");
            return false;
        };
        let event = match decode_asset(obj_text, TextureId(texture), pose_json.as_deref()) {
            Ok(asset) => LoadEvent::Ready { ticket, asset },
            Err(error) => LoadEvent::Failed { ticket, error },
        };
        self.viewer.post(event);
        true
    }

    /// Report a load that failed before reaching the viewer.
    pub fn fail_load(&mut self, handle: u32, message: &str) -> bool {
        let Some(ticket) = self.pending.remove(&handle) else {
            return false;
        };
        self.viewer.post(LoadEvent::Failed {
            ticket,
            error: AssetError::Fetch(message.to_owned()),
        });
        true
    }

    /// Mesh positions (3 floats per vertex) of the `draw`-th entry in the
    /// frame's draw order.
    pub fn mesh_positions(&self, draw: usize) -> Option<Vec<f32>> {
        self.find_mesh(draw, |mesh| mesh.positions().to_vec())
    }

    /// Texture coordinates (2 floats per vertex) of the `draw`-th entry.
    pub fn mesh_tex_coords(&self, draw: usize) -> Option<Vec<f32>> {
        self.find_mesh(draw, |mesh| mesh.tex_coords().to_vec())
    }

    // --- input ---

    pub fn glasses_names(&self) -> Vec<String> {
        self.viewer
            .manager()
            .glasses_names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    pub fn active_glasses(&self) -> Option<String> {
        self.viewer.manager().active_glasses().map(str::to_owned)
    }

    pub fn select_glasses(&mut self, name: &str) {
        if let Err(err) = self.viewer.select_glasses(name) {
            log::warn!("select {name:?}: {err}");
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.viewer.pointer_down(x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.viewer.pointer_move(x, y)
    }

    pub fn pointer_up(&mut self) {
        self.viewer.pointer_up();
    }

    pub fn set_offset_x(&mut self, value: f32) {
        self.viewer.set_glasses_axis(tryon_core::Axis::X, value);
    }

    pub fn set_offset_y(&mut self, value: f32) {
        self.viewer.set_glasses_axis(tryon_core::Axis::Y, value);
    }

    pub fn set_offset_z(&mut self, value: f32) {
        self.viewer.set_glasses_axis(tryon_core::Axis::Z, value);
    }

    // --- frame ---

    /// Interactive view for this animation frame.
    pub fn frame(&mut self) -> Result<FrameData, JsValue> {
        let frame = self
            .viewer
            .frame()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(FrameData {
            projection: flatten([frame.projection]),
            models: flatten(frame.items.iter().map(|i| i.world)),
            textures: frame.items.iter().map(|i| i.texture.0).collect(),
            depth_only: vec![0; frame.items.len()],
            notices: frame
                .notices
                .into_iter()
                .map(|n| format!("{:?}: {}", n.slot, n.message))
                .collect(),
        })
    }

    /// Calibrated view over the photograph, or `undefined` without a pose.
    pub fn result_frame(&self) -> Result<Option<FrameData>, JsValue> {
        let result = self
            .viewer
            .result_frame()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(result.map(|result| FrameData {
            projection: flatten([result.projection]),
            models: flatten(result.passes.iter().map(|p| p.model)),
            textures: result.passes.iter().map(|p| p.texture.0).collect(),
            depth_only: result
                .passes
                .iter()
                .map(|p| u8::from(p.mode == PassMode::DepthOnly))
                .collect(),
            notices: Vec::new(),
        }))
    }
}

impl WebViewer {
    pub fn with_config(config: ViewerConfig) -> Self {
        Self {
            viewer: Viewer::new(config),
            canvas: None,
            pending: HashMap::new(),
        }
    }

    /// `None` once generations no longer fit a JS-side handle.
    fn begin(&mut self, slot: LoadSlot) -> Option<u32> {
        let ticket = self.viewer.begin_load(slot);
        // Generations are global and start at 1, so they double as handles.
        let handle = handle_for(ticket.generation)?;
        self.pending.insert(handle, ticket);
        Some(handle)
    }

    /// Draw order is the same for the interactive and calibrated frames.
    fn find_mesh<T>(&self, draw: usize, f: impl Fn(&tryon_core::MeshData) -> T) -> Option<T> {
        let items = self.viewer.manager().draw_list().ok()?;
        items.get(draw).map(|item| f(&item.mesh))
    }
}

fn handle_for(generation: u64) -> Option<u32> {
    u32::try_from(generation).ok()
}
