//! ASCII rasterizer for terminal rendering

use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Point3, Vector3};
use std::io::Write;
use tryon_core::geometry::face_normal;
use tryon_core::{Mat4, MeshData, PassMode};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Stands in for the reference photograph behind the calibrated view
const BACKDROP: char = '`';

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.fill(' ');
    }

    /// Clear to the backdrop character.
    pub fn clear_backdrop(&mut self) {
        self.fill(BACKDROP);
    }

    fn fill(&mut self, c: char) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(c);
    }

    pub fn char_at(&self, x: usize, y: usize) -> char {
        self.char_buffer[y * self.width + x]
    }

    pub fn depth_at(&self, x: usize, y: usize) -> f32 {
        self.depth_buffer[y * self.width + x]
    }

    /// Rasterize one mesh. `model` places it in camera space (the camera
    /// sits at the origin looking down -Z). A depth-only pass fills the
    /// depth buffer and leaves the characters alone.
    pub fn render_mesh(&mut self, mesh: &MeshData, model: &Mat4, projection: &Mat4, mode: PassMode) {
        for triangle in mesh.triangles() {
            let world = triangle.map(|p| model.transform_point(&p));
            self.render_triangle(&world, projection, mode);
        }
    }

    fn render_triangle(&mut self, world: &[Point3<f32>; 3], projection: &Mat4, mode: PassMode) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(world) {
            match self.project(vertex, projection) {
                Some(coords) => *slot = coords,
                None => return, // Triangle is clipped
            }
        }

        let character = match mode {
            PassMode::DepthOnly => None,
            PassMode::Color => {
                // Light from the camera
                let normal = face_normal(world);
                let brightness = normal.dot(&Vector3::z()).max(0.0);
                let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
                // Faces at grazing angles still show up
                Some(LUMINOSITY_RAMP[char_index.clamp(1, LUMINOSITY_RAMP.len() - 1)])
            }
        };

        self.rasterize_triangle(&screen_coords, character);
    }

    /// Camera space to (column, row, depth), or `None` behind the camera or
    /// outside the depth range.
    fn project(&self, point: &Point3<f32>, projection: &Mat4) -> Option<(f32, f32, f32)> {
        let clip = projection * point.to_homogeneous();
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * self.width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * self.height as f32;
        Some((screen_x, screen_y, ndc.z))
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: Option<char>) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    return;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    if let Some(c) = character {
                        self.char_buffer[idx] = c;
                    }
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.char_at(x, y);

                // Color based on character intensity
                let color = match c {
                    BACKDROP => Color::DarkYellow,
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
