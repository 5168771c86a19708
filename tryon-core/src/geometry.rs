//! Decoded mesh data handed over by the asset collaborators

use nalgebra::{Point2, Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("position buffer length {0} is not a multiple of 3")]
    PositionsNotVec3(usize),
    #[error("texture coordinate buffer length {0} is not a multiple of 2")]
    TexCoordsNotVec2(usize),
    #[error("{positions} positions but {tex_coords} texture coordinates")]
    VertexCountMismatch { positions: usize, tex_coords: usize },
    #[error("vertex count {0} is not a whole number of triangles")]
    NotTriangulated(usize),
}

/// A triangle list: three position floats and two texture-coordinate floats
/// per vertex, with no index buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    positions: Vec<f32>,
    tex_coords: Vec<f32>,
}

impl MeshData {
    pub fn new(positions: Vec<f32>, tex_coords: Vec<f32>) -> Result<Self, MeshError> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::PositionsNotVec3(positions.len()));
        }
        if tex_coords.len() % 2 != 0 {
            return Err(MeshError::TexCoordsNotVec2(tex_coords.len()));
        }

        let vertices = positions.len() / 3;
        if vertices != tex_coords.len() / 2 {
            return Err(MeshError::VertexCountMismatch {
                positions: vertices,
                tex_coords: tex_coords.len() / 2,
            });
        }
        if vertices % 3 != 0 {
            return Err(MeshError::NotTriangulated(vertices));
        }

        Ok(Self {
            positions,
            tex_coords,
        })
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn tex_coords(&self) -> &[f32] {
        &self.tex_coords
    }

    /// Vertex count for the triangle-list draw call.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, vertex: usize) -> Point3<f32> {
        let p = &self.positions[vertex * 3..vertex * 3 + 3];
        Point3::new(p[0], p[1], p[2])
    }

    pub fn tex_coord(&self, vertex: usize) -> Point2<f32> {
        let t = &self.tex_coords[vertex * 2..vertex * 2 + 2];
        Point2::new(t[0], t[1])
    }

    /// Iterate triangles as position triples
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f32>; 3]> + '_ {
        (0..self.triangle_count()).map(move |t| {
            let base = t * 3;
            [
                self.position(base),
                self.position(base + 1),
                self.position(base + 2),
            ]
        })
    }

    /// Unit cube centred on the origin, two triangles per face.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let mut builder = MeshBuilder::default();

        // +Z, -Z, +Y, -Y, +X, -X
        builder.quad([[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]);
        builder.quad([[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]]);
        builder.quad([[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]]);
        builder.quad([[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]);
        builder.quad([[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]]);
        builder.quad([[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]]);

        builder.build()
    }

    /// Stand-in glasses frame: two lens plates joined by a bridge, facing +Z.
    pub fn glasses_frame(width: f32) -> Self {
        let lens = width * 0.4;
        let bridge = width - 2.0 * lens;
        let half_h = lens * 0.35;
        let mut builder = MeshBuilder::default();

        let left = -width / 2.0;
        builder.quad([
            [left, -half_h, 0.0],
            [left + lens, -half_h, 0.0],
            [left + lens, half_h, 0.0],
            [left, half_h, 0.0],
        ]);
        let right = width / 2.0 - lens;
        builder.quad([
            [right, -half_h, 0.0],
            [right + lens, -half_h, 0.0],
            [right + lens, half_h, 0.0],
            [right, half_h, 0.0],
        ]);
        let bar = half_h * 0.25;
        builder.quad([
            [-bridge / 2.0, half_h - bar, 0.0],
            [bridge / 2.0, half_h - bar, 0.0],
            [bridge / 2.0, half_h, 0.0],
            [-bridge / 2.0, half_h, 0.0],
        ]);

        builder.build()
    }
}

/// Geometric normal of a triangle, counter-clockwise winding.
pub fn face_normal(triangle: &[Point3<f32>; 3]) -> Vector3<f32> {
    let edge1 = triangle[1] - triangle[0];
    let edge2 = triangle[2] - triangle[0];
    let n = edge1.cross(&edge2);
    let len = n.norm();
    if len > f32::EPSILON {
        n / len
    } else {
        Vector3::zeros()
    }
}

#[derive(Default)]
struct MeshBuilder {
    positions: Vec<f32>,
    tex_coords: Vec<f32>,
}

impl MeshBuilder {
    // Corners counter-clockwise from bottom-left.
    fn quad(&mut self, corners: [[f32; 3]; 4]) {
        const UV: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        for i in [0, 1, 2, 0, 2, 3] {
            self.positions.extend_from_slice(&corners[i]);
            self.tex_coords.extend_from_slice(&UV[i]);
        }
    }

    fn build(self) -> MeshData {
        MeshData {
            positions: self.positions,
            tex_coords: self.tex_coords,
        }
    }
}
