use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

pub type VertexUvCoordinates = Vec2;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    /// The position of the vertex
    pub position: Vec3,
    /// The uv coordinates of the vertex
    pub uv: VertexUvCoordinates,
}

impl Vertex {
    pub fn new(position: Vec3, uv: VertexUvCoordinates) -> Self {
        Vertex { position, uv }
    }
}
