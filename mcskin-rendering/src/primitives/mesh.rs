use crate::primitives::vertex::Vertex;
use crate::primitives::MeshPrimitive;

pub struct Mesh {
    primitives: Vec<Box<dyn MeshPrimitive>>,
}

impl Mesh {
    pub fn new(primitives: Vec<Box<dyn MeshPrimitive>>) -> Self {
        Mesh { primitives }
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

impl MeshPrimitive for Mesh {
    fn vertices(&self) -> Vec<Vertex> {
        self.primitives
            .iter()
            .flat_map(|primitive| primitive.vertices())
            .collect()
    }

    fn indices(&self) -> Vec<u16> {
        // Go through all primitives, get their indices, and add them to the list
        // Be sure to offset the indices by the number of vertices we've already added
        let mut indices = Vec::new();
        let mut offset = 0;

        for primitive in &self.primitives {
            let primitive_indices = primitive.indices();
            indices.extend(primitive_indices.iter().map(|index| index + offset));
            offset += primitive.vertices().len() as u16;
        }

        indices
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::primitives::Quad;

    fn unit_quad(z: f32) -> Quad {
        Quad::new(
            Vec3::new(-1.0, 1.0, z),
            Vec3::new(1.0, 1.0, z),
            Vec3::new(-1.0, -1.0, z),
            Vec3::new(1.0, -1.0, z),
            Vec2::ZERO,
            Vec2::ONE,
        )
    }

    #[test]
    fn quad_produces_two_clockwise_triangles() {
        let quad = unit_quad(0.0);
        assert_eq!(quad.vertices().len(), 4);
        assert_eq!(quad.indices(), vec![2, 0, 3, 0, 1, 3]);
    }

    #[test]
    fn mesh_offsets_indices_per_primitive() {
        let mesh = Mesh::new(vec![Box::new(unit_quad(0.0)), Box::new(unit_quad(1.0))]);

        assert_eq!(mesh.vertices().len(), 8);
        assert_eq!(mesh.indices(), vec![2, 0, 3, 0, 1, 3, 6, 4, 7, 4, 5, 7]);
    }
}
