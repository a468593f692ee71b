use glam::{Mat4, Vec3};

use crate::pipeline::scene::Size;

#[derive(Copy, Clone, Debug)]
pub enum ProjectionParameters {
    Perspective {
        /// The field of view of the camera (in degrees)
        fov: f32,
    },
    Orthographic {
        /// The half-height of the camera volume
        aspect: f32,
    },
}

impl ProjectionParameters {
    fn compute_projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        match self {
            ProjectionParameters::Perspective { fov } => {
                Mat4::perspective_rh(fov.to_radians(), aspect_ratio, 0.1, 100.0)
            }
            ProjectionParameters::Orthographic { aspect } => Mat4::orthographic_rh(
                -aspect * aspect_ratio,
                aspect * aspect_ratio,
                -*aspect,
                *aspect,
                -100.0,
                100.0,
            ),
        }
    }
}

/// The camera used to view the scene.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    /// The position of the eye
    pub eye: Vec3,
    /// The point the camera looks at
    pub look_at: Vec3,
    /// The up direction of the camera
    pub up: Vec3,
    pub projection: ProjectionParameters,
    pub size: Size,
}

impl Camera {
    pub fn new(
        eye: Vec3,
        look_at: Vec3,
        up: Vec3,
        projection: ProjectionParameters,
        size: Size,
    ) -> Self {
        Camera {
            eye,
            look_at,
            up,
            projection,
            size,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.size.width as f32 / self.size.height as f32
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        let projection = self.projection.compute_projection_matrix(self.aspect_ratio());
        let view = Mat4::look_at_rh(self.eye, self.look_at, self.up);

        projection * view
    }
}
