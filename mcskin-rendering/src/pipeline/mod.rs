mod buffer;
pub mod graphics_context;
pub mod scene;
pub mod textures;

pub use graphics_context::{GraphicsContext, GraphicsContextDescriptor};
pub use scene::{Scene, Size};
pub use textures::SceneTexture;
