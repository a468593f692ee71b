use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkinTextureError {
    #[error("skin dimensions {0}x{1} are not a recognized skin size (expected 64x32 or 64x64)")]
    DimensionMismatch(u32, u32),
    #[error("legacy slim-arm skins have no defined upgrade layout")]
    UnsupportedSkinVariant,
    #[error("{op} region {width}x{height} at ({x}, {y}) exceeds the {image_width}x{image_height} image bounds")]
    BufferBoundsViolation {
        op: &'static str,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
}

pub type Result<T> = std::result::Result<T, SkinTextureError>;
