use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use wgpu::BufferAsyncError;

#[derive(Debug, Error)]
pub enum RenderingError {
    #[error("Unable to find a suitable GPU adapter. Either pass in a backend or set the WGPU_BACKEND environment variable")]
    NoAdapterFound,
    #[error("Unable to create a device: {0}")]
    RequestDeviceError(#[from] wgpu::RequestDeviceError),
    #[error("Surface is not supported by the adapter")]
    SurfaceNotSupported,
    #[error("Unable to create a rendering surface: {0}")]
    CreateSurfaceError(#[from] wgpu::CreateSurfaceError),
    #[error("Scene has no skin texture set")]
    SkinTextureNotSet,
    #[error("Surface error: {0}")]
    SurfaceError(#[from] wgpu::SurfaceError),
    #[error("Buffer async error: {0}")]
    BufferAsyncError(#[from] BufferAsyncError),
    #[error("RecvError: {0}")]
    RecvError(#[from] RecvError),
    #[error("Unable to assemble the {width}x{height} output image from the frame bytes")]
    OutputImageError { width: u32, height: u32 },
}

pub(crate) type Result<T> = std::result::Result<T, RenderingError>;
