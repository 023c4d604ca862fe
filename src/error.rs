use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced at the viewer's boundaries (files, config, GPU, windowing).
///
/// The camera and the flattener never fail; everything here happens either
/// at startup or while talking to the platform.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("OBJ parse error on line {line}: {message}")]
    ObjParse { line: usize, message: String },

    #[error("invalid mesh '{mesh}': {reason}")]
    InvalidMesh { mesh: String, reason: String },

    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("model needs a {bytes}-byte vertex buffer, device allows at most {limit} bytes")]
    ModelTooLarge { bytes: u64, limit: u64 },
}

pub type Result<T> = std::result::Result<T, ViewerError>;
