// VIEW: GPU setup, pipelines and shading modes
pub mod gpu_init;
pub mod render;
pub mod shading;

pub use gpu_init::GpuContext;
pub use render::{ModelBuffer, OverlayFrame, PipelineResources, RenderState, UniformResources};
pub use shading::ShadingMode;
