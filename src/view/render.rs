use wgpu::util::DeviceExt;
use wgpu::*;

use crate::controller::{CameraUniform, ShadingUniform};
use crate::error::ViewerError;
use crate::model::{FlattenedScene, VertexLayout};
use crate::view::{GpuContext, ShadingMode};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Position and normal are read from each record; UVs, when present, are skipped over.
const MODEL_ATTRIBUTES: [VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

pub struct UniformResources {
    pub camera_buffer: Buffer,
    pub shading_buffer: Buffer,
    pub bind_group_layout: BindGroupLayout,
    pub bind_group: BindGroup,
}

pub struct PipelineResources {
    pub fill: RenderPipeline,
    /// Only present when the device has `POLYGON_MODE_LINE`.
    pub line: Option<RenderPipeline>,
}

/// Flattened vertices on the GPU, drawn without an index buffer.
pub struct ModelBuffer {
    pub vertex_buffer: Buffer,
    pub vertex_count: u32,
}

/// Size of the vertex buffer for `scene`, rejected when the device cannot hold it.
pub fn checked_upload_size(scene: &FlattenedScene, limit: u64) -> crate::error::Result<u64> {
    let bytes = (scene.vertices.len() * std::mem::size_of::<f32>()) as u64;
    if bytes > limit {
        return Err(ViewerError::ModelTooLarge { bytes, limit });
    }
    Ok(bytes)
}

impl ModelBuffer {
    /// Returns `Ok(None)` for an empty scene; there is nothing to draw.
    pub fn upload(device: &Device, scene: &FlattenedScene) -> crate::error::Result<Option<Self>> {
        if scene.is_empty() {
            return Ok(None);
        }
        checked_upload_size(scene, device.limits().max_buffer_size)?;
        let vertex_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some("model_vertices"),
            contents: bytemuck::cast_slice(&scene.vertices),
            usage: BufferUsages::VERTEX,
        });
        Ok(Some(Self { vertex_buffer, vertex_count: scene.vertex_count() as u32 }))
    }
}

/// Bytes between consecutive records in the vertex buffer.
pub fn array_stride(layout: VertexLayout) -> BufferAddress {
    (layout.stride() * std::mem::size_of::<f32>()) as BufferAddress
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

fn uniform_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub fn create_uniform_resources(device: &Device) -> UniformResources {
    let camera_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let shading_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("shading_buffer"),
        size: std::mem::size_of::<ShadingUniform>() as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("uniform_bind_group_layout"),
        entries: &[
            uniform_entry(0, ShaderStages::VERTEX | ShaderStages::FRAGMENT),
            uniform_entry(1, ShaderStages::FRAGMENT),
        ],
    });

    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("uniform_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            BindGroupEntry { binding: 1, resource: shading_buffer.as_entire_binding() },
        ],
    });

    UniformResources { camera_buffer, shading_buffer, bind_group_layout, bind_group }
}

fn model_pipeline(
    device: &Device,
    label: &str,
    shader: &ShaderModule,
    pipeline_layout: &PipelineLayout,
    format: TextureFormat,
    layout: VertexLayout,
    polygon_mode: PolygonMode,
) -> RenderPipeline {
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(pipeline_layout),
        vertex: VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[VertexBufferLayout {
                array_stride: array_stride(layout),
                step_mode: VertexStepMode::Vertex,
                attributes: &MODEL_ATTRIBUTES,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::REPLACE), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            // winding in OBJ files is not reliable
            cull_mode: None,
            polygon_mode,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

pub fn create_model_pipelines(
    device: &Device,
    format: TextureFormat,
    bind_group_layout: &BindGroupLayout,
    layout: VertexLayout,
) -> PipelineResources {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("model_shader"),
        source: ShaderSource::Wgsl(include_str!("shaders/model.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("model_pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    let fill = model_pipeline(device, "model_fill_pipeline", &shader, &pipeline_layout, format, layout, PolygonMode::Fill);
    let line = device.features().contains(Features::POLYGON_MODE_LINE).then(|| {
        model_pipeline(device, "model_line_pipeline", &shader, &pipeline_layout, format, layout, PolygonMode::Line)
    });

    PipelineResources { fill, line }
}

/// Tessellated egui output for one frame
pub struct OverlayFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub screen: egui_wgpu::ScreenDescriptor,
}

/// Everything needed to draw the model and the overlay
pub struct RenderState {
    pub uniforms: UniformResources,
    pub pipelines: PipelineResources,
    pub model: Option<ModelBuffer>,
    pub depth_texture: Texture,
    pub depth_view: TextureView,
    pub egui_renderer: egui_wgpu::Renderer,
    pub clear_color: Color,
}

impl RenderState {
    pub fn new(gpu: &GpuContext, scene: &FlattenedScene, clear_color: [f32; 3]) -> crate::error::Result<Self> {
        let device = gpu.device.as_ref();
        let uniforms = create_uniform_resources(device);
        let pipelines = create_model_pipelines(device, gpu.format, &uniforms.bind_group_layout, scene.layout);
        let model = ModelBuffer::upload(device, scene)?;
        let (depth_texture, depth_view) = create_depth_texture(device, gpu.config.width, gpu.config.height);
        let egui_renderer = egui_wgpu::Renderer::new(device, gpu.format, egui_wgpu::RendererOptions::default());

        tracing::debug!(
            stride_bytes = array_stride(scene.layout),
            vertices = model.as_ref().map_or(0, |m| m.vertex_count),
            "model buffer ready"
        );

        let [r, g, b] = clear_color;
        Ok(Self {
            uniforms,
            pipelines,
            model,
            depth_texture,
            depth_view,
            egui_renderer,
            clear_color: Color { r: r as f64, g: g as f64, b: b as f64, a: 1.0 },
        })
    }

    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        let (depth_texture, depth_view) = create_depth_texture(device, width, height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    pub fn write_uniforms(&self, queue: &Queue, camera: &CameraUniform, shading: &ShadingUniform) {
        queue.write_buffer(&self.uniforms.camera_buffer, 0, bytemuck::bytes_of(camera));
        queue.write_buffer(&self.uniforms.shading_buffer, 0, bytemuck::bytes_of(shading));
    }

    fn pipeline_for(&self, mode: ShadingMode) -> &RenderPipeline {
        match (&self.pipelines.line, mode.uses_line_pipeline()) {
            (Some(line), true) => line,
            _ => &self.pipelines.fill,
        }
    }

    /// Model pass, then the overlay on top. Surface errors go to the caller.
    pub fn draw_frame(&mut self, gpu: &GpuContext, mode: ShadingMode, overlay: OverlayFrame) -> Result<(), SurfaceError> {
        let device = gpu.device.as_ref();
        let queue = gpu.queue.as_ref();

        let frame = gpu.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor { label: Some("frame_encoder") });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("model_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Clear(self.clear_color), store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations { load: LoadOp::Clear(1.0), store: StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(model) = &self.model {
                rp.set_pipeline(self.pipeline_for(mode));
                rp.set_bind_group(0, &self.uniforms.bind_group, &[]);
                rp.set_vertex_buffer(0, model.vertex_buffer.slice(..));
                rp.draw(0..model.vertex_count, 0..1);
            }
        }

        for (id, image_delta) in &overlay.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        self.egui_renderer
            .update_buffers(device, queue, &mut encoder, &overlay.primitives, &overlay.screen);

        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("overlay_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Load, store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui_renderer
                .render(&mut egui_pass.forget_lifetime(), &overlay.primitives, &overlay.screen);
        }

        for id in &overlay.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_stride_follows_layout() {
        assert_eq!(array_stride(VertexLayout::POSITION_NORMAL), 24);
        assert_eq!(array_stride(VertexLayout::POSITION_NORMAL_UV), 32);
    }

    fn flat_with_floats(count: usize) -> FlattenedScene {
        FlattenedScene {
            vertices: vec![0.0; count],
            layout: VertexLayout::POSITION_NORMAL,
            format: crate::model::VertexFormat { has_normals: true, has_tex_coords: false, stride: 6 },
            bounds: crate::model::BoundingBox::EMPTY,
        }
    }

    #[test]
    fn test_upload_size_within_limit() {
        let flat = flat_with_floats(36);
        assert_eq!(checked_upload_size(&flat, 144).unwrap(), 144);
        assert_eq!(checked_upload_size(&flat, 1 << 28).unwrap(), 144);
    }

    #[test]
    fn test_upload_size_over_limit_is_an_error() {
        let flat = flat_with_floats(36);
        let err = checked_upload_size(&flat, 143).unwrap_err();
        assert!(matches!(err, ViewerError::ModelTooLarge { bytes: 144, limit: 143 }));
        assert!(err.to_string().contains("144"));
    }

    #[test]
    fn test_attributes_read_position_then_normal() {
        assert_eq!(MODEL_ATTRIBUTES[0].shader_location, 0);
        assert_eq!(MODEL_ATTRIBUTES[0].offset, (VertexLayout::POSITION_OFFSET * 4) as u64);
        assert_eq!(MODEL_ATTRIBUTES[1].shader_location, 1);
        assert_eq!(MODEL_ATTRIBUTES[1].offset, (VertexLayout::NORMAL_OFFSET * 4) as u64);
    }
}
