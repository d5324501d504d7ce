use crate::device::GpuContext;
use crate::overlay::TextOverlay;
use crate::scene::{Scene, SceneVertex};
use bytemuck::{Pod, Zeroable};
use depthview_core::{Error, Result};
use nalgebra::Matrix4;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

/// Converts an OpenGL-style clip space (z in -1..1) to wgpu's (z in 0..1)
#[rustfmt::skip]
pub fn opengl_to_wgpu_matrix() -> Matrix4<f32> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Camera uniform data
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub viewport: [f32; 2],
    pub point_size: f32,
    pub _padding: f32,
}

impl CameraUniform {
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            view_proj: scene.view_proj.into(),
            viewport: [
                scene.viewport.width.max(1) as f32,
                scene.viewport.height.max(1) as f32,
            ],
            point_size: scene.point_size,
            _padding: 0.0,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub background_color: [f64; 4],
    pub enable_depth_test: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background_color: [0.0, 0.0, 0.0, 1.0],
            enable_depth_test: true,
        }
    }
}

/// Draws a [`Scene`] into a window surface
pub struct SceneRenderer {
    pub gpu_context: GpuContext,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub config: RenderConfig,
    line_pipeline: wgpu::RenderPipeline,
    triangle_pipeline: wgpu::RenderPipeline,
    point_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    overlay: TextOverlay,
}

impl SceneRenderer {
    /// Create a renderer drawing into `window`
    pub async fn new(window: Arc<Window>, config: RenderConfig) -> Result<Self> {
        let size = window.inner_size();
        let (gpu_context, surface) = GpuContext::for_window(window).await?;

        let surface_caps = surface.get_capabilities(&gpu_context.adapter);
        // Colors come from an 8-bit table and are written as-is.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| Error::Surface("Surface reports no supported formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu_context.device, &surface_config);
        tracing::debug!(format = ?surface_format, width = surface_config.width, height = surface_config.height, "configured surface");

        let camera_uniform = CameraUniform {
            view_proj: Matrix4::identity().into(),
            viewport: [surface_config.width as f32, surface_config.height as f32],
            point_size: 1.0,
            _padding: 0.0,
        };

        let camera_buffer = gpu_context.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::bytes_of(&camera_uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout = gpu_context.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let camera_bind_group = gpu_context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let shader = gpu_context.create_shader_module("Scene Shader", include_str!("shaders/scene.wgsl"));

        let layout = gpu_context.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = |kind: PipelineKind| {
            create_pipeline(
                &gpu_context.device,
                &layout,
                &shader,
                surface_format,
                config.enable_depth_test,
                kind,
            )
        };
        let line_pipeline = pipeline(PipelineKind {
            label: "Line Pipeline",
            topology: wgpu::PrimitiveTopology::LineList,
            entry_point: "vs_main",
            step_mode: wgpu::VertexStepMode::Vertex,
        });
        let triangle_pipeline = pipeline(PipelineKind {
            label: "Triangle Pipeline",
            topology: wgpu::PrimitiveTopology::TriangleList,
            entry_point: "vs_main",
            step_mode: wgpu::VertexStepMode::Vertex,
        });
        // Each point is one instance of a six-vertex quad.
        let point_pipeline = pipeline(PipelineKind {
            label: "Point Pipeline",
            topology: wgpu::PrimitiveTopology::TriangleList,
            entry_point: "vs_point",
            step_mode: wgpu::VertexStepMode::Instance,
        });

        let depth_view = create_depth_view(&gpu_context.device, surface_config.width, surface_config.height);
        let overlay = TextOverlay::new(&gpu_context.device, surface_format);

        Ok(Self {
            gpu_context,
            surface,
            surface_config,
            config,
            line_pipeline,
            triangle_pipeline,
            point_pipeline,
            camera_buffer,
            camera_bind_group,
            depth_view,
            overlay,
        })
    }

    /// Resize renderer surface; a collapsed window is ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.gpu_context.device, &self.surface_config);
            self.depth_view = create_depth_view(&self.gpu_context.device, width, height);
        }
    }

    /// Render one scene and present it
    pub fn render(&mut self, scene: &Scene) -> Result<()> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost, reconfiguring");
                self.surface.configure(&self.gpu_context.device, &self.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("timed out acquiring surface texture, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(Error::Surface(format!("Failed to get surface texture: {:?}", e))),
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let uniform = CameraUniform::from_scene(scene);
        self.gpu_context
            .queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));

        let line_buffer = self.vertex_buffer("Line Vertex Buffer", &scene.lines);
        let triangle_buffer = self.vertex_buffer("Triangle Vertex Buffer", &scene.triangles);
        let point_buffer = self.vertex_buffer("Point Instance Buffer", &scene.points);

        let mut encoder = self
            .gpu_context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Render Encoder"),
            });

        {
            let background = self.config.background_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: background[0],
                            g: background[1],
                            b: background[2],
                            a: background[3],
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: if self.config.enable_depth_test {
                    Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    })
                } else {
                    None
                },
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            if let Some(buffer) = &line_buffer {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..scene.lines.len() as u32, 0..1);
            }
            if let Some(buffer) = &triangle_buffer {
                render_pass.set_pipeline(&self.triangle_pipeline);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..scene.triangles.len() as u32, 0..1);
            }
            if let Some(buffer) = &point_buffer {
                render_pass.set_pipeline(&self.point_pipeline);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..6, 0..scene.points.len() as u32);
            }
        }

        let extra = self.overlay.paint(
            &self.gpu_context.device,
            &self.gpu_context.queue,
            &mut encoder,
            &view,
            scene,
        );

        self.gpu_context
            .queue
            .submit(extra.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();

        Ok(())
    }

    fn vertex_buffer(&self, label: &str, vertices: &[SceneVertex]) -> Option<wgpu::Buffer> {
        if vertices.is_empty() {
            None
        } else {
            Some(self.gpu_context.create_vertex_buffer(label, vertices))
        }
    }
}

struct PipelineKind {
    label: &'static str,
    topology: wgpu::PrimitiveTopology,
    entry_point: &'static str,
    step_mode: wgpu::VertexStepMode,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    depth_test: bool,
    kind: PipelineKind,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(kind.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: kind.entry_point,
            buffers: &[SceneVertex::desc(kind.step_mode)],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: kind.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: depth_test.then(|| wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Viewport;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    #[test]
    fn test_camera_uniform_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
    }

    #[test]
    fn test_camera_uniform_from_scene() {
        let mut scene = Scene::new(Matrix4::new_scaling(2.0), Viewport::new(0, 300));
        scene.point_size = 4.0;
        let uniform = CameraUniform::from_scene(&scene);
        assert_eq!(uniform.viewport, [1.0, 300.0]);
        assert_eq!(uniform.point_size, 4.0);
        assert_eq!(uniform.view_proj[0][0], 2.0);
        assert_eq!(uniform.view_proj[3][3], 1.0);
    }

    #[test]
    fn test_depth_remap() {
        let near = opengl_to_wgpu_matrix() * Vector4::new(0.0, 0.0, -1.0, 1.0);
        let far = opengl_to_wgpu_matrix() * Vector4::new(0.0, 0.0, 1.0, 1.0);
        assert_relative_eq!(near.z, 0.0);
        assert_relative_eq!(far.z, 1.0);
    }
}
