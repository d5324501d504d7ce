//! Screen-space text drawn on top of the 3D scene

use crate::scene::{LabelFont, Scene, TextLabel};

const CAPTION_SIZE: f32 = 12.0;
const HELP_SIZE: f32 = 13.0;

/// Paints [`TextLabel`]s with egui after the scene pass
pub struct TextOverlay {
    context: egui::Context,
    renderer: egui_wgpu::Renderer,
}

impl TextOverlay {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        Self {
            context: egui::Context::default(),
            renderer: egui_wgpu::Renderer::new(device, format, None, 1),
        }
    }

    /// Record a pass drawing every label of `scene` over `target`.
    ///
    /// Returns extra command buffers that must be submitted before the encoder.
    pub fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &Scene,
    ) -> Vec<wgpu::CommandBuffer> {
        if scene.labels.is_empty() {
            return Vec::new();
        }

        let width = scene.viewport.width.max(1);
        let height = scene.viewport.height.max(1);
        let raw_input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(width as f32, height as f32),
            )),
            ..Default::default()
        };

        let output = self.context.run(raw_input, |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::new(
                egui::Order::Foreground,
                egui::Id::new("depthview-labels"),
            ));
            for label in &scene.labels {
                paint_label(&painter, label);
            }
        });

        let primitives = self.context.tessellate(output.shapes, output.pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: output.pixels_per_point,
        };

        for (id, delta) in &output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        let extra = self
            .renderer
            .update_buffers(device, queue, encoder, &primitives, &screen);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.renderer.render(&mut render_pass, &primitives, &screen);
        }

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }

        extra
    }
}

fn paint_label(painter: &egui::Painter, label: &TextLabel) {
    let font = match label.font {
        LabelFont::Caption => egui::FontId::proportional(CAPTION_SIZE),
        LabelFont::Help => egui::FontId::monospace(HELP_SIZE),
    };
    let [r, g, b] = label.color;
    painter.text(
        egui::pos2(label.position[0], label.position[1]),
        egui::Align2::LEFT_TOP,
        &label.text,
        font,
        egui::Color32::from_rgb(r, g, b),
    );
}
