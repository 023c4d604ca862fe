use egui::{Context, RichText};
use glam::Vec3;

use crate::model::{BoundingBox, Camera, FlattenedScene};
use crate::view::ShadingMode;

const CONTROLS: [&str; 9] = [
    "Click - Capture mouse",
    "WASD / Arrows - Move",
    "Space / Shift - Up / Down",
    "Scroll - Forward / Back",
    "Tab, 1-4 - Shading",
    "R - Reset camera",
    "H - Toggle overlay",
    "Esc - Release mouse",
    "Q - Quit",
];

/// Model statistics shown in the overlay, gathered once after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelStats {
    pub source: String,
    pub meshes: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub stride: usize,
    pub has_normals: bool,
    pub has_tex_coords: bool,
    pub bounds: BoundingBox,
}

impl ModelStats {
    pub fn new(source: impl Into<String>, meshes: usize, flat: &FlattenedScene) -> Self {
        Self {
            source: source.into(),
            meshes,
            vertices: flat.vertex_count(),
            triangles: flat.triangle_count(),
            stride: flat.layout.stride(),
            has_normals: flat.format.has_normals,
            has_tex_coords: flat.format.has_tex_coords,
            bounds: flat.bounds,
        }
    }

    pub fn format_label(&self) -> String {
        let mut parts = vec!["pos"];
        parts.push(if self.has_normals { "normal" } else { "normal (fallback)" });
        if self.has_tex_coords {
            parts.push("uv");
        }
        format!("{} ({} floats)", parts.join(" + "), self.stride)
    }
}

/// Per-frame values for the overlay
pub struct OverlayInfo<'a> {
    pub fps: f32,
    pub frame_ms: f32,
    pub camera: &'a Camera,
    pub shading: ShadingMode,
    pub wireframe_supported: bool,
    pub pointer_locked: bool,
    pub stats: &'a ModelStats,
}

fn fmt_vec3(v: Vec3) -> String {
    format!("{:.2}, {:.2}, {:.2}", v.x, v.y, v.z)
}

fn small(text: impl Into<String>) -> RichText {
    RichText::new(text).small()
}

/// Draw the overlay windows into `ctx`.
pub fn build_overlay(ctx: &Context, info: &OverlayInfo) {
    draw_camera_window(ctx, info);
    draw_model_window(ctx, info.stats);
}

fn draw_camera_window(ctx: &Context, info: &OverlayInfo) {
    let camera = info.camera;
    egui::Window::new("Camera")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(small(format!("FPS: {:.0} ({:.1} ms)", info.fps, info.frame_ms)));
            ui.label(small(format!("Pos: {}", fmt_vec3(camera.position))));
            ui.label(small(format!("Yaw: {:.1} Pitch: {:.1}", camera.yaw(), camera.pitch())));
            ui.label(small(format!(
                "Speed: {:.2} (x{:.2})",
                camera.effective_speed(),
                camera.speed_multiplier()
            )));

            let mut shading = info.shading.label().to_string();
            if !info.wireframe_supported {
                shading.push_str(" (no wireframe)");
            }
            ui.label(small(format!("Shading: {shading}")));
            if !info.pointer_locked {
                ui.label(small("Click to look around").italics());
            }

            ui.separator();
            ui.label(small("Controls:"));
            for line in CONTROLS {
                ui.label(small(line));
            }
        });
}

fn draw_model_window(ctx: &Context, stats: &ModelStats) {
    egui::Window::new("Model")
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(small(stats.source.clone()));
            ui.label(small(format!("Meshes: {}", stats.meshes)));
            ui.label(small(format!("Vertices: {}", stats.vertices)));
            ui.label(small(format!("Triangles: {}", stats.triangles)));
            ui.label(small(format!("Format: {}", stats.format_label())));
            if stats.bounds.is_empty() {
                ui.label(small("Bounds: empty"));
            } else {
                ui.label(small(format!("Min: {}", fmt_vec3(stats.bounds.min))));
                ui.label(small(format!("Max: {}", fmt_vec3(stats.bounds.max))));
                ui.label(small(format!("Size: {}", fmt_vec3(stats.bounds.size()))));
            }
        });
}
