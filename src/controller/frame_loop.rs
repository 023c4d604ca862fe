use std::time::{Duration, Instant};

use glam::Vec3;

use crate::config::RenderConfig;
use crate::model::Camera;
use crate::view::ShadingMode;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 3],
    pub _pad: f32,
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            eye: camera.position.to_array(),
            _pad: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadingUniform {
    /// Normalized direction towards the light
    pub light_dir: [f32; 3],
    pub ambient: f32,
    pub base_color: [f32; 3],
    pub mode: u32,
}

impl ShadingUniform {
    pub fn new(render: &RenderConfig, mode: ShadingMode) -> Self {
        let towards_light = -Vec3::from_array(render.light_direction);
        let light_dir = if towards_light.length_squared() > 0.0 { towards_light.normalize() } else { Vec3::Y };
        Self {
            light_dir: light_dir.to_array(),
            ambient: render.ambient.clamp(0.0, 1.0),
            base_color: render.base_color,
            mode: mode.shader_index(),
        }
    }
}

/// Frame delta and a once-per-second FPS average
pub struct FrameTimer {
    last_frame: Instant,
    frame_count: u32,
    accumulated: f32,
    fps: f32,
    last_dt: f32,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self { last_frame: now, frame_count: 0, accumulated: 0.0, fps: 0.0, last_dt: 0.0 }
    }

    /// Seconds since the previous tick
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.last_dt = dt;

        self.frame_count += 1;
        self.accumulated += dt;
        if self.accumulated >= 1.0 {
            self.fps = self.frame_count as f32 / self.accumulated;
            self.frame_count = 0;
            self.accumulated = 0.0;
        }
        dt
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn frame_time(&self) -> Duration {
        Duration::from_secs_f32(self.last_dt)
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<ShadingUniform>(), 32);
    }

    #[test]
    fn test_shading_uniform_points_towards_light() {
        let render = RenderConfig { light_direction: [0.0, -2.0, 0.0], ambient: 3.0, ..RenderConfig::default() };
        let u = ShadingUniform::new(&render, ShadingMode::Normals);
        assert_eq!(u.light_dir, [0.0, 1.0, 0.0]);
        assert_eq!(u.ambient, 1.0);
        assert_eq!(u.mode, 2);
    }

    #[test]
    fn test_fps_average() {
        let start = Instant::now();
        let mut timer = FrameTimer::starting_at(start);
        for i in 1..=11 {
            let dt = timer.tick_at(start + Duration::from_millis(100 * i));
            assert!((dt - 0.1).abs() < 1e-3);
        }
        assert!((timer.fps() - 10.0).abs() < 0.1);
    }
}
