use glam::Vec3;

use crate::config::CameraConfig;
use crate::controller::input::{InputProcessor, InputState};
use crate::model::{BoundingBox, Camera};

/// Where to put the camera so the whole model is in view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenePlacement {
    pub position: Vec3,
    pub target: Vec3,
    pub distance: f32,
    /// Largest box dimension; feeds the adaptive speed multiplier.
    pub scene_scale: f32,
}

/// Fit `bounds` into a perspective view looking down -Z.
///
/// Returns `None` for an empty box or one with zero extent; there is no
/// meaningful distance to derive from those.
pub fn frame_scene(bounds: &BoundingBox, fov_y: f32, aspect: f32, padding: f32) -> Option<ScenePlacement> {
    if bounds.is_empty() {
        return None;
    }
    let max_extent = bounds.max_extent();
    if !max_extent.is_finite() || max_extent <= 0.0 {
        return None;
    }

    let center = bounds.center();
    let half = max_extent * 0.5;
    let half_fov_y = fov_y.to_radians() * 0.5;
    let half_fov_x = (half_fov_y.tan() * aspect.max(f32::EPSILON)).atan();

    let fit_vertical = half / half_fov_y.tan();
    let fit_horizontal = half / half_fov_x.tan();
    let distance = (fit_vertical.max(fit_horizontal) * padding).max(2.0 * max_extent);

    Some(ScenePlacement {
        position: center + Vec3::Z * distance,
        target: center,
        distance,
        scene_scale: max_extent,
    })
}

/// Handles camera movement and orientation
pub struct CameraController {
    pub scroll_step: f32,
    home: Option<ScenePlacement>,
}

impl CameraController {
    pub fn new(config: &CameraConfig) -> Self {
        Self { scroll_step: config.scroll_step, home: None }
    }

    /// Build the startup camera for a model with the given bounds.
    pub fn initial_camera(&mut self, bounds: &BoundingBox, config: &CameraConfig, width: u32, height: u32) -> Camera {
        let mut camera = Camera::default();
        camera.base_speed = config.base_speed;
        camera.sensitivity = config.sensitivity;
        camera.adaptive_speed = config.adaptive_speed;
        camera.projection.fov_y = config.fov_y;
        camera.projection.z_near = config.z_near;
        camera.projection.z_far = config.z_far;
        camera.set_aspect(width, height);

        self.home = frame_scene(bounds, config.fov_y, camera.projection.aspect, config.fit_padding);
        match self.home {
            Some(placement) => {
                self.place(&mut camera, &placement);
                tracing::info!(
                    center = ?placement.target,
                    position = ?placement.position,
                    distance = placement.distance,
                    z_far = camera.projection.z_far,
                    "camera framed on model"
                );
            }
            None => {
                tracing::warn!("model has no extent, using default camera");
            }
        }
        camera
    }

    fn place(&self, camera: &mut Camera, placement: &ScenePlacement) {
        camera.position = placement.position;
        camera.look_at(placement.target);
        camera.set_scene_bounds(placement.target, placement.scene_scale);
        // keep the far side of the model inside the frustum
        let needed = placement.distance + placement.scene_scale * 2.0;
        camera.projection.z_far = camera.projection.z_far.max(needed);
    }

    /// Return to the startup placement (or the default pose).
    pub fn reset(&self, camera: &mut Camera) {
        match self.home {
            Some(placement) => self.place(camera, &placement),
            None => {
                camera.position = Camera::default().position;
                camera.set_orientation(-90.0, 0.0);
            }
        }
    }

    /// Apply pointer motion. Screen y grows downwards, pitch grows upwards.
    pub fn apply_look(&self, camera: &mut Camera, dx: f32, dy: f32) {
        if dx != 0.0 || dy != 0.0 {
            camera.apply_look(dx, -dy);
        }
    }

    /// Update camera position based on pressed keys
    pub fn update_movement(&self, camera: &mut Camera, input: &InputState, processor: &InputProcessor, dt: f32) {
        for direction in processor.held_directions(input) {
            camera.apply_movement(direction, dt);
        }
    }

    /// Scroll moves along forward/backward, `scroll_step` seconds per line.
    pub fn apply_scroll(&self, camera: &mut Camera, delta_y: f32) {
        use crate::model::MoveDirection;
        if delta_y > 0.0 {
            camera.apply_movement(MoveDirection::Forward, delta_y * self.scroll_step);
        } else if delta_y < 0.0 {
            camera.apply_movement(MoveDirection::Backward, -delta_y * self.scroll_step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::InputEvent;
    use winit::keyboard::KeyCode;

    fn cube(half: f32, center: Vec3) -> BoundingBox {
        BoundingBox { min: center - Vec3::splat(half), max: center + Vec3::splat(half) }
    }

    #[test]
    fn test_frame_scene_fits_vertical_fov() {
        let bounds = cube(1.0, Vec3::new(1.0, 2.0, 3.0));
        let p = frame_scene(&bounds, 90.0, 1.0, 1.0).unwrap();
        // tan(45°) = 1, half extent 1, floor 2 * extent = 4 wins
        assert!((p.distance - 4.0).abs() < 1e-5);
        assert_eq!(p.target, Vec3::new(1.0, 2.0, 3.0));
        assert!((p.position - Vec3::new(1.0, 2.0, 7.0)).length() < 1e-5);
        assert_eq!(p.scene_scale, 2.0);
    }

    #[test]
    fn test_frame_scene_narrow_aspect_moves_back() {
        let bounds = cube(5.0, Vec3::ZERO);
        let wide = frame_scene(&bounds, 20.0, 2.0, 1.5).unwrap();
        let narrow = frame_scene(&bounds, 20.0, 0.25, 1.5).unwrap();
        assert!(narrow.distance > wide.distance);

        let expected = 5.0 / (10.0f32.to_radians().tan()) * 1.5;
        assert!((wide.distance - expected).abs() < 1e-3);
    }

    #[test]
    fn test_frame_scene_rejects_degenerate() {
        assert!(frame_scene(&BoundingBox::EMPTY, 45.0, 1.0, 1.5).is_none());
        let point = BoundingBox::from_points([Vec3::ONE]);
        assert!(frame_scene(&point, 45.0, 1.0, 1.5).is_none());
    }

    #[test]
    fn test_initial_camera_looks_at_center() {
        let config = CameraConfig::default();
        let mut controller = CameraController::new(&config);
        let bounds = cube(50.0, Vec3::new(0.0, 10.0, 0.0));
        let camera = controller.initial_camera(&bounds, &config, 1600, 1200);

        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-4);
        assert!((camera.yaw() + 90.0).abs() < 1e-3);
        assert_eq!(camera.position.y, 10.0);
        assert!(camera.position.z >= 200.0);
        assert!(camera.projection.z_far > camera.position.z + 50.0);
        assert_eq!(camera.scene_bounds(), Some((Vec3::new(0.0, 10.0, 0.0), 100.0)));
    }

    #[test]
    fn test_empty_scene_uses_default_camera() {
        let config = CameraConfig::default();
        let mut controller = CameraController::new(&config);
        let camera = controller.initial_camera(&BoundingBox::EMPTY, &config, 800, 600);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 3.0));
        assert!(camera.scene_bounds().is_none());
    }

    #[test]
    fn test_reset_restores_home() {
        let config = CameraConfig::default();
        let mut controller = CameraController::new(&config);
        let bounds = cube(1.0, Vec3::ZERO);
        let mut camera = controller.initial_camera(&bounds, &config, 800, 600);
        let home = camera.position;

        camera.apply_look(40.0, 10.0);
        camera.position += Vec3::X * 3.0;
        controller.reset(&mut camera);
        assert!((camera.position - home).length() < 1e-5);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_look_inverts_screen_y() {
        let config = CameraConfig::default();
        let controller = CameraController::new(&config);
        let mut camera = Camera::default();
        camera.sensitivity = 1.0;
        controller.apply_look(&mut camera, 0.0, 10.0);
        assert!((camera.pitch() + 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_movement_and_scroll() {
        let config = CameraConfig::default();
        let controller = CameraController::new(&config);
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        let mut camera = Camera::default();

        input.process_event(&InputEvent::KeyDown(KeyCode::KeyD));
        controller.update_movement(&mut camera, &input, &processor, 1.0);
        assert!((camera.position - Vec3::new(2.5, 0.0, 3.0)).length() < 1e-5);

        controller.apply_scroll(&mut camera, 2.0);
        assert!((camera.position.z - (3.0 - 2.5 * 0.2)).abs() < 1e-5);
        controller.apply_scroll(&mut camera, -2.0);
        assert!((camera.position.z - 3.0).abs() < 1e-5);
    }
}
