use glam::{Mat4, Vec3};

/// Pitch limit in degrees; keeps forward away from world-up so the basis never flips.
pub const PITCH_LIMIT: f32 = 89.0;

pub const MIN_SPEED_MULTIPLIER: f32 = 0.1;
pub const MAX_SPEED_MULTIPLIER: f32 = 1000.0;

/// Discrete movement commands produced by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl MoveDirection {
    pub const ALL: [MoveDirection; 6] = [
        MoveDirection::Forward,
        MoveDirection::Backward,
        MoveDirection::Left,
        MoveDirection::Right,
        MoveDirection::Up,
        MoveDirection::Down,
    ];

    /// Displacement coefficients along (forward, right, world_up).
    pub fn coefficients(self) -> [f32; 3] {
        match self {
            MoveDirection::Forward => [1.0, 0.0, 0.0],
            MoveDirection::Backward => [-1.0, 0.0, 0.0],
            MoveDirection::Left => [0.0, -1.0, 0.0],
            MoveDirection::Right => [0.0, 1.0, 0.0],
            MoveDirection::Up => [0.0, 0.0, 1.0],
            MoveDirection::Down => [0.0, 0.0, -1.0],
        }
    }
}

/// Perspective parameters. Angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            fov_y: 45.0,
            aspect: aspect_ratio(width, height),
            z_near: 0.1,
            z_far: 100.0,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect, self.z_near, self.z_far)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// Free-fly camera with yaw/pitch orientation.
///
/// `forward`, `right` and `up` are derived from `yaw`, `pitch` and
/// `world_up`; mutate the angles only through [`Camera::apply_look`] or
/// [`Camera::set_orientation`] so the basis stays orthonormal.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    yaw: f32,
    pitch: f32,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    world_up: Vec3,
    pub base_speed: f32,
    pub sensitivity: f32,
    pub adaptive_speed: bool,
    scene_center: Option<Vec3>,
    scene_scale: f32,
    pub projection: Projection,
}

impl Camera {
    pub fn new(position: Vec3, world_up: Vec3, yaw: f32, pitch: f32) -> Self {
        let world_up = if world_up.length_squared() > 0.0 { world_up.normalize() } else { Vec3::Y };
        let mut camera = Self {
            position,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            world_up,
            base_speed: 2.5,
            sensitivity: 0.1,
            adaptive_speed: true,
            scene_center: None,
            scene_scale: 0.0,
            projection: Projection::new(16, 9),
        };
        camera.update_vectors();
        camera
    }

    pub fn yaw(&self) -> f32 { self.yaw }
    pub fn pitch(&self) -> f32 { self.pitch }
    pub fn forward(&self) -> Vec3 { self.forward }
    pub fn right(&self) -> Vec3 { self.right }
    pub fn up(&self) -> Vec3 { self.up }
    pub fn world_up(&self) -> Vec3 { self.world_up }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.projection.aspect = aspect_ratio(width, height);
    }

    /// Set yaw and pitch (degrees) directly. Pitch is clamped.
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Orient the camera towards `target` without moving it.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.length_squared() <= f32::EPSILON {
            return;
        }
        let dir = dir.normalize();
        let yaw = dir.z.atan2(dir.x).to_degrees();
        let pitch = dir.y.clamp(-1.0, 1.0).asin().to_degrees();
        self.set_orientation(yaw, pitch);
    }

    /// Record the loaded scene's extent for the adaptive speed multiplier.
    /// A non-positive or non-finite scale clears it.
    pub fn set_scene_bounds(&mut self, center: Vec3, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.scene_center = Some(center);
            self.scene_scale = scale;
        } else {
            tracing::warn!(scale, "ignoring degenerate scene scale for adaptive speed");
            self.scene_center = None;
            self.scene_scale = 0.0;
        }
    }

    pub fn scene_bounds(&self) -> Option<(Vec3, f32)> {
        self.scene_center.map(|c| (c, self.scene_scale))
    }

    /// Speed multiplier derived from scene size and distance to the scene
    /// center, clamped to `[0.1, 1000]`. 1.0 when no scene is known.
    pub fn speed_multiplier(&self) -> f32 {
        if !self.adaptive_speed {
            return 1.0;
        }
        match self.scene_center {
            Some(center) => {
                let scale_factor = self.scene_scale / 10.0;
                let distance_factor = (self.position.distance(center) / self.scene_scale).max(1.0);
                (scale_factor * distance_factor).clamp(MIN_SPEED_MULTIPLIER, MAX_SPEED_MULTIPLIER)
            }
            None => 1.0,
        }
    }

    pub fn effective_speed(&self) -> f32 {
        self.base_speed * self.speed_multiplier()
    }

    pub fn apply_movement(&mut self, direction: MoveDirection, dt: f32) {
        let velocity = self.effective_speed() * dt;
        let [f, r, u] = direction.coefficients();
        self.position += (self.forward * f + self.right * r + self.world_up * u) * velocity;
    }

    pub fn apply_look(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch += dy * self.sensitivity;
        // clamp before the basis is rebuilt
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.forward = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        self.right = self.forward.cross(self.world_up).normalize();
        self.up = self.right.cross(self.forward).normalize();
    }
}

impl Default for Camera {
    /// Three units in front of the origin, looking down -Z.
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0), Vec3::Y, -90.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let mut yaw = 0.0;
        while yaw < 360.0 {
            let mut pitch = -89.0;
            while pitch <= 89.0 {
                let cam = Camera::new(Vec3::ZERO, Vec3::Y, yaw, pitch);
                let (f, r, u) = (cam.forward(), cam.right(), cam.up());
                assert!((f.length() - 1.0).abs() < EPS, "yaw {yaw} pitch {pitch}");
                assert!((r.length() - 1.0).abs() < EPS, "yaw {yaw} pitch {pitch}");
                assert!((u.length() - 1.0).abs() < EPS, "yaw {yaw} pitch {pitch}");
                assert!(f.dot(r).abs() < EPS);
                assert!(f.dot(u).abs() < EPS);
                assert!(r.dot(u).abs() < EPS);
                pitch += 11.125;
            }
            yaw += 7.5;
        }
    }

    #[test]
    fn test_default_looks_down_negative_z() {
        let cam = Camera::default();
        assert!(approx(cam.forward(), Vec3::NEG_Z));
        assert!(approx(cam.right(), Vec3::X));
        assert!(approx(cam.up(), Vec3::Y));
    }

    #[test]
    fn test_pitch_clamps_at_limits() {
        let mut cam = Camera::default();
        cam.apply_look(0.0, 5000.0);
        assert_eq!(cam.pitch(), PITCH_LIMIT);
        assert!(cam.forward().y > 0.99);
        assert!(cam.up().y > 0.0);

        cam.apply_look(0.0, -100_000.0);
        assert_eq!(cam.pitch(), -PITCH_LIMIT);
        assert!(cam.forward().y < -0.99);
    }

    #[test]
    fn test_look_scales_by_sensitivity() {
        let mut cam = Camera::new(Vec3::ZERO, Vec3::Y, 0.0, 0.0);
        cam.sensitivity = 0.5;
        cam.apply_look(10.0, -4.0);
        assert!((cam.yaw() - 5.0).abs() < EPS);
        assert!((cam.pitch() + 2.0).abs() < EPS);
    }

    #[test]
    fn test_forward_then_backward_returns_to_start() {
        let mut cam = Camera::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, 33.0, 12.0);
        // large enough that the multiplier stays flat over these distances
        cam.set_scene_bounds(Vec3::ZERO, 100.0);
        let start = cam.position;
        for dt in [0.0, 0.016, 0.5, 3.0] {
            cam.apply_movement(MoveDirection::Forward, dt);
            cam.apply_movement(MoveDirection::Backward, dt);
            assert!((cam.position - start).length() < 1e-3, "dt {dt}");
        }

        let mut cam = Camera::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, 33.0, 12.0);
        let start = cam.position;
        for dt in [0.0, 0.016, 0.5, 3.0] {
            cam.apply_movement(MoveDirection::Forward, dt);
            cam.apply_movement(MoveDirection::Backward, dt);
            assert!(approx(cam.position, start), "dt {dt}");
        }
    }

    #[test]
    fn test_movement_follows_basis() {
        let mut cam = Camera::default();
        cam.apply_movement(MoveDirection::Forward, 1.0);
        assert!(approx(cam.position, Vec3::new(0.0, 0.0, 0.5)));

        let mut cam = Camera::default();
        cam.apply_movement(MoveDirection::Right, 2.0);
        assert!(approx(cam.position, Vec3::new(5.0, 0.0, 3.0)));

        let mut cam = Camera::default();
        cam.apply_look(0.0, 300.0); // steep pitch; up/down still use world-up
        cam.apply_movement(MoveDirection::Up, 1.0);
        assert!(approx(cam.position, Vec3::new(0.0, 2.5, 3.0)));
        cam.apply_movement(MoveDirection::Down, 2.0);
        assert!(approx(cam.position, Vec3::new(0.0, -2.5, 3.0)));
    }

    #[test]
    fn test_movement_scales_with_adaptive_multiplier() {
        // scale 50 at distance 100: (50 / 10) * (100 / 50) = 10
        let mut cam = Camera::default();
        cam.position = Vec3::new(0.0, 0.0, 100.0);
        cam.set_scene_bounds(Vec3::ZERO, 50.0);
        cam.apply_movement(MoveDirection::Forward, 1.0);
        assert!(approx(cam.position, Vec3::new(0.0, 0.0, 100.0 - 2.5 * 10.0)));

        let mut cam = Camera::default();
        cam.position = Vec3::new(0.0, 0.0, 100.0);
        cam.set_scene_bounds(Vec3::ZERO, 50.0);
        cam.adaptive_speed = false;
        cam.apply_movement(MoveDirection::Forward, 1.0);
        assert!(approx(cam.position, Vec3::new(0.0, 0.0, 97.5)));
    }

    #[test]
    fn test_speed_multiplier_monotonic_and_clamped() {
        let mut cam = Camera::default();
        cam.set_scene_bounds(Vec3::ZERO, 20.0);
        let mut last = 0.0;
        for step in 0..200 {
            cam.position = Vec3::new(0.0, 0.0, step as f32 * 3.0);
            let m = cam.speed_multiplier();
            assert!(m >= last, "multiplier decreased at step {step}");
            assert!((MIN_SPEED_MULTIPLIER..=MAX_SPEED_MULTIPLIER).contains(&m));
            last = m;
        }

        cam.set_scene_bounds(Vec3::ZERO, 0.001);
        cam.position = Vec3::ZERO;
        assert_eq!(cam.speed_multiplier(), MIN_SPEED_MULTIPLIER);

        cam.set_scene_bounds(Vec3::ZERO, 1.0e6);
        cam.position = Vec3::new(1.0e9, 0.0, 0.0);
        assert_eq!(cam.speed_multiplier(), MAX_SPEED_MULTIPLIER);
    }

    #[test]
    fn test_speed_multiplier_inside_scene() {
        let mut cam = Camera::default();
        cam.set_scene_bounds(Vec3::ZERO, 50.0);
        cam.position = Vec3::new(10.0, 0.0, 0.0);
        assert!((cam.speed_multiplier() - 5.0).abs() < EPS);
        cam.position = Vec3::new(100.0, 0.0, 0.0);
        assert!((cam.speed_multiplier() - 10.0).abs() < EPS);
    }

    #[test]
    fn test_degenerate_scene_scale_disables_multiplier() {
        let mut cam = Camera::default();
        cam.set_scene_bounds(Vec3::ZERO, 0.0);
        assert!(cam.scene_bounds().is_none());
        assert_eq!(cam.speed_multiplier(), 1.0);

        cam.set_scene_bounds(Vec3::ZERO, 50.0);
        cam.adaptive_speed = false;
        assert_eq!(cam.speed_multiplier(), 1.0);
    }

    #[test]
    fn test_view_matrix_moves_eye_to_origin() {
        let mut cam = Camera::new(Vec3::new(4.0, -2.0, 7.0), Vec3::Y, 15.0, -20.0);
        cam.apply_look(3.0, 1.0);
        let view = cam.view_matrix();
        let eye = view.transform_point3(cam.position);
        assert!(eye.length() < EPS);
        let ahead = view.transform_point3(cam.position + cam.forward());
        assert!(approx(ahead, Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_look_at_points_forward_at_target() {
        let mut cam = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Y, 0.0, 0.0);
        cam.look_at(Vec3::ZERO);
        assert!(approx(cam.forward(), Vec3::NEG_Z));
        assert!((cam.yaw() + 90.0).abs() < EPS);

        cam.look_at(Vec3::new(0.0, 10.0, 0.0));
        let expected = Vec3::new(0.0, 10.0, -10.0).normalize();
        assert!(approx(cam.forward(), expected));
    }

    #[test]
    fn test_direction_table_is_symmetric() {
        for dir in MoveDirection::ALL {
            let c = dir.coefficients();
            assert_eq!(c.iter().map(|v| v.abs()).sum::<f32>(), 1.0);
        }
        let f = MoveDirection::Forward.coefficients();
        let b = MoveDirection::Backward.coefficients();
        assert_eq!([f[0] + b[0], f[1] + b[1], f[2] + b[2]], [0.0; 3]);
    }
}
