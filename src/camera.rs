use glam::{Mat4, Vec3};

const PITCH_LIMIT: f32 = 89.0;
const FOV_MIN: f32 = 1.0;
const FOV_MAX: f32 = 45.0;

/// Fly camera with position, yaw, pitch and a scroll-driven field of view.
///
/// Angles are stored in degrees; the defaults match the tutorial scenes
/// (looking down negative Z from three units out).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            yaw: -90.0,
            pitch: 0.0,
            fov: FOV_MAX,
            speed: 2.5,
            sensitivity: 0.1,
        }
    }
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32, fov: f32) -> Self {
        let mut camera = Self {
            position,
            ..Self::default()
        };
        camera.yaw = yaw;
        camera.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        camera.fov = fov.clamp(FOV_MIN, FOV_MAX);
        camera
    }

    pub fn forward(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    pub fn move_forward(&mut self, dt: f32) {
        self.position += self.forward() * self.speed * dt;
    }

    pub fn move_backward(&mut self, dt: f32) {
        self.position -= self.forward() * self.speed * dt;
    }

    pub fn move_left(&mut self, dt: f32) {
        self.position -= self.right() * self.speed * dt;
    }

    pub fn move_right(&mut self, dt: f32) {
        self.position += self.right() * self.speed * dt;
    }

    pub fn move_up(&mut self, dt: f32) {
        self.position.y += self.speed * dt;
    }

    pub fn move_down(&mut self, dt: f32) {
        self.position.y -= self.speed * dt;
    }

    /// Applies a mouse delta. `dy` is already reversed by the input layer,
    /// so positive values pitch the camera upwards.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch += dy * self.sensitivity;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Applies a scroll delta to the field of view (positive zooms in).
    pub fn zoom(&mut self, delta: f32) {
        self.fov = (self.fov - delta).clamp(FOV_MIN, FOV_MAX);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect.max(0.01), 0.1, 100.0)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_looks_down_negative_z() {
        let camera = Camera::default();
        let forward = camera.forward();
        assert!(forward.z < -0.99);
        assert!(forward.y.abs() < 1e-6);
    }

    #[test]
    fn basis_vectors_are_unit_length() {
        let camera = Camera::new(Vec3::ZERO, 37.0, 21.0, 45.0);
        assert!((camera.forward().length() - 1.0).abs() < 1e-5);
        assert!((camera.right().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.rotate(0.0, 10_000.0);
        assert_eq!(camera.pitch, 89.0);
        camera.rotate(0.0, -100_000.0);
        assert_eq!(camera.pitch, -89.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::default();
        camera.zoom(100.0);
        assert_eq!(camera.fov, 1.0);
        camera.zoom(-100.0);
        assert_eq!(camera.fov, 45.0);
    }

    #[test]
    fn forward_motion_moves_along_forward() {
        let mut camera = Camera::default();
        let forward = camera.forward();
        camera.move_forward(2.0);
        let expected = forward * camera.speed * 2.0;
        assert!((camera.position - expected).length() < 1e-5);
    }

    #[test]
    fn view_projection_is_finite() {
        let camera = Camera::default();
        let vp = camera.view_projection(16.0 / 9.0);
        assert!(vp.to_cols_array().iter().all(|v| v.is_finite()));
    }
}
