use glam::{Mat4, Vec2, Vec3};

/// Pitch is clamped short of straight up/down so the view basis never
/// degenerates against the up vector.
pub const PITCH_LIMIT_DEGREES: f32 = 70.0;

/// World units moved per navigation update while a direction is held.
pub const MOVE_SPEED: f32 = 0.2;

/// Degrees of rotation per pixel of pointer travel.
pub const LOOK_SENSITIVITY: f32 = 0.1;

/// Held-direction flags consumed by [`Camera::navigate`].
///
/// The windowing layer maps whatever keys it likes onto these; the camera
/// only sees movement intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavInput {
    pub forward: bool,
    pub back: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
}

/// First-person perspective camera.
///
/// Owns view position, look direction, and projection parameters, and keeps
/// the derived view and projection matrices in step with them: every mutator
/// recomputes the cached matrices before returning, so callers never observe
/// a stale matrix.
///
/// The look target is stored as a unit *direction*, not a point. The
/// constructor and [`Camera::look_at`] accept a point and convert it once;
/// navigation writes the direction from yaw and pitch.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    direction: Vec3,
    up: Vec3,
    /// Vertical field of view in degrees.
    fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
    /// Heading in degrees; unclamped, wraps freely.
    yaw: f32,
    /// Elevation in degrees, clamped to [`PITCH_LIMIT_DEGREES`].
    pitch: f32,
    /// Last pointer position seen by [`Camera::navigate`].
    last_cursor: Vec2,
    view: Mat4,
    projection: Mat4,
}

impl Camera {
    /// Build a camera at `position` looking at the point `look_at`.
    pub fn new(
        position: Vec3,
        look_at: Vec3,
        up: Vec3,
        fov_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let direction = (look_at - position).normalize_or(Vec3::NEG_Z);
        let mut camera = Self {
            position,
            direction,
            up,
            fov_degrees,
            aspect,
            near,
            far,
            yaw: direction.z.atan2(direction.x).to_degrees(),
            pitch: direction
                .y
                .clamp(-1.0, 1.0)
                .asin()
                .to_degrees()
                .clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES),
            last_cursor: Vec2::ZERO,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.update_matrices();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit look direction.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn last_cursor(&self) -> Vec2 {
        self.last_cursor
    }

    /// Cached right-handed look-at matrix for the current state.
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Cached perspective projection matrix for the current state.
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_matrices();
    }

    /// Set the look direction; the input is normalized, and a degenerate
    /// vector leaves the previous direction in place.
    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction.normalize_or(self.direction);
        self.update_matrices();
    }

    /// Point the camera at a world-space point.
    pub fn look_at(&mut self, point: Vec3) {
        self.direction = (point - self.position).normalize_or(self.direction);
        self.update_matrices();
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.update_matrices();
    }

    pub fn set_fov(&mut self, fov_degrees: f32) {
        self.fov_degrees = fov_degrees;
        self.update_matrices();
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_matrices();
    }

    pub fn set_near(&mut self, near: f32) {
        self.near = near;
        self.update_matrices();
    }

    pub fn set_far(&mut self, far: f32) {
        self.far = far;
        self.update_matrices();
    }

    /// Yaw is stored unclamped; full turns are fine.
    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw;
        self.update_matrices();
    }

    /// Out-of-range pitch is clamped silently, never rejected.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);
        self.update_matrices();
    }

    pub fn set_last_cursor(&mut self, cursor: Vec2) {
        self.last_cursor = cursor;
    }

    /// One navigation update: pointer look plus held-direction movement.
    ///
    /// The delta from the last-known pointer position drives yaw and pitch
    /// (screen y grows downward, so it is inverted into pitch), the new
    /// heading becomes the look direction, and the position is displaced
    /// along the direction or its horizontal right vector by [`MOVE_SPEED`].
    pub fn navigate(&mut self, cursor: Vec2, input: NavInput) {
        let delta = cursor - self.last_cursor;
        self.last_cursor = cursor;

        self.yaw += delta.x * LOOK_SENSITIVITY;
        self.pitch = (self.pitch - delta.y * LOOK_SENSITIVITY)
            .clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);

        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.direction = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize_or(self.direction);

        let right = self.direction.cross(self.up).normalize_or(Vec3::X);
        if input.forward {
            self.position += self.direction * MOVE_SPEED;
        }
        if input.back {
            self.position -= self.direction * MOVE_SPEED;
        }
        if input.strafe_left {
            self.position -= right * MOVE_SPEED;
        }
        if input.strafe_right {
            self.position += right * MOVE_SPEED;
        }

        self.update_matrices();
    }

    fn update_matrices(&mut self) {
        self.view = Mat4::look_to_rh(self.position, self.direction, self.up);
        self.projection = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Camera {
        Camera::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            120.0,
            1280.0 / 720.0,
            0.1,
            800.0,
        )
    }

    #[test]
    fn construction_matches_look_at_and_perspective() {
        let cam = test_camera();
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let projection =
            Mat4::perspective_rh(120.0_f32.to_radians(), 1280.0 / 720.0, 0.1, 800.0);
        assert!(cam.view_matrix().abs_diff_eq(view, 1e-6));
        assert!(cam.projection_matrix().abs_diff_eq(projection, 1e-6));
    }

    #[test]
    fn pitch_is_always_clamped() {
        let mut cam = test_camera();
        for p in [-1000.0, -70.1, -70.0, 0.0, 69.9, 70.0, 89.0, 1e6] {
            cam.set_pitch(p);
            assert!(cam.pitch() >= -PITCH_LIMIT_DEGREES);
            assert!(cam.pitch() <= PITCH_LIMIT_DEGREES);
        }
        cam.set_pitch(90.0);
        assert_eq!(cam.pitch(), PITCH_LIMIT_DEGREES);
    }

    #[test]
    fn yaw_is_unclamped() {
        let mut cam = test_camera();
        cam.set_yaw(1234.5);
        assert_eq!(cam.yaw(), 1234.5);
    }

    #[test]
    fn matrices_track_every_mutation() {
        let mut cam = test_camera();

        cam.set_position(Vec3::new(3.0, -2.0, 7.0));
        let expected = Mat4::look_to_rh(cam.position(), cam.direction(), cam.up());
        assert!(cam.view_matrix().abs_diff_eq(expected, 1e-6));

        cam.look_at(Vec3::new(10.0, 0.0, 0.0));
        let expected = Mat4::look_to_rh(cam.position(), cam.direction(), cam.up());
        assert!(cam.view_matrix().abs_diff_eq(expected, 1e-6));

        cam.set_fov(60.0);
        cam.set_aspect(2.0);
        let expected = Mat4::perspective_rh(60.0_f32.to_radians(), 2.0, 0.1, 800.0);
        assert!(cam.projection_matrix().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn yaw_and_pitch_map_to_direction() {
        let mut cam = test_camera();
        cam.set_yaw(0.0);
        cam.set_pitch(0.0);
        cam.navigate(cam.last_cursor(), NavInput::default());
        assert!(cam.direction().abs_diff_eq(Vec3::X, 1e-6));

        cam.set_yaw(90.0);
        cam.navigate(cam.last_cursor(), NavInput::default());
        assert!(cam.direction().abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn navigation_moves_along_direction_and_right() {
        let mut cam = test_camera();
        cam.set_yaw(0.0);
        cam.set_pitch(0.0);
        let start = cam.position();

        cam.navigate(
            cam.last_cursor(),
            NavInput {
                forward: true,
                ..NavInput::default()
            },
        );
        assert!(cam.position().abs_diff_eq(start + Vec3::X * MOVE_SPEED, 1e-6));

        let here = cam.position();
        cam.navigate(
            cam.last_cursor(),
            NavInput {
                strafe_right: true,
                ..NavInput::default()
            },
        );
        // Facing +X with up +Y, right is direction × up = +Z.
        let right = Vec3::X.cross(Vec3::Y);
        assert!(cam.position().abs_diff_eq(here + right * MOVE_SPEED, 1e-6));
    }

    #[test]
    fn pointer_delta_turns_the_camera() {
        let mut cam = test_camera();
        cam.set_yaw(0.0);
        cam.set_pitch(0.0);
        cam.set_last_cursor(Vec2::new(100.0, 100.0));

        // 10 px right, 20 px up (screen y decreases upward).
        cam.navigate(Vec2::new(110.0, 80.0), NavInput::default());
        assert!((cam.yaw() - 1.0).abs() < 1e-5);
        assert!((cam.pitch() - 2.0).abs() < 1e-5);
        assert_eq!(cam.last_cursor(), Vec2::new(110.0, 80.0));
    }

    #[test]
    fn degenerate_look_at_keeps_previous_direction() {
        let mut cam = test_camera();
        let before = cam.direction();
        cam.look_at(cam.position());
        assert_eq!(cam.direction(), before);
        assert!(!cam.view_matrix().is_nan());
    }
}
