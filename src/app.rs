use std::sync::Arc;
use std::time::Instant;

use crate::camera::Camera;
use crate::input::{InputState, KeyCode, NamedKey};
use crate::light::Light;
use crate::render::{CameraParams, LampMarker};
use crate::scene::Scene;

/// Per-frame timing derived from the wall clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    /// Seconds since the previous frame.
    pub delta: f32,
    /// Seconds since the application started.
    pub elapsed: f32,
}

/// Measures frame deltas and total elapsed time.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    pub fn tick(&mut self) -> FrameTiming {
        let now = Instant::now();
        let timing = FrameTiming {
            delta: (now - self.last).as_secs_f32(),
            elapsed: (now - self.start).as_secs_f32(),
        };
        self.last = now;
        timing
    }
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct FrameState {
    pub camera: CameraParams,
    pub light: Light,
    pub lamp: Option<LampMarker>,
    pub shaded: bool,
    pub wireframe: bool,
}

/// Application context owning the camera, scene and per-frame state that
/// the original demos kept in process-wide globals.
pub struct App {
    pub camera: Camera,
    pub scene: Scene,
    input: Arc<InputState>,
    clock: FrameClock,
    wireframe: bool,
}

impl App {
    pub fn new(scene: Scene, input: Arc<InputState>) -> Self {
        let start = scene.camera;
        Self {
            camera: Camera::new(start.position, start.yaw, start.pitch, start.fov),
            scene,
            input,
            clock: FrameClock::new(),
            wireframe: false,
        }
    }

    pub fn toggle_wireframe(&mut self) {
        self.wireframe = !self.wireframe;
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// Advances the clock and produces the state for the next frame.
    pub fn advance(&mut self, aspect: f32) -> FrameState {
        let timing = self.clock.tick();
        self.step(timing, aspect)
    }

    /// Applies one frame's worth of input and animation at the given
    /// timing. Split from [`advance`](Self::advance) so tests can drive it
    /// with deterministic clocks.
    pub fn step(&mut self, timing: FrameTiming, aspect: f32) -> FrameState {
        self.apply_input(timing.delta);

        let light = self.scene.light.animated(timing.elapsed);
        let lamp = light.position().map(|position| LampMarker {
            position,
            color: light.color.diffuse,
        });

        FrameState {
            camera: CameraParams {
                view_proj: self.camera.view_projection(aspect),
                position: self.camera.position,
            },
            light,
            lamp,
            shaded: self.scene.shaded,
            wireframe: self.wireframe,
        }
    }

    fn apply_input(&mut self, delta: f32) {
        if self.input.is_key_down(KeyCode::Character('W')) {
            self.camera.move_forward(delta);
        }
        if self.input.is_key_down(KeyCode::Character('S')) {
            self.camera.move_backward(delta);
        }
        if self.input.is_key_down(KeyCode::Character('A')) {
            self.camera.move_left(delta);
        }
        if self.input.is_key_down(KeyCode::Character('D')) {
            self.camera.move_right(delta);
        }
        if self.input.is_key_down(KeyCode::Named(NamedKey::Space)) {
            self.camera.move_up(delta);
        }
        if self.input.is_key_down(KeyCode::Named(NamedKey::LeftShift))
            || self.input.is_key_down(KeyCode::Named(NamedKey::RightShift))
        {
            self.camera.move_down(delta);
        }

        let look = self.input.take_look_delta();
        if look != glam::Vec2::ZERO {
            self.camera.rotate(look.x, look.y);
        }
        let scroll = self.input.take_scroll_delta();
        if scroll != 0.0 {
            self.camera.zoom(scroll);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::Demo;
    use glam::{Vec2, Vec3};

    fn timing(delta: f32, elapsed: f32) -> FrameTiming {
        FrameTiming { delta, elapsed }
    }

    fn app_with_input() -> (App, Arc<InputState>) {
        let input = Arc::new(InputState::new());
        let app = App::new(Demo::Phong.scene(), Arc::clone(&input));
        (app, input)
    }

    #[test]
    fn clock_reports_monotonic_elapsed_time() {
        let mut clock = FrameClock::new();
        let first = clock.tick();
        let second = clock.tick();
        assert!(first.delta >= 0.0);
        assert!(second.elapsed >= first.elapsed);
    }

    #[test]
    fn held_keys_translate_the_camera() {
        let (mut app, input) = app_with_input();
        let before = app.camera.position;
        input.set_key_down(KeyCode::Character('W'));
        app.step(timing(0.5, 0.0), 1.0);
        assert_ne!(app.camera.position, before);
    }

    #[test]
    fn look_deltas_rotate_the_camera_once() {
        let (mut app, input) = app_with_input();
        input.observe_cursor(Vec2::new(100.0, 100.0));
        input.observe_cursor(Vec2::new(110.0, 100.0));
        let yaw_before = app.camera.yaw;
        app.step(timing(0.016, 0.016), 1.0);
        assert!(app.camera.yaw > yaw_before);
        // the delta was drained; a second frame must not rotate again
        let yaw_after = app.camera.yaw;
        app.step(timing(0.016, 0.032), 1.0);
        assert_eq!(app.camera.yaw, yaw_after);
    }

    #[test]
    fn frame_state_carries_the_orbiting_light() {
        let (mut app, _input) = app_with_input();
        let frame = app.step(timing(0.016, 0.0), 1.0);
        assert_eq!(frame.light.position(), Some(Vec3::new(0.0, 1.0, 2.0)));
        let lamp = frame.lamp.expect("point lights have a lamp marker");
        assert_eq!(lamp.position, Vec3::new(0.0, 1.0, 2.0));
    }

    #[test]
    fn directional_scenes_have_no_lamp() {
        let input = Arc::new(InputState::new());
        let mut app = App::new(Demo::Directional.scene(), input);
        let frame = app.step(timing(0.016, 0.0), 1.0);
        assert!(frame.lamp.is_none());
    }

    #[test]
    fn wireframe_toggle_round_trips() {
        let (mut app, _input) = app_with_input();
        assert!(!app.wireframe());
        app.toggle_wireframe();
        assert!(app.step(timing(0.016, 0.0), 1.0).wireframe);
    }
}
