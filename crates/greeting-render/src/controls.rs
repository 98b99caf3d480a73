//! Orbit camera controls.
//!
//! [`OrbitControls`] keeps the camera on a sphere around [`OrbitControls::target`].
//! Left drag rotates, right or middle drag pans, the wheel dollies. With
//! auto-rotation on, the camera circles the target by a fixed angle per
//! update, so the orbit period follows the frame rate (one turn per 3600
//! updates at speed 1).

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use winit::event::MouseButton;

use crate::camera::Camera;

/// Keeps phi away from the poles so `look_at` stays well defined.
const POLAR_EPSILON: f32 = 1e-6;

/// Adjusts a camera once per frame.
pub trait CameraController {
    /// Move `camera`. Returns whether its position changed.
    fn update(&mut self, camera: &mut Camera) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragMode {
    Rotate,
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    mode: DragMode,
    last: Vec2,
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Point the camera orbits and looks at.
    pub target: Vec3,
    pub auto_rotate: bool,
    /// 1.0 is one turn per 3600 updates.
    pub auto_rotate_speed: f32,
    /// Keep moving after input stops, decaying by `damping_factor` per update.
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Smallest angle from +Y the camera may reach.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    /// Unresolved pan drag, in pixels.
    pan_pixels: Vec2,
    pan_offset: Vec3,
    drag: Option<Drag>,
    viewport_height: f32,
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_pixels: Vec2::ZERO,
            pan_offset: Vec3::ZERO,
            drag: None,
            viewport_height: 1.0,
        }
    }

    pub fn with_auto_rotate(mut self, speed: f32) -> Self {
        self.auto_rotate = true;
        self.auto_rotate_speed = speed;
        self
    }

    pub fn with_damping(mut self, factor: f32) -> Self {
        self.enable_damping = true;
        self.damping_factor = factor;
        self
    }

    /// Viewport height in pixels; drags are measured against it.
    pub fn set_viewport_height(&mut self, height: f32) {
        if height > 0.0 {
            self.viewport_height = height;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn pointer_down(&mut self, button: MouseButton, x: f32, y: f32) {
        let mode = match button {
            MouseButton::Left => DragMode::Rotate,
            MouseButton::Right | MouseButton::Middle => DragMode::Pan,
            _ => return,
        };
        self.drag = Some(Drag {
            mode,
            last: Vec2::new(x, y),
        });
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Pointer moved to `(x, y)` in pixels. Ignored unless a button is held.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let position = Vec2::new(x, y);
        let delta = position - drag.last;
        drag.last = position;
        match drag.mode {
            DragMode::Rotate => {
                self.rotate_left(TAU * delta.x / self.viewport_height * self.rotate_speed);
                self.rotate_up(TAU * delta.y / self.viewport_height * self.rotate_speed);
            }
            DragMode::Pan => self.pan_pixels += delta,
        }
    }

    /// Wheel input in lines; positive moves toward the target.
    pub fn scroll(&mut self, lines: f32) {
        self.scale *= 0.95f32.powf(self.zoom_speed * lines);
    }

    fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    fn auto_rotation_angle(&self) -> f32 {
        TAU / 60.0 / 60.0 * self.auto_rotate_speed
    }

    /// Turn pending pan pixels into a world-space offset at the target's depth.
    fn resolve_pan(&mut self, camera: &Camera) {
        if self.pan_pixels == Vec2::ZERO {
            return;
        }
        let forward = camera.forward();
        let right = forward.cross(camera.up).normalize_or(Vec3::X);
        let up = right.cross(forward);
        let target_distance = (camera.position - self.target).length() * (camera.fov_y / 2.0).tan();
        let scale = 2.0 * target_distance / self.viewport_height;
        self.pan_offset += right * (-self.pan_pixels.x * scale) + up * (self.pan_pixels.y * scale);
        self.pan_pixels = Vec2::ZERO;
    }
}

impl CameraController for OrbitControls {
    fn update(&mut self, camera: &mut Camera) -> bool {
        if self.auto_rotate && self.drag.is_none() {
            self.rotate_left(self.auto_rotation_angle());
        }
        self.resolve_pan(camera);

        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * factor;
        phi += self.delta_phi * factor;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * factor;

        let sin_phi = phi.sin();
        let offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        let previous = camera.position;
        camera.position = self.target + offset;
        camera.look_at(self.target);

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        previous.distance_squared(camera.position) > 1e-12
    }
}
