//! Sun-aligned lights.
//!
//! [`DirectionalLight`] carries the shadow-casting sun; [`HemisphereLight`]
//! provides the sky/ground ambient term. Both are positioned along the sun
//! direction.

use glam::{Mat4, Vec3};

/// Orthographic shadow frustum and map parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSettings {
    /// Shadow map resolution (width = height).
    pub map_size: u32,
    /// Depth bias subtracted from the receiver depth before comparison.
    pub bias: f32,
    /// Half-extent of the frustum on X and Y, in light space.
    pub extent: f32,
    /// Near plane of the shadow camera.
    pub near: f32,
    /// Far plane of the shadow camera.
    pub far: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 4096,
            bias: 0.001,
            extent: 10.0,
            near: 0.5,
            far: 500.0,
        }
    }
}

/// A directional light positioned in world space and aimed at a target.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    /// Linear RGB color.
    pub color: Vec3,
    /// Scalar intensity.
    pub intensity: f32,
    /// World position; only its direction relative to `target` matters for
    /// shading, but the shadow camera is placed here.
    pub position: Vec3,
    /// Point the light is aimed at.
    pub target: Vec3,
    /// Shadow parameters, or `None` when the light casts no shadows.
    pub shadow: Option<ShadowSettings>,
}

impl DirectionalLight {
    /// Unit vector pointing from the light toward its target.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or(-Vec3::Y)
    }

    /// Whether this light renders a shadow map.
    pub fn casts_shadow(&self) -> bool {
        self.shadow.is_some()
    }

    /// View-projection matrix of the orthographic shadow camera, with depth
    /// in `[0, 1]`. `None` when the light casts no shadows.
    pub fn shadow_view_proj(&self) -> Option<Mat4> {
        let shadow = self.shadow?;
        let forward = self.direction();
        // Pick an up vector that is not parallel to the view direction.
        let up = if forward.dot(Vec3::Y).abs() > 0.999 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(self.position, self.target, up);
        let proj = Mat4::orthographic_rh(
            -shadow.extent,
            shadow.extent,
            -shadow.extent,
            shadow.extent,
            shadow.near,
            shadow.far,
        );
        Some(proj * view)
    }
}

/// Ambient light blended between a sky color (above) and a ground color
/// (below) by the surface normal.
#[derive(Clone, Debug, PartialEq)]
pub struct HemisphereLight {
    /// Linear RGB color received by upward-facing surfaces.
    pub sky_color: Vec3,
    /// Linear RGB color received by downward-facing surfaces.
    pub ground_color: Vec3,
    /// Scalar intensity.
    pub intensity: f32,
    /// World position; its direction from the origin is the "up" axis.
    pub position: Vec3,
}

impl HemisphereLight {
    /// Unit axis pointing toward the sky side.
    pub fn up(&self) -> Vec3 {
        self.position.normalize_or(Vec3::Y)
    }

    /// Irradiance for a surface with unit normal `normal`.
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        let weight = 0.5 * normal.dot(self.up()) + 0.5;
        self.ground_color.lerp(self.sky_color, weight) * self.intensity
    }
}
