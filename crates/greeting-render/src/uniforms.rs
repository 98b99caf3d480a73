//! GPU uniform blocks. Layouts match the structs of the same name in the
//! WGSL shaders; every field is a 16-byte multiple so no implicit padding
//! is needed.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use greeting_scene::{Material, MeshInstance, ShadingModel};
use greeting_sky::{DirectionalLight, HemisphereLight, SkyNode, SkyUniform};

use crate::camera::Camera;
use crate::renderer::RenderSettings;

/// Per-frame camera, lighting, fog and tone-mapping state. `@group(0)` in
/// every pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    /// xyz camera position, w camera far plane.
    pub camera_position: [f32; 4],
    /// xyz unit vector toward the sun, w intensity (0 without a light).
    pub sun_direction: [f32; 4],
    pub sun_color: [f32; 4],
    /// rgb sky color, w intensity (0 without a light).
    pub hemisphere_sky: [f32; 4],
    pub hemisphere_ground: [f32; 4],
    pub hemisphere_up: [f32; 4],
    pub fog_color: [f32; 4],
    /// fog near, fog far, exposure, tone mapping operator.
    pub params: [f32; 4],
    /// depth bias, texel size, enabled (0/1), unused.
    pub shadow: [f32; 4],
}

impl FrameUniform {
    pub fn new(
        camera: &Camera,
        directional: Option<&DirectionalLight>,
        hemisphere: Option<&HemisphereLight>,
        settings: &RenderSettings,
        shadow_texel_size: f32,
    ) -> Self {
        let view_proj = camera.view_projection_matrix();
        let mut uniform = Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            light_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_position: camera.position.extend(camera.far).to_array(),
            sun_direction: [0.0, 1.0, 0.0, 0.0],
            sun_color: [0.0; 4],
            hemisphere_sky: [0.0; 4],
            hemisphere_ground: [0.0; 4],
            hemisphere_up: [0.0, 1.0, 0.0, 0.0],
            fog_color: settings.fog.color.extend(0.0).to_array(),
            params: [
                settings.fog.near,
                settings.fog.far,
                settings.exposure,
                settings.tone_mapping.shader_index() as f32,
            ],
            shadow: [0.0; 4],
        };

        if let Some(light) = directional {
            uniform.sun_direction = (-light.direction()).extend(light.intensity).to_array();
            uniform.sun_color = light.color.extend(0.0).to_array();
            if settings.shadows
                && let (Some(shadow), Some(matrix)) = (light.shadow, light.shadow_view_proj())
            {
                uniform.light_view_proj = matrix.to_cols_array_2d();
                uniform.shadow = [shadow.bias, shadow_texel_size, 1.0, 0.0];
            }
        }
        if let Some(light) = hemisphere {
            uniform.hemisphere_sky = light.sky_color.extend(light.intensity).to_array();
            uniform.hemisphere_ground = light.ground_color.extend(0.0).to_array();
            uniform.hemisphere_up = light.up().extend(0.0).to_array();
        }
        uniform
    }

    pub fn shadows_enabled(&self) -> bool {
        self.shadow[2] > 0.5
    }
}

/// Per-mesh transform and material. `@group(1)`, bound with a dynamic offset.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`.
    pub normal_matrix: [[f32; 4]; 4],
    /// rgb base color, w shading model (0 standard, 1 phong).
    pub color: [f32; 4],
    /// roughness, metalness, shininess, receives shadows (0/1).
    pub material: [f32; 4],
}

impl DrawUniform {
    pub fn new(world: Mat4, material: &Material, receive_shadow: bool) -> Self {
        let (model_index, roughness, metalness, shininess) = match material.model {
            ShadingModel::Standard {
                roughness,
                metalness,
            } => (0.0, roughness, metalness, 0.0),
            ShadingModel::Phong { shininess } => (1.0, 1.0, 0.0, shininess),
        };
        Self {
            model: world.to_cols_array_2d(),
            normal_matrix: world.inverse().transpose().to_cols_array_2d(),
            color: material.color.extend(model_index).to_array(),
            material: [
                roughness.clamp(0.04, 1.0),
                metalness.clamp(0.0, 1.0),
                shininess.max(0.0),
                if receive_shadow { 1.0 } else { 0.0 },
            ],
        }
    }

    pub fn from_instance(instance: &MeshInstance<'_>) -> Self {
        Self::new(
            instance.world,
            &instance.mesh.material,
            instance.receive_shadow,
        )
    }
}

/// Sky pass constants: the atmosphere plus the dome it is painted on.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SkyPassUniform {
    pub sky: SkyUniform,
    /// Dome half extent, unused x3.
    pub dome: [f32; 4],
}

impl SkyPassUniform {
    /// The sky dome is a unit cube scaled by `sky.scale`.
    pub fn new(sky: &SkyNode) -> Self {
        Self {
            sky: sky.uniform(),
            dome: [sky.scale * 0.5, 0.0, 0.0, 0.0],
        }
    }

    pub fn half_extent(&self) -> f32 {
        self.dome[0]
    }
}

/// Round `size` up to a multiple of `alignment` (a power of two).
pub fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}
