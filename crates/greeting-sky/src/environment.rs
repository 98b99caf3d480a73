//! Sun angle to sky dome and lights.

use glam::Vec3;

use crate::atmosphere::{AtmosphereConfig, ScatteringParams, SkyUniform, sun_direction};
use crate::color::hex_to_linear;
use crate::light::{DirectionalLight, HemisphereLight, ShadowSettings};

/// Tunables for [`SkyEnvironment::build_with`].
#[derive(Clone, Debug, PartialEq)]
pub struct SkySettings {
    /// Sun azimuth in degrees.
    pub azimuth_degrees: f64,
    /// Atmosphere scattering coefficients.
    pub scattering: ScatteringParams,
    /// Uniform scale of the sky dome.
    pub dome_scale: f32,
    /// Distance from the origin at which both lights are placed.
    pub light_distance: f32,
    /// Directional light color as 0xRRGGBB.
    pub sun_color: u32,
    /// Directional light intensity.
    pub sun_intensity: f32,
    /// Shadow parameters; `None` disables shadow casting.
    pub shadow: Option<ShadowSettings>,
    /// Hemisphere light sky color as 0xRRGGBB.
    pub hemisphere_sky_color: u32,
    /// Hemisphere light ground color as 0xRRGGBB.
    pub hemisphere_ground_color: u32,
    /// Hemisphere light intensity.
    pub hemisphere_intensity: f32,
}

impl Default for SkySettings {
    fn default() -> Self {
        Self {
            azimuth_degrees: 10.0,
            scattering: ScatteringParams::default(),
            dome_scale: 1000.0,
            light_distance: 10.0,
            sun_color: 0xffffff,
            sun_intensity: 1.0,
            shadow: Some(ShadowSettings::default()),
            hemisphere_sky_color: 0x9575cd,
            hemisphere_ground_color: 0x263238,
            hemisphere_intensity: 1.0,
        }
    }
}

/// Sky dome payload: a scaled box/sphere shaded by the atmosphere model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyNode {
    /// Uniform scale of the dome.
    pub scale: f32,
    /// Atmosphere bound to the current sun position.
    pub atmosphere: AtmosphereConfig,
}

impl SkyNode {
    /// GPU constants for this sky.
    pub fn uniform(&self) -> SkyUniform {
        self.atmosphere.uniform()
    }
}

/// Everything derived from one sun angle.
#[derive(Clone, Debug, PartialEq)]
pub struct SkyEnvironment {
    /// Unit vector toward the sun.
    pub sun_direction: Vec3,
    /// Sky dome.
    pub sky: SkyNode,
    /// Shadow-casting sun light.
    pub directional: DirectionalLight,
    /// Ambient sky/ground light.
    pub hemisphere: HemisphereLight,
}

impl SkyEnvironment {
    /// Build with default settings.
    pub fn build(sun_angle_degrees: f64) -> Self {
        Self::build_with(&SkySettings::default(), sun_angle_degrees)
    }

    /// Build the sky and lights for `sun_angle_degrees`, used as the polar
    /// angle of the sun.
    pub fn build_with(settings: &SkySettings, sun_angle_degrees: f64) -> Self {
        let sun = sun_direction(sun_angle_degrees, settings.azimuth_degrees);
        let placement = sun * settings.light_distance;

        let sky = SkyNode {
            scale: settings.dome_scale,
            atmosphere: AtmosphereConfig::new(settings.scattering, sun),
        };

        let directional = DirectionalLight {
            color: hex_to_linear(settings.sun_color),
            intensity: settings.sun_intensity,
            position: placement,
            target: Vec3::ZERO,
            shadow: settings.shadow,
        };

        let hemisphere = HemisphereLight {
            sky_color: hex_to_linear(settings.hemisphere_sky_color),
            ground_color: hex_to_linear(settings.hemisphere_ground_color),
            intensity: settings.hemisphere_intensity,
            position: placement,
        };

        tracing::info!(
            angle_degrees = sun_angle_degrees,
            sun_x = sun.x,
            sun_y = sun.y,
            sun_z = sun.z,
            "Built sky environment"
        );

        Self {
            sun_direction: sun,
            sky,
            directional,
            hemisphere,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_is_idempotent() {
        assert_eq!(SkyEnvironment::build(37.5), SkyEnvironment::build(37.5));
        assert_ne!(SkyEnvironment::build(37.5), SkyEnvironment::build(38.0));
    }

    #[test]
    fn test_lights_sit_along_sun_direction() {
        let env = SkyEnvironment::build(45.0);
        let expected = env.sun_direction * 10.0;
        assert!(env.directional.position.abs_diff_eq(expected, 1e-5));
        assert_eq!(env.hemisphere.position, env.directional.position);
        assert!((env.directional.position.length() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_default_light_parameters() {
        let env = SkyEnvironment::build(0.0);
        let shadow = env.directional.shadow.unwrap();
        assert_eq!(shadow.map_size, 4096);
        assert_eq!(shadow.bias, 0.001);
        assert_eq!(shadow.extent, 10.0);
        assert_eq!(env.directional.intensity, 1.0);
        assert_eq!(env.directional.target, Vec3::ZERO);
        assert!(env.directional.color.abs_diff_eq(Vec3::ONE, 1e-6));
        assert!(env.hemisphere.sky_color.x > env.hemisphere.ground_color.x);
    }

    #[test]
    fn test_sky_dome_carries_atmosphere() {
        let env = SkyEnvironment::build(60.0);
        assert_eq!(env.sky.scale, 1000.0);
        assert_eq!(env.sky.atmosphere.sun_position, env.sun_direction);
        assert_eq!(env.sky.atmosphere.scattering, ScatteringParams::default());
    }

    #[test]
    fn test_negative_angle_is_not_clamped() {
        let env = SkyEnvironment::build(-22.5);
        assert!(env.sun_direction.x < 0.0);
        assert!(env.sun_direction.y > 0.9);
    }

    #[test]
    fn test_settings_disable_shadows() {
        let settings = SkySettings {
            shadow: None,
            ..SkySettings::default()
        };
        let env = SkyEnvironment::build_with(&settings, 30.0);
        assert!(!env.directional.casts_shadow());
    }
}
