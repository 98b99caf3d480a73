//! Preetham analytic sky model: scattering parameters, the derived GPU
//! uniform, and a CPU evaluation of the sky color used for validation.

use bytemuck::{Pod, Zeroable};
use glam::{DVec3, Vec3};

const E: f64 = 2.71828;
/// Peak solar illuminance.
const EE: f64 = 1000.0;
/// Sun zenith angle (radians) past which the sun stops lighting the sky.
const CUTOFF_ANGLE: f64 = 1.6110731556870734;
const STEEPNESS: f64 = 1.5;

/// Total Rayleigh scattering for wavelengths (680, 550, 450) nm.
const TOTAL_RAYLEIGH: DVec3 = DVec3::new(
    5.804542996261093e-6,
    1.3562911419845635e-5,
    3.0265902468824876e-5,
);
/// `pi * ((2pi / lambda)^(v - 2)) * K` for v = 4.
const MIE_CONST: DVec3 = DVec3::new(
    1.8399918514433978e14,
    2.7798023919660528e14,
    4.0790479543861094e14,
);

const RAYLEIGH_ZENITH_LENGTH: f64 = 8.4e3;
const MIE_ZENITH_LENGTH: f64 = 1.25e3;
const SUN_ANGULAR_DIAMETER_COS: f64 = 0.99995667694644844;
const THREE_OVER_SIXTEEN_PI: f64 = 0.05968310365946075;
const ONE_OVER_FOUR_PI: f64 = 0.07957747154594767;

/// Unit sun direction from spherical coordinates.
///
/// `polar_degrees` is measured from +Y and `azimuth_degrees` around +Y
/// starting at +Z: `(sin φ sin θ, cos φ, sin φ cos θ)`.
pub fn sun_direction(polar_degrees: f64, azimuth_degrees: f64) -> Vec3 {
    let phi = polar_degrees.to_radians();
    let theta = azimuth_degrees.to_radians();
    let dir = DVec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos());
    dir.as_vec3()
}

/// Tunable scattering coefficients of the sky.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatteringParams {
    /// Haze; higher values give a whiter, hazier sky.
    pub turbidity: f32,
    /// Rayleigh scattering strength.
    pub rayleigh: f32,
    /// Mie scattering coefficient.
    pub mie_coefficient: f32,
    /// Henyey-Greenstein anisotropy of Mie scattering.
    pub mie_directional_g: f32,
}

impl Default for ScatteringParams {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 3.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.7,
        }
    }
}

/// Scattering parameters bound to a sun position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtmosphereConfig {
    /// Scattering coefficients.
    pub scattering: ScatteringParams,
    /// Unit vector toward the sun.
    pub sun_position: Vec3,
}

impl AtmosphereConfig {
    /// Bind `scattering` to a sun direction.
    pub fn new(scattering: ScatteringParams, sun_position: Vec3) -> Self {
        Self {
            scattering,
            sun_position,
        }
    }

    /// Derive the per-sky constants the sky shader needs.
    pub fn uniform(&self) -> SkyUniform {
        SkyUniform::from_config(self)
    }
}

/// GPU-side sky constants, 48 bytes. Matches `SkyParams` in `sky.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SkyUniform {
    /// Normalized sun direction. (offset 0)
    pub sun_direction: [f32; 3],
    /// Sun illuminance at the current zenith angle. (offset 12)
    pub sun_e: f32,
    /// Total Rayleigh scattering coefficient (RGB). (offset 16)
    pub beta_r: [f32; 3],
    /// Fade factor as the sun sinks below the horizon. (offset 28)
    pub sunfade: f32,
    /// Total Mie scattering coefficient (RGB). (offset 32)
    pub beta_m: [f32; 3],
    /// Mie anisotropy g. (offset 44)
    pub mie_directional_g: f32,
}

impl SkyUniform {
    /// Derive the uniform from an atmosphere configuration.
    pub fn from_config(config: &AtmosphereConfig) -> Self {
        let params = &config.scattering;
        let sun = config.sun_position.as_dvec3().normalize_or_zero();

        let sun_e = sun_intensity(sun.dot(DVec3::Y));
        let sunfade = 1.0 - (1.0 - (config.sun_position.y as f64 / 450_000.0).exp()).clamp(0.0, 1.0);
        let rayleigh_coefficient = params.rayleigh as f64 - (1.0 - sunfade);
        let beta_r = TOTAL_RAYLEIGH * rayleigh_coefficient;
        let beta_m = total_mie(params.turbidity as f64) * params.mie_coefficient as f64;

        Self {
            sun_direction: sun.as_vec3().to_array(),
            sun_e: sun_e as f32,
            beta_r: beta_r.as_vec3().to_array(),
            sunfade: sunfade as f32,
            beta_m: beta_m.as_vec3().to_array(),
            mie_directional_g: params.mie_directional_g,
        }
    }

    /// Evaluate the sky color seen along `direction` (before tone mapping).
    ///
    /// Mirrors the fragment stage of `sky.wgsl`.
    pub fn radiance(&self, direction: Vec3) -> Vec3 {
        let direction = direction.as_dvec3().normalize_or_zero();
        let sun = Vec3::from(self.sun_direction).as_dvec3();
        let beta_r = Vec3::from(self.beta_r).as_dvec3();
        let beta_m = Vec3::from(self.beta_m).as_dvec3();
        let sun_e = self.sun_e as f64;
        let g = self.mie_directional_g as f64;

        let zenith_angle = direction.dot(DVec3::Y).max(0.0).acos();
        let inverse = 1.0
            / (zenith_angle.cos()
                + 0.15 * (93.885 - zenith_angle.to_degrees()).powf(-1.253));
        let s_r = RAYLEIGH_ZENITH_LENGTH * inverse;
        let s_m = MIE_ZENITH_LENGTH * inverse;
        let fex = exp3(-(beta_r * s_r + beta_m * s_m));

        let cos_theta = direction.dot(sun);
        let beta_r_theta = beta_r * rayleigh_phase(cos_theta * 0.5 + 0.5);
        let beta_m_theta = beta_m * hg_phase(cos_theta, g);
        let scatter = (beta_r_theta + beta_m_theta) / (beta_r + beta_m);

        let mut lin = pow3(sun_e * scatter * (DVec3::ONE - fex), 1.5);
        let horizon_mix = (1.0 - DVec3::Y.dot(sun)).powf(5.0).clamp(0.0, 1.0);
        lin *= DVec3::ONE.lerp(pow3(sun_e * scatter * fex, 0.5), horizon_mix);

        let mut l0 = 0.1 * fex;
        let sundisk = smoothstep(
            SUN_ANGULAR_DIAMETER_COS,
            SUN_ANGULAR_DIAMETER_COS + 0.00002,
            cos_theta,
        );
        l0 += sun_e * 19000.0 * fex * sundisk;

        let tex_color = (lin + l0) * 0.04 + DVec3::new(0.0, 0.0003, 0.00075);
        pow3(tex_color, 1.0 / (1.2 + 1.2 * self.sunfade as f64)).as_vec3()
    }
}

fn sun_intensity(zenith_angle_cos: f64) -> f64 {
    let zenith_angle_cos = zenith_angle_cos.clamp(-1.0, 1.0);
    EE * (1.0 - E.powf(-((CUTOFF_ANGLE - zenith_angle_cos.acos()) / STEEPNESS))).max(0.0)
}

fn total_mie(turbidity: f64) -> DVec3 {
    let c = (0.2 * turbidity) * 10e-18;
    0.434 * c * MIE_CONST
}

fn rayleigh_phase(cos_theta: f64) -> f64 {
    THREE_OVER_SIXTEEN_PI * (1.0 + cos_theta * cos_theta)
}

fn hg_phase(cos_theta: f64, g: f64) -> f64 {
    let g2 = g * g;
    ONE_OVER_FOUR_PI * ((1.0 - g2) / (1.0 - 2.0 * g * cos_theta + g2).powf(1.5))
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn exp3(v: DVec3) -> DVec3 {
    DVec3::new(v.x.exp(), v.y.exp(), v.z.exp())
}

fn pow3(v: DVec3, e: f64) -> DVec3 {
    DVec3::new(v.x.powf(e), v.y.powf(e), v.z.powf(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_at(polar_degrees: f64) -> AtmosphereConfig {
        AtmosphereConfig::new(ScatteringParams::default(), sun_direction(polar_degrees, 10.0))
    }

    #[test]
    fn test_sun_direction_is_unit_length() {
        for angle in [-720.0, -90.0, -22.5, 0.0, 12.3, 45.0, 90.0, 1e4] {
            let len = sun_direction(angle, 10.0).length();
            assert!((len - 1.0).abs() < 1e-6, "angle {angle}: length {len}");
        }
    }

    #[test]
    fn test_sun_direction_components() {
        let zenith = sun_direction(0.0, 10.0);
        assert!(zenith.abs_diff_eq(Vec3::Y, 1e-6));

        let d = sun_direction(45.0, 10.0);
        let s = 45.0_f64.to_radians().sin();
        let t = 10.0_f64.to_radians();
        assert!((d.x as f64 - s * t.sin()).abs() < 1e-6);
        assert!((d.y as f64 - 45.0_f64.to_radians().cos()).abs() < 1e-6);
        assert!((d.z as f64 - s * t.cos()).abs() < 1e-6);
    }

    #[test]
    fn test_uniform_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<SkyUniform>(), 48);
        assert_eq!(std::mem::offset_of!(SkyUniform, beta_r), 16);
        assert_eq!(std::mem::offset_of!(SkyUniform, beta_m), 32);
    }

    #[test]
    fn test_sun_intensity_peaks_at_zenith() {
        let high = config_at(0.0).uniform().sun_e;
        let low = config_at(80.0).uniform().sun_e;
        assert!(high > low, "zenith {high} should exceed low sun {low}");
        assert!(high <= EE as f32);
    }

    #[test]
    fn test_sun_intensity_zero_far_below_horizon() {
        let uniform = config_at(120.0).uniform();
        assert_eq!(uniform.sun_e, 0.0);
    }

    #[test]
    fn test_beta_r_scales_with_rayleigh() {
        let mut params = ScatteringParams::default();
        let sun = sun_direction(30.0, 10.0);
        let base = AtmosphereConfig::new(params, sun).uniform();
        params.rayleigh = 6.0;
        let doubled = AtmosphereConfig::new(params, sun).uniform();
        assert!(doubled.beta_r[2] > base.beta_r[2] * 1.9);
        assert_eq!(doubled.beta_m, base.beta_m);
    }

    #[test]
    fn test_blue_scatters_most() {
        let uniform = config_at(30.0).uniform();
        assert!(uniform.beta_r[2] > uniform.beta_r[1]);
        assert!(uniform.beta_r[1] > uniform.beta_r[0]);
    }

    #[test]
    fn test_radiance_is_finite_and_positive() {
        let uniform = config_at(45.0).uniform();
        for dir in [Vec3::Y, Vec3::X, Vec3::new(0.3, 0.2, -0.9), -Vec3::Y] {
            let c = uniform.radiance(dir);
            assert!(c.is_finite(), "non-finite radiance for {dir:?}");
            assert!(c.min_element() >= 0.0);
        }
    }

    #[test]
    fn test_sun_disc_is_brightest() {
        let config = config_at(40.0);
        let uniform = config.uniform();
        let at_sun = uniform.radiance(config.sun_position);
        let away = uniform.radiance(Vec3::new(-config.sun_position.x, 0.5, -config.sun_position.z));
        assert!(at_sun.length() > away.length());
    }

    #[test]
    fn test_uniform_is_deterministic() {
        assert_eq!(config_at(33.0).uniform(), config_at(33.0).uniform());
    }
}
