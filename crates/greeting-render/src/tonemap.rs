//! Tone mapping operators. [`ToneMapping::apply`] is the CPU twin of
//! `tone_map` in `common.wgsl`.

use glam::{Mat3, Vec3};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToneMapping {
    /// Linear output; exposure is not applied.
    None,
    Reinhard,
    #[default]
    AcesFilmic,
}

impl ToneMapping {
    /// Operator index passed to the shaders.
    pub fn shader_index(self) -> u32 {
        match self {
            ToneMapping::None => 0,
            ToneMapping::Reinhard => 1,
            ToneMapping::AcesFilmic => 2,
        }
    }

    /// Map linear HDR `color` into `[0, 1]`.
    pub fn apply(self, color: Vec3, exposure: f32) -> Vec3 {
        match self {
            ToneMapping::None => color,
            ToneMapping::Reinhard => {
                let c = color * exposure;
                (c / (Vec3::ONE + c)).clamp(Vec3::ZERO, Vec3::ONE)
            }
            ToneMapping::AcesFilmic => aces_filmic(color, exposure),
        }
    }
}

/// Stephen Hill's fitted ACES curve, with exposure normalised by 0.6.
fn aces_filmic(color: Vec3, exposure: f32) -> Vec3 {
    let input = Mat3::from_cols(
        Vec3::new(0.59719, 0.07600, 0.02840),
        Vec3::new(0.35458, 0.90834, 0.13383),
        Vec3::new(0.04823, 0.01566, 0.83777),
    );
    let output = Mat3::from_cols(
        Vec3::new(1.60475, -0.10208, -0.00327),
        Vec3::new(-0.53108, 1.10813, -0.07276),
        Vec3::new(-0.07367, -0.00605, 1.07602),
    );
    let v = input * (color * (exposure / 0.6));
    let a = v * (v + Vec3::splat(0.0245786)) - Vec3::splat(0.000090537);
    let b = v * (v * 0.983729 + Vec3::splat(0.4329510)) + Vec3::splat(0.238081);
    (output * (a / b)).clamp(Vec3::ZERO, Vec3::ONE)
}
