//! Assembling the greeting scene from configuration.
//!
//! The static part of the scene (floor, sky and lights) is built
//! synchronously before the first frame. The text and the model are handed
//! to the [`AssetPipeline`] and join the graph whenever they finish.

use glam::Vec3;
use greeting_assets::{
    AssetCompletion, AssetIntegrator, AssetPipeline, Integration, ModelJob, ModelSettings,
    TextJob, TextSettings,
};
use greeting_config::{
    AssetsConfig, CameraConfig, Config, ModelConfig, RenderConfig, SkyConfig, TextConfig,
};
use greeting_render::{Camera, FogSettings, OrbitControls, RenderSettings, ToneMapping};
use greeting_scene::{SceneGraph, SpinningAssetState, floor_node, hex_to_linear};
use greeting_sky::{ScatteringParams, ShadowSettings, SkyEnvironment, SkySettings, SolarClock};

/// Side length of the square ground plane.
pub const FLOOR_SIZE: f32 = 1000.0;

/// Ground plane color as 0xRRGGBB.
pub const FLOOR_COLOR: u32 = 0xffffff;

/// The scene graph together with the bookkeeping for loaded assets.
#[derive(Debug)]
pub struct GreetingScene {
    pub graph: SceneGraph,
    pub spinning: SpinningAssetState,
    pub integrator: AssetIntegrator,
}

impl GreetingScene {
    /// Floor, sky dome, directional light and hemisphere light.
    pub fn new(env: &SkyEnvironment) -> Self {
        let mut graph = SceneGraph::new();
        graph.add_node(floor_node(FLOOR_SIZE, FLOOR_COLOR));
        graph.install_environment(env);
        Self {
            graph,
            spinning: SpinningAssetState::new(),
            integrator: AssetIntegrator::new(),
        }
    }

    /// Add a finished load to the graph, or record its failure.
    pub fn integrate(&mut self, completion: AssetCompletion) -> Integration {
        self.integrator
            .apply(completion, &mut self.graph, &mut self.spinning)
    }
}

/// Sample the clock (or the configured hour) and build the environment.
pub fn build_environment(config: &SkyConfig) -> SkyEnvironment {
    let angle = SolarClock::with_override(config.override_hour).current_sun_angle();
    let env = SkyEnvironment::build_with(&sky_settings(config), angle);
    tracing::info!(
        sun_angle_degrees = angle,
        sun_direction = ?env.sun_direction,
        "Sky environment built"
    );
    env
}

pub fn sky_settings(config: &SkyConfig) -> SkySettings {
    SkySettings {
        azimuth_degrees: config.sun_azimuth_degrees,
        scattering: ScatteringParams {
            turbidity: config.turbidity,
            rayleigh: config.rayleigh,
            mie_coefficient: config.mie_coefficient,
            mie_directional_g: config.mie_directional_g,
        },
        dome_scale: config.dome_scale,
        light_distance: config.light_distance,
        shadow: Some(ShadowSettings {
            map_size: config.shadow_map_size,
            bias: config.shadow_bias,
            extent: config.shadow_extent,
            ..ShadowSettings::default()
        }),
        hemisphere_sky_color: config.hemisphere_sky_color,
        hemisphere_ground_color: config.hemisphere_ground_color,
        ..SkySettings::default()
    }
}

pub fn text_settings(config: &TextConfig) -> TextSettings {
    TextSettings {
        content: config.content.clone(),
        size: config.size,
        depth: config.depth,
        curve_segments: config.curve_segments,
        color: hex_to_linear(config.color),
        position: Vec3::from_array(config.position),
        rotation_y: config.rotation_y_degrees.to_radians(),
    }
}

pub fn model_settings(config: &ModelConfig) -> ModelSettings {
    ModelSettings {
        position: Vec3::from_array(config.position),
    }
}

pub fn render_settings(config: &RenderConfig) -> RenderSettings {
    let tone_mapping = match config.tone_mapping {
        greeting_config::ToneMapping::None => ToneMapping::None,
        greeting_config::ToneMapping::Reinhard => ToneMapping::Reinhard,
        greeting_config::ToneMapping::AcesFilmic => ToneMapping::AcesFilmic,
    };
    RenderSettings {
        tone_mapping,
        exposure: config.exposure,
        shadows: config.shadows,
        fog: FogSettings {
            color: hex_to_linear(config.fog.color),
            near: config.fog.near,
            far: config.fog.far,
        },
    }
}

pub fn camera(config: &CameraConfig) -> Camera {
    Camera::new(
        Vec3::from_array(config.position),
        Vec3::from_array(config.target),
        config.fov_y_degrees,
        config.near,
        config.far,
    )
}

pub fn orbit_controls(config: &CameraConfig) -> OrbitControls {
    let mut controls = OrbitControls::new(Vec3::from_array(config.target));
    if config.auto_rotate {
        controls = controls.with_auto_rotate(config.auto_rotate_speed);
    }
    if config.enable_damping {
        controls = controls.with_damping(config.damping_factor);
    }
    controls
}

/// Start the asset pipeline and queue the text and model loads.
///
/// Returns `None` if the worker threads cannot be spawned; the scene then
/// renders without its decorative assets.
pub fn start_asset_loads(config: &AssetsConfig) -> Option<AssetPipeline> {
    let pipeline = match AssetPipeline::new(
        config.worker_threads,
        greeting_assets::AssetCache::new(config.cache_enabled),
    ) {
        Ok(pipeline) => pipeline,
        Err(error) => {
            tracing::error!(%error, "Could not start asset loader threads");
            return None;
        }
    };

    let text = TextJob::new(config.font_path(), text_settings(&config.text));
    if let Err(error) = pipeline.request(text) {
        tracing::error!(%error, "Text load was not queued");
    }
    let model = ModelJob::new(config.model_path(), model_settings(&config.model_settings));
    if let Err(error) = pipeline.request(model) {
        tracing::error!(%error, "Model load was not queued");
    }
    Some(pipeline)
}

/// The scene, camera and controls described by `config`.
pub fn build_scene(config: &Config) -> (GreetingScene, Camera, OrbitControls) {
    let env = build_environment(&config.sky);
    (
        GreetingScene::new(&env),
        camera(&config.camera),
        orbit_controls(&config.camera),
    )
}
