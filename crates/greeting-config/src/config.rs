//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level scene configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering settings.
    pub render: RenderConfig,
    /// Camera and orbit control settings.
    pub camera: CameraConfig,
    /// Sky, sun and light settings.
    pub sky: SkyConfig,
    /// Asset locations and placement.
    pub assets: AssetsConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Tone mapping operator applied before sRGB output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToneMapping {
    /// Linear output, clamped.
    None,
    /// Reinhard `c / (1 + c)`.
    Reinhard,
    /// ACES filmic approximation.
    AcesFilmic,
}

/// Linear distance fog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FogConfig {
    /// Fog color as 0xRRGGBB (sRGB).
    pub color: u32,
    /// Distance at which fog starts.
    pub near: f32,
    /// Distance at which fog is fully opaque.
    pub far: f32,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Tone mapping operator.
    pub tone_mapping: ToneMapping,
    /// Exposure multiplier applied before tone mapping.
    pub exposure: f32,
    /// Render the directional light's shadow map.
    pub shadows: bool,
    /// Scene fog.
    pub fog: FogConfig,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    /// Initial camera position.
    pub position: [f32; 3],
    /// Orbit target.
    pub target: [f32; 3],
    /// Rotate around the target without user input.
    pub auto_rotate: bool,
    /// Auto-rotation speed (1.0 = one turn per 60 seconds at 60 fps).
    pub auto_rotate_speed: f32,
    /// Smooth out pointer-driven motion.
    pub enable_damping: bool,
    /// Fraction of the remaining motion dropped each update when damping.
    pub damping_factor: f32,
}

/// Sky, atmosphere and sun-light configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkyConfig {
    /// Use this hour of day (0.0–24.0) instead of the system clock.
    pub override_hour: Option<f64>,
    /// Sun azimuth in degrees.
    pub sun_azimuth_degrees: f64,
    /// Atmospheric turbidity (haze).
    pub turbidity: f32,
    /// Rayleigh scattering strength.
    pub rayleigh: f32,
    /// Mie scattering coefficient.
    pub mie_coefficient: f32,
    /// Mie directional anisotropy (Henyey-Greenstein g).
    pub mie_directional_g: f32,
    /// Uniform scale of the sky dome.
    pub dome_scale: f32,
    /// Distance from the origin at which the lights are placed.
    pub light_distance: f32,
    /// Half-extent of the square shadow frustum.
    pub shadow_extent: f32,
    /// Shadow map resolution (width = height).
    pub shadow_map_size: u32,
    /// Constant depth bias against shadow acne.
    pub shadow_bias: f32,
    /// Hemisphere light sky color as 0xRRGGBB.
    pub hemisphere_sky_color: u32,
    /// Hemisphere light ground color as 0xRRGGBB.
    pub hemisphere_ground_color: u32,
}

/// Text asset configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    /// Greeting text.
    pub content: String,
    /// Glyph height in world units.
    pub size: f32,
    /// Extrusion depth.
    pub depth: f32,
    /// Points generated per curve segment.
    pub curve_segments: u32,
    /// Text color as 0xRRGGBB.
    pub color: u32,
    /// World position.
    pub position: [f32; 3],
    /// Rotation around Y in degrees.
    pub rotation_y_degrees: f32,
}

/// Model asset configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// World position of the model root.
    pub position: [f32; 3],
    /// Rotation added around Y every frame, in radians.
    pub spin_per_frame: f32,
}

/// Asset configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory that asset paths are resolved against.
    pub root: PathBuf,
    /// Typeface JSON font, relative to `root`.
    pub font: PathBuf,
    /// glTF model, relative to `root`.
    pub model: PathBuf,
    /// Keep loaded file contents in memory.
    pub cache_enabled: bool,
    /// Loader worker threads (0 = pick from CPU count).
    pub worker_threads: usize,
    /// Text settings.
    pub text: TextConfig,
    /// Model settings.
    pub model_settings: ModelConfig,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log every N frames (0 disables frame statistics).
    pub frame_log_interval: u64,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Greeting".to_string(),
        }
    }
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: 0xffffff,
            near: 0.0,
            far: 1000.0,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tone_mapping: ToneMapping::AcesFilmic,
            exposure: 0.5,
            shadows: true,
            fog: FogConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 2.0, 6.0],
            target: [0.0, 0.0, 0.0],
            auto_rotate: true,
            auto_rotate_speed: 0.3,
            enable_damping: false,
            damping_factor: 0.05,
        }
    }
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            override_hour: None,
            sun_azimuth_degrees: 10.0,
            turbidity: 10.0,
            rayleigh: 3.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.7,
            dome_scale: 1000.0,
            light_distance: 10.0,
            shadow_extent: 10.0,
            shadow_map_size: 4096,
            shadow_bias: 0.001,
            hemisphere_sky_color: 0x9575cd,
            hemisphere_ground_color: 0x263238,
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: "Папа, с Днем рождения!".to_string(),
            size: 1.0,
            depth: 0.1,
            curve_segments: 12,
            color: 0x2196f3,
            position: [-5.0, 1.0, 0.0],
            rotation_y_degrees: -18.0,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            position: [-2.0, 4.47, -2.0],
            spin_per_frame: 0.005,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            font: PathBuf::from("fonts").join("Pacifico.json"),
            model: PathBuf::from("cake").join("scene.gltf"),
            cache_enabled: true,
            worker_threads: 2,
            text: TextConfig::default(),
            model_settings: ModelConfig::default(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            frame_log_interval: 600,
        }
    }
}

impl AssetsConfig {
    /// Full path of the font file.
    pub fn font_path(&self) -> PathBuf {
        self.root.join(&self.font)
    }

    /// Full path of the model file.
    pub fn model_path(&self) -> PathBuf {
        self.root.join(&self.model)
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
