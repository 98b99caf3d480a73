//! Time-of-day sky: solar clock, Preetham atmosphere parameters, and the
//! sun-aligned directional and hemisphere lights.

mod atmosphere;
mod color;
mod environment;
mod light;
mod solar;

pub use atmosphere::{AtmosphereConfig, ScatteringParams, SkyUniform, sun_direction};
pub use color::hex_to_linear;
pub use environment::{SkyEnvironment, SkyNode, SkySettings};
pub use light::{DirectionalLight, HemisphereLight, ShadowSettings};
pub use solar::{Clock, FixedClock, SolarClock, SystemClock, WallClockTime, sun_angle};
