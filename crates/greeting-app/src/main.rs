//! Opens the greeting window.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI
//! flags, e.g. `greeting --hour 7.5 --assets ./assets`.

use clap::Parser;
use greeting_app::platform::PlatformDirs;
use greeting_config::{CliArgs, Config};

fn main() {
    let args = CliArgs::parse();

    let dirs = match args.config.clone() {
        Some(config_dir) => PlatformDirs::with_config_dir(config_dir),
        None => match PlatformDirs::resolve() {
            Ok(dirs) => dirs,
            Err(e) => {
                eprintln!("Failed to resolve platform directories: {e}");
                std::process::exit(1);
            }
        },
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to create platform directories: {e}");
    }

    let mut config = Config::load_or_create(&dirs.config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    greeting_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    tracing::info!(
        config = %dirs.config_dir.display(),
        assets = %config.assets.root.display(),
        "Starting greeting"
    );

    if let Err(e) = greeting_app::window::run(config) {
        tracing::error!("Event loop failed: {e}");
        std::process::exit(1);
    }
}
