//! Viewer configuration, read once at startup from `assets/viewer.ron`.

#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

use bevy::prelude::*;
#[cfg(not(target_arch = "wasm32"))]
use viewer_shared::error::ConfigError;
use viewer_shared::ViewerConfig;

#[cfg(not(target_arch = "wasm32"))]
const CONFIG_PATH: &str = "assets/viewer.ron";
#[cfg(any(target_arch = "wasm32", test))]
const SHIPPED_CONFIG: &str = include_str!("../assets/viewer.ron");

/// The configuration every plugin builds from.
#[derive(Resource, Clone, Debug, Deref)]
pub struct Settings(pub ViewerConfig);

pub(super) fn plugin(app: &mut App) {
    app.insert_resource(Settings(load_config()));
}

/// Resolved the same way Bevy's file asset reader resolves its root.
#[cfg(not(target_arch = "wasm32"))]
fn config_path() -> PathBuf {
    std::env::var_os("BEVY_ASSET_ROOT")
        .or_else(|| std::env::var_os("CARGO_MANIFEST_DIR"))
        .map(PathBuf::from)
        .or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(PathBuf::from))
        })
        .unwrap_or_default()
        .join(CONFIG_PATH)
}

#[cfg(not(target_arch = "wasm32"))]
fn load_config() -> ViewerConfig {
    let path = config_path();
    match ViewerConfig::load(&path) {
        Ok(config) => {
            info!("loaded viewer config from {}", path.display());
            config
        }
        Err(ConfigError::Io { .. }) => {
            warn!("no viewer config at {}; using defaults", path.display());
            ViewerConfig::default()
        }
        Err(err) => {
            error!("{err}; using defaults");
            ViewerConfig::default()
        }
    }
}

/// The browser has no file system; the shipped config is compiled in.
#[cfg(target_arch = "wasm32")]
fn load_config() -> ViewerConfig {
    match ViewerConfig::from_ron_str(SHIPPED_CONFIG) {
        Ok(config) => {
            info!("using the shipped viewer config");
            config
        }
        Err(err) => {
            error!("{err}; using defaults");
            ViewerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped = ViewerConfig::from_ron_str(SHIPPED_CONFIG).unwrap();
        let defaults = ViewerConfig::default();
        assert!((shipped.fixed_delta - defaults.fixed_delta).abs() < 1e-6);
        assert_eq!(
            ViewerConfig {
                fixed_delta: defaults.fixed_delta,
                ..shipped
            },
            defaults
        );
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn config_path_ends_in_the_asset_folder() {
        assert!(config_path().ends_with(CONFIG_PATH));
    }
}
