use anyhow::Context;
use kronos::Config;
use std::fs;
use std::path::Path;

/// Locations tried when no explicit path is given, relative to the working
/// directory and to a crate directory inside the workspace.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/kronos.toml", "../../configs/kronos.toml"];

/// Read the first `configs/kronos.toml` found on the fallback path list.
pub fn read_config_toml_text() -> anyhow::Result<String> {
    for p in &DEFAULT_CONFIG_PATHS {
        if let Ok(c) = fs::read_to_string(p) {
            log::debug!("Loaded kronos config from {}", p);
            return Ok(c);
        }
    }
    anyhow::bail!("Could not load kronos.toml from {:?}", DEFAULT_CONFIG_PATHS);
}

/// Parse override text on top of the built-in tables.
pub fn parse_config(text: &str) -> anyhow::Result<Config> {
    Config::from_toml_str(text).context("Failed to apply kronos.toml overrides")
}

/// Load the runtime configuration.
///
/// An explicit `path` must exist and parse. Without one, the fallback paths
/// are tried and the built-in tables are used when none of them exist.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let text = match path {
        Some(p) => Some(
            fs::read_to_string(p)
                .with_context(|| format!("Failed to read config file {}", p.display()))?,
        ),
        None => match read_config_toml_text() {
            Ok(text) => Some(text),
            Err(e) => {
                log::info!("{e}; using built-in tables");
                None
            }
        },
    };

    match text {
        Some(text) => parse_config(&text),
        None => Ok(Config::builtin()),
    }
}
