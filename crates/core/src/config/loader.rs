use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "MEDIAWATCH_CONFIG";

/// Flat variable names understood by existing container deployments.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("INPUT_DIR", "watch.input_dir"),
    ("OUTPUT_MOVIES", "output.movies_dir"),
    ("OUTPUT_TV", "output.tv_dir"),
    ("OUTPUT_MUSIC", "output.music_dir"),
    ("ENABLE_GDRIVE_SYNC", "sync_helper.enabled"),
    ("GDRIVE_SYNC_COMMAND", "sync_helper.command"),
];

/// Load configuration from defaults, an optional file, and the environment.
///
/// Precedence, lowest first: built-in defaults, the TOML file (if given),
/// legacy flat variables (`INPUT_DIR`, `OUTPUT_MOVIES`, ...), and finally
/// `MEDIAWATCH_<SECTION>__<KEY>` variables.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment
        .merge(legacy_env())
        .merge(Env::prefixed("MEDIAWATCH_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV_KEYS.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        LEGACY_ENV_KEYS
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, dotted)| (*dotted).into())
            .unwrap_or_else(|| key.as_str().to_string().into())
    })
}
