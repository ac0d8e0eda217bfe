use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::encoder::EncoderConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub sync_helper: SyncHelperConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ingest side: where files arrive and how they are admitted.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Root directory, scanned at startup and watched recursively.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default)]
    pub quiescence: QuiescenceConfig,
    /// Jobs allowed to run at the same time (1 = strictly one file at a time).
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            quiescence: QuiescenceConfig::default(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("/input")
}

fn default_max_concurrent_jobs() -> usize {
    1
}

/// How the quiescence guard decides a file is finished writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuiescencePolicy {
    /// Sleep for `delay_ms` and assume the write is done.
    #[default]
    Fixed,
    /// Sleep for `delay_ms`, then poll size and mtime until they stop changing.
    StableSize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuiescenceConfig {
    #[serde(default)]
    pub policy: QuiescencePolicy,
    /// Initial delay applied to every path (default: 2000).
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Interval between size checks for `stable_size`.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Consecutive identical observations required for `stable_size`.
    #[serde(default = "default_stable_polls")]
    pub stable_polls: u32,
    /// Upper bound on polling before the file is admitted anyway.
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

impl Default for QuiescenceConfig {
    fn default() -> Self {
        Self {
            policy: QuiescencePolicy::default(),
            delay_ms: default_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            stable_polls: default_stable_polls(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_stable_polls() -> u32 {
    2
}

fn default_max_wait_ms() -> u64 {
    600_000 // 10 minutes
}

/// Library roots that transcoded files are written to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_movies_dir")]
    pub movies_dir: PathBuf,
    /// Reserved for episodic content; created at startup but never written by the transcoder.
    #[serde(default = "default_tv_dir")]
    pub tv_dir: PathBuf,
    #[serde(default = "default_music_dir")]
    pub music_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            movies_dir: default_movies_dir(),
            tv_dir: default_tv_dir(),
            music_dir: default_music_dir(),
        }
    }
}

impl OutputConfig {
    /// All output roots, in a stable order.
    pub fn roots(&self) -> [&PathBuf; 3] {
        [&self.movies_dir, &self.tv_dir, &self.music_dir]
    }
}

fn default_movies_dir() -> PathBuf {
    PathBuf::from("/output/movies")
}

fn default_tv_dir() -> PathBuf {
    PathBuf::from("/output/tv")
}

fn default_music_dir() -> PathBuf {
    PathBuf::from("/output/music")
}

/// Background sync helper, spawned once at startup and never supervised.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncHelperConfig {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub enabled: bool,
    #[serde(default = "default_sync_command")]
    pub command: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for SyncHelperConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: default_sync_command(),
            args: Vec::new(),
        }
    }
}

fn default_sync_command() -> PathBuf {
    PathBuf::from("/app/sync_gdrive.sh")
}

/// Accepts any scalar; only `true` or a case-insensitive "true" enables.
/// Numbers and other words (`1`, `yes`, `on`) leave the helper off.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.trim().eq_ignore_ascii_case("true"),
        Flag::Other(_) => false,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}
