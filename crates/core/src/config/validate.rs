use super::{
    types::{Config, QuiescencePolicy},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - At least one job may run
/// - Stable-size polling has a usable interval and threshold
/// - Encoder binary and profile values are sane
/// - No output root lives inside the input root
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.watch.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "watch.max_concurrent_jobs cannot be 0".to_string(),
        ));
    }

    let quiescence = &config.watch.quiescence;
    if quiescence.policy == QuiescencePolicy::StableSize {
        if quiescence.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "watch.quiescence.poll_interval_ms cannot be 0 with the stable_size policy"
                    .to_string(),
            ));
        }
        if quiescence.stable_polls == 0 {
            return Err(ConfigError::ValidationError(
                "watch.quiescence.stable_polls cannot be 0 with the stable_size policy"
                    .to_string(),
            ));
        }
    }

    let encoder = &config.encoder;
    if encoder.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "encoder.ffmpeg_path cannot be empty".to_string(),
        ));
    }
    if encoder.video.crf > 51 {
        return Err(ConfigError::ValidationError(format!(
            "encoder.video.crf must be within 0..=51, got {}",
            encoder.video.crf
        )));
    }
    if encoder.video.audio_bitrate_kbps == 0 || encoder.audio.bitrate_kbps == 0 {
        return Err(ConfigError::ValidationError(
            "encoder audio bitrates must be greater than 0".to_string(),
        ));
    }

    let input = &config.watch.input_dir;
    for root in config.output.roots() {
        if root.starts_with(input) {
            return Err(ConfigError::ValidationError(format!(
                "output directory {} is inside the input directory {}; its files would be re-ingested",
                root.display(),
                input.display()
            )));
        }
    }

    Ok(())
}
