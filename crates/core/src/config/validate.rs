use super::{types::Config, ConfigError};

/// Highest CRF value libx264 accepts.
const MAX_CRF: u8 = 51;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.max_upload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_upload_bytes cannot be 0".to_string(),
        ));
    }

    if config.transcoder.video_crf > MAX_CRF {
        return Err(ConfigError::ValidationError(format!(
            "transcoder.video_crf must be at most {}",
            MAX_CRF
        )));
    }

    if config.transcoder.video_preset.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "transcoder.video_preset cannot be empty".to_string(),
        ));
    }

    let timeouts = [
        ("transcoder.timeout_secs", config.transcoder.timeout_secs),
        (
            "transcoder.probe_timeout_secs",
            config.transcoder.probe_timeout_secs,
        ),
        ("http.connect_timeout_secs", config.http.connect_timeout_secs),
        ("http.fetch_timeout_secs", config.http.fetch_timeout_secs),
        ("http.publish_timeout_secs", config.http.publish_timeout_secs),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be 0",
                name
            )));
        }
    }

    Ok(())
}
