mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./transcode-orchestrator.toml",
        "~/.config/transcode-orchestrator/config.toml",
        "/etc/transcode-orchestrator/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
///
/// Provider sections are only checked for values that would break the
/// process; missing credentials are reported by the provider factories so
/// that one misconfigured provider does not take the others down.
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.request_deadline_secs == 0 {
        anyhow::bail!("server.request_deadline_secs must be greater than 0");
    }

    if let Some(bitmovin) = &config.bitmovin {
        if bitmovin.page_size == 0 || bitmovin.page_size > 100 {
            anyhow::bail!(
                "bitmovin.page_size must be between 1 and 100, got {}",
                bitmovin.page_size
            );
        }
        if bitmovin.requests_per_second == 0 {
            anyhow::bail!("bitmovin.requests_per_second must be greater than 0");
        }
    }

    if let Some(encodingcom) = &config.encodingcom {
        if encodingcom.user_id.is_empty() != encodingcom.user_key.is_empty() {
            tracing::warn!("encodingcom: only one of user_id/user_key is set");
        }
    }

    Ok(())
}
