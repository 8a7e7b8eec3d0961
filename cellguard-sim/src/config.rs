//! Configuration loading
//!
//! Loads the monitor configuration from a TOML file or a binary config
//! image. Falls back to the built-in defaults when no file is given.

use std::fs;
use std::path::Path;

use cellguard_core::config::{decode_config, encode_config, MAX_IMAGE_SIZE};
use cellguard_core::MonitorConfig;
use tracing::{debug, info};

use crate::error::SimError;

/// Load a config from `path`, or the defaults when `path` is `None`
///
/// Files ending in `.bin` are read as config images; anything else is
/// parsed as TOML.
pub fn load_config(path: Option<&Path>) -> Result<MonitorConfig, SimError> {
    let Some(path) = path else {
        debug!("No config file given, using defaults");
        return Ok(MonitorConfig::default());
    };

    let config = if path.extension().is_some_and(|ext| ext == "bin") {
        let bytes = fs::read(path).map_err(|e| SimError::io(path, e))?;
        debug!("Read {} bytes of config image", bytes.len());
        decode_config(&bytes)?
    } else {
        let text = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        parse_config(&text)?
    };

    info!(path = %path.display(), "Loaded configuration");
    log_config_summary(&config);
    Ok(config)
}

/// Parse a TOML config
///
/// Missing keys take their default values.
pub fn parse_config(input: &str) -> Result<MonitorConfig, SimError> {
    Ok(toml::from_str(input)?)
}

/// Encode `config` as a config image and write it to `path`
pub fn save_config_image(config: &MonitorConfig, path: &Path) -> Result<usize, SimError> {
    let mut buffer = [0u8; MAX_IMAGE_SIZE];
    let bytes = encode_config(config, &mut buffer)?;
    fs::write(path, &bytes[..]).map_err(|e| SimError::io(path, e))?;

    info!(path = %path.display(), len = bytes.len(), "Saved config image");
    Ok(bytes.len())
}

fn log_config_summary(config: &MonitorConfig) {
    debug!(
        adc_width = config.adc_width,
        counter_reset = ?config.counter_reset,
        shutdown = ?config.shutdown,
        "Config"
    );
    for channel in cellguard_core::Channel::ALL {
        let cfg = config.channel(channel);
        debug!(
            %channel,
            min = cfg.limits.min,
            max = cfg.limits.max,
            warning_cycles = cfg.debounce.warning_cycles,
            fault_cycles = cfg.debounce.fault_cycles,
            "Channel"
        );
    }
}
