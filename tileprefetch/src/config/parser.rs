//! INI parsing logic for converting `Ini` into `ConfigFile`.
//!
//! This is the single place where INI key names map to struct fields.

use std::path::{Path, PathBuf};

use ini::Ini;

use super::settings::ConfigFile;
use super::size::parse_size;
use super::ConfigError;
use crate::coord::{GeoBounds, MAX_ZOOM};
use crate::layer::LayerId;

/// Parse an `Ini` into a `ConfigFile`, starting from defaults.
pub(super) fn parse_ini(ini: &Ini, base: &Path) -> Result<ConfigFile, ConfigError> {
    let mut config = ConfigFile::default();

    // [aerial] and [mapnik] sections
    for layer in LayerId::ALL {
        if let Some(section) = ini.section(Some(layer.as_str())) {
            if let Some(v) = section.get("tiles") {
                let v = v.trim();
                if !v.is_empty() {
                    config.layer_mut(layer).tiles = Some(resolve_path(base, v));
                }
            }
        }
    }

    // [area] section
    if let Some(section) = ini.section(Some("area")) {
        if let Some(v) = section.get("bbox") {
            let bounds = GeoBounds::parse(v).map_err(|e| {
                ConfigError::invalid("area", "bbox", v, &e.to_string())
            })?;
            config.area.bbox = Some(bounds);
        }
        if let Some(v) = section.get("zoom") {
            config.area.zoom = v
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|z| *z <= MAX_ZOOM)
                .ok_or_else(|| {
                    ConfigError::invalid("area", "zoom", v, "must be an integer from 0 to 22")
                })?;
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("latency_ms") {
            config.download.latency_ms = v.trim().parse().map_err(|_| {
                ConfigError::invalid("download", "latency_ms", v, "must be a positive integer")
            })?;
        }
        if let Some(v) = section.get("failure_rate") {
            config.download.failure_rate = v
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|r| (0.0..=1.0).contains(r))
                .ok_or_else(|| {
                    ConfigError::invalid(
                        "download",
                        "failure_rate",
                        v,
                        "must be a number from 0.0 to 1.0",
                    )
                })?;
        }
        if let Some(v) = section.get("progress_log_interval") {
            config.download.progress_log_interval = v.trim().parse().map_err(|_| {
                ConfigError::invalid(
                    "download",
                    "progress_log_interval",
                    v,
                    "must be a non-negative integer",
                )
            })?;
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("memory_size") {
            config.cache.memory_size = parse_size(v).map_err(|_| {
                ConfigError::invalid(
                    "cache",
                    "memory_size",
                    v,
                    "expected format like '64MB', '1GB', or '512KB'",
                )
            })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = resolve_path(base, v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

/// Expands `~/` and resolves relative paths against `base`.
fn resolve_path(base: &Path, value: &str) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
