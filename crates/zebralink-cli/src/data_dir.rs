// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution and the persisted router configuration.

use std::path::{Path, PathBuf};

use tracing::warn;

use zebralink_core::LinkConfig;
use zebralink_core::error::Result;

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Return the application data directory (not created).
pub fn data_dir() -> PathBuf {
    base_dir(
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
    .join("zebralink")
}

fn base_dir(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Some(xdg) = xdg.filter(|p| !p.as_os_str().is_empty()) {
        return xdg;
    }
    if let Some(home) = home {
        return home.join(".local").join("share");
    }
    std::env::temp_dir()
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    data_dir().join(CONFIG_FILE)
}

/// Load the configuration, falling back to defaults when the file is
/// missing or unreadable.
pub fn load_config(path: &Path) -> LinkConfig {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(_) => return LinkConfig::default(),
    };
    match serde_json::from_str(&data) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed config, using defaults");
            LinkConfig::default()
        }
    }
}

/// Write `config` as pretty JSON, creating parent directories.
pub fn persist_config(path: &Path, config: &LinkConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}
