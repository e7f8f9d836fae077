// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Router configuration: timeouts, scan window, transport tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Persistent router settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Upper bound on establishing a TCP or RFCOMM connection.
    pub connect_timeout_ms: u64,
    /// Upper bound on waiting for a printer's reply to one request.
    pub request_timeout_ms: u64,
    /// How long a Bluetooth discovery scan runs before completing.
    pub scan_window_secs: u64,
    /// RFCOMM channel of the printer's Serial Port Profile service.
    pub bluetooth_channel: u8,
    /// Bytes per write when streaming documents to the printer.
    pub write_chunk_size: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            request_timeout_ms: 5_000,
            scan_window_secs: 10,
            bluetooth_channel: 1,
            write_chunk_size: 8192,
        }
    }
}

impl LinkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn scan_window(&self) -> Duration {
        Duration::from_secs(self.scan_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: LinkConfig = serde_json::from_str(r#"{"scan_window_secs": 3}"#).unwrap();
        assert_eq!(cfg.scan_window(), Duration::from_secs(3));
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.bluetooth_channel, 1);
    }
}
