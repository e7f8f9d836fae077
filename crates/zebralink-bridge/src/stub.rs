// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub radio for platforms without a native Bluetooth backend.
//
// Discovery reports the scanner as unavailable and RFCOMM connections fail
// with `PlatformUnavailable`; TCP/IP printing is unaffected.

use async_trait::async_trait;

use zebralink_core::error::{Result, ZebraLinkError};

use crate::traits::{BluetoothRadio, ByteStream, DiscoveryFeed};

/// No-op radio returned on unsupported platforms.
pub struct StubRadio;

#[async_trait]
impl BluetoothRadio for StubRadio {
    fn platform_name(&self) -> &str {
        "unsupported (stub)"
    }

    async fn start_discovery(&self) -> Result<DiscoveryFeed> {
        tracing::warn!("BluetoothRadio::start_discovery called on stub radio");
        Err(ZebraLinkError::ScannerUnavailable(
            "no Bluetooth backend on this platform".into(),
        ))
    }

    async fn open_rfcomm(&self, address: &str, _channel: u8) -> Result<Box<dyn ByteStream>> {
        tracing::warn!(address, "BluetoothRadio::open_rfcomm called on stub radio");
        Err(ZebraLinkError::PlatformUnavailable)
    }
}
