// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Linux Bluetooth radio: BlueZ discovery plus raw RFCOMM sockets.

mod bluez;
pub mod rfcomm;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use zebralink_core::error::{ConnectionError, Result};

use crate::traits::{BluetoothRadio, ByteStream, DiscoveryFeed};

pub use rfcomm::RfcommStream;

/// Capacity of the discovery notification buffer.
const FEED_CAPACITY: usize = 64;

/// Radio backed by the host's BlueZ stack.
pub struct LinuxRadio;

impl LinuxRadio {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinuxRadio {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BluetoothRadio for LinuxRadio {
    fn platform_name(&self) -> &str {
        "Linux (BlueZ)"
    }

    async fn start_discovery(&self) -> Result<DiscoveryFeed> {
        bluez::ensure_powered().await?;
        let known = bluez::known_devices().await?;
        let (child, stdout) = bluez::spawn_scan()?;

        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        tokio::spawn(bluez::pump_scan_output(known, stdout, tx));

        Ok(DiscoveryFeed::new(rx, Some(Box::new(child))))
    }

    async fn open_rfcomm(&self, address: &str, channel: u8) -> Result<Box<dyn ByteStream>> {
        let stream = RfcommStream::connect(address, channel)
            .await
            .map_err(|e| ConnectionError::from_io(&e, address))?;
        info!(address, channel, "RFCOMM channel open");
        Ok(Box::new(stream))
    }
}
