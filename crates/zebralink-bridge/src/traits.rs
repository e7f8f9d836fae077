// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the Bluetooth radio.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use zebralink_core::error::Result;

/// A bidirectional byte stream to a printer (RFCOMM channel, TCP socket,
/// in-memory pipe in tests).
pub trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ByteStream for T {}

/// A peer reported by the platform's discovery machinery. The same peer may
/// be reported many times while a scan runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDevice {
    pub address: String,
    pub name: Option<String>,
}

/// Notifications delivered by a running platform scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    DeviceSeen(PlatformDevice),
    /// The radio went away (powered off, adapter removed) mid-scan.
    Unavailable(String),
}

/// A live subscription to platform discovery notifications.
///
/// Dropping the feed stops the platform scan and releases its resources.
pub struct DiscoveryFeed {
    events: mpsc::Receiver<RadioEvent>,
    _scan: Option<Box<dyn Send>>,
}

impl DiscoveryFeed {
    /// Wrap a notification receiver. `scan` is whatever keeps the platform
    /// scan alive (child process, D-Bus session); it is dropped with the feed.
    pub fn new(events: mpsc::Receiver<RadioEvent>, scan: Option<Box<dyn Send>>) -> Self {
        Self {
            events,
            _scan: scan,
        }
    }

    /// Next notification, or `None` once the platform scan has ended.
    pub async fn next(&mut self) -> Option<RadioEvent> {
        self.events.recv().await
    }
}

/// Access to the host's Bluetooth adapter.
#[async_trait]
pub trait BluetoothRadio: Send + Sync {
    /// Human-readable platform name (e.g. "Linux (BlueZ)").
    fn platform_name(&self) -> &str;

    /// Start scanning for peers.
    ///
    /// Fails with `ScannerUnavailable` when there is no adapter or it is
    /// powered off.
    async fn start_discovery(&self) -> Result<DiscoveryFeed>;

    /// Open an RFCOMM channel to the peer with the given MAC address.
    ///
    /// Callers bound this with their own connect timeout.
    async fn open_rfcomm(&self, address: &str, channel: u8) -> Result<Box<dyn ByteStream>>;
}
