// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// zebralink — Native Bluetooth bridge.
//
// Defines the radio abstraction the print crate talks to (device discovery
// feed + RFCOMM byte streams) and picks the implementation for the target
// operating system.

use std::sync::Arc;

pub mod traits;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(not(target_os = "linux"))]
pub mod stub;

pub use traits::{BluetoothRadio, ByteStream, DiscoveryFeed, PlatformDevice, RadioEvent};

/// Retrieves the Bluetooth radio implementation for the target operating system.
pub fn platform_radio() -> Arc<dyn BluetoothRadio> {
    #[cfg(target_os = "linux")]
    {
        // Linux: BlueZ via `bluetoothctl` for discovery, raw AF_BLUETOOTH
        // sockets for RFCOMM.
        Arc::new(linux::LinuxRadio::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Arc::new(stub::StubRadio)
    }
}
