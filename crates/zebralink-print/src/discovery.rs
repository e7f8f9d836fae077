// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bluetooth printer discovery.
//
// Subscribes to the platform radio's discovery feed for one scan window.
// Peers are keyed by their upper-cased MAC address so the repeated sightings
// a radio reports while scanning collapse into one `DiscoveredDevice`.  An
// optional address filter keeps only peers whose address starts with it.
//
// A peer is announced as soon as it is seen with a name.  Peers seen only by
// address (BlueZ often reports RSSI changes before the name) are held back
// and announced without a name when the window closes.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use zebralink_bridge::{BluetoothRadio, RadioEvent};
use zebralink_core::error::{Result, ZebraLinkError};
use zebralink_core::types::{DiscoveredDevice, ScanOutcome};

/// Lifecycle of one scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanState {
    Idle,
    Scanning,
    Complete,
    Cancelled,
    Failed,
}

/// Summary of a finished scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    pub devices_found: usize,
}

pub struct DiscoveryScanner {
    radio: Arc<dyn BluetoothRadio>,
    window: Duration,
    state: ScanState,
}

impl DiscoveryScanner {
    pub fn new(radio: Arc<dyn BluetoothRadio>, window: Duration) -> Self {
        Self {
            radio,
            window,
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Run one scan.
    ///
    /// `on_found` is called once per matching peer and returns `false` when
    /// nobody is listening any more, which ends the scan as cancelled.
    /// Unnamed peers are only reported when the scan completes.
    pub async fn run<F>(
        &mut self,
        filter: Option<&str>,
        cancel: &CancellationToken,
        mut on_found: F,
    ) -> Result<ScanReport>
    where
        F: FnMut(DiscoveredDevice) -> bool + Send,
    {
        let filter = filter.map(normalise).filter(|f| !f.is_empty());

        let mut feed = match self.radio.start_discovery().await {
            Ok(feed) => feed,
            Err(e) => {
                self.state = ScanState::Failed;
                warn!(platform = self.radio.platform_name(), error = %e, "discovery unavailable");
                return Err(match e {
                    ZebraLinkError::ScannerUnavailable(_) => e,
                    other => ZebraLinkError::ScannerUnavailable(other.to_string()),
                });
            }
        };
        self.state = ScanState::Scanning;
        info!(
            platform = self.radio.platform_name(),
            window_secs = self.window.as_secs(),
            filter = filter.as_deref().unwrap_or("*"),
            "bluetooth scan started"
        );

        let window = tokio::time::sleep(self.window);
        tokio::pin!(window);

        let mut announced = HashSet::new();
        let mut unnamed: Vec<String> = Vec::new();
        let mut outcome = loop {
            tokio::select! {
                _ = cancel.cancelled() => break ScanOutcome::Cancelled,
                _ = &mut window => break ScanOutcome::Complete,
                event = feed.next() => match event {
                    None => {
                        debug!("platform scan ended before the window closed");
                        break ScanOutcome::Complete;
                    }
                    Some(RadioEvent::Unavailable(reason)) => {
                        self.state = ScanState::Failed;
                        warn!(reason = %reason, "radio went away during scan");
                        return Err(ZebraLinkError::ScannerUnavailable(reason));
                    }
                    Some(RadioEvent::DeviceSeen(device)) => {
                        let address = normalise(&device.address);
                        if filter.as_ref().is_some_and(|f| !address.starts_with(f.as_str())) {
                            continue;
                        }
                        if announced.contains(&address) {
                            continue;
                        }
                        match device.name.filter(|name| !name.trim().is_empty()) {
                            Some(name) => {
                                unnamed.retain(|a| a != &address);
                                announced.insert(address.clone());
                                debug!(address = %address, name = %name, "device found");
                                let found = DiscoveredDevice {
                                    address,
                                    friendly_name: Some(name),
                                };
                                if !on_found(found) {
                                    break ScanOutcome::Cancelled;
                                }
                            }
                            None if !unnamed.contains(&address) => {
                                debug!(address = %address, "unnamed device, waiting for its name");
                                unnamed.push(address);
                            }
                            None => {}
                        }
                    }
                },
            }
        };
        drop(feed);

        if outcome == ScanOutcome::Complete {
            for address in unnamed {
                announced.insert(address.clone());
                let found = DiscoveredDevice {
                    address,
                    friendly_name: None,
                };
                if !on_found(found) {
                    outcome = ScanOutcome::Cancelled;
                    break;
                }
            }
        }

        self.state = match outcome {
            ScanOutcome::Complete => ScanState::Complete,
            ScanOutcome::Cancelled => ScanState::Cancelled,
        };
        info!(outcome = ?outcome, devices = announced.len(), "bluetooth scan finished");
        Ok(ScanReport {
            outcome,
            devices_found: announced.len(),
        })
    }
}

fn normalise(address: &str) -> String {
    address.trim().to_ascii_uppercase()
}
