// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// BlueZ discovery through `bluetoothctl`.
//
// `bluetoothctl show` tells us whether an adapter exists and is powered,
// `bluetoothctl devices` lists peers BlueZ already knows (paired or cached),
// and `bluetoothctl scan on` streams `[NEW] Device …` / `[CHG] Device …`
// lines while an inquiry runs.  The scan process lives as long as the
// returned `Child` and is killed when it is dropped.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, info};

use zebralink_core::error::{Result, ZebraLinkError};
use zebralink_core::types::is_mac_address;

use crate::traits::{PlatformDevice, RadioEvent};

const BLUETOOTHCTL: &str = "bluetoothctl";

/// Fail with `ScannerUnavailable` unless a powered adapter is present.
pub(crate) async fn ensure_powered() -> Result<()> {
    let output = Command::new(BLUETOOTHCTL)
        .arg("show")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ZebraLinkError::ScannerUnavailable(format!("cannot run {BLUETOOTHCTL}: {e}")))?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    check_controller(&text)
}

/// Interpret `bluetoothctl show` output.
pub(crate) fn check_controller(show_output: &str) -> Result<()> {
    let clean = strip_ansi(show_output);
    if clean.contains("No default controller available") || !clean.contains("Controller") {
        return Err(ZebraLinkError::ScannerUnavailable(
            "no Bluetooth adapter found".into(),
        ));
    }
    if clean.lines().any(|l| l.trim() == "Powered: no") {
        return Err(ZebraLinkError::ScannerUnavailable(
            "Bluetooth adapter is powered off".into(),
        ));
    }
    Ok(())
}

/// Peers BlueZ already knows about.
pub(crate) async fn known_devices() -> Result<Vec<PlatformDevice>> {
    let output = Command::new(BLUETOOTHCTL)
        .arg("devices")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ZebraLinkError::ScannerUnavailable(format!("{BLUETOOTHCTL} devices: {e}")))?;
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(parse_device_line)
        .collect())
}

/// Start an inquiry scan. The child is killed when dropped.
pub(crate) fn spawn_scan() -> Result<(Child, ChildStdout)> {
    let mut child = Command::new(BLUETOOTHCTL)
        .args(["scan", "on"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ZebraLinkError::ScannerUnavailable(format!("{BLUETOOTHCTL} scan: {e}")))?;
    let stdout = child.stdout.take().ok_or_else(|| {
        ZebraLinkError::ScannerUnavailable("scan process has no stdout".into())
    })?;
    info!("BlueZ inquiry scan started");
    Ok((child, stdout))
}

/// Forward known peers, then scan output, into `tx` until either side ends.
pub(crate) async fn pump_scan_output(
    known: Vec<PlatformDevice>,
    stdout: ChildStdout,
    tx: mpsc::Sender<RadioEvent>,
) {
    for device in known {
        if tx.send(RadioEvent::DeviceSeen(device)).await.is_err() {
            return;
        }
    }

    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let event = if line.contains("No default controller available")
            || line.contains("Failed to start discovery")
        {
            Some(RadioEvent::Unavailable(strip_ansi(&line).trim().to_owned()))
        } else {
            parse_device_line(&line).map(RadioEvent::DeviceSeen)
        };
        if let Some(event) = event {
            if tx.send(event).await.is_err() {
                break;
            }
        }
    }
    debug!("BlueZ scan output closed");
}

/// Parse one `bluetoothctl` device line.
///
/// Accepted shapes:
///   `Device AC:3F:A4:01:02:03 ZQ520`            (devices listing)
///   `[NEW] Device AC:3F:A4:01:02:03 ZQ520`      (scan)
///   `[CHG] Device AC:3F:A4:01:02:03 Name: ZQ520`
///   `[CHG] Device AC:3F:A4:01:02:03 RSSI: -61`
/// `[DEL]` lines and everything else yield `None`.
pub(crate) fn parse_device_line(line: &str) -> Option<PlatformDevice> {
    let clean = strip_ansi(line);
    let idx = clean.find("Device ")?;
    let (prefix, rest) = clean.split_at(idx);
    if prefix.contains("[DEL]") {
        return None;
    }
    let changed = prefix.contains("[CHG]");

    let rest = rest["Device ".len()..].trim();
    let (address, tail) = rest.split_once(' ').unwrap_or((rest, ""));
    if !is_mac_address(address) {
        return None;
    }
    let tail = tail.trim();

    let name = if changed {
        tail.strip_prefix("Name:").map(|n| n.trim().to_owned())
    } else if tail.is_empty() || tail.replace('-', ":").eq_ignore_ascii_case(address) {
        // BlueZ uses the dashed address as the alias of unnamed peers.
        None
    } else {
        Some(tail.to_owned())
    };

    Some(PlatformDevice {
        address: address.to_ascii_uppercase(),
        name: name.filter(|n| !n.is_empty()),
    })
}

/// Remove ANSI colour sequences and readline markers.
fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for t in chars.by_ref() {
                if t.is_ascii_alphabetic() {
                    break;
                }
            }
        } else if c == '\u{1}' || c == '\u{2}' {
            continue;
        } else {
            out.push(c);
        }
    }
    out
}
