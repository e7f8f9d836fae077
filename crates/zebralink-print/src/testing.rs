// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process fake printer and radio for tests.
//
// The fake printer sits on the far end of a `tokio::io::duplex` pipe and
// answers `~HS` and SGD getvar/setvar lines the way Zebra firmware does.
// Everything the client writes is recorded on the client side, so tests can
// inspect it as soon as the operation has finished.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;

use zebralink_bridge::{BluetoothRadio, ByteStream, DiscoveryFeed, RadioEvent};
use zebralink_core::error::{ConnectionError, Result, ZebraLinkError};
use zebralink_core::types::ConnectionTarget;

use crate::transport::{Connection, ReplyComplete, StreamConnection, Transport};

/// Three-frame `~HS` reply with the given first two frames.
pub(crate) fn status_reply(first: &str, second: &str) -> Vec<u8> {
    format!("\x02{first}\x03\r\n\x02{second}\x03\r\n\x021234,0\x03\r\n").into_bytes()
}

fn ready_status() -> Vec<u8> {
    status_reply(
        "030,0,0,1245,000,0,0,0,000,0,0,0",
        "000,0,0,0,1,2,6,0,00000000,1,000",
    )
}

pub(crate) struct FakePrinter {
    status: Mutex<Vec<u8>>,
    vars: Mutex<BTreeMap<String, String>>,
    written: Mutex<Vec<u8>>,
    last_target: Mutex<Option<ConnectionTarget>>,
    opens: AtomicUsize,
    closes: AtomicUsize,
    read_only: AtomicBool,
    silent: AtomicBool,
    unreachable: AtomicBool,
    failing_close: AtomicBool,
}

impl FakePrinter {
    /// A ready printer with every recognised setting except `zpl.reprint_mode`.
    pub(crate) fn new() -> Arc<Self> {
        let vars = [
            ("print.tone", "10.0"),
            ("media.speed", "4.0"),
            ("ezpl.tear_off", "0"),
            ("ezpl.media_type", "gap"),
            ("ezpl.print_method", "direct thermal"),
            ("ezpl.print_width", "812"),
            ("zpl.label_length", "1218"),
            ("media.printmode", "tear off"),
            ("zpl.zpl_mode", "zpl II"),
            ("ezpl.power_up_action", "no motion"),
            ("ezpl.head_close_action", "feed"),
            ("zpl.label_top", "0"),
            ("zpl.left_position", "0"),
            ("device.languages", "hybrid_xml_zpl"),
            ("apl.enable", "none"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        Arc::new(Self {
            status: Mutex::new(ready_status()),
            vars: Mutex::new(vars),
            written: Mutex::new(Vec::new()),
            last_target: Mutex::new(None),
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            read_only: AtomicBool::new(false),
            silent: AtomicBool::new(false),
            unreachable: AtomicBool::new(false),
            failing_close: AtomicBool::new(false),
        })
    }

    pub(crate) fn with_status(self: Arc<Self>, reply: Vec<u8>) -> Arc<Self> {
        *self.status.lock().unwrap() = reply;
        self
    }

    pub(crate) fn with_var(self: Arc<Self>, sgd: &str, value: &str) -> Arc<Self> {
        self.vars.lock().unwrap().insert(sgd.into(), value.into());
        self
    }

    /// Accepts setvar lines but never applies them.
    pub(crate) fn read_only(self: Arc<Self>) -> Arc<Self> {
        self.read_only.store(true, Ordering::SeqCst);
        self
    }

    /// Never answers anything.
    pub(crate) fn silent(self: Arc<Self>) -> Arc<Self> {
        self.silent.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn unreachable(self: Arc<Self>) -> Arc<Self> {
        self.unreachable.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn failing_close(self: Arc<Self>) -> Arc<Self> {
        self.failing_close.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    pub(crate) fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn last_target(&self) -> Option<ConnectionTarget> {
        self.last_target.lock().unwrap().clone()
    }

    /// Consume complete commands from `pending`, returning the replies.
    fn process(&self, pending: &mut Vec<u8>) -> Vec<u8> {
        let mut replies = Vec::new();
        while !pending.is_empty() {
            if pending.starts_with(b"~HS") {
                replies.extend_from_slice(&self.status.lock().unwrap());
                pending.drain(..3);
            } else if pending.starts_with(b"! U1 ") {
                let Some(end) = pending.windows(2).position(|w| w == b"\r\n") else {
                    break;
                };
                let line = String::from_utf8_lossy(&pending[..end]).into_owned();
                pending.drain(..end + 2);
                replies.extend(self.sgd(&line));
            } else {
                // Label formats and other commands need no reply.
                let next = pending[1..]
                    .iter()
                    .position(|&b| b == b'~' || b == b'!')
                    .map_or(pending.len(), |p| p + 1);
                pending.drain(..next);
            }
        }
        replies
    }

    fn sgd(&self, line: &str) -> Vec<u8> {
        let parts: Vec<&str> = line.split('"').collect();
        let mut vars = self.vars.lock().unwrap();
        if line.starts_with("! U1 getvar") && parts.len() >= 2 {
            let value = vars.get(parts[1]).map_or("?", String::as_str);
            format!("\"{value}\"").into_bytes()
        } else {
            if line.starts_with("! U1 setvar")
                && parts.len() >= 4
                && !self.read_only.load(Ordering::SeqCst)
            {
                vars.insert(parts[1].to_owned(), parts[3].to_owned());
            }
            Vec::new()
        }
    }
}

async fn serve(printer: Arc<FakePrinter>, mut stream: DuplexStream) {
    let mut pending = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        if printer.silent.load(Ordering::SeqCst) {
            continue;
        }
        pending.extend_from_slice(&chunk[..n]);
        let replies = printer.process(&mut pending);
        if !replies.is_empty() && stream.write_all(&replies).await.is_err() {
            return;
        }
    }
}

pub(crate) struct FakeTransport {
    printer: Arc<FakePrinter>,
}

impl FakeTransport {
    pub(crate) fn new(printer: Arc<FakePrinter>) -> Self {
        Self { printer }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn open(&self, target: &ConnectionTarget) -> Result<Box<dyn Connection>> {
        *self.printer.last_target.lock().unwrap() = Some(target.clone());
        if self.printer.unreachable.load(Ordering::SeqCst) {
            return Err(ConnectionError::AddressUnreachable(target.endpoint()).into());
        }
        self.printer.opens.fetch_add(1, Ordering::SeqCst);

        let (client, far_end) = tokio::io::duplex(64 * 1024);
        tokio::spawn(serve(self.printer.clone(), far_end));
        Ok(Box::new(FakeConnection {
            inner: StreamConnection::new(Box::new(client), target.endpoint(), 8192),
            printer: self.printer.clone(),
        }))
    }
}

struct FakeConnection {
    inner: StreamConnection,
    printer: Arc<FakePrinter>,
}

#[async_trait]
impl Connection for FakeConnection {
    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.printer.written.lock().unwrap().extend_from_slice(data);
        self.inner.write(data).await
    }

    async fn read_until(&mut self, done: ReplyComplete<'_>, timeout: Duration) -> Result<Vec<u8>> {
        self.inner.read_until(done, timeout).await
    }

    async fn close(&mut self) -> Result<()> {
        self.printer.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await?;
        if self.printer.failing_close.load(Ordering::SeqCst) {
            return Err(ZebraLinkError::Write("fake close failure".into()));
        }
        Ok(())
    }
}

/// Scripted Bluetooth radio.
#[derive(Default)]
pub(crate) struct FakeRadio {
    events: Vec<RadioEvent>,
    unavailable: bool,
    hold_open: bool,
    scan_stopped: Arc<AtomicBool>,
    channel: Mutex<Option<u8>>,
}

impl FakeRadio {
    /// Reports `events`, then ends the platform scan.
    pub(crate) fn with_events(events: Vec<RadioEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub(crate) fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Keep the platform scan running until the feed is dropped.
    pub(crate) fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub(crate) fn last_channel(&self) -> Option<u8> {
        *self.channel.lock().unwrap()
    }

    /// Wait briefly for the platform scan to be torn down.
    pub(crate) async fn wait_scan_stopped(&self) -> bool {
        for _ in 0..100 {
            if self.scan_stopped.load(Ordering::SeqCst) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

#[async_trait]
impl BluetoothRadio for FakeRadio {
    fn platform_name(&self) -> &str {
        "fake"
    }

    async fn start_discovery(&self) -> Result<DiscoveryFeed> {
        if self.unavailable {
            return Err(ZebraLinkError::ScannerUnavailable("no adapter".into()));
        }
        let (tx, rx) = mpsc::channel(64);
        let events = self.events.clone();
        let hold_open = self.hold_open;
        let stopped = self.scan_stopped.clone();
        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            if hold_open {
                tx.closed().await;
            }
            stopped.store(true, Ordering::SeqCst);
        });
        Ok(DiscoveryFeed::new(rx, None))
    }

    async fn open_rfcomm(&self, _address: &str, channel: u8) -> Result<Box<dyn ByteStream>> {
        *self.channel.lock().unwrap() = Some(channel);
        let (client, mut far_end) = tokio::io::duplex(4096);
        tokio::spawn(async move {
            let _ = tokio::io::copy(&mut far_end, &mut tokio::io::sink()).await;
        });
        Ok(Box::new(client))
    }
}
