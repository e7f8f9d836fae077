// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Byte-stream transports to a printer.
//
// TCP/IP targets are plain sockets (raw port 9100 or 6101 on Zebra
// firmware).  Bluetooth targets are RFCOMM connections on the configured
// Serial Port Profile channel, opened through the platform radio.  Both end up as a
// `StreamConnection`: chunked writes, deadline-bounded reads, idempotent
// close.  The socket is released on drop if `close` was never reached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::{debug, info};

use zebralink_bridge::{BluetoothRadio, ByteStream};
use zebralink_core::config::LinkConfig;
use zebralink_core::error::{ConnectionError, Result, ZebraLinkError};
use zebralink_core::types::{ConnectionTarget, TargetKind};

/// Serial Port Profile service class advertised by Zebra printers.
///
/// Only logged: no SDP lookup is made, the RFCOMM channel comes from
/// `LinkConfig::bluetooth_channel`.
pub const SPP_SERVICE_CLASS: &str = "00001101-0000-1000-8000-00805F9B34FB";

/// Predicate deciding whether a reply buffer is complete.
pub type ReplyComplete<'a> = &'a (dyn Fn(&[u8]) -> bool + Send + Sync);

/// An open byte channel to one printer.
#[async_trait]
pub trait Connection: Send {
    /// `host:port` or MAC address, for logs and error messages.
    fn endpoint(&self) -> &str;

    /// Write the whole buffer.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read until `done` accepts the accumulated bytes or `timeout` elapses.
    ///
    /// If the peer closes the stream first, whatever arrived is returned and
    /// the caller's parser decides whether it is usable.
    async fn read_until(&mut self, done: ReplyComplete<'_>, timeout: Duration) -> Result<Vec<u8>>;

    /// Shut the channel down. Calling it again is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Opens connections to printers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, target: &ConnectionTarget) -> Result<Box<dyn Connection>>;
}

/// A [`Connection`] over any async byte stream.
pub struct StreamConnection {
    stream: Option<Box<dyn ByteStream>>,
    endpoint: String,
    chunk_size: usize,
}

impl StreamConnection {
    pub fn new(stream: Box<dyn ByteStream>, endpoint: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            stream: Some(stream),
            endpoint: endpoint.into(),
            chunk_size: chunk_size.max(1),
        }
    }

    fn stream(&mut self) -> Result<&mut Box<dyn ByteStream>> {
        let endpoint = &self.endpoint;
        self.stream
            .as_mut()
            .ok_or_else(|| ZebraLinkError::Write(format!("connection to {endpoint} is closed")))
    }
}

#[async_trait]
impl Connection for StreamConnection {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let chunk_size = self.chunk_size;
        let endpoint = self.endpoint.clone();
        let stream = self.stream()?;

        let mut sent = 0usize;
        for chunk in data.chunks(chunk_size) {
            stream.write_all(chunk).await.map_err(|e| {
                ZebraLinkError::Write(format!("{endpoint}: send failed at byte {sent}: {e}"))
            })?;
            sent += chunk.len();
            debug!(endpoint = %endpoint, sent, total = data.len(), "write progress");
        }
        stream
            .flush()
            .await
            .map_err(|e| ZebraLinkError::Write(format!("{endpoint}: flush: {e}")))
    }

    async fn read_until(&mut self, done: ReplyComplete<'_>, timeout: Duration) -> Result<Vec<u8>> {
        let endpoint = self.endpoint.clone();
        let stream = self.stream()?;
        let deadline = Instant::now() + timeout;

        let mut reply = Vec::new();
        let mut chunk = [0u8; 1024];
        while !done(&reply) {
            let n = match tokio::time::timeout_at(deadline, stream.read(&mut chunk)).await {
                Err(_) => {
                    return Err(ConnectionError::Timeout(format!(
                        "no complete reply from {endpoint} within {} ms ({} bytes received)",
                        timeout.as_millis(),
                        reply.len()
                    ))
                    .into());
                }
                Ok(Err(e)) => return Err(ConnectionError::from_io(&e, &endpoint).into()),
                Ok(Ok(n)) => n,
            };
            if n == 0 {
                debug!(endpoint = %endpoint, received = reply.len(), "peer closed before reply completed");
                break;
            }
            reply.extend_from_slice(&chunk[..n]);
            debug!(endpoint = %endpoint, received = reply.len(), "read progress");
        }
        Ok(reply)
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        stream
            .shutdown()
            .await
            .map_err(|e| ZebraLinkError::Write(format!("{}: shutdown: {e}", self.endpoint)))?;
        info!(endpoint = %self.endpoint, "connection closed");
        Ok(())
    }
}

/// The production transport: TCP sockets and RFCOMM channels.
pub struct PrinterTransport {
    config: LinkConfig,
    radio: Arc<dyn BluetoothRadio>,
}

impl PrinterTransport {
    pub fn new(config: LinkConfig, radio: Arc<dyn BluetoothRadio>) -> Self {
        Self { config, radio }
    }

    async fn open_tcp(&self, target: &ConnectionTarget) -> Result<Box<dyn ByteStream>> {
        let endpoint = target.endpoint();
        let port = target.port.ok_or_else(|| {
            ZebraLinkError::Validation(format!("TCP target {} has no port", target.address))
        })?;
        let timeout = self.config.connect_timeout();

        let stream = tokio::time::timeout(timeout, TcpStream::connect((target.address.as_str(), port)))
            .await
            .map_err(|_| {
                ConnectionError::Timeout(format!(
                    "connect to {endpoint} took longer than {} ms",
                    timeout.as_millis()
                ))
            })?
            .map_err(|e| ConnectionError::from_io(&e, &endpoint))?;
        // Small SGD requests should not sit in Nagle's buffer.
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }

    async fn open_bluetooth(&self, target: &ConnectionTarget) -> Result<Box<dyn ByteStream>> {
        let timeout = self.config.connect_timeout();
        let channel = self.config.bluetooth_channel;
        debug!(address = %target.address, channel, service = SPP_SERVICE_CLASS, "opening RFCOMM channel on the configured channel");

        tokio::time::timeout(timeout, self.radio.open_rfcomm(&target.address, channel))
            .await
            .map_err(|_| {
                ConnectionError::Timeout(format!(
                    "RFCOMM connect to {} took longer than {} ms",
                    target.address,
                    timeout.as_millis()
                ))
            })?
    }
}

#[async_trait]
impl Transport for PrinterTransport {
    async fn open(&self, target: &ConnectionTarget) -> Result<Box<dyn Connection>> {
        let stream = match target.kind {
            TargetKind::TcpIp => self.open_tcp(target).await?,
            TargetKind::Bluetooth => self.open_bluetooth(target).await?,
        };
        info!(target = %target, "connection open");
        Ok(Box::new(StreamConnection::new(
            stream,
            target.endpoint(),
            self.config.write_chunk_size,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRadio;
    use tokio::net::TcpListener;
    use zebralink_core::error::ErrorCode;

    fn transport() -> PrinterTransport {
        PrinterTransport::new(LinkConfig::default(), Arc::new(FakeRadio::default()))
    }

    #[tokio::test]
    async fn unreachable_tcp_target_is_a_typed_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let target = ConnectionTarget::tcp("127.0.0.1", port).unwrap();
        let err = transport().open(&target).await.err().unwrap();
        assert!(err.is_connection());
        assert_eq!(err.code(), ErrorCode::AddressUnreachable);
    }

    #[tokio::test]
    async fn tcp_write_and_read_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 3];
            socket.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"~HS");
            socket.write_all(b"\"ok\"").await.unwrap();
        });

        let target = ConnectionTarget::tcp("127.0.0.1", port).unwrap();
        let mut conn = transport().open(&target).await.unwrap();
        conn.write(b"~HS").await.unwrap();
        let reply = conn
            .read_until(&|buf: &[u8]| buf.ends_with(b"\""), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(reply, b"\"ok\"");
        conn.close().await.unwrap();
        conn.close().await.unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let (client, _printer) = tokio::io::duplex(64);
        let mut conn = StreamConnection::new(Box::new(client), "duplex", 16);
        let err = conn
            .read_until(&|buf: &[u8]| !buf.is_empty(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Timeout);
    }

    #[tokio::test]
    async fn writes_are_chunked_but_complete() {
        let (client, mut printer) = tokio::io::duplex(1 << 16);
        let mut conn = StreamConnection::new(Box::new(client), "duplex", 7);
        let label = b"^XA^FO50,50^A0N,40,40^FDHello^FS^XZ".repeat(20);
        conn.write(&label).await.unwrap();
        conn.close().await.unwrap();

        let mut received = Vec::new();
        printer.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, label);
    }

    #[tokio::test]
    async fn write_after_close_fails() {
        let (client, _printer) = tokio::io::duplex(64);
        let mut conn = StreamConnection::new(Box::new(client), "duplex", 16);
        conn.close().await.unwrap();
        let err = conn.write(b"~WC").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::WriteError);
    }

    #[tokio::test]
    async fn bluetooth_targets_use_the_configured_channel() {
        let radio = Arc::new(FakeRadio::default());
        let config = LinkConfig {
            bluetooth_channel: 3,
            ..LinkConfig::default()
        };
        let transport = PrinterTransport::new(config, radio.clone());
        let target = ConnectionTarget::bluetooth("AC:3F:A4:01:02:03").unwrap();

        let mut conn = transport.open(&target).await.unwrap();
        assert_eq!(conn.endpoint(), "AC:3F:A4:01:02:03");
        assert_eq!(radio.last_channel(), Some(3));
        conn.close().await.unwrap();
    }
}
