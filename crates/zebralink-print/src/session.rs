// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer sessions: one open connection for the lifetime of one operation.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info, warn};

use zebralink_core::error::{FileError, Result};
use zebralink_core::types::ConnectionTarget;

use crate::transport::{Connection, Transport};

/// Future returned by a [`with_session`] body.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A connection plus the request/response conveniences operations need.
pub struct PrinterSession {
    conn: Box<dyn Connection>,
    request_timeout: Duration,
}

impl PrinterSession {
    pub fn new(conn: Box<dyn Connection>, request_timeout: Duration) -> Self {
        Self {
            conn,
            request_timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.conn.endpoint()
    }

    /// Send the whole buffer.
    pub async fn send_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.conn.write(data).await?;
        debug!(endpoint = %self.endpoint(), bytes = data.len(), "payload sent");
        Ok(())
    }

    /// Read a file completely, then send it. Returns the byte count.
    pub async fn send_file(&mut self, path: &Path) -> Result<usize> {
        let data = read_document(path).await?;
        self.send_bytes(&data).await?;
        Ok(data.len())
    }

    /// Send `command`, then collect the reply until `done` accepts it.
    pub async fn request<F>(&mut self, command: &[u8], done: F) -> Result<Vec<u8>>
    where
        F: Fn(&[u8]) -> bool + Send + Sync,
    {
        self.conn.write(command).await?;
        let reply = self.conn.read_until(&done, self.request_timeout).await?;
        debug!(endpoint = %self.endpoint(), bytes = reply.len(), "reply received");
        Ok(reply)
    }

    /// Close the underlying connection. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        self.conn.close().await
    }
}

/// Load a document from disk, distinguishing "missing" from "unreadable".
pub async fn read_document(path: &Path) -> Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FileError::NotFound(path.to_path_buf()).into())
        }
        Err(source) => Err(FileError::Read {
            path: path.to_path_buf(),
            source,
        }
        .into()),
    }
}

/// Open a session to `target`, run `body`, and close the session.
///
/// Exactly one open and, once the open succeeded, exactly one close happen
/// whether `body` succeeds or fails. A failure to close is logged and never
/// replaces the body's own outcome.
pub async fn with_session<T, F>(
    transport: &dyn Transport,
    target: &ConnectionTarget,
    request_timeout: Duration,
    body: F,
) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut PrinterSession) -> SessionFuture<'a, T>,
{
    let conn = transport.open(target).await?;
    let mut session = PrinterSession::new(conn, request_timeout);

    let result = body(&mut session).await;

    if let Err(close_err) = session.close().await {
        warn!(target = %target, error = %close_err, "closing printer session failed");
    }
    info!(target = %target, ok = result.is_ok(), "session finished");
    result
}
