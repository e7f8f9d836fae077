// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operation dispatcher.
//
// Every operation runs on its own task, opens at most one session, and ends
// with exactly one terminal notification on the shared channel.  Discovery
// additionally emits one progress notification per device found.  Failures
// of any kind, including a panicking worker, become a `Failure` result.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use zebralink_bridge::BluetoothRadio;
use zebralink_core::call::MethodCall;
use zebralink_core::config::LinkConfig;
use zebralink_core::error::{ErrorCode, Result, ZebraLinkError};
use zebralink_core::human_errors::humanize_error;
use zebralink_core::types::{
    Notification, Operation, OperationId, Payload, PrinterConfig, ProgressEvent, TargetKind,
    TerminalResult,
};

use crate::commands;
use crate::discovery::DiscoveryScanner;
use crate::session::with_session;
use crate::status;
use crate::transport::{PrinterTransport, Transport};

/// Handle to a spawned operation.
pub struct OperationHandle {
    pub id: OperationId,
    cancel: CancellationToken,
    task: JoinHandle<TerminalResult>,
}

impl OperationHandle {
    /// Ask the operation to stop. Only discovery reacts; everything else
    /// runs to completion.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this operation, for callers that also await it.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the terminal result.
    pub async fn join(self) -> TerminalResult {
        match self.task.await {
            Ok(result) => result,
            Err(e) => TerminalResult::failure(ErrorCode::Exception, format!("operation task failed: {e}")),
        }
    }
}

/// Routes operations to transports and protocols.
#[derive(Clone)]
pub struct OperationDispatcher {
    transport: Arc<dyn Transport>,
    radio: Arc<dyn BluetoothRadio>,
    config: LinkConfig,
    events: mpsc::UnboundedSender<Notification>,
}

impl OperationDispatcher {
    /// Dispatcher using the real TCP/RFCOMM transport.
    pub fn new(
        config: LinkConfig,
        radio: Arc<dyn BluetoothRadio>,
        events: mpsc::UnboundedSender<Notification>,
    ) -> Self {
        let transport = Arc::new(PrinterTransport::new(config.clone(), radio.clone()));
        Self::with_transport(config, transport, radio, events)
    }

    pub fn with_transport(
        config: LinkConfig,
        transport: Arc<dyn Transport>,
        radio: Arc<dyn BluetoothRadio>,
        events: mpsc::UnboundedSender<Notification>,
    ) -> Self {
        Self {
            transport,
            radio,
            config,
            events,
        }
    }

    /// Validate a raw call and start it.
    ///
    /// Invalid calls still get an id and a terminal failure; no I/O happens.
    pub fn dispatch_call(&self, call: MethodCall) -> OperationHandle {
        let method = call.method.clone();
        match call.into_request() {
            Ok((operation, config)) => self.spawn(operation, config),
            Err(err) => {
                let id = OperationId::new();
                warn!(operation = %id, method = %method, error = %err, "call rejected");
                let result = TerminalResult::from_error(&err);
                self.notify(Notification::terminal(id, result.clone()));
                OperationHandle {
                    id,
                    cancel: CancellationToken::new(),
                    task: tokio::spawn(async move { result }),
                }
            }
        }
    }

    /// Run `operation` on its own task.
    pub fn spawn(&self, operation: Operation, config: PrinterConfig) -> OperationHandle {
        let id = OperationId::new();
        let cancel = CancellationToken::new();

        let worker = {
            let dispatcher = self.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { dispatcher.execute(id, operation, config, cancel).await })
        };

        // A panicking worker never sent its terminal notification.
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            match worker.await {
                Ok(result) => result,
                Err(join_err) => {
                    error!(operation = %id, error = %join_err, "operation worker died");
                    let result = TerminalResult::failure(
                        ErrorCode::Exception,
                        format!("operation worker died: {join_err}"),
                    );
                    let _ = events.send(Notification::terminal(id, result.clone()));
                    result
                }
            }
        });

        OperationHandle { id, cancel, task }
    }

    /// Run one operation to completion and publish its terminal result.
    #[instrument(skip_all, fields(operation = %id, method = operation.name()))]
    pub async fn execute(
        &self,
        id: OperationId,
        operation: Operation,
        config: PrinterConfig,
        cancel: CancellationToken,
    ) -> TerminalResult {
        info!("operation started");
        let result = match self.run(id, operation, config, &cancel).await {
            Ok(payload) => {
                info!("operation succeeded");
                TerminalResult::success(payload)
            }
            Err(err) => {
                let human = humanize_error(&err);
                warn!(
                    code = %err.code(),
                    error = %err,
                    suggestion = %human.suggestion,
                    retriable = human.retriable,
                    "operation failed"
                );
                TerminalResult::from_error(&err)
            }
        };
        self.notify(Notification::terminal(id, result.clone()));
        result
    }

    async fn run(
        &self,
        id: OperationId,
        operation: Operation,
        config: PrinterConfig,
        cancel: &CancellationToken,
    ) -> Result<Payload> {
        let transport = self.transport.as_ref();
        let timeout = self.config.request_timeout();

        match operation {
            Operation::SearchDevices { filter_address } => {
                let mut scanner = DiscoveryScanner::new(self.radio.clone(), self.config.scan_window());
                let events = self.events.clone();
                let report = scanner
                    .run(filter_address.as_deref(), cancel, move |device| {
                        events
                            .send(Notification::progress(id, ProgressEvent::DeviceFound(device)))
                            .is_ok()
                    })
                    .await?;
                Ok(Payload::ScanFinished {
                    outcome: report.outcome,
                    devices_found: report.devices_found,
                })
            }

            Operation::CheckStatus { target } => {
                let status = with_session(transport, &target, timeout, |s| {
                    Box::pin(status::query_status(s))
                })
                .await?;
                Ok(Payload::Status(status))
            }

            Operation::PrintZplFile { path, target } => {
                with_session(transport, &target, timeout, move |s| {
                    Box::pin(async move { s.send_file(&path).await })
                })
                .await?;
                Ok(Payload::Done)
            }

            Operation::PrintZplData { data, target } => {
                with_session(transport, &target, timeout, move |s| {
                    Box::pin(async move { s.send_bytes(&data).await })
                })
                .await?;
                Ok(Payload::Done)
            }

            Operation::PrintPdfFile { path, target } => {
                if target.kind != TargetKind::TcpIp {
                    return Err(ZebraLinkError::Validation(format!(
                        "PDF printing needs a TCP/IP target, got {target}"
                    )));
                }
                with_session(transport, &target, timeout, move |s| {
                    Box::pin(async move { commands::print_pdf_file(s, &path, &config).await })
                })
                .await?;
                Ok(Payload::Done)
            }

            Operation::PrintPdfData { data, .. } => Err(ZebraLinkError::NotImplemented(format!(
                "printing PDF data from memory ({} bytes); use a PDF file instead",
                data.len()
            ))),

            Operation::GetSettings { target } => {
                let settings = with_session(transport, &target, timeout, |s| {
                    Box::pin(commands::get_settings(s))
                })
                .await?;
                Ok(Payload::Settings(settings))
            }

            Operation::SetSettings { target, settings } => {
                with_session(transport, &target, timeout, move |s| {
                    Box::pin(async move { commands::set_settings(s, &settings).await })
                })
                .await?;
                Ok(Payload::Done)
            }

            Operation::Calibrate { target } => {
                with_session(transport, &target, timeout, move |s| {
                    Box::pin(async move { commands::calibrate(s, &config).await })
                })
                .await?;
                Ok(Payload::Done)
            }

            Operation::PrintConfigLabel { target } => {
                with_session(transport, &target, timeout, |s| {
                    Box::pin(commands::print_config_label(s))
                })
                .await?;
                Ok(Payload::Done)
            }
        }
    }

    fn notify(&self, notification: Notification) {
        if self.events.send(notification).is_err() {
            warn!("notification receiver dropped");
        }
    }
}
