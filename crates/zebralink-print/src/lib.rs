// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// zebralink Print — transports, printer sessions, the ZPL/SGD protocol
// pieces and the operation dispatcher.  This crate bridges between the
// domain types in `zebralink-core` and actual printers on the wire.

pub mod commands;
pub mod discovery;
pub mod dispatcher;
pub mod retry;
pub mod session;
pub mod settings;
pub mod status;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use discovery::{DiscoveryScanner, ScanReport, ScanState};
pub use dispatcher::{OperationDispatcher, OperationHandle};
pub use session::{PrinterSession, with_session};
pub use transport::{Connection, PrinterTransport, StreamConnection, Transport};
