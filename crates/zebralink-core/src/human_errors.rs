// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for operators at the printer.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how front ends present the failure.

use crate::error::{ConnectionError, FileError, ZebraLinkError};

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip, timeout — re-issuing the operation may work.
    Transient,
    /// Operator must do something (pair the printer, fix a path, load media).
    ActionRequired,
    /// Retrying will not help — unsupported operation or rejected command.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the operator should try.
    pub suggestion: String,
    /// Whether re-issuing the same operation is worthwhile.
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    fn new(message: &str, suggestion: impl Into<String>, retriable: bool, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable,
            severity,
        }
    }
}

/// Convert a `ZebraLinkError` into a `HumanError`.
pub fn humanize_error(err: &ZebraLinkError) -> HumanError {
    match err {
        ZebraLinkError::Connection(conn) => humanize_connection_error(conn),

        ZebraLinkError::Write(_) => HumanError::new(
            "The connection to the printer was interrupted while sending.",
            "Check the printer is still on and in range, then send the label again.",
            true,
            Severity::Transient,
        ),

        ZebraLinkError::Protocol(detail) => HumanError::new(
            "The printer answered with something we couldn't understand.",
            format!(
                "Make sure the printer is in ZPL mode and not busy printing. (Detail: {detail})"
            ),
            true,
            Severity::Transient,
        ),

        ZebraLinkError::File(FileError::NotFound(path)) => HumanError::new(
            "The label file couldn't be found.",
            format!("Check the path and try again: {}", path.display()),
            false,
            Severity::ActionRequired,
        ),

        ZebraLinkError::File(FileError::Read { source, .. })
            if source.kind() == std::io::ErrorKind::PermissionDenied =>
        {
            HumanError::new(
                "We don't have permission to read that file.",
                "Check the file permissions, or copy the file somewhere readable first.",
                false,
                Severity::ActionRequired,
            )
        }

        ZebraLinkError::File(FileError::Read { .. }) => HumanError::new(
            "There was a problem reading the label file.",
            "Try again. If this keeps happening the file may be damaged.",
            true,
            Severity::Transient,
        ),

        ZebraLinkError::NotImplemented(what) => HumanError::new(
            "That operation isn't supported.",
            format!("The printer or this build can't do that: {what}"),
            false,
            Severity::Permanent,
        ),

        ZebraLinkError::Rejected(detail) => HumanError::new(
            "The printer refused the new settings.",
            format!("Check the values are valid for this printer model. ({detail})"),
            false,
            Severity::Permanent,
        ),

        ZebraLinkError::Validation(detail) => HumanError::new(
            "Some of the details for this request are missing or wrong.",
            detail.clone(),
            false,
            Severity::ActionRequired,
        ),

        ZebraLinkError::ScannerUnavailable(_) | ZebraLinkError::PlatformUnavailable => {
            HumanError::new(
                "We can't search for Bluetooth printers right now.",
                "Make sure Bluetooth is switched on and this device has a Bluetooth adapter.",
                false,
                Severity::ActionRequired,
            )
        }

        ZebraLinkError::Io(_) | ZebraLinkError::Serialization(_) | ZebraLinkError::Internal(_) => {
            HumanError::new(
                "Something went wrong inside the print router.",
                "Try again. If this keeps happening, please report it with the log output.",
                true,
                Severity::Transient,
            )
        }
    }
}

fn humanize_connection_error(err: &ConnectionError) -> HumanError {
    match err {
        ConnectionError::AddressUnreachable(addr) => HumanError::new(
            "We couldn't reach the printer.",
            format!("Check the printer at {addr} is switched on and on the same network or in Bluetooth range."),
            true,
            Severity::Transient,
        ),
        ConnectionError::Timeout(_) => HumanError::new(
            "The printer didn't respond in time.",
            "The printer might be busy or asleep. Check it's on, then try again.",
            true,
            Severity::Transient,
        ),
        ConnectionError::PermissionDenied(_) => HumanError::new(
            "We're not allowed to use Bluetooth or the network.",
            "Grant Bluetooth permission (or join the bluetooth group on Linux), then try again.",
            false,
            Severity::ActionRequired,
        ),
        ConnectionError::AlreadyInUse(_) => HumanError::new(
            "The printer is already connected to something else.",
            "Disconnect the other app or device from the printer, then try again.",
            true,
            Severity::ActionRequired,
        ),
    }
}
