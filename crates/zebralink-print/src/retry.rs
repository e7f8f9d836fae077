// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Re-issue policy for callers of the dispatcher.
//
// Operations never retry on their own: a status query that times out reports
// TIMEOUT and stops.  A caller that wants another go looks at the terminal
// error code.  Link trouble (printer asleep, socket busy, garbled reply) is
// worth re-issuing after a pause; a missing file or a disabled radio needs a
// person first; a rejected setting or an unknown method will fail the same
// way every time.

use std::time::Duration;

use tracing::debug;

use zebralink_core::error::ErrorCode;

/// What kind of failure a terminal error code describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The link or the printer hiccuped; the same call may succeed later.
    Transient,
    /// Someone has to fix the printer, the radio or the input.
    UserAction,
    /// The call can never succeed as issued.
    Permanent,
}

impl FailureClass {
    pub fn of(code: ErrorCode) -> Self {
        use ErrorCode::*;
        match code {
            AddressUnreachable | Timeout | AlreadyInUse | WriteError | ProtocolError => {
                Self::Transient
            }
            PermissionDenied | FileNotFound | FileReadError | ScannerUnavailable => {
                Self::UserAction
            }
            NotImplemented | Rejected | ValidationError | Exception => Self::Permanent,
        }
    }
}

/// What a caller should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp(FailureClass),
    Exhausted,
}

/// How many times, and how patiently, to re-issue a transient failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    /// Pause before the first re-issue; doubles for each one after.
    pub first_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_retries(3)
    }
}

impl RetryPolicy {
    /// A policy allowing `retries` re-issues, starting at half a second
    /// and never waiting longer than thirty.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            retries,
            first_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }

    /// Decide on the next step after a failure with `code`, given how many
    /// re-issues were already made.
    pub fn decide(&self, code: ErrorCode, retries_made: u32) -> RetryDecision {
        match FailureClass::of(code) {
            FailureClass::Transient if retries_made < self.retries => {
                let delay = self.backoff(retries_made);
                debug!(%code, retries_made, delay_ms = delay.as_millis() as u64, "re-issue scheduled");
                RetryDecision::RetryAfter(delay)
            }
            FailureClass::Transient => RetryDecision::Exhausted,
            class => RetryDecision::GiveUp(class),
        }
    }

    /// first_delay * 2^n, capped at max_delay.
    pub fn backoff(&self, retries_made: u32) -> Duration {
        let factor = 1u32 << retries_made.min(16);
        self.first_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}
