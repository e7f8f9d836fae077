// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// zebralink — Core types, error definitions and call validation shared
// across all crates.

pub mod call;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use call::MethodCall;
pub use config::LinkConfig;
pub use error::{ErrorCode, ZebraLinkError};
pub use types::*;
