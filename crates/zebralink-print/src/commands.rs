// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer commands run inside an open session: settings read/write,
// calibration, configuration label and PDF direct printing.

use std::path::Path;

use tracing::{debug, info, warn};

use zebralink_core::error::{Result, ZebraLinkError};
use zebralink_core::types::{PrinterConfig, PrinterSettings, Setting, SettingValue};

use crate::session::{PrinterSession, read_document};
use crate::settings::{self, getvar, parse_getvar_reply, reply_complete};

/// Media calibration.
pub const CALIBRATE: &[u8] = b"~JC";

/// Print the configuration label.
pub const CONFIG_LABEL: &[u8] = b"~WC";

/// SGD variable naming the enabled alternate language (PDF Direct).
pub const APL_ENABLE: &str = "apl.enable";

/// ZPL format that applies label width, length and orientation.
pub fn label_setup(config: &PrinterConfig) -> String {
    format!(
        "^XA^PW{}^LL{}^PO{}^XZ\r\n",
        config.width_dots(),
        config.height_dots(),
        config.orientation.zpl_code()
    )
}

/// Read one SGD variable. `None` when the printer does not support it.
pub async fn read_var(session: &mut PrinterSession, sgd: &str) -> Result<Option<String>> {
    let reply = session.request(getvar(sgd)?.as_bytes(), reply_complete).await?;
    let value = parse_getvar_reply(&reply)?;
    debug!(sgd, value = value.as_deref().unwrap_or("?"), "getvar");
    Ok(value)
}

/// Query every recognised setting and decode the answers.
pub async fn get_settings(session: &mut PrinterSession) -> Result<PrinterSettings> {
    let mut dump = String::new();
    for setting in Setting::ALL {
        if let Some(value) = read_var(session, setting.sgd_name()).await? {
            dump.push_str(&format!("{} : {}\r\n", setting.sgd_name(), value));
        }
    }
    settings::decode(dump.as_bytes())
}

/// Write settings, then read each one back as the acknowledgement.
pub async fn set_settings(session: &mut PrinterSession, wanted: &PrinterSettings) -> Result<()> {
    session.send_bytes(&settings::encode(wanted)?).await?;
    info!(endpoint = %session.endpoint(), count = wanted.len(), "settings written");

    for (setting, value) in &wanted.known {
        let actual = read_var(session, setting.sgd_name()).await?;
        confirm(setting.sgd_name(), actual, |got| setting_matches(*setting, value, got))?;
    }
    for (sgd, value) in &wanted.passthrough {
        let actual = read_var(session, sgd).await?;
        confirm(sgd, actual, |got| got.trim().eq_ignore_ascii_case(value.trim()))?;
    }
    Ok(())
}

fn confirm(sgd: &str, actual: Option<String>, matches: impl Fn(&str) -> bool) -> Result<()> {
    match actual {
        None => Err(ZebraLinkError::Rejected(format!(
            "printer does not support '{sgd}'"
        ))),
        Some(got) if !matches(&got) => {
            warn!(sgd, got = %got, "setting not applied");
            Err(ZebraLinkError::Rejected(format!(
                "'{sgd}' reads back as '{got}'"
            )))
        }
        Some(_) => Ok(()),
    }
}

fn setting_matches(setting: Setting, wanted: &SettingValue, got: &str) -> bool {
    let got = SettingValue::parse_for(setting, got);
    match (wanted.as_f64(), got.as_f64()) {
        (Some(a), Some(b)) if setting.is_numeric() => (a - b).abs() < 1e-6,
        _ => wanted.to_string().trim().eq_ignore_ascii_case(got.to_string().trim()),
    }
}

/// Apply label geometry, then start media calibration.
pub async fn calibrate(session: &mut PrinterSession, config: &PrinterConfig) -> Result<()> {
    session.send_bytes(label_setup(config).as_bytes()).await?;
    session.send_bytes(CALIBRATE).await?;
    info!(endpoint = %session.endpoint(), "calibration started");
    Ok(())
}

/// Print the printer's configuration label.
pub async fn print_config_label(session: &mut PrinterSession) -> Result<()> {
    session.send_bytes(CONFIG_LABEL).await?;
    info!(endpoint = %session.endpoint(), "configuration label requested");
    Ok(())
}

/// Send a PDF to a printer with PDF Direct enabled.
pub async fn print_pdf_file(
    session: &mut PrinterSession,
    path: &Path,
    config: &PrinterConfig,
) -> Result<usize> {
    let document = read_document(path).await?;

    match read_var(session, APL_ENABLE).await? {
        Some(mode) if !mode.trim().eq_ignore_ascii_case("none") => {
            debug!(mode = %mode.trim(), "PDF Direct available");
        }
        _ => {
            return Err(ZebraLinkError::NotImplemented(
                "printer has no PDF Direct support (apl.enable is none)".into(),
            ));
        }
    }

    session.send_bytes(label_setup(config).as_bytes()).await?;
    session.send_bytes(&document).await?;
    info!(endpoint = %session.endpoint(), bytes = document.len(), "PDF sent");
    Ok(document.len())
}
