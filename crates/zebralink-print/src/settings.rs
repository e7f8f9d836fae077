// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Set-Get-Do (SGD) codec for printer settings.
//
// Writing uses one `! U1 setvar "<name>" "<value>"` line per setting.
// Reading accepts the same lines back, or the dump format printed by
// `! U1 getvar "allcv"`:
//
//   print.tone : 10.0 , Choices: 0.0-30.0
//   ezpl.media_type : gap , Choices: continuous,gap/notch,mark
//
// A value of `?` means the firmware does not know the variable.  SGD has no
// escape for `"` or line breaks, so names and values carrying them are
// refused before anything is written.

use tracing::debug;

use zebralink_core::error::{Result, ZebraLinkError};
use zebralink_core::types::{PrinterSettings, Setting, SettingValue, check_sgd_text};

/// Value the firmware returns for an unknown SGD variable.
pub const UNSUPPORTED: &str = "?";

const SETVAR: &str = "! U1 setvar";
const GETVAR: &str = "! U1 getvar";

/// `! U1 setvar "<sgd>" "<value>"` line.
pub fn setvar(sgd: &str, value: &str) -> Result<String> {
    check_sgd_text("setting name", sgd)?;
    check_sgd_text(&format!("value of '{sgd}'"), value)?;
    Ok(format!("{SETVAR} \"{sgd}\" \"{value}\"\r\n"))
}

/// `! U1 getvar "<sgd>"` line.
pub fn getvar(sgd: &str) -> Result<String> {
    check_sgd_text("setting name", sgd)?;
    Ok(format!("{GETVAR} \"{sgd}\"\r\n"))
}

/// Whether a getvar reply (a single quoted string) has fully arrived.
pub fn reply_complete(buf: &[u8]) -> bool {
    buf.iter().filter(|&&b| b == b'"').count() >= 2
}

/// Extract the value of a getvar reply. `None` when the printer answered `?`.
pub fn parse_getvar_reply(buf: &[u8]) -> Result<Option<String>> {
    let text = std::str::from_utf8(buf)
        .map_err(|_| ZebraLinkError::Protocol("getvar reply is not text".into()))?;
    let value = quoted(text.trim_matches(|c: char| c.is_whitespace() || c == '\0'))
        .map(|(value, _)| value)
        .ok_or_else(|| ZebraLinkError::Protocol(format!("unquoted getvar reply '{}'", text.trim())))?;
    if value.trim() == UNSUPPORTED {
        return Ok(None);
    }
    Ok(Some(value.to_owned()))
}

/// Encode settings as setvar lines: recognised keys first, then passthrough.
pub fn encode(settings: &PrinterSettings) -> Result<Vec<u8>> {
    settings.validate()?;
    let mut out = String::new();
    for (setting, value) in &settings.known {
        out.push_str(&setvar(setting.sgd_name(), &value.to_string())?);
    }
    for (sgd, value) in &settings.passthrough {
        out.push_str(&setvar(sgd, value)?);
    }
    Ok(out.into_bytes())
}

/// Decode setvar lines and/or SGD dump lines into settings.
pub fn decode(buf: &[u8]) -> Result<PrinterSettings> {
    let text = std::str::from_utf8(buf)
        .map_err(|_| ZebraLinkError::Protocol("settings data is not text".into()))?;

    let mut settings = PrinterSettings::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (name, value) = parse_setvar_line(line)
            .or_else(|| parse_dump_line(line))
            .ok_or_else(|| {
                ZebraLinkError::Protocol(format!("settings line {}: cannot parse '{line}'", number + 1))
            })?;
        if value.trim() == UNSUPPORTED {
            debug!(sgd = name, "printer does not support setting");
            continue;
        }
        match Setting::from_sgd_name(name) {
            Some(setting) => settings.set(setting, SettingValue::parse_for(setting, value)),
            None => settings.set_raw(name, value),
        }
    }
    Ok(settings)
}

/// `! U1 setvar "name" "value"`
fn parse_setvar_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix(SETVAR)?.trim_start();
    let (name, rest) = quoted(rest)?;
    let (value, rest) = quoted(rest.trim_start())?;
    (!name.is_empty() && rest.trim().is_empty()).then_some((name, value))
}

/// `name : value [, Choices: ...]`
fn parse_dump_line(line: &str) -> Option<(&str, &str)> {
    let (name, rest) = line.split_once(" : ")?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    let value = match rest.find(" , Choices:") {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    let value = value.trim();
    let value = quoted(value)
        .filter(|(_, tail)| tail.is_empty())
        .map_or(value, |(inner, _)| inner);
    Some((name, value))
}

/// Split a leading `"..."` off `s`, returning the contents and the tail.
fn quoted(s: &str) -> Option<(&str, &str)> {
    let body = s.strip_prefix('"')?;
    let end = body.find('"')?;
    Some((&body[..end], &body[end + 1..]))
}
