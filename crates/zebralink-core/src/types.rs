// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the zebralink operation router.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorCode, Result, ZebraLinkError};

/// Default TCP port for raw ZPL (JetDirect).
pub const DEFAULT_RAW_PORT: u16 = 9100;

/// Unique identifier for one dispatched operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(pub Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Label configuration
// ---------------------------------------------------------------------------

/// Print orientation of the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Normal,
    Inverted,
}

impl Orientation {
    /// Parse a caller-supplied name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "normal" | "n" | "portrait" => Some(Self::Normal),
            "inverted" | "i" | "landscape" => Some(Self::Inverted),
            _ => None,
        }
    }

    /// ZPL `^PO` parameter.
    pub fn zpl_code(&self) -> char {
        match self {
            Self::Normal => 'N',
            Self::Inverted => 'I',
        }
    }
}

/// Label geometry supplied with each operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrinterConfig {
    pub label_width_cm: f64,
    pub label_height_cm: f64,
    pub dpi: u32,
    pub orientation: Orientation,
}

impl Default for PrinterConfig {
    /// A 4" x 6" shipping label on a 203 dpi head.
    fn default() -> Self {
        Self {
            label_width_cm: 10.16,
            label_height_cm: 15.24,
            dpi: 203,
            orientation: Orientation::Normal,
        }
    }
}

impl PrinterConfig {
    /// Build a config, rejecting non-positive dimensions or resolution.
    pub fn new(
        label_width_cm: f64,
        label_height_cm: f64,
        dpi: u32,
        orientation: Orientation,
    ) -> Result<Self> {
        if !(label_width_cm > 0.0) || !label_width_cm.is_finite() {
            return Err(ZebraLinkError::Validation(format!(
                "label width must be > 0 cm, got {label_width_cm}"
            )));
        }
        if !(label_height_cm > 0.0) || !label_height_cm.is_finite() {
            return Err(ZebraLinkError::Validation(format!(
                "label height must be > 0 cm, got {label_height_cm}"
            )));
        }
        if dpi == 0 {
            return Err(ZebraLinkError::Validation("dpi must be > 0".into()));
        }
        Ok(Self {
            label_width_cm,
            label_height_cm,
            dpi,
            orientation,
        })
    }

    /// Label width in printer dots.
    pub fn width_dots(&self) -> u32 {
        cm_to_dots(self.label_width_cm, self.dpi)
    }

    /// Label height in printer dots.
    pub fn height_dots(&self) -> u32 {
        cm_to_dots(self.label_height_cm, self.dpi)
    }
}

fn cm_to_dots(cm: f64, dpi: u32) -> u32 {
    (cm / 2.54 * f64::from(dpi)).round() as u32
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Which carrier reaches the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Bluetooth,
    TcpIp,
}

/// Where an operation's printer lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub kind: TargetKind,
    pub address: String,
    pub port: Option<u16>,
}

impl ConnectionTarget {
    /// A Bluetooth RFCOMM target. The address must be a MAC address.
    pub fn bluetooth(address: &str) -> Result<Self> {
        let address = address.trim();
        if !is_mac_address(address) {
            return Err(ZebraLinkError::Validation(format!(
                "'{address}' is not a Bluetooth MAC address (XX:XX:XX:XX:XX:XX)"
            )));
        }
        Ok(Self {
            kind: TargetKind::Bluetooth,
            address: address.to_ascii_uppercase(),
            port: None,
        })
    }

    /// A TCP/IP target. Both host and port are required.
    pub fn tcp(address: &str, port: u16) -> Result<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ZebraLinkError::Validation("printer address is empty".into()));
        }
        if port == 0 {
            return Err(ZebraLinkError::Validation("port must be non-zero".into()));
        }
        Ok(Self {
            kind: TargetKind::TcpIp,
            address: address.to_owned(),
            port: Some(port),
        })
    }

    /// Pick the transport from the address shape: MAC addresses go over
    /// Bluetooth (port ignored), everything else needs a TCP port.
    pub fn resolve(address: &str, port: Option<u16>) -> Result<Self> {
        if is_mac_address(address.trim()) {
            return Self::bluetooth(address);
        }
        match port {
            Some(port) => Self::tcp(address, port),
            None => Err(ZebraLinkError::Validation(format!(
                "'{address}' is not a MAC address, so a TCP port is required"
            ))),
        }
    }

    /// `host:port` for TCP targets, the MAC address for Bluetooth.
    pub fn endpoint(&self) -> String {
        match (self.kind, self.port) {
            (TargetKind::TcpIp, Some(port)) => format!("{}:{}", self.address, port),
            _ => self.address.clone(),
        }
    }
}

impl std::fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TargetKind::Bluetooth => write!(f, "bt://{}", self.address),
            TargetKind::TcpIp => write!(f, "tcp://{}", self.endpoint()),
        }
    }
}

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_mac_address(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Every operation the dispatcher can route.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    SearchDevices { filter_address: Option<String> },
    CheckStatus { target: ConnectionTarget },
    PrintZplFile { path: PathBuf, target: ConnectionTarget },
    PrintZplData { data: Vec<u8>, target: ConnectionTarget },
    PrintPdfFile { path: PathBuf, target: ConnectionTarget },
    PrintPdfData { data: Vec<u8>, target: ConnectionTarget },
    GetSettings { target: ConnectionTarget },
    SetSettings { target: ConnectionTarget, settings: PrinterSettings },
    Calibrate { target: ConnectionTarget },
    PrintConfigLabel { target: ConnectionTarget },
}

impl Operation {
    /// Method tag used on the call boundary.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchDevices { .. } => "searchBluetoothDevices",
            Self::CheckStatus { .. } => "checkPrinterStatus",
            Self::PrintZplFile { .. } => "printZplFile",
            Self::PrintZplData { .. } => "printZplData",
            Self::PrintPdfFile { .. } => "printPdfFileOverTCPIP",
            Self::PrintPdfData { .. } => "printPdfDataOverTCPIP",
            Self::GetSettings { .. } => "getPrinterSettingsOverTCPIP",
            Self::SetSettings { .. } => "setPrinterSettingsOverTCPIP",
            Self::Calibrate { .. } => "doManualCalibrationOverTCPIP",
            Self::PrintConfigLabel { .. } => "printConfigurationLabelOverTCPIP",
        }
    }

    /// The printer this operation talks to (discovery has none).
    pub fn target(&self) -> Option<&ConnectionTarget> {
        match self {
            Self::SearchDevices { .. } => None,
            Self::CheckStatus { target }
            | Self::PrintZplFile { target, .. }
            | Self::PrintZplData { target, .. }
            | Self::PrintPdfFile { target, .. }
            | Self::PrintPdfData { target, .. }
            | Self::GetSettings { target }
            | Self::SetSettings { target, .. }
            | Self::Calibrate { target }
            | Self::PrintConfigLabel { target } => Some(target),
        }
    }
}

// ---------------------------------------------------------------------------
// Printer status
// ---------------------------------------------------------------------------

/// Bits of [`PrinterStatus::raw_code`].
pub mod status_bits {
    pub const MEDIA_OUT: u32 = 1 << 0;
    pub const PAUSED: u32 = 1 << 1;
    pub const HEAD_OPEN: u32 = 1 << 2;
    pub const RIBBON_OUT: u32 = 1 << 3;
    pub const HEAD_TOO_HOT: u32 = 1 << 4;
    pub const HEAD_TOO_COLD: u32 = 1 << 5;
    pub const BUFFER_FULL: u32 = 1 << 6;
    pub const CORRUPT_RAM: u32 = 1 << 7;
}

/// Snapshot of the printer's host status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterStatus {
    pub is_ready: bool,
    pub is_paused: bool,
    pub head_open: bool,
    pub media_out: bool,
    pub ribbon_out: bool,
    pub head_too_hot: bool,
    pub head_too_cold: bool,
    pub receive_buffer_full: bool,
    pub labels_remaining: u32,
    pub formats_in_buffer: u32,
    /// Fault bit field, see [`status_bits`]. Zero means ready.
    pub raw_code: u32,
}

// ---------------------------------------------------------------------------
// Printer settings
// ---------------------------------------------------------------------------

/// Printer settings the router understands by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Setting {
    Darkness,
    PrintSpeed,
    TearOff,
    MediaType,
    PrintMethod,
    PrintWidth,
    LabelLength,
    PrintMode,
    ZplMode,
    PowerUpAction,
    HeadCloseAction,
    LabelTop,
    LeftPosition,
    ReprintMode,
    VirtualDevice,
}

impl Setting {
    pub const ALL: [Setting; 15] = [
        Setting::Darkness,
        Setting::PrintSpeed,
        Setting::TearOff,
        Setting::MediaType,
        Setting::PrintMethod,
        Setting::PrintWidth,
        Setting::LabelLength,
        Setting::PrintMode,
        Setting::ZplMode,
        Setting::PowerUpAction,
        Setting::HeadCloseAction,
        Setting::LabelTop,
        Setting::LeftPosition,
        Setting::ReprintMode,
        Setting::VirtualDevice,
    ];

    /// Name used in call arguments.
    pub fn camel_name(&self) -> &'static str {
        match self {
            Self::Darkness => "darkness",
            Self::PrintSpeed => "printSpeed",
            Self::TearOff => "tearOff",
            Self::MediaType => "mediaType",
            Self::PrintMethod => "printMethod",
            Self::PrintWidth => "printWidth",
            Self::LabelLength => "labelLength",
            Self::PrintMode => "printMode",
            Self::ZplMode => "zplMode",
            Self::PowerUpAction => "powerUpAction",
            Self::HeadCloseAction => "headCloseAction",
            Self::LabelTop => "labelTop",
            Self::LeftPosition => "leftPosition",
            Self::ReprintMode => "reprintMode",
            Self::VirtualDevice => "virtualDevice",
        }
    }

    /// Set-Get-Do variable name on the printer.
    pub fn sgd_name(&self) -> &'static str {
        match self {
            Self::Darkness => "print.tone",
            Self::PrintSpeed => "media.speed",
            Self::TearOff => "ezpl.tear_off",
            Self::MediaType => "ezpl.media_type",
            Self::PrintMethod => "ezpl.print_method",
            Self::PrintWidth => "ezpl.print_width",
            Self::LabelLength => "zpl.label_length",
            Self::PrintMode => "media.printmode",
            Self::ZplMode => "zpl.zpl_mode",
            Self::PowerUpAction => "ezpl.power_up_action",
            Self::HeadCloseAction => "ezpl.head_close_action",
            Self::LabelTop => "zpl.label_top",
            Self::LeftPosition => "zpl.left_position",
            Self::ReprintMode => "zpl.reprint_mode",
            Self::VirtualDevice => "device.languages",
        }
    }

    /// Whether the printer reports this setting as a number.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Darkness
                | Self::PrintSpeed
                | Self::TearOff
                | Self::PrintWidth
                | Self::LabelLength
                | Self::LabelTop
                | Self::LeftPosition
        )
    }

    pub fn from_camel_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.camel_name() == name)
    }

    pub fn from_sgd_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.sgd_name().eq_ignore_ascii_case(name))
    }
}

/// A setting value as exchanged with the printer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Number(f64),
    Text(String),
}

impl SettingValue {
    /// Interpret a raw printer string for the given setting.
    pub fn parse_for(setting: Setting, raw: &str) -> Self {
        let raw = raw.trim();
        if setting.is_numeric() {
            if let Ok(n) = raw.parse::<f64>() {
                return Self::Number(n);
            }
        }
        Self::Text(raw.to_owned())
    }

    /// Numeric view, parsing text if needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for SettingValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// Characters an SGD quoted string cannot carry; SGD has no escapes.
const SGD_FORBIDDEN: [char; 4] = ['"', '\r', '\n', '\0'];

/// Reject text that would break out of an SGD quoted string.
pub fn check_sgd_text(what: &str, text: &str) -> Result<()> {
    match text.chars().find(|c| SGD_FORBIDDEN.contains(c)) {
        Some(c) => Err(ZebraLinkError::Validation(format!(
            "{what} contains {c:?}, which cannot be sent to the printer"
        ))),
        None => Ok(()),
    }
}

/// Printer configuration as a key/value mapping.
///
/// Recognised keys are typed through [`Setting`]; anything else is kept in
/// `passthrough` under its raw SGD name so it survives a round trip.
///
/// `set` and `set_raw` store values in the form the printer reports them:
/// a numeric setting given as text becomes a number, text is trimmed, and a
/// raw SGD name that belongs to a recognised setting lands in `known`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrinterSettings {
    pub known: BTreeMap<Setting, SettingValue>,
    pub passthrough: BTreeMap<String, String>,
}

impl PrinterSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, setting: Setting, value: impl Into<SettingValue>) -> Self {
        self.set(setting, value);
        self
    }

    pub fn set(&mut self, setting: Setting, value: impl Into<SettingValue>) {
        let value = SettingValue::parse_for(setting, &value.into().to_string());
        self.known.insert(setting, value);
    }

    pub fn set_raw(&mut self, sgd_name: impl Into<String>, value: impl Into<String>) {
        let sgd_name = sgd_name.into();
        let value = value.into();
        match Setting::from_sgd_name(&sgd_name) {
            Some(setting) => self.set(setting, value.as_str()),
            None => {
                self.passthrough.insert(sgd_name, value);
            }
        }
    }

    /// Check every name and value can be written as an SGD `setvar`.
    ///
    /// `?` is refused as a value: it is the printer's "unsupported" answer.
    pub fn validate(&self) -> Result<()> {
        let entries = self
            .known
            .iter()
            .map(|(setting, value)| (setting.sgd_name().to_owned(), value.to_string()))
            .chain(self.passthrough.iter().map(|(k, v)| (k.clone(), v.clone())));
        for (name, value) in entries {
            if name.trim().is_empty() {
                return Err(ZebraLinkError::Validation("empty setting name".into()));
            }
            check_sgd_text("setting name", &name)?;
            check_sgd_text(&format!("value of '{name}'"), &value)?;
            if value.trim() == "?" {
                return Err(ZebraLinkError::Validation(format!(
                    "'?' is not a valid value for '{name}'"
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, setting: Setting) -> Option<&SettingValue> {
        self.known.get(&setting)
    }

    pub fn len(&self) -> usize {
        self.known.len() + self.passthrough.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.passthrough.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Discovery and notifications
// ---------------------------------------------------------------------------

/// A Bluetooth peer found during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredDevice {
    pub address: String,
    pub friendly_name: Option<String>,
}

/// Non-terminal notification emitted while an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ProgressEvent {
    DeviceFound(DiscoveredDevice),
}

/// How a discovery scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanOutcome {
    Complete,
    Cancelled,
}

/// Data carried by a successful terminal result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Payload {
    Done,
    Status(PrinterStatus),
    Settings(PrinterSettings),
    ScanFinished {
        outcome: ScanOutcome,
        devices_found: usize,
    },
}

/// The single definitive outcome of one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum TerminalResult {
    Success {
        payload: Payload,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        error_code: ErrorCode,
        error_message: String,
    },
}

impl TerminalResult {
    pub fn success(payload: Payload) -> Self {
        Self::Success { payload }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Failure {
            error_code: code,
            error_message: message.into(),
        }
    }

    pub fn from_error(err: &ZebraLinkError) -> Self {
        Self::failure(err.code(), err.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error_code, .. } => Some(*error_code),
        }
    }
}

/// What a [`Notification`] carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum NotificationKind {
    Progress(ProgressEvent),
    Terminal(TerminalResult),
}

/// One message on the shared notification channel, tagged with the
/// operation that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub operation: OperationId,
    pub at: DateTime<Utc>,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn progress(operation: OperationId, event: ProgressEvent) -> Self {
        Self {
            operation,
            at: Utc::now(),
            kind: NotificationKind::Progress(event),
        }
    }

    pub fn terminal(operation: OperationId, result: TerminalResult) -> Self {
        Self {
            operation,
            at: Utc::now(),
            kind: NotificationKind::Terminal(result),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NotificationKind::Terminal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_rejects_non_positive_dimensions() {
        assert!(PrinterConfig::new(0.0, 5.0, 203, Orientation::Normal).is_err());
        assert!(PrinterConfig::new(5.0, -1.0, 203, Orientation::Normal).is_err());
        assert!(PrinterConfig::new(5.0, 5.0, 0, Orientation::Normal).is_err());
        assert!(PrinterConfig::new(f64::NAN, 5.0, 203, Orientation::Normal).is_err());
    }

    #[test]
    fn config_converts_cm_to_dots() {
        let cfg = PrinterConfig::default();
        assert_eq!(cfg.width_dots(), 812);
        assert_eq!(cfg.height_dots(), 1218);
    }

    #[test]
    fn resolve_picks_bluetooth_for_mac_addresses() {
        let target = ConnectionTarget::resolve("ac:3f:a4:01:02:03", Some(9100)).unwrap();
        assert_eq!(target.kind, TargetKind::Bluetooth);
        assert_eq!(target.port, None);
        assert_eq!(target.address, "AC:3F:A4:01:02:03");
    }

    #[test]
    fn tcp_target_requires_port() {
        assert!(ConnectionTarget::resolve("192.168.1.40", None).is_err());
        let target = ConnectionTarget::resolve("192.168.1.40", Some(9100)).unwrap();
        assert_eq!(target.kind, TargetKind::TcpIp);
        assert_eq!(target.endpoint(), "192.168.1.40:9100");
    }

    #[test]
    fn mac_validation() {
        assert!(is_mac_address("00:11:22:33:44:55"));
        assert!(!is_mac_address("00:11:22:33:44"));
        assert!(!is_mac_address("00-11-22-33-44-55"));
        assert!(!is_mac_address("GG:HH:II:JJ:KK:LL"));
    }

    #[test]
    fn setting_names_are_bidirectional() {
        for setting in Setting::ALL {
            assert_eq!(Setting::from_camel_name(setting.camel_name()), Some(setting));
            assert_eq!(Setting::from_sgd_name(setting.sgd_name()), Some(setting));
        }
    }

    #[test]
    fn numeric_values_display_without_trailing_zero() {
        assert_eq!(SettingValue::Number(10.0).to_string(), "10");
        assert_eq!(SettingValue::Number(12.5).to_string(), "12.5");
        assert_eq!(
            SettingValue::parse_for(Setting::Darkness, " 10.0 "),
            SettingValue::Number(10.0)
        );
        assert_eq!(
            SettingValue::parse_for(Setting::MediaType, "gap"),
            SettingValue::Text("gap".into())
        );
    }

    #[test]
    fn settings_store_values_as_the_printer_reports_them() {
        let mut settings = PrinterSettings::new()
            .with(Setting::Darkness, "10")
            .with(Setting::MediaType, " gap ");
        settings.set_raw("print.tone", "12");
        settings.set_raw("Media.Speed", "4");
        settings.set_raw("media.sense_mode", "gap");

        assert_eq!(settings.get(Setting::Darkness), Some(&SettingValue::Number(12.0)));
        assert_eq!(settings.get(Setting::PrintSpeed), Some(&SettingValue::Number(4.0)));
        assert_eq!(settings.get(Setting::MediaType), Some(&SettingValue::Text("gap".into())));
        assert_eq!(settings.passthrough.len(), 1);
        assert!(!settings.passthrough.contains_key("print.tone"));
    }

    #[test]
    fn settings_that_would_break_a_setvar_line_are_refused() {
        let injected = PrinterSettings::new().with(Setting::MediaType, "gap\"\r\n~JR\r\n");
        assert_eq!(injected.validate().unwrap_err().code(), ErrorCode::ValidationError);

        let mut quoted = PrinterSettings::new();
        quoted.set_raw("bluetooth.friendly_name", "Dock \"4\"");
        assert_eq!(quoted.validate().unwrap_err().code(), ErrorCode::ValidationError);

        let mut bad_name = PrinterSettings::new();
        bad_name.set_raw("media.x\" \"y", "1");
        assert!(bad_name.validate().is_err());

        let mut unsupported = PrinterSettings::new();
        unsupported.set_raw("media.sense_mode", "?");
        assert!(unsupported.validate().is_err());

        let mut fine = PrinterSettings::new().with(Setting::Darkness, 10.0);
        fine.set_raw("bluetooth.friendly_name", "Dock 4");
        assert!(fine.validate().is_ok());
        assert!(check_sgd_text("nul", "a\0b").is_err());
    }

    #[test]
    fn failure_serializes_with_error_code() {
        let result = TerminalResult::failure(ErrorCode::NotImplemented, "printPdfDataOverTCPIP");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["result"], "failure");
        assert_eq!(json["errorCode"], "NOT_IMPLEMENTED");
    }
}
