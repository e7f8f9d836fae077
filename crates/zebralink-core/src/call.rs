// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inbound call boundary.
//
// Host applications hand us a method tag plus a loose argument mapping.  All
// validation happens here, before any I/O: a call either becomes a typed
// `Operation` + `PrinterConfig`, or fails with `Validation` (bad or missing
// arguments) or `NotImplemented` (unknown method tag).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ZebraLinkError};
use crate::types::{
    ConnectionTarget, Operation, Orientation, PrinterConfig, PrinterSettings, Setting,
    SettingValue,
};

pub const ARG_FILE_PATH: &str = "filePath";
pub const ARG_DATA: &str = "data";
pub const ARG_ADDRESS: &str = "address";
pub const ARG_MAC_ADDRESS: &str = "macAddress";
pub const ARG_PORT: &str = "port";
pub const ARG_CM_WIDTH: &str = "cmWidth";
pub const ARG_CM_HEIGHT: &str = "cmHeight";
pub const ARG_ORIENTATION: &str = "orientation";
pub const ARG_DPI: &str = "dpi";

/// Keys every call may carry besides its settings.
const BOUNDARY_KEYS: [&str; 9] = [
    ARG_FILE_PATH,
    ARG_DATA,
    ARG_ADDRESS,
    ARG_MAC_ADDRESS,
    ARG_PORT,
    ARG_CM_WIDTH,
    ARG_CM_HEIGHT,
    ARG_ORIENTATION,
    ARG_DPI,
];

/// A generic method call as received from a host application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Map::new(),
        }
    }

    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.to_owned(), value.into());
        self
    }

    /// Validate the call into a typed operation and its label config.
    pub fn into_request(self) -> Result<(Operation, PrinterConfig)> {
        let args = Args(&self.arguments);
        let operation = match self.method.as_str() {
            "searchBluetoothDevices" => Operation::SearchDevices {
                filter_address: args.opt_str(ARG_MAC_ADDRESS)?.filter(|s| !s.is_empty()),
            },
            "checkPrinterStatus" => Operation::CheckStatus {
                target: args.target()?,
            },
            "printZplFile" => Operation::PrintZplFile {
                path: args.path()?,
                target: args.target()?,
            },
            "printZplData" => Operation::PrintZplData {
                data: args.bytes()?,
                target: args.target()?,
            },
            "printPdfFileOverTCPIP" => Operation::PrintPdfFile {
                path: args.path()?,
                target: args.target()?,
            },
            "printPdfDataOverTCPIP" => Operation::PrintPdfData {
                data: args.bytes()?,
                target: args.target()?,
            },
            "getPrinterSettingsOverTCPIP" => Operation::GetSettings {
                target: args.target()?,
            },
            "setPrinterSettingsOverTCPIP" => Operation::SetSettings {
                target: args.target()?,
                settings: args.settings()?,
            },
            "doManualCalibrationOverTCPIP" => Operation::Calibrate {
                target: args.target()?,
            },
            "printConfigurationLabelOverTCPIP" => Operation::PrintConfigLabel {
                target: args.target()?,
            },
            other => return Err(ZebraLinkError::NotImplemented(format!("method '{other}'"))),
        };
        let config = args.printer_config()?;
        Ok((operation, config))
    }
}

/// Typed accessors over the raw argument map.
struct Args<'a>(&'a Map<String, Value>);

impl Args<'_> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn opt_str(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_owned())),
            Some(other) => Err(invalid(key, "a string", other)),
        }
    }

    fn req_str(&self, key: &str) -> Result<String> {
        self.opt_str(key)?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ZebraLinkError::Validation(format!("missing '{key}'")))
    }

    fn opt_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| invalid(key, "a number", &Value::String(s.clone()))),
            Some(other) => Err(invalid(key, "a number", other)),
        }
    }

    fn opt_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| invalid(key, "a non-negative integer", &Value::Number(n.clone()))),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| invalid(key, "a non-negative integer", &Value::String(s.clone()))),
            Some(other) => Err(invalid(key, "a non-negative integer", other)),
        }
    }

    fn port(&self) -> Result<Option<u16>> {
        self.opt_u64(ARG_PORT)?
            .map(|p| {
                u16::try_from(p)
                    .map_err(|_| ZebraLinkError::Validation(format!("port {p} is out of range")))
            })
            .transpose()
    }

    fn target(&self) -> Result<ConnectionTarget> {
        let address = self.req_str(ARG_ADDRESS)?;
        ConnectionTarget::resolve(&address, self.port()?)
    }

    fn path(&self) -> Result<PathBuf> {
        self.req_str(ARG_FILE_PATH).map(PathBuf::from)
    }

    /// `data` is either a string (sent as UTF-8) or an array of bytes.
    fn bytes(&self) -> Result<Vec<u8>> {
        match self.get(ARG_DATA) {
            None => Err(ZebraLinkError::Validation(format!("missing '{ARG_DATA}'"))),
            Some(Value::String(s)) if s.is_empty() => {
                Err(ZebraLinkError::Validation(format!("'{ARG_DATA}' is empty")))
            }
            Some(Value::String(s)) => Ok(s.as_bytes().to_vec()),
            Some(Value::Array(items)) if !items.is_empty() => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .ok_or_else(|| invalid(ARG_DATA, "an array of bytes", item))
                })
                .collect(),
            Some(other) => Err(invalid(ARG_DATA, "a string or byte array", other)),
        }
    }

    fn printer_config(&self) -> Result<PrinterConfig> {
        let defaults = PrinterConfig::default();
        let orientation = match self.opt_str(ARG_ORIENTATION)? {
            None => defaults.orientation,
            Some(name) => Orientation::from_name(&name).ok_or_else(|| {
                ZebraLinkError::Validation(format!("unknown orientation '{name}'"))
            })?,
        };
        let dpi = match self.opt_u64(ARG_DPI)? {
            None => defaults.dpi,
            Some(dpi) => u32::try_from(dpi)
                .map_err(|_| ZebraLinkError::Validation(format!("dpi {dpi} is out of range")))?,
        };
        PrinterConfig::new(
            self.opt_f64(ARG_CM_WIDTH)?.unwrap_or(defaults.label_width_cm),
            self.opt_f64(ARG_CM_HEIGHT)?.unwrap_or(defaults.label_height_cm),
            dpi,
            orientation,
        )
    }

    /// Recognised camelCase keys become typed settings; dotted keys are raw
    /// SGD names passed through untouched.  Any other key is refused so a
    /// misspelt setting cannot vanish silently.
    fn settings(&self) -> Result<PrinterSettings> {
        let mut settings = PrinterSettings::new();
        let mut unknown = Vec::new();
        for (key, value) in self.0 {
            if value.is_null() || BOUNDARY_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(setting) = Setting::from_camel_name(key) {
                let value = match value {
                    Value::Number(n) => n
                        .as_f64()
                        .map(SettingValue::Number)
                        .ok_or_else(|| invalid(key, "a number", value))?,
                    Value::String(s) => SettingValue::parse_for(setting, s),
                    Value::Bool(b) => SettingValue::Text(if *b { "on" } else { "off" }.into()),
                    other => return Err(invalid(key, "a string or number", other)),
                };
                settings.set(setting, value);
            } else if key.contains('.') {
                let raw = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => return Err(invalid(key, "a scalar", other)),
                };
                settings.set_raw(key.clone(), raw);
            } else {
                unknown.push(key.as_str());
            }
        }
        if !unknown.is_empty() {
            return Err(ZebraLinkError::Validation(format!(
                "unknown printer settings: {}",
                unknown.join(", ")
            )));
        }
        if settings.is_empty() {
            return Err(ZebraLinkError::Validation(
                "no printer settings supplied".into(),
            ));
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn invalid(key: &str, expected: &str, got: &Value) -> ZebraLinkError {
    ZebraLinkError::Validation(format!("'{key}' must be {expected}, got {got}"))
}
