// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// zebralink — label printer operation router, command-line front end.
//
// Takes one method call (tag + JSON arguments), runs it through the
// dispatcher and prints every notification it produces as one JSON line on
// stdout.  Logs go to stderr.  The exit status reflects the terminal result.
//
//   zebralink checkPrinterStatus --args '{"address":"10.0.0.40","port":9100}'
//   zebralink searchBluetoothDevices --args '{"macAddress":"AC:3F"}'
//   zebralink --write-default-config

mod data_dir;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use zebralink_core::error::{Result, ZebraLinkError};
use zebralink_core::human_errors::humanize_error;
use zebralink_core::{LinkConfig, MethodCall, Notification};
use zebralink_print::OperationDispatcher;
use zebralink_print::retry::{RetryDecision, RetryPolicy};

/// zebralink - Zebra label printer operations over Bluetooth and TCP/IP
#[derive(Parser, Debug)]
#[command(name = "zebralink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Method tag, e.g. checkPrinterStatus or printZplData
    #[arg(required_unless_present = "write_default_config")]
    method: Option<String>,

    /// Call arguments as a JSON object
    #[arg(long, value_name = "JSON", default_value = "{}")]
    args: String,

    /// Configuration file (defaults to config.json in the data directory)
    #[arg(long, value_name = "FILE", env = "ZEBRALINK_CONFIG")]
    config: Option<PathBuf>,

    /// Re-issue transient failures up to N times
    #[arg(long, value_name = "N", default_value_t = 0)]
    retries: u32,

    /// Write the default configuration file and exit
    #[arg(long)]
    write_default_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            let human = humanize_error(&e);
            error!(code = %e.code(), error = %e, "{}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the call ended in success.
async fn run(cli: Cli) -> Result<bool> {
    let config_path = cli.config.unwrap_or_else(data_dir::default_config_path);

    if cli.write_default_config {
        data_dir::persist_config(&config_path, &LinkConfig::default())?;
        info!(path = %config_path.display(), "default configuration written");
        return Ok(true);
    }

    let config = data_dir::load_config(&config_path);
    let method = cli
        .method
        .ok_or_else(|| ZebraLinkError::Validation("no method given".into()))?;
    let call = MethodCall {
        method,
        arguments: parse_arguments(&cli.args)?,
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let output = tokio::spawn(print_notifications(rx));

    let radio = zebralink_bridge::platform_radio();
    info!(platform = radio.platform_name(), "zebralink starting");
    let dispatcher = OperationDispatcher::new(config, radio, tx);
    let ok = call_with_retries(&dispatcher, call, cli.retries).await;

    // Last sender gone: the output task drains what is left and stops.
    drop(dispatcher);
    output
        .await
        .map_err(|e| ZebraLinkError::Internal(format!("output task failed: {e}")))?;
    Ok(ok)
}

fn parse_arguments(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ZebraLinkError::Validation(format!(
            "--args must be a JSON object, got {other}"
        ))),
        Err(e) => Err(ZebraLinkError::Validation(format!("--args is not valid JSON: {e}"))),
    }
}

async fn call_with_retries(dispatcher: &OperationDispatcher, call: MethodCall, retries: u32) -> bool {
    let policy = RetryPolicy::with_retries(retries);

    let mut attempt = 0;
    loop {
        let handle = dispatcher.dispatch_call(call.clone());
        let cancel = handle.cancel_token();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
        let result = handle.join().await;
        interrupt.abort();

        let Some(code) = result.error_code() else {
            return true;
        };
        match policy.decide(code, attempt) {
            RetryDecision::RetryAfter(delay) => {
                attempt += 1;
                warn!(%code, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                tokio::time::sleep(delay).await;
            }
            RetryDecision::GiveUp(class) => {
                if retries > 0 {
                    warn!(%code, ?class, "failure is not transient, not re-issuing");
                }
                return false;
            }
            RetryDecision::Exhausted => return false,
        }
    }
}

async fn print_notifications(mut rx: mpsc::UnboundedReceiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        match serde_json::to_string(&notification) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "cannot serialise notification"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zebralink_core::ErrorCode;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("zebralink").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn method_is_required_unless_writing_config() {
        assert!(Cli::try_parse_from(["zebralink"]).is_err());
        assert!(cli(&["--write-default-config"]).method.is_none());
        let parsed = cli(&["printZplData", "--args", "{\"data\":\"^XA^XZ\"}", "--retries", "2"]);
        assert_eq!(parsed.method.as_deref(), Some("printZplData"));
        assert_eq!(parsed.retries, 2);
    }

    #[test]
    fn arguments_must_be_an_object() {
        let map = parse_arguments(r#"{"address":"10.0.0.40","port":9100}"#).unwrap();
        assert_eq!(map["port"], 9100);
        let err = parse_arguments("[1,2]").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        let err = parse_arguments("{oops").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut parsed = cli(&["--write-default-config"]);
        parsed.config = Some(path.clone());
        assert!(run(parsed).await.unwrap());
        assert_eq!(data_dir::load_config(&path), LinkConfig::default());
    }

    #[tokio::test]
    async fn unknown_method_fails_without_io() {
        let dir = tempfile::tempdir().unwrap();
        let mut parsed = cli(&["printHologram"]);
        parsed.config = Some(dir.path().join("config.json"));
        assert!(!run(parsed).await.unwrap());
    }
}
