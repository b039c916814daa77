use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use beanwire_proto::{encode_response, Response, Value};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
struct ResponseOutput<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    timestamp: String,
}

impl<'a> ResponseOutput<'a> {
    fn new(response: &'a Response) -> Self {
        let timestamp = now_unix_seconds();
        match response {
            Response::Return(value) => Self {
                ok: true,
                value_type: Some(value.type_name()),
                value: Some(value.to_json()),
                error_kind: None,
                message: None,
                timestamp,
            },
            Response::Error(err) => Self {
                ok: false,
                value_type: None,
                value: None,
                error_kind: Some(err.kind.as_str()),
                message: Some(&err.message),
                timestamp,
            },
        }
    }
}

pub fn print_response(response: &Response, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&ResponseOutput::new(response))
                    .unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);
            match response {
                Response::Return(value) => {
                    table
                        .set_header(vec!["RESULT", "TYPE", "VALUE"])
                        .add_row(vec![
                            "return".to_string(),
                            value.type_name().to_string(),
                            value_preview(value),
                        ]);
                }
                Response::Error(err) => {
                    table
                        .set_header(vec!["RESULT", "KIND", "MESSAGE"])
                        .add_row(vec![
                            "error".to_string(),
                            err.kind.to_string(),
                            err.message.clone(),
                        ]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", pretty_line(response)),
        OutputFormat::Raw => {
            let mut payload = encode_response(response);
            payload.push(b'\n');
            print_raw(&payload);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn pretty_line(response: &Response) -> String {
    match response {
        Response::Return(value) => format!(
            "return type={} value={}",
            value.type_name(),
            value_preview(value)
        ),
        Response::Error(err) => format!("error kind={} message={}", err.kind, err.message),
    }
}

fn value_preview(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_json().to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
