use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod call;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the built-in demo applications over TCP.
    Serve(ServeArgs),
    /// Invoke one remote method and print the response.
    Call(CallArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Call(args) => call::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (port 0 picks a free port).
    pub addr: String,
    /// Maximum encoded frame size in bytes.
    #[arg(long, env = "BEANWIRE_MAX_FRAME_SIZE", default_value_t = beanwire_frame::DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
    /// Read timeout per connection (e.g. 30s, 500ms).
    #[arg(long, env = "BEANWIRE_READ_TIMEOUT", default_value = "30s")]
    pub read_timeout: String,
    /// Write timeout per connection (e.g. 30s, 500ms).
    #[arg(long, env = "BEANWIRE_WRITE_TIMEOUT", default_value = "30s")]
    pub write_timeout: String,
    /// Exit after serving N connections.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Endpoint address to connect to.
    pub addr: String,
    /// Application name.
    #[arg(long)]
    pub app: String,
    /// Bean class name.
    #[arg(long = "class")]
    pub class_name: String,
    /// Method name.
    #[arg(long)]
    pub method: String,
    /// Session id of a stateful bean.
    #[arg(long)]
    pub session: Option<String>,
    /// Parameter as key=value; the value is parsed as JSON, or taken as a string.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,
    /// Connect, write and read timeout (e.g. 10s, 500ms).
    #[arg(long, env = "BEANWIRE_CALL_TIMEOUT", default_value = "10s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
