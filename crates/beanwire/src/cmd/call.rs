use beanwire_endpoint::{call_tcp, ClientConfig};
use beanwire_frame::FrameConfig;
use beanwire_proto::{MethodCall, Value};
use tracing::debug;

use crate::cmd::{parse_duration, CallArgs};
use crate::exit::{client_error, proto_error, CliError, CliResult, REMOTE_ERROR, SUCCESS, USAGE};
use crate::output::{print_response, OutputFormat};

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let request = build_request(&args)?;
    let config = ClientConfig {
        frame: FrameConfig {
            read_timeout: Some(timeout),
            write_timeout: Some(timeout),
            ..FrameConfig::default()
        },
        connect_timeout: Some(timeout),
    };

    debug!(addr = %args.addr, app = %args.app, class = %args.class_name, method = %args.method, "calling");
    let response =
        call_tcp(&args.addr, &request, &config).map_err(|err| client_error("call failed", err))?;
    print_response(&response, format);

    if response.is_error() {
        Ok(REMOTE_ERROR)
    } else {
        Ok(SUCCESS)
    }
}

fn build_request(args: &CallArgs) -> CliResult<MethodCall> {
    let mut request = MethodCall::new(args.class_name.as_str(), args.method.as_str())
        .map_err(|err| proto_error("invalid call", err))?
        .with_app_name(args.app.as_str());
    if let Some(session) = &args.session {
        request = request.with_session(session.as_str());
    }
    for raw in &args.params {
        let (key, value) = parse_param(raw)?;
        request.add_parameter(key, value);
    }
    Ok(request)
}

fn parse_param(raw: &str) -> CliResult<(String, Value)> {
    let (key, text) = raw
        .split_once('=')
        .ok_or_else(|| CliError::new(USAGE, format!("--param must be KEY=VALUE: {raw}")))?;
    if key.is_empty() {
        return Err(CliError::new(USAGE, format!("--param has an empty key: {raw}")));
    }

    let value = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json) => Value::from(json),
        Err(_) => Value::from(text),
    };
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(params: &[&str]) -> CallArgs {
        CallArgs {
            addr: "127.0.0.1:1".to_string(),
            app: "shop".to_string(),
            class_name: "CartBean".to_string(),
            method: "addItem".to_string(),
            session: Some("S1".to_string()),
            params: params.iter().map(|p| p.to_string()).collect(),
            timeout: "1s".to_string(),
        }
    }

    #[test]
    fn params_parse_as_json_or_string() {
        assert_eq!(parse_param("price=42").unwrap(), ("price".to_string(), Value::Int(42)));
        assert_eq!(
            parse_param("name=widget").unwrap(),
            ("name".to_string(), Value::from("widget"))
        );
        assert_eq!(
            parse_param("tags=[\"a\"]").unwrap().1,
            Value::List(vec![Value::from("a")])
        );
        assert_eq!(parse_param("note=a=b").unwrap().1, Value::from("a=b"));
    }

    #[test]
    fn params_need_a_key() {
        assert_eq!(parse_param("42").unwrap_err().code, USAGE);
        assert_eq!(parse_param("=42").unwrap_err().code, USAGE);
    }

    #[test]
    fn request_carries_all_arguments() {
        let request = build_request(&args(&["name=widget", "price=20", "price=21"])).unwrap();
        assert_eq!(request.app_name(), Some("shop"));
        assert_eq!(request.class_name(), "CartBean");
        assert_eq!(request.session_id(), Some("S1"));
        assert_eq!(request.parameters().len(), 2);
        assert_eq!(request.parameter("price"), Some(&Value::Int(21)));
    }

    #[test]
    fn empty_method_is_a_usage_error() {
        let mut bad = args(&[]);
        bad.method.clear();
        assert_eq!(build_request(&bad).unwrap_err().code, USAGE);
    }
}
