#![cfg(feature = "cli")]

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Output, Stdio};

struct Server {
    child: Child,
    addr: String,
}

impl Server {
    fn start(count: usize) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_beanwire"))
            .args(["--log-level", "error", "serve", "127.0.0.1:0", "--count"])
            .arg(count.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("serve command should start");

        let stdout = child.stdout.take().expect("stdout should be piped");
        let mut line = String::new();
        BufReader::new(stdout)
            .read_line(&mut line)
            .expect("serve should announce its address");
        let addr = line
            .trim()
            .strip_prefix("listening on ")
            .unwrap_or_else(|| panic!("unexpected serve output: {line}"))
            .to_string();

        Self { child, addr }
    }

    fn wait(mut self) -> i32 {
        self.child
            .wait()
            .expect("serve should exit")
            .code()
            .unwrap_or(-1)
    }
}

fn call(addr: &str, format: &str, rest: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_beanwire"))
        .args(["--log-level", "error", "--format", format, "call", addr])
        .args(rest)
        .output()
        .expect("call should run")
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("call should emit json")
}

const CART: [&str; 6] = ["--app", "shop", "--class", "CartBean", "--session", "S1"];

fn add_item(addr: &str, name: &str, price: i64) -> Output {
    let name = format!("name={name}");
    let price = format!("price={price}");
    let mut args = CART.to_vec();
    args.extend(["--method", "addItem", "--param", &*name, "--param", &*price]);
    call(addr, "json", &args)
}

#[test]
fn cart_session_over_cli() {
    let server = Server::start(3);

    assert!(add_item(&server.addr, "widget", 40).status.success());
    assert!(add_item(&server.addr, "bolt", 2).status.success());

    let mut args = CART.to_vec();
    args.extend(["--method", "getTotal"]);
    let output = call(&server.addr, "json", &args);
    assert!(output.status.success());
    let payload = json(&output);
    assert_eq!(payload["ok"], true);
    assert_eq!(payload["value"], 42);

    assert_eq!(server.wait(), 0);
}

#[test]
fn remote_error_exits_nonzero() {
    let server = Server::start(2);

    let output = call(
        &server.addr,
        "json",
        &[
            "--app", "util", "--class", "EchoBean", "--method", "fail", "--param",
            "message=boom",
        ],
    );
    assert_eq!(output.status.code(), Some(2));
    let payload = json(&output);
    assert_eq!(payload["ok"], false);
    assert_eq!(payload["error_kind"], "invocation");
    assert_eq!(payload["message"], "boom");

    let output = call(
        &server.addr,
        "pretty",
        &["--app", "billing", "--class", "X", "--method", "y"],
    );
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("no application named billing"), "{stdout}");

    assert_eq!(server.wait(), 0);
}

#[test]
fn echo_prints_value() {
    let server = Server::start(1);
    let output = call(
        &server.addr,
        "pretty",
        &[
            "--app", "util", "--class", "EchoBean", "--method", "echo", "--param",
            "message=hello",
        ],
    );
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "return type=string value=hello"
    );
    assert_eq!(server.wait(), 0);
}

#[test]
fn refused_connection_fails() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let output = call(
        &addr,
        "json",
        &["--app", "shop", "--class", "CartBean", "--method", "getTotal"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("call failed"));
}

#[test]
fn version_reports_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_beanwire"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("beanwire {}", env!("CARGO_PKG_VERSION"))
    );
}
