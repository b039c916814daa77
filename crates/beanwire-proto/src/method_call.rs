use serde::{Deserialize, Serialize};

use crate::error::{ProtoError, Result};
use crate::value::Value;

/// Default reply address carried by a new descriptor.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
/// Default reply port carried by a new descriptor.
pub const DEFAULT_PORT: u16 = 0;

/// One keyed argument of a method call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub value: Value,
}

/// Descriptor of one remote method invocation.
///
/// Built by the caller, serialized, decoded verbatim by the endpoint and consumed once.
/// Class and method names are fixed at construction; parameters only grow through
/// [`MethodCall::add_parameter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    app_name: Option<String>,
    class_name: String,
    method_name: String,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    /// Where an asynchronous reply could be routed. Unused by synchronous dispatch.
    #[serde(default = "default_address")]
    address: String,
    #[serde(default)]
    port: u16,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

impl MethodCall {
    /// Create a descriptor for `class_name::method_name`.
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Result<Self> {
        let call = Self {
            app_name: None,
            class_name: class_name.into(),
            method_name: method_name.into(),
            parameters: Vec::new(),
            session_id: None,
            address: default_address(),
            port: DEFAULT_PORT,
        };
        call.validate()?;
        Ok(call)
    }

    /// Attach the call to an established stateful session.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Name the owning application.
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.set_app_name(app_name);
        self
    }

    /// Add a keyed argument.
    ///
    /// Arguments keep insertion order. Re-adding a key replaces its value in place.
    pub fn add_parameter(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.parameters.iter_mut().find(|p| p.key == key) {
            Some(existing) => existing.value = value,
            None => self.parameters.push(Parameter { key, value }),
        }
    }

    /// Builder form of [`MethodCall::add_parameter`].
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_parameter(key, value);
        self
    }

    pub fn set_app_name(&mut self, app_name: impl Into<String>) {
        self.app_name = Some(app_name.into());
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Value of the argument named `key`.
    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.key == key)
            .map(|p| &p.value)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Check the construction invariants. Decoded descriptors go through this too.
    pub fn validate(&self) -> Result<()> {
        if self.class_name.is_empty() {
            return Err(ProtoError::EmptyField("class name"));
        }
        if self.method_name.is_empty() {
            return Err(ProtoError::EmptyField("method name"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_defaults() {
        let call = MethodCall::new("CartBean", "getTotal").unwrap();

        assert_eq!(call.class_name(), "CartBean");
        assert_eq!(call.method_name(), "getTotal");
        assert!(call.parameters().is_empty());
        assert_eq!(call.session_id(), None);
        assert_eq!(call.app_name(), None);
        assert_eq!(call.address(), DEFAULT_ADDRESS);
        assert_eq!(call.port(), DEFAULT_PORT);
    }

    #[test]
    fn rejects_empty_names() {
        assert!(matches!(
            MethodCall::new("", "getTotal"),
            Err(ProtoError::EmptyField("class name"))
        ));
        assert!(matches!(
            MethodCall::new("CartBean", ""),
            Err(ProtoError::EmptyField("method name"))
        ));
    }

    #[test]
    fn parameters_keep_order_and_replace_in_place() {
        let mut call = MethodCall::new("CartBean", "addItem").unwrap();
        call.add_parameter("sku", "pen");
        call.add_parameter("qty", 2);
        call.add_parameter("sku", "ink");

        let keys: Vec<&str> = call.parameters().iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["sku", "qty"]);
        assert_eq!(call.parameter("sku"), Some(&Value::from("ink")));
        assert_eq!(call.parameter("missing"), None);
    }

    #[test]
    fn builders_and_setters() {
        let mut call = MethodCall::new("CartBean", "getTotal")
            .unwrap()
            .with_app_name("shop")
            .with_session("S1")
            .with_parameter("currency", "EUR");
        call.set_address("10.0.0.5");
        call.set_port(9090);

        assert_eq!(call.app_name(), Some("shop"));
        assert_eq!(call.session_id(), Some("S1"));
        assert_eq!(call.parameter("currency"), Some(&Value::from("EUR")));
        assert_eq!(call.address(), "10.0.0.5");
        assert_eq!(call.port(), 9090);
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let call: MethodCall =
            serde_json::from_str(r#"{"class_name":"CartBean","method_name":"clear"}"#).unwrap();

        assert!(call.parameters().is_empty());
        assert_eq!(call.session_id(), None);
        assert_eq!(call.address(), DEFAULT_ADDRESS);
        assert_eq!(call.port(), 0);
    }
}
