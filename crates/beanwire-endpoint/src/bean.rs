//! Bean types and their method dispatch tables.
//!
//! A bean type is a class name, a table of invocable methods and a factory for fresh
//! state. The table is built once and shared by every instance, so calling a method by
//! name is a map lookup followed by a typed call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use beanwire_proto::{Parameter, Value};

use crate::error::InvocationError;

/// A live bean instance, owned by the container between calls.
pub type Instance = Box<dyn Bean>;

/// An object whose methods can be invoked by name.
pub trait Bean: Send {
    fn class_name(&self) -> &str;

    /// Invoke `method` with the call's parameters.
    fn invoke(&mut self, method: &str, parameters: &[Parameter]) -> Result<Value, InvocationError>;
}

type Method<B> = Box<dyn Fn(&mut B, Args<'_>) -> Result<Value, InvocationError> + Send + Sync>;

/// Method name to invocable map for bean state `B`.
pub struct MethodTable<B> {
    class_name: String,
    methods: HashMap<String, Method<B>>,
}

impl<B> MethodTable<B> {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            methods: HashMap::new(),
        }
    }

    /// Register a method. A later registration under the same name replaces the earlier one.
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut B, Args<'_>) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Box::new(f));
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn invoke(
        &self,
        state: &mut B,
        method: &str,
        parameters: &[Parameter],
    ) -> Result<Value, InvocationError> {
        let f = self
            .methods
            .get(method)
            .ok_or_else(|| InvocationError::UnknownMethod {
                class_name: self.class_name.clone(),
                method_name: method.to_string(),
            })?;
        f(state, Args::new(parameters))
    }
}

impl<B> fmt::Debug for MethodTable<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("class_name", &self.class_name)
            .field("methods", &self.method_names())
            .finish()
    }
}

struct TableBean<B> {
    state: B,
    table: Arc<MethodTable<B>>,
}

impl<B: Send> Bean for TableBean<B> {
    fn class_name(&self) -> &str {
        self.table.class_name()
    }

    fn invoke(&mut self, method: &str, parameters: &[Parameter]) -> Result<Value, InvocationError> {
        self.table.invoke(&mut self.state, method, parameters)
    }
}

type Factory = Box<dyn Fn() -> Instance + Send + Sync>;

/// A registered bean class: name plus a way to create instances.
pub struct BeanType {
    class_name: String,
    factory: Factory,
}

impl BeanType {
    /// Bean type backed by a method table and a state factory.
    pub fn new<B, F>(table: MethodTable<B>, state: F) -> Self
    where
        B: Send + 'static,
        F: Fn() -> B + Send + Sync + 'static,
    {
        let table = Arc::new(table);
        let class_name = table.class_name().to_string();
        Self {
            class_name,
            factory: Box::new(move || -> Instance {
                Box::new(TableBean {
                    state: state(),
                    table: Arc::clone(&table),
                })
            }),
        }
    }

    /// Bean type backed by a hand-written [`Bean`] implementation.
    pub fn from_factory<F>(class_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Instance + Send + Sync + 'static,
    {
        Self {
            class_name: class_name.into(),
            factory: Box::new(factory),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn instantiate(&self) -> Instance {
        (self.factory)()
    }
}

impl fmt::Debug for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanType")
            .field("class_name", &self.class_name)
            .finish_non_exhaustive()
    }
}

/// Borrowed view of a call's parameters with typed extraction.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    parameters: &'a [Parameter],
}

impl<'a> Args<'a> {
    pub fn new(parameters: &'a [Parameter]) -> Self {
        Self { parameters }
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Parameter at `index`, in call order.
    pub fn value(&self, index: usize) -> Result<&'a Value, InvocationError> {
        self.parameters
            .get(index)
            .map(|p| &p.value)
            .ok_or_else(|| InvocationError::MissingArgument(format!("#{index}")))
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.parameters
            .iter()
            .find(|p| p.key == key)
            .map(|p| &p.value)
    }

    /// Parameter named `key`.
    pub fn named(&self, key: &str) -> Result<&'a Value, InvocationError> {
        self.get(key)
            .ok_or_else(|| InvocationError::MissingArgument(key.to_string()))
    }

    pub fn i64(&self, key: &str) -> Result<i64, InvocationError> {
        self.typed(key, "int", Value::as_i64)
    }

    /// Accepts ints as well as floats.
    pub fn f64(&self, key: &str) -> Result<f64, InvocationError> {
        self.typed(key, "float", Value::as_f64)
    }

    pub fn str(&self, key: &str) -> Result<&'a str, InvocationError> {
        self.typed(key, "string", Value::as_str)
    }

    pub fn bool(&self, key: &str) -> Result<bool, InvocationError> {
        self.typed(key, "bool", Value::as_bool)
    }

    fn typed<T>(
        &self,
        key: &str,
        expected: &'static str,
        extract: fn(&'a Value) -> Option<T>,
    ) -> Result<T, InvocationError> {
        let value = self.named(key)?;
        extract(value).ok_or_else(|| InvocationError::InvalidArgument {
            name: key.to_string(),
            expected,
            found: value.type_name(),
        })
    }
}
