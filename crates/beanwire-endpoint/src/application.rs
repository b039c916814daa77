use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::bean::BeanType;
use crate::error::{DispatchError, Result};

/// A deployed application: a named set of bean types.
#[derive(Debug)]
pub struct Application {
    name: String,
    beans: HashMap<String, BeanType>,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            beans: HashMap::new(),
        }
    }

    /// Builder form of [`Application::register`].
    pub fn with_bean(mut self, bean_type: BeanType) -> Self {
        self.register(bean_type);
        self
    }

    /// Register a bean type under its class name, replacing any earlier one.
    pub fn register(&mut self, bean_type: BeanType) {
        self.beans
            .insert(bean_type.class_name().to_string(), bean_type);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bean_type(&self, class_name: &str) -> Option<&BeanType> {
        self.beans.get(class_name)
    }

    /// Registered class names, sorted.
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.beans.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Applications known to a server, keyed by name.
#[derive(Debug, Default, Clone)]
pub struct ApplicationRegistry {
    applications: BTreeMap<String, Arc<Application>>,
}

impl ApplicationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an application, replacing one with the same name.
    pub fn insert(&mut self, application: Application) -> Arc<Application> {
        let application = Arc::new(application);
        self.applications
            .insert(application.name().to_string(), Arc::clone(&application));
        application
    }

    pub fn with(mut self, application: Application) -> Self {
        self.insert(application);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Application>> {
        self.applications.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.applications.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }
}

/// Find the application a request addresses.
///
/// Names match exactly and case-sensitively. A missing name is looked up as `""`.
pub fn resolve(app_name: Option<&str>, registry: &ApplicationRegistry) -> Result<Arc<Application>> {
    let name = app_name.unwrap_or_default();
    registry
        .get(name)
        .cloned()
        .ok_or_else(|| DispatchError::ApplicationNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::MethodTable;
    use beanwire_proto::Value;

    fn registry() -> ApplicationRegistry {
        let cart = BeanType::new(
            MethodTable::<()>::new("CartBean").method("getTotal", |_, _| Ok(Value::Int(0))),
            || (),
        );
        ApplicationRegistry::new()
            .with(Application::new("shop").with_bean(cart))
            .with(Application::new("admin"))
    }

    #[test]
    fn resolve_finds_exact_name() {
        let app = resolve(Some("shop"), &registry()).unwrap();
        assert_eq!(app.name(), "shop");
        assert_eq!(app.class_names(), vec!["CartBean"]);
        assert!(app.bean_type("CartBean").is_some());
    }

    #[test]
    fn resolve_is_case_sensitive() {
        let err = resolve(Some("Shop"), &registry()).unwrap_err();
        assert_eq!(err.to_string(), "no application named Shop");
    }

    #[test]
    fn resolve_without_name_fails() {
        let err = resolve(None, &registry()).unwrap_err();
        assert!(matches!(err, DispatchError::ApplicationNotFound(ref name) if name.is_empty()));
    }

    #[test]
    fn insert_replaces_same_name() {
        let mut registry = registry();
        registry.insert(Application::new("shop"));
        assert_eq!(registry.len(), 2);
        assert!(registry.get("shop").unwrap().class_names().is_empty());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["admin", "shop"]);
    }
}
