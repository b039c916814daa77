use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::application::ApplicationRegistry;
use crate::container::{Container, LocalContainer};

/// Hook run once per request, after the frame is read and before it is decoded.
pub trait ClassLoader: Send + Sync {
    /// Make the server's bean classes resolvable for the current request.
    fn register(&self, throw_on_error: bool, prepend: bool);
}

/// Class loader for bean types compiled into the server. Only counts registrations.
#[derive(Debug, Default)]
pub struct StaticClassLoader {
    registrations: AtomicUsize,
}

impl StaticClassLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::Relaxed)
    }
}

impl ClassLoader for StaticClassLoader {
    fn register(&self, throw_on_error: bool, prepend: bool) {
        let count = self.registrations.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(count, throw_on_error, prepend, "class loader registered");
    }
}

/// Everything a connection handler needs from the hosting server.
pub trait ServerContext: Send + Sync {
    fn container(&self) -> Arc<dyn Container>;
    fn applications(&self) -> &ApplicationRegistry;
    fn class_loader(&self) -> &dyn ClassLoader;
}

/// A server context assembled from fixed parts.
pub struct StaticContext {
    container: Arc<dyn Container>,
    applications: ApplicationRegistry,
    class_loader: Arc<dyn ClassLoader>,
}

impl StaticContext {
    /// Context with a [`LocalContainer`] and a [`StaticClassLoader`].
    pub fn new(applications: ApplicationRegistry) -> Self {
        Self {
            container: Arc::new(LocalContainer::new()),
            applications,
            class_loader: Arc::new(StaticClassLoader::new()),
        }
    }

    pub fn with_container(mut self, container: Arc<dyn Container>) -> Self {
        self.container = container;
        self
    }

    pub fn with_class_loader(mut self, class_loader: Arc<dyn ClassLoader>) -> Self {
        self.class_loader = class_loader;
        self
    }
}

impl ServerContext for StaticContext {
    fn container(&self) -> Arc<dyn Container> {
        Arc::clone(&self.container)
    }

    fn applications(&self) -> &ApplicationRegistry {
        &self.applications
    }

    fn class_loader(&self) -> &dyn ClassLoader {
        self.class_loader.as_ref()
    }
}

impl fmt::Debug for StaticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticContext")
            .field("applications", &self.applications.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::Application;

    #[test]
    fn static_context_exposes_parts() {
        let loader = Arc::new(StaticClassLoader::new());
        let context = StaticContext::new(ApplicationRegistry::new().with(Application::new("shop")))
            .with_class_loader(loader.clone());

        assert!(context.applications().get("shop").is_some());
        context.class_loader().register(true, true);
        context.class_loader().register(true, true);
        assert_eq!(loader.registrations(), 2);
    }

    #[test]
    fn container_is_shared() {
        let container = Arc::new(LocalContainer::new());
        let context = StaticContext::new(ApplicationRegistry::new()).with_container(container.clone());

        context.container().lock();
        assert!(container.is_locked());
        context.container().unlock();
        assert!(!container.is_locked());
    }
}
