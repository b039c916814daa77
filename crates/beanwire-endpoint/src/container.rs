//! Bean containers and scoped instance acquisition.
//!
//! Every invocation runs under one container-wide lock. [`with_instance`] takes the lock
//! through a [`ContainerLock`] guard, so it is released exactly once whether the lookup
//! fails, the method returns an error, or the method unwinds.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Condvar, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::application::Application;
use crate::bean::{Bean, Instance};
use crate::error::InvocationError;

/// Owner of bean instances.
pub trait Container: Send + Sync {
    /// Block until the container-wide lock is held.
    fn lock(&self);

    /// Release the container-wide lock.
    fn unlock(&self);

    /// Produce the instance serving `class_name`, for `session_id` when given.
    fn lookup(
        &self,
        class_name: &str,
        session_id: Option<&str>,
        application: &Application,
    ) -> Result<Instance, InvocationError>;

    /// Hand back an instance obtained from `lookup` with the same class name and session.
    fn attach(
        &self,
        instance: Instance,
        class_name: &str,
        session_id: Option<&str>,
        application: &Application,
    );
}

/// Holds the container-wide lock until released or dropped.
#[must_use = "the container lock is released as soon as the guard is dropped"]
pub struct ContainerLock<'a> {
    container: &'a dyn Container,
    released: bool,
}

impl<'a> ContainerLock<'a> {
    pub fn acquire(container: &'a dyn Container) -> Self {
        container.lock();
        debug!("container lock acquired");
        Self {
            container,
            released: false,
        }
    }

    pub fn release(mut self) {
        self.unlock_once();
    }

    fn unlock_once(&mut self) {
        if !self.released {
            self.released = true;
            self.container.unlock();
            debug!("container lock released");
        }
    }
}

impl Drop for ContainerLock<'_> {
    fn drop(&mut self) {
        self.unlock_once();
    }
}

impl fmt::Debug for ContainerLock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerLock")
            .field("released", &self.released)
            .finish()
    }
}

/// Run `f` on the instance serving `class_name` while holding the container lock.
///
/// The instance is attached back before the lock is released, whether `f` succeeded
/// or returned an error. If `f` unwinds, the instance is dropped and the lock is still
/// released.
pub fn with_instance<T, F>(
    container: &dyn Container,
    class_name: &str,
    session_id: Option<&str>,
    application: &Application,
    f: F,
) -> Result<T, InvocationError>
where
    F: FnOnce(&mut dyn Bean) -> Result<T, InvocationError>,
{
    let guard = ContainerLock::acquire(container);
    let mut instance = container.lookup(class_name, session_id, application)?;
    let result = f(&mut *instance);
    container.attach(instance, class_name, session_id, application);
    guard.release();
    result
}

type InstanceKey = (String, String, String);

/// In-process container.
///
/// Stateful instances are parked per application, class and session between calls.
/// Calls without a session get a fresh instance that is dropped afterwards.
#[derive(Default)]
pub struct LocalContainer {
    locked: Mutex<bool>,
    unlocked: Condvar,
    parked: Mutex<HashMap<InstanceKey, Instance>>,
}

impl LocalContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        *self.locked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of session instances currently parked.
    pub fn parked_count(&self) -> usize {
        self.parked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Container for LocalContainer {
    fn lock(&self) {
        let mut locked = self.locked.lock().unwrap_or_else(PoisonError::into_inner);
        while *locked {
            locked = self
                .unlocked
                .wait(locked)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *locked = true;
    }

    fn unlock(&self) {
        let mut locked = self.locked.lock().unwrap_or_else(PoisonError::into_inner);
        if !*locked {
            warn!("unlock of a container that is not locked, ignoring");
            return;
        }
        *locked = false;
        drop(locked);
        self.unlocked.notify_one();
    }

    fn lookup(
        &self,
        class_name: &str,
        session_id: Option<&str>,
        application: &Application,
    ) -> Result<Instance, InvocationError> {
        let bean_type =
            application
                .bean_type(class_name)
                .ok_or_else(|| InvocationError::UnknownClass {
                    class_name: class_name.to_string(),
                    application: application.name().to_string(),
                })?;

        if let Some(session) = session_id {
            let key = (
                application.name().to_string(),
                class_name.to_string(),
                session.to_string(),
            );
            let parked = self
                .parked
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
            if let Some(instance) = parked {
                debug!(class = class_name, session, "reusing session instance");
                return Ok(instance);
            }
        }

        debug!(class = class_name, session = ?session_id, "new instance");
        Ok(bean_type.instantiate())
    }

    fn attach(
        &self,
        instance: Instance,
        class_name: &str,
        session_id: Option<&str>,
        application: &Application,
    ) {
        let Some(session) = session_id else {
            return;
        };
        let key = (
            application.name().to_string(),
            class_name.to_string(),
            session.to_string(),
        );
        self.parked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, instance);
    }
}

impl fmt::Debug for LocalContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalContainer")
            .field("locked", &self.is_locked())
            .field("parked", &self.parked_count())
            .finish()
    }
}
