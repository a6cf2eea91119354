use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::action::{ActionDescriptor, HandlerInstance};

/// Hands out a fresh handler instance for a type name.
///
/// This is the only construction capability the dispatcher relies on.
pub trait HandlerFactory: Send + Sync {
    /// `None` when no handler type of that name is known.
    fn create_instance(&self, type_name: &str) -> Option<HandlerInstance>;
}

impl<F> HandlerFactory for F
where
    F: Fn(&str) -> Option<HandlerInstance> + Send + Sync,
{
    fn create_instance(&self, type_name: &str) -> Option<HandlerInstance> {
        self(type_name)
    }
}

/// A handler type and its statically declared actions.
pub trait Controller: Any + Send {
    /// Type name the router resolves to (e.g. `UserController`).
    const NAME: &'static str;

    fn actions() -> Vec<ActionDescriptor>;
}

type Constructor = Arc<dyn Fn() -> HandlerInstance + Send + Sync>;

struct ControllerEntry {
    actions: Vec<ActionDescriptor>,
    constructor: Option<Constructor>,
}

/// Static registration table: handler type name -> declared actions.
///
/// Built once at startup and read-only afterwards. Also acts as the default
/// [`HandlerFactory`] for controllers registered with a constructor.
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, ControllerEntry>,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `C`, constructed with `C::default()` for every exchange.
    pub fn register<C: Controller + Default>(&mut self) -> &mut Self {
        self.register_with(C::default)
    }

    /// Register `C` with a custom constructor.
    pub fn register_with<C, F>(&mut self, constructor: F) -> &mut Self
    where
        C: Controller,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let constructor: Constructor = Arc::new(move || Box::new(constructor()) as HandlerInstance);
        self.insert(C::NAME, C::actions(), Some(constructor))
    }

    /// Register action metadata only; instances come from an external factory.
    pub fn register_actions(
        &mut self,
        type_name: impl Into<String>,
        actions: Vec<ActionDescriptor>,
    ) -> &mut Self {
        self.insert(type_name, actions, None)
    }

    fn insert(
        &mut self,
        type_name: impl Into<String>,
        actions: Vec<ActionDescriptor>,
        constructor: Option<Constructor>,
    ) -> &mut Self {
        let type_name = type_name.into();
        let action_names: Vec<&str> = actions.iter().map(ActionDescriptor::name).collect();
        info!(
            handler = %type_name,
            actions = ?action_names,
            total_handlers = self.controllers.len() + 1,
            "Controller registered"
        );
        let entry = ControllerEntry {
            actions,
            constructor,
        };
        if self.controllers.insert(type_name.clone(), entry).is_some() {
            warn!(handler = %type_name, "Replaced existing controller registration");
        }
        self
    }

    /// Declared actions of a handler type.
    #[must_use]
    pub fn actions(&self, type_name: &str) -> Option<&[ActionDescriptor]> {
        self.controllers
            .get(type_name)
            .map(|entry| entry.actions.as_slice())
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.controllers.contains_key(type_name)
    }

    /// Registered handler type names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.controllers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl HandlerFactory for ControllerRegistry {
    fn create_instance(&self, type_name: &str) -> Option<HandlerInstance> {
        self.controllers
            .get(type_name)
            .and_then(|entry| entry.constructor.as_ref())
            .map(|construct| construct())
    }
}
