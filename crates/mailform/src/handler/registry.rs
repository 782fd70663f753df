//! Handler lookup by name.

use super::{EmailHandler, TestEmailHandler};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Builds a handler from its configuration.
pub type HandlerFactory = fn(&serde_json::Value) -> Result<Box<dyn EmailHandler>>;

/// Maps handler names to factories.
///
/// Resolved once when the application is configured:
///
/// ```
/// use mailform::handler::HandlerRegistry;
///
/// let registry = HandlerRegistry::with_defaults();
/// let _handler = registry.build("test", &serde_json::json!({}))?;
/// # Ok::<(), mailform::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    factories: HashMap<&'static str, HandlerFactory>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in `test` handler.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("test", |config| {
            Ok(Box::new(TestEmailHandler::from_config(config)?))
        });
        registry
    }

    /// Registers a factory, replacing any previous one with the same name.
    pub fn register(&mut self, name: &'static str, factory: HandlerFactory) {
        self.factories.insert(name, factory);
    }

    /// Returns true if a handler is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the factory registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownHandler`] if nothing is registered.
    pub fn get(&self, name: &str) -> Result<HandlerFactory> {
        self.factories
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownHandler(name.to_string()))
    }

    /// Builds the handler registered under `name` from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown or the factory rejects the
    /// configuration.
    pub fn build(&self, name: &str, config: &serde_json::Value) -> Result<Box<dyn EmailHandler>> {
        let factory = self.get(name)?;
        debug!(handler = name, "Building email handler");
        factory(config)
    }

    /// Returns the registered names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}
