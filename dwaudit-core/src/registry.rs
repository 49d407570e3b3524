//! Plugin registry mapping `(category, name)` to constructors.
//!
//! The process-wide registry is built once from the explicit list of built-in
//! constructors and is read-only afterwards, so concurrent lookups need no
//! locking. Registration takes `&mut self` and therefore cannot race with
//! readers of a shared registry.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use serde::Serialize;

use crate::error::AuditError;
use crate::params::ParamSchema;
use crate::plugin::{Plugin, PluginCategory, PluginConstructor};
use crate::{Result, plugins};

/// A registered plugin.
#[derive(Clone, Copy)]
pub struct RegistryEntry {
    /// Category the plugin was registered under
    pub category: PluginCategory,
    /// Registered name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Constructor producing fresh instances
    pub constructor: PluginConstructor,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("category", &self.category)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Summary of a registered plugin for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginInfo {
    /// Registration category
    pub category: PluginCategory,
    /// Registered name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Declared parameters
    pub parameters: ParamSchema,
}

/// Table of registered plugins, enumerable in registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    index: HashMap<PluginCategory, HashMap<&'static str, usize>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in plugin.
    ///
    /// # Errors
    /// Fails if two built-ins share a name within a category.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for constructor in plugins::builtin_constructors() {
            registry.register_constructor(*constructor)?;
        }
        tracing::debug!("Registered {} built-in plugins", registry.len());
        Ok(registry)
    }

    /// Registers a constructor under `(category, name)`.
    ///
    /// The registry is left unchanged when registration fails.
    ///
    /// # Errors
    /// - [`AuditError::DuplicatePlugin`] if the name is already taken in the category
    /// - [`AuditError::Configuration`] if the constructed instance reports a
    ///   different name or category
    pub fn register(
        &mut self,
        category: PluginCategory,
        name: &'static str,
        constructor: PluginConstructor,
    ) -> Result<()> {
        if self.contains(category, name) {
            return Err(AuditError::DuplicatePlugin {
                category,
                name: name.to_string(),
            });
        }

        let instance = constructor();
        if instance.name() != name || instance.category() != category {
            return Err(AuditError::configuration(format!(
                "constructor registered as {} '{}' produces {} '{}'",
                category,
                name,
                instance.category(),
                instance.name()
            )));
        }

        self.index
            .entry(category)
            .or_default()
            .insert(name, self.entries.len());
        self.entries.push(RegistryEntry {
            category,
            name,
            description: instance.description(),
            constructor,
        });
        tracing::trace!("Registered {} plugin '{}'", category, name);
        Ok(())
    }

    /// Registers a constructor under the name and category its instance reports.
    pub fn register_constructor(&mut self, constructor: PluginConstructor) -> Result<()> {
        let instance = constructor();
        self.register(instance.category(), instance.name(), constructor)
    }

    /// Looks up the constructor for `(category, name)`.
    ///
    /// # Errors
    /// Returns [`AuditError::UnknownPlugin`] if nothing is registered under the name.
    pub fn lookup(&self, category: PluginCategory, name: &str) -> Result<PluginConstructor> {
        self.entry(category, name).map(|entry| entry.constructor)
    }

    /// Looks up and constructs a plugin instance.
    pub fn instantiate(&self, category: PluginCategory, name: &str) -> Result<Box<dyn Plugin>> {
        self.lookup(category, name).map(|constructor| constructor())
    }

    /// Returns true if `(category, name)` is registered.
    pub fn contains(&self, category: PluginCategory, name: &str) -> bool {
        self.index
            .get(&category)
            .is_some_and(|names| names.contains_key(name))
    }

    fn entry(&self, category: PluginCategory, name: &str) -> Result<&RegistryEntry> {
        self.index
            .get(&category)
            .and_then(|names| names.get(name))
            .and_then(|i| self.entries.get(*i))
            .ok_or_else(|| AuditError::unknown_plugin(category, name))
    }

    /// Names registered in `category`, in registration order.
    pub fn list(&self, category: PluginCategory) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|entry| entry.category == category)
            .map(|entry| entry.name)
            .collect()
    }

    /// All entries in registration order.
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Parameter schema of a registered plugin.
    pub fn describe(&self, category: PluginCategory, name: &str) -> Result<ParamSchema> {
        self.instantiate(category, name)
            .map(|plugin| plugin.parameter_schema())
    }

    /// Listing information for a registered plugin.
    pub fn info(&self, category: PluginCategory, name: &str) -> Result<PluginInfo> {
        let entry = self.entry(category, name)?;
        Ok(PluginInfo {
            category: entry.category,
            name: entry.name,
            description: entry.description,
            parameters: (entry.constructor)().parameter_schema(),
        })
    }

    /// Number of registered plugins across categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static BUILTIN_REGISTRY: OnceLock<Arc<Registry>> = OnceLock::new();

/// Returns the process-wide registry of built-in plugins, building it on first use.
///
/// # Errors
/// Propagates registration failures from [`Registry::with_builtins`].
pub fn builtin_registry() -> Result<Arc<Registry>> {
    if let Some(registry) = BUILTIN_REGISTRY.get() {
        return Ok(Arc::clone(registry));
    }
    let registry = Arc::new(Registry::with_builtins()?);
    Ok(Arc::clone(BUILTIN_REGISTRY.get_or_init(|| registry)))
}
