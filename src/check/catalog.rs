//! Registry of check factories keyed by check name.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::{Check, CheckError};

/// Builds a fresh, unconfigured check.
pub type CheckFactory = Box<dyn Fn() -> Box<dyn Check> + Send + Sync>;

/// Maps check names to factories.
#[derive(Default)]
pub struct CheckCatalog {
    factories: BTreeMap<String, CheckFactory>,
}

impl CheckCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing any previous factory.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Check> + Send + Sync + 'static,
    {
        if self
            .factories
            .insert(name.to_string(), Box::new(factory))
            .is_some()
        {
            warn!(check = name, "check factory registered twice, keeping the latest");
        } else {
            debug!(check = name, "registered check factory");
        }
    }

    /// Returns `true` if a factory is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered check names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Builds an unconfigured check.
    pub fn instantiate(&self, name: &str) -> Result<Box<dyn Check>, CheckError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| CheckError::UnknownCheck(name.to_string()))
    }

    /// Builds a check and configures it from raw documents.
    pub fn load(
        &self,
        name: &str,
        instance: &str,
        init_config: &str,
    ) -> Result<Box<dyn Check>, CheckError> {
        let mut check = self.instantiate(name)?;
        check.configure(instance, init_config)?;
        Ok(check)
    }
}
