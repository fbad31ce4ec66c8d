use std::collections::HashMap;

use anyhow::{anyhow, Result};

use super::backend::PersonDetector;
use super::backends::StubDetector;

type DetectorFactory = Box<dyn Fn() -> Box<dyn PersonDetector> + Send + Sync>;

/// Registry of person-detector backends, keyed by name.
///
/// Alternate detector implementations are swapped by registering them here
/// and selecting by name, never by conditional wiring at the call sites.
/// Factories rather than instances, so each monitor gets its own detector.
pub struct DetectorRegistry {
    factories: HashMap<String, DetectorFactory>,
    default_name: Option<String>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend factory. The first registered backend becomes the
    /// default.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn PersonDetector> + Send + Sync + 'static,
    {
        if self.default_name.is_none() {
            self.default_name = Some(name.to_string());
        }
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.factories.contains_key(name) {
            return Err(anyhow!("detector '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Instantiate a backend by name.
    pub fn create(&self, name: &str) -> Result<Box<dyn PersonDetector>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| anyhow!("detector '{}' not registered", name))?;
        Ok(factory())
    }

    /// Instantiate the default backend.
    pub fn create_default(&self) -> Result<Box<dyn PersonDetector>> {
        let name = self
            .default_name
            .as_deref()
            .ok_or_else(|| anyhow!("no detector registered"))?;
        self.create(name)
    }

    pub fn list(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with the backends that ship in-tree.
pub fn builtin_registry() -> DetectorRegistry {
    let mut registry = DetectorRegistry::new();
    registry.register("stub", || Box::new(StubDetector::new()));
    registry
}
