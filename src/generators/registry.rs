use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::generators::{DummyTestGenerator, TestGenerator};

pub type GeneratorFactory = fn() -> Box<dyn TestGenerator>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown generator: {name} (available: {})", .available.join(", "))]
pub struct GeneratorNotFound {
    pub name: String,
    pub available: Vec<String>,
}

/// Fixed mapping from generator name to factory. Built before a run starts
/// and only read afterwards.
#[derive(Clone)]
pub struct GeneratorRegistry {
    factories: BTreeMap<&'static str, GeneratorFactory>,
}

impl GeneratorRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        Self::empty().with("dummy", || Box::new(DummyTestGenerator))
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn with(mut self, name: &'static str, factory: GeneratorFactory) -> Self {
        self.factories.insert(name, factory);
        self
    }

    pub fn resolve(&self, name: &str) -> Result<GeneratorFactory, GeneratorNotFound> {
        self.factories
            .get(name)
            .copied()
            .ok_or_else(|| GeneratorNotFound {
                name: name.to_string(),
                available: self.names().map(str::to_string).collect(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
