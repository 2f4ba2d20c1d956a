use std::collections::HashMap;

use crate::math::law::law::{
    SharedLaw,
    law_fn,
    uniform_law
};
use crate::rtferror::{
    Result,
    RtfError
};

/// Name → law lookup for custom callables that a model file refers to by name.
///
/// Callers register their own Rust closures here before loading a model; the
/// file itself can only pick names that already exist.
pub struct LawRegistry {
    map: HashMap<String, SharedLaw>,
}

impl LawRegistry {
    /// Registry pre-populated with `uniform` (t ↦ t) and `zero` (t ↦ 0).
    pub fn new() -> LawRegistry {
        let mut registry = LawRegistry::empty();
        registry.insert("uniform", uniform_law());
        registry.insert("zero", law_fn(|_| 0.0));
        registry
    }

    pub fn empty() -> LawRegistry {
        LawRegistry { map: HashMap::new() }
    }

    /// Registers `law` under `name`, returning the law it replaced.
    pub fn insert(&mut self, name: impl Into<String>, law: SharedLaw) -> Option<SharedLaw> {
        self.map.insert(name.into(), law)
    }

    pub fn get(&self, name: &str) -> Result<SharedLaw> {
        self.map
            .get(name)
            .cloned()
            .ok_or_else(|| RtfError::UnknownLaw(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for LawRegistry {
    fn default() -> Self {
        LawRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = LawRegistry::new();
        assert_eq!(registry.names(), vec!["uniform", "zero"]);
        assert_eq!(registry.get("uniform").unwrap().evaluate(12.0), 12.0);
        assert_eq!(registry.get("zero").unwrap().evaluate(12.0), 0.0);
    }

    #[test]
    fn custom_law_replaces_and_resolves() {
        let mut registry = LawRegistry::empty();
        assert!(registry.insert("fast", law_fn(|t| 1e6 * t)).is_none());
        assert!(registry.contains("fast"));
        assert_eq!(registry.get("fast").unwrap().evaluate(2.0), 2e6);
        assert!(registry.insert("fast", law_fn(|t| t)).is_some());
        assert_eq!(registry.get("fast").unwrap().evaluate(2.0), 2.0);
    }

    #[test]
    fn missing_name_is_an_error() {
        let registry = LawRegistry::empty();
        match registry.get("nope") {
            Err(RtfError::UnknownLaw(name)) => assert_eq!(name, "nope"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
