//! Catalog of callable operations, keyed by name.
//!
//! Registration is last-write-wins and never ambiguous: re-registering a
//! name logs the replacement and keeps the name's original position so that
//! schema export order stays deterministic across replacements.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Result, VisionError};
use crate::tools::descriptor::ToolDescriptor;

/// Name → descriptor map with deterministic iteration order.
#[derive(Debug, Default)]
pub struct ToolCatalog {
    tools: HashMap<String, ToolDescriptor>,
    /// Registration order of the names in `tools`.
    order: Vec<String>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its name.
    ///
    /// If the name is already present the prior descriptor is replaced (last
    /// write wins) and the replacement is logged.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::InvalidArgument` if the descriptor's name is
    /// empty. Catalog misuse is a programming error at startup, raised to
    /// the registering caller rather than deferred.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<()> {
        if descriptor.name.is_empty() {
            return Err(VisionError::InvalidArgument(
                "tool descriptor has an empty name".to_string(),
            ));
        }

        let name = descriptor.name.clone();
        if self.tools.insert(name.clone(), descriptor).is_some() {
            log::warn!("tool '{name}' re-registered, replacing prior descriptor");
        } else {
            self.order.push(name);
        }
        Ok(())
    }

    /// Remove a descriptor. Returns whether anything was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        if self.tools.remove(name).is_some() {
            self.order.retain(|n| n != name);
            true
        } else {
            false
        }
    }

    /// Look up a descriptor by name.
    pub fn resolve(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.order.iter().filter_map(|name| self.tools.get(name))
    }

    /// Project every descriptor to its wire schema, in registration order.
    pub fn export_schema(&self) -> Vec<Value> {
        self.iter()
            .map(|d| serde_json::to_value(d).unwrap_or(Value::Null))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, description: &str) -> ToolDescriptor {
        ToolDescriptor::builder(name, description).build()
    }

    #[test]
    fn test_register_and_resolve() {
        let mut catalog = ToolCatalog::new();
        catalog.register(descriptor("scene_info", "d")).unwrap();

        assert!(catalog.contains("scene_info"));
        assert_eq!(catalog.resolve("scene_info").unwrap().description, "d");
        assert!(catalog.resolve("nope").is_none());
    }

    #[test]
    fn test_empty_name_is_invalid() {
        let mut catalog = ToolCatalog::new();
        let result = catalog.register(descriptor("", "d"));
        assert!(matches!(result, Err(VisionError::InvalidArgument(_))));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_reregister_replaces_not_duplicates() {
        let mut catalog = ToolCatalog::new();
        catalog.register(descriptor("scene_info", "first")).unwrap();
        catalog.register(descriptor("scene_info", "second")).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.resolve("scene_info").unwrap().description, "second");
    }

    #[test]
    fn test_reregister_keeps_export_position() {
        let mut catalog = ToolCatalog::new();
        catalog.register(descriptor("a", "d")).unwrap();
        catalog.register(descriptor("b", "d")).unwrap();
        catalog.register(descriptor("a", "replaced")).unwrap();

        let schema = catalog.export_schema();
        assert_eq!(schema[0]["name"], "a");
        assert_eq!(schema[0]["description"], "replaced");
        assert_eq!(schema[1]["name"], "b");
    }

    #[test]
    fn test_unregister() {
        let mut catalog = ToolCatalog::new();
        catalog.register(descriptor("scene_info", "d")).unwrap();

        assert!(catalog.unregister("scene_info"));
        assert!(!catalog.unregister("scene_info"));
        assert!(catalog.export_schema().is_empty());
    }

    #[test]
    fn test_export_schema_order() {
        let mut catalog = ToolCatalog::new();
        for name in ["charlie", "alpha", "bravo"] {
            catalog.register(descriptor(name, "d")).unwrap();
        }

        let names: Vec<_> = catalog
            .export_schema()
            .into_iter()
            .map(|v| v["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["charlie", "alpha", "bravo"]);
    }
}
