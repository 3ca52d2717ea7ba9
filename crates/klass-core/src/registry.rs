//! Class registry
//!
//! Maps class names to declared descriptors so a driver can declare its
//! classes once and construct instances by name.

use crate::class::ClassDescriptor;
use crate::instance::{construct, Instance};
use crate::{ObjResult, ObjectError};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Registry of declared classes
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: FxHashMap<String, Arc<ClassDescriptor>>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declared class under its name
    pub fn register(&mut self, descriptor: Arc<ClassDescriptor>) -> ObjResult<()> {
        let name = descriptor.name().to_string();
        if self.classes.contains_key(&name) {
            return Err(ObjectError::DuplicateClass { name });
        }
        self.classes.insert(name, descriptor);
        Ok(())
    }

    /// Get class by name
    pub fn get(&self, name: &str) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(name)
    }

    /// Construct an instance of the class registered as `name`
    pub fn construct(&self, name: &str) -> ObjResult<Instance> {
        let descriptor = self.get(name).ok_or_else(|| ObjectError::ClassNotFound {
            name: name.to_string(),
        })?;
        construct(descriptor)
    }

    /// Registered class names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if no classes are registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn class(name: &str) -> Arc<ClassDescriptor> {
        ClassDescriptor::builder(name)
            .initializer(|this, _| {
                this.set_attribute("ready", true);
                Ok(Value::None)
            })
            .representation(|this, _| Ok(Value::from(this.class_name())))
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_construct() {
        let mut registry = ClassRegistry::new();
        assert!(registry.is_empty());
        registry.register(class("B")).unwrap();
        registry.register(class("A")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["A", "B"]);

        let a = registry.construct("A").unwrap();
        assert_eq!(a.get_attribute("ready").unwrap(), Value::Bool(true));
        assert_eq!(a.represent().unwrap(), "A");
        assert!(a.is_instance_of(registry.get("A").unwrap()));
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let mut registry = ClassRegistry::new();
        registry.register(class("A")).unwrap();
        let err = registry.register(class("A")).unwrap_err();
        assert_eq!(
            err,
            ObjectError::DuplicateClass {
                name: "A".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_class() {
        let registry = ClassRegistry::new();
        assert!(matches!(
            registry.construct("Nope"),
            Err(ObjectError::ClassNotFound { .. })
        ));
    }
}
