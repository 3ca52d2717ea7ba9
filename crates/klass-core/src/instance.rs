//! Instances, attribute resolution and method dispatch
//!
//! An `Instance` is a cheap, clonable handle. Clones refer to the same object:
//! attribute writes through one handle are visible through every other, and
//! `Value` equality on instances is identity.
//!
//! # Attribute resolution
//!
//! ```text
//! get(k):  instance attributes[k]  ->  class attributes[k]  ->  AttributeNotFound
//! set(k):  instance attributes[k] = v   (class attributes are never written)
//! ```
//!
//! The attribute lock is held only for a single map access and never across a
//! method call, so method bodies may freely read and write their receiver.

use crate::class::{ClassDescriptor, INITIALIZER, REPRESENTATION};
use crate::value::Value;
use crate::{ObjResult, ObjectError};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

struct InstanceData {
    descriptor: Arc<ClassDescriptor>,
    attributes: RwLock<FxHashMap<String, Value>>,
}

/// Handle to an object constructed from a `ClassDescriptor`
#[derive(Clone)]
pub struct Instance(Arc<InstanceData>);

impl Instance {
    /// Allocate an instance with no attributes of its own
    ///
    /// The initializer is not run; use `construct` for that.
    fn allocate(descriptor: Arc<ClassDescriptor>) -> Self {
        Instance(Arc::new(InstanceData {
            descriptor,
            attributes: RwLock::new(FxHashMap::default()),
        }))
    }

    /// The class this instance was constructed from
    pub fn descriptor(&self) -> &Arc<ClassDescriptor> {
        &self.0.descriptor
    }

    /// Name of the instance's class
    pub fn class_name(&self) -> &str {
        self.0.descriptor.name()
    }

    /// Check whether this instance was constructed from `descriptor`
    pub fn is_instance_of(&self, descriptor: &Arc<ClassDescriptor>) -> bool {
        Arc::ptr_eq(&self.0.descriptor, descriptor)
    }

    /// Check whether two handles refer to the same instance
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Resolve an attribute: own attributes first, then the class defaults
    pub fn get_attribute(&self, name: &str) -> ObjResult<Value> {
        self.lookup_attribute(name)
            .ok_or_else(|| ObjectError::AttributeNotFound {
                class: self.class_name().to_string(),
                name: name.to_string(),
            })
    }

    /// Resolve an attribute, returning `None` when neither tier has it
    pub fn lookup_attribute(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.0.attributes.read().get(name) {
            return Some(value.clone());
        }
        self.0.descriptor.class_attribute(name).cloned()
    }

    /// Check whether an attribute resolves in either tier
    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.attributes.read().contains_key(name)
            || self.0.descriptor.class_attribute(name).is_some()
    }

    /// Write an attribute on this instance, shadowing any class default
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.attributes.write().insert(name.into(), value.into());
    }

    /// Names of the attributes stored on this instance, sorted
    pub fn own_attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.attributes.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Names resolvable on this instance from either tier, sorted and deduplicated
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names = self.own_attribute_names();
        names.extend(
            self.0
                .descriptor
                .class_attribute_names()
                .into_iter()
                .map(str::to_string),
        );
        names.sort_unstable();
        names.dedup();
        names
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Call a method from the class method table with `self` as receiver
    ///
    /// Failures raised by the method body propagate unchanged. Attribute writes
    /// the body made before failing are kept.
    pub fn call_method(&self, name: &str, args: &[Value]) -> ObjResult<Value> {
        let descriptor = &self.0.descriptor;
        let method = descriptor
            .method(name)
            .ok_or_else(|| ObjectError::MethodNotFound {
                class: descriptor.name().to_string(),
                name: name.to_string(),
            })?;

        if !method.arity().accepts(args.len()) {
            return Err(ObjectError::ArityMismatch {
                class: descriptor.name().to_string(),
                method: name.to_string(),
                expected: method.arity(),
                given: args.len(),
            });
        }

        trace!(class = descriptor.name(), method = name, argc = args.len(), "dispatch");
        method.invoke(self, args)
    }

    /// Text representation produced by the class's representation method
    pub fn represent(&self) -> ObjResult<String> {
        match self.call_method(REPRESENTATION, &[])? {
            Value::Str(text) => Ok(text.to_string()),
            other => Err(ObjectError::RepresentationNotText {
                class: self.class_name().to_string(),
                type_name: other.type_name(),
            }),
        }
    }
}

impl fmt::Debug for Instance {
    // Attributes may refer back to this instance, so they are not printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Instance({} @ {:p})",
            self.class_name(),
            Arc::as_ptr(&self.0)
        )
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Construct an instance and run its initializer with no arguments
pub fn construct(descriptor: &Arc<ClassDescriptor>) -> ObjResult<Instance> {
    construct_with(descriptor, &[])
}

/// Construct an instance, passing `args` to the initializer
///
/// The initializer's return value is discarded.
pub fn construct_with(descriptor: &Arc<ClassDescriptor>, args: &[Value]) -> ObjResult<Instance> {
    let instance = Instance::allocate(Arc::clone(descriptor));
    trace!(class = descriptor.name(), argc = args.len(), "construct");
    instance.call_method(INITIALIZER, args)?;
    Ok(instance)
}

/// Resolve an attribute on `instance`
pub fn get_attribute(instance: &Instance, name: &str) -> ObjResult<Value> {
    instance.get_attribute(name)
}

/// Write an attribute on `instance`
pub fn set_attribute(instance: &Instance, name: impl Into<String>, value: impl Into<Value>) {
    instance.set_attribute(name, value)
}

/// Call a method on `instance`
pub fn call_method(instance: &Instance, name: &str, args: &[Value]) -> ObjResult<Value> {
    instance.call_method(name, args)
}

/// Text representation of `instance`
pub fn represent(instance: &Instance) -> ObjResult<String> {
    instance.represent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Arity;

    fn counter_class() -> Arc<ClassDescriptor> {
        ClassDescriptor::builder("Counter")
            .attribute("count", 0)
            .attribute("step", 1)
            .initializer(|_, _| Ok(Value::None))
            .representation(|this, _| {
                Ok(Value::from(format!("Counter({})", this.get_attribute("count")?)))
            })
            .method("bump", Arity::Exact(0), |this, _| {
                let count = this.get_attribute("count")?.as_int().unwrap_or(0);
                let step = this.get_attribute("step")?.as_int().unwrap_or(0);
                this.set_attribute("count", count + step);
                Ok(Value::None)
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_class_default_visible_before_write() {
        let counter = construct(&counter_class()).unwrap();
        assert_eq!(counter.get_attribute("count").unwrap(), Value::Int(0));
        assert!(counter.own_attribute_names().is_empty());
    }

    #[test]
    fn test_write_shadows_class_default() {
        let class = counter_class();
        let counter = construct(&class).unwrap();
        counter.set_attribute("count", 10);
        assert_eq!(counter.get_attribute("count").unwrap(), Value::Int(10));
        assert_eq!(class.class_attribute("count"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_missing_attribute() {
        let counter = construct(&counter_class()).unwrap();
        let err = counter.get_attribute("missing").unwrap_err();
        assert_eq!(
            err,
            ObjectError::AttributeNotFound {
                class: "Counter".to_string(),
                name: "missing".to_string(),
            }
        );
        assert!(counter.lookup_attribute("missing").is_none());
        assert!(!counter.has_attribute("missing"));
        assert!(counter.has_attribute("step"));
    }

    #[test]
    fn test_method_reads_and_writes_receiver() {
        let counter = construct(&counter_class()).unwrap();
        counter.set_attribute("step", 5);
        counter.call_method("bump", &[]).unwrap();
        counter.call_method("bump", &[]).unwrap();
        assert_eq!(counter.get_attribute("count").unwrap(), Value::Int(10));
        assert_eq!(counter.represent().unwrap(), "Counter(10)");
    }

    #[test]
    fn test_missing_method() {
        let counter = construct(&counter_class()).unwrap();
        let err = counter.call_method("reset", &[]).unwrap_err();
        assert!(matches!(err, ObjectError::MethodNotFound { ref name, .. } if name == "reset"));
    }

    #[test]
    fn test_arity_checked_before_body_runs() {
        let counter = construct(&counter_class()).unwrap();
        let err = counter.call_method("bump", &[Value::Int(1)]).unwrap_err();
        assert_eq!(
            err,
            ObjectError::ArityMismatch {
                class: "Counter".to_string(),
                method: "bump".to_string(),
                expected: Arity::Exact(0),
                given: 1,
            }
        );
        assert_eq!(counter.get_attribute("count").unwrap(), Value::Int(0));
    }

    #[test]
    fn test_attribute_names_merge_tiers() {
        let counter = construct(&counter_class()).unwrap();
        counter.set_attribute("count", 3);
        counter.set_attribute("label", "c");
        assert_eq!(counter.own_attribute_names(), vec!["count", "label"]);
        assert_eq!(counter.attribute_names(), vec!["count", "label", "step"]);
    }

    #[test]
    fn test_clone_is_same_instance() {
        let class = counter_class();
        let a = construct(&class).unwrap();
        let alias = a.clone();
        let b = construct(&class).unwrap();
        alias.set_attribute("count", 4);
        assert_eq!(a.get_attribute("count").unwrap(), Value::Int(4));
        assert!(a.ptr_eq(&alias));
        assert!(!a.ptr_eq(&b));
        assert!(a.is_instance_of(&class));
    }

    #[test]
    fn test_debug_does_not_recurse_through_self_reference() {
        let counter = construct(&counter_class()).unwrap();
        counter.set_attribute("me", counter.clone());
        let rendered = format!("{:?}", counter);
        assert!(rendered.starts_with("Instance(Counter @ "));
        // break the cycle so the allocation is released
        counter.set_attribute("me", Value::None);
    }

    #[test]
    fn test_handles_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Instance>();
        assert_send_sync::<Value>();
        assert_send_sync::<ClassDescriptor>();
    }

    #[test]
    fn test_method_mutates_receiver_from_another_thread() {
        let counter = construct(&counter_class()).unwrap();
        let remote = counter.clone();

        // bump reads and writes its receiver; the map lock must be released in between
        std::thread::spawn(move || {
            for _ in 0..10 {
                remote.call_method("bump", &[]).unwrap();
            }
        })
        .join()
        .unwrap();

        assert_eq!(counter.get_attribute("count").unwrap(), Value::Int(10));
        assert_eq!(counter.represent().unwrap(), "Counter(10)");
    }
}
