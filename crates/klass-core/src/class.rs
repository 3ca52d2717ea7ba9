//! Class descriptors and their declaration
//!
//! A `ClassDescriptor` is the immutable template shared by every instance of a
//! class: class-level attribute defaults plus a method table. Descriptors are
//! declared through a `ClassBuilder` and frozen behind an `Arc` by
//! `ClassBuilder::build`, after which neither map changes again.

use crate::instance::Instance;
use crate::value::Value;
use crate::{ObjResult, ObjectError};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Name of the method invoked on every newly allocated instance
pub const INITIALIZER: &str = "initializer";

/// Name of the method producing an instance's text representation
pub const REPRESENTATION: &str = "representation";

/// Method body signature: receiver first, then the positional arguments
pub type MethodFn = dyn Fn(&Instance, &[Value]) -> ObjResult<Value> + Send + Sync;

/// Number of positional arguments a method accepts (receiver excluded)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments
    Exact(usize),
    /// This many arguments or more
    AtLeast(usize),
}

impl Arity {
    /// Check whether `count` arguments satisfy this arity
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, n) = match self {
            Arity::Exact(n) => ("", *n),
            Arity::AtLeast(n) => ("at least ", *n),
        };
        let noun = if n == 1 { "argument" } else { "arguments" };
        write!(f, "{}{} positional {}", prefix, n, noun)
    }
}

/// An entry in a class method table
#[derive(Clone)]
pub struct Method {
    name: String,
    arity: Arity,
    body: Arc<MethodFn>,
}

impl Method {
    /// Create a method from a name, an arity and a body
    pub fn new<F>(name: impl Into<String>, arity: Arity, body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> ObjResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            body: Arc::new(body),
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared arity
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Run the body with `receiver` bound as the first parameter
    ///
    /// Arity is not checked here; see `Instance::call_method`.
    pub fn invoke(&self, receiver: &Instance, args: &[Value]) -> ObjResult<Value> {
        (self.body)(receiver, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Immutable class template
pub struct ClassDescriptor {
    name: String,
    attributes: FxHashMap<String, Value>,
    methods: FxHashMap<String, Method>,
}

impl ClassDescriptor {
    /// Start declaring a class
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a class-level attribute default
    pub fn class_attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Names of all class-level attributes, sorted
    pub fn class_attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get a method from the method table
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Check if the method table has `name`
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Names of all methods, sorted
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("attributes", &self.class_attribute_names())
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Builder for a `ClassDescriptor`
///
/// Declaration errors are recorded as they happen and reported by `build`.
pub struct ClassBuilder {
    name: String,
    attributes: FxHashMap<String, Value>,
    methods: FxHashMap<String, Method>,
    error: Option<ObjectError>,
}

impl ClassBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: FxHashMap::default(),
            methods: FxHashMap::default(),
            error: None,
        }
    }

    /// Declare a class-level attribute default
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        if self.attributes.contains_key(&name) {
            self.record_duplicate(name);
        } else {
            self.attributes.insert(name, value.into());
        }
        self
    }

    /// Declare a method taking `arity` positional arguments after the receiver
    pub fn method<F>(mut self, name: impl Into<String>, arity: Arity, body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> ObjResult<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.methods.contains_key(&name) {
            self.record_duplicate(name);
        } else {
            self.methods
                .insert(name.clone(), Method::new(name, arity, body));
        }
        self
    }

    /// Declare an initializer taking no arguments
    pub fn initializer<F>(self, body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> ObjResult<Value> + Send + Sync + 'static,
    {
        self.method(INITIALIZER, Arity::Exact(0), body)
    }

    /// Declare an initializer taking constructor arguments
    pub fn initializer_with_arity<F>(self, arity: Arity, body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> ObjResult<Value> + Send + Sync + 'static,
    {
        self.method(INITIALIZER, arity, body)
    }

    /// Declare the representation method
    pub fn representation<F>(self, body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> ObjResult<Value> + Send + Sync + 'static,
    {
        self.method(REPRESENTATION, Arity::Exact(0), body)
    }

    fn record_duplicate(&mut self, name: String) {
        if self.error.is_none() {
            self.error = Some(ObjectError::DuplicateMember {
                class: self.name.clone(),
                name,
            });
        }
    }

    /// Validate and freeze the declaration
    pub fn build(self) -> ObjResult<Arc<ClassDescriptor>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.name.is_empty() {
            return Err(ObjectError::InvalidDeclaration(
                "class name cannot be empty".to_string(),
            ));
        }
        if !self.methods.contains_key(INITIALIZER) {
            return Err(ObjectError::MissingInitializer { class: self.name });
        }
        if !self.methods.contains_key(REPRESENTATION) {
            return Err(ObjectError::MissingRepresentation { class: self.name });
        }

        tracing::debug!(
            class = %self.name,
            attributes = self.attributes.len(),
            methods = self.methods.len(),
            "declared class"
        );

        Ok(Arc::new(ClassDescriptor {
            name: self.name,
            attributes: self.attributes,
            methods: self.methods,
        }))
    }
}
