//! Klass Object Model
//!
//! This crate provides a minimal class/instance object model:
//! - Class descriptors with shared class-level attributes and a method table
//! - Instances with their own attributes shadowing the class defaults
//! - Method dispatch with an explicit receiver
//! - Construction through an initializer and a representation protocol
//!
//! # Example
//!
//! ```
//! use klass_core::{construct, ClassDescriptor, ObjResult, Value};
//!
//! # fn main() -> ObjResult<()> {
//! let point = ClassDescriptor::builder("Point")
//!     .attribute("x", 0)
//!     .initializer(|this, _args| {
//!         this.set_attribute("x", 2);
//!         Ok(Value::None)
//!     })
//!     .representation(|_this, _args| Ok(Value::from("Point")))
//!     .build()?;
//!
//! let p = construct(&point)?;
//! assert_eq!(p.get_attribute("x")?, Value::Int(2));
//! assert_eq!(p.represent()?, "Point");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod class;
pub mod instance;
pub mod registry;
pub mod value;

pub use class::{Arity, ClassBuilder, ClassDescriptor, Method, MethodFn, INITIALIZER, REPRESENTATION};
pub use instance::{
    call_method, construct, construct_with, get_attribute, represent, set_attribute, Instance,
};
pub use registry::ClassRegistry;
pub use value::Value;

/// Object model errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObjectError {
    /// Attribute resolved in neither the instance nor the class
    #[error("'{class}' object has no attribute '{name}'")]
    AttributeNotFound {
        /// Class of the instance the lookup was made on
        class: String,
        /// Attribute name
        name: String,
    },

    /// Method not present in the class method table
    #[error("'{class}' object has no method '{name}'")]
    MethodNotFound {
        /// Class of the receiver
        class: String,
        /// Method name
        name: String,
    },

    /// Wrong number of positional arguments for a method
    #[error("{method}() takes {expected} but {} given", given_phrase(.given))]
    ArityMismatch {
        /// Class of the receiver
        class: String,
        /// Method name
        method: String,
        /// Declared arity (receiver excluded)
        expected: Arity,
        /// Number of positional arguments supplied
        given: usize,
    },

    /// Representation method returned something other than text
    #[error("representation of '{class}' returned non-text value of type '{type_name}'")]
    RepresentationNotText {
        /// Class of the receiver
        class: String,
        /// Type name of the returned value
        type_name: String,
    },

    /// Class declared without an initializer
    #[error("class '{class}' does not define an initializer")]
    MissingInitializer {
        /// Class name
        class: String,
    },

    /// Class declared without a representation method
    #[error("class '{class}' does not define a representation method")]
    MissingRepresentation {
        /// Class name
        class: String,
    },

    /// Attribute or method declared twice in one class
    #[error("class '{class}' declares '{name}' more than once")]
    DuplicateMember {
        /// Class name
        class: String,
        /// Member name
        name: String,
    },

    /// Malformed class declaration
    #[error("Invalid class declaration: {0}")]
    InvalidDeclaration(String),

    /// Class name already registered
    #[error("class '{name}' is already registered")]
    DuplicateClass {
        /// Class name
        name: String,
    },

    /// Class name not registered
    #[error("class '{name}' is not registered")]
    ClassNotFound {
        /// Class name
        name: String,
    },

    /// Failure raised by a method body
    #[error("{0}")]
    Raised(String),
}

impl ObjectError {
    /// Create an error raised from inside a method body
    pub fn raised(message: impl Into<String>) -> Self {
        ObjectError::Raised(message.into())
    }
}

fn given_phrase(given: &usize) -> String {
    match given {
        1 => "1 was".to_string(),
        n => format!("{} were", n),
    }
}

/// Object model result
pub type ObjResult<T> = Result<T, ObjectError>;
