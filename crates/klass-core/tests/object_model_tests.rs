//! Integration tests for the object model
//!
//! Tests cover:
//! - Class defaults and instance shadowing
//! - Write isolation between sibling instances
//! - Receiver binding and instance arguments passed by reference
//! - The representation protocol
//! - Construction with initializer arguments

use klass_core::{
    call_method, construct, construct_with, get_attribute, represent, set_attribute, Arity,
    ClassDescriptor, ClassRegistry, Instance, ObjectError, Value,
};
use std::sync::Arc;

fn class_a() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("A")
        .attribute("a", 1)
        .initializer(|this, _| {
            this.set_attribute("a", 2);
            Ok(Value::None)
        })
        .representation(|_, _| Ok(Value::from("foo")))
        .build()
        .unwrap()
}

fn class_b() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("B")
        .attribute("a", 1)
        .initializer(|this, _| {
            this.set_attribute("a", -1);
            Ok(Value::None)
        })
        .representation(|_, _| Ok(Value::from("foob")))
        .method("foo", Arity::Exact(1), |_this, args| Ok(args[0].clone()))
        .build()
        .unwrap()
}

// ────────────────────────────────────────────────────────────────────────────
// Classes scenario
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_class_a_scenario() {
    let a1 = construct(&class_a()).unwrap();
    assert_eq!(represent(&a1).unwrap(), "foo");
    assert_eq!(get_attribute(&a1, "a").unwrap(), Value::Int(2));
}

#[test]
fn test_class_b_scenario() {
    let a1 = construct(&class_a()).unwrap();
    let b1 = construct(&class_b()).unwrap();

    assert_eq!(represent(&b1).unwrap(), "foob");

    let returned = call_method(&b1, "foo", &[Value::from(&a1)]).unwrap();
    assert_eq!(returned, Value::from(&a1));

    let returned = returned.as_instance().unwrap();
    assert!(returned.ptr_eq(&a1));
    assert_eq!(
        get_attribute(returned, "a").unwrap(),
        get_attribute(&a1, "a").unwrap()
    );
    assert_eq!(get_attribute(returned, "a").unwrap(), Value::Int(2));

    assert_eq!(get_attribute(&b1, "a").unwrap(), Value::Int(-1));
}

// ────────────────────────────────────────────────────────────────────────────
// Attribute resolution
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_class_defaults_visible_before_any_write() {
    let plain = ClassDescriptor::builder("Plain")
        .attribute("a", 1)
        .attribute("name", "plain")
        .attribute("ratio", 0.5)
        .initializer(|_, _| Ok(Value::None))
        .representation(|_, _| Ok(Value::from("Plain")))
        .build()
        .unwrap();
    let p = construct(&plain).unwrap();

    for name in plain.class_attribute_names() {
        assert_eq!(
            &get_attribute(&p, name).unwrap(),
            plain.class_attribute(name).unwrap()
        );
    }
}

#[test]
fn test_write_then_read_is_independent_of_class_default() {
    let a1 = construct(&class_a()).unwrap();
    for value in [Value::Int(1), Value::str("text"), Value::None, Value::Float(2.5)] {
        set_attribute(&a1, "a", value.clone());
        assert_eq!(get_attribute(&a1, "a").unwrap(), value);
    }
    set_attribute(&a1, "fresh", true);
    assert_eq!(get_attribute(&a1, "fresh").unwrap(), Value::Bool(true));
}

#[test]
fn test_write_isolation_between_siblings() {
    let class = class_a();
    let first = construct(&class).unwrap();
    let second = construct(&class).unwrap();

    set_attribute(&first, "a", 100);
    set_attribute(&first, "only_first", 1);

    assert_eq!(get_attribute(&second, "a").unwrap(), Value::Int(2));
    assert!(matches!(
        get_attribute(&second, "only_first"),
        Err(ObjectError::AttributeNotFound { .. })
    ));
    assert_eq!(class.class_attribute("a"), Some(&Value::Int(1)));
}

#[test]
fn test_initializer_effects_are_per_instance() {
    let class = ClassDescriptor::builder("Labelled")
        .attribute("label", "default")
        .initializer_with_arity(Arity::Exact(1), |this, args| {
            this.set_attribute("label", args[0].clone());
            Ok(Value::None)
        })
        .representation(|this, _| Ok(Value::from(this.get_attribute("label")?.to_string())))
        .build()
        .unwrap();

    let left = construct_with(&class, &[Value::from("left")]).unwrap();
    let right = construct_with(&class, &[Value::from("right")]).unwrap();

    assert_eq!(represent(&left).unwrap(), "left");
    assert_eq!(represent(&right).unwrap(), "right");

    let err = construct(&class).unwrap_err();
    assert_eq!(
        err.to_string(),
        "initializer() takes 1 positional argument but 0 were given"
    );
}

#[test]
fn test_attribute_holding_an_instance() {
    let a1 = construct(&class_a()).unwrap();
    let b1 = construct(&class_b()).unwrap();
    set_attribute(&b1, "peer", &a1);

    let peer = get_attribute(&b1, "peer").unwrap();
    assert_eq!(peer, Value::from(&a1));

    // Identity, not structure: a fresh A with equal attributes is a different value.
    let other = construct(&class_a()).unwrap();
    assert_ne!(peer, Value::from(&other));

    // Mutation through the attribute is visible on the original.
    set_attribute(peer.as_instance().unwrap(), "a", 9);
    assert_eq!(get_attribute(&a1, "a").unwrap(), Value::Int(9));
}

// ────────────────────────────────────────────────────────────────────────────
// Dispatch
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_receiver_is_the_calling_instance() {
    let class = ClassDescriptor::builder("Reader")
        .attribute("a", 1)
        .initializer(|_, _| Ok(Value::None))
        .representation(|_, _| Ok(Value::from("Reader")))
        .method("read", Arity::Exact(0), |this, _| this.get_attribute("a"))
        .method("me", Arity::Exact(0), |this, _| Ok(Value::from(this)))
        .build()
        .unwrap();

    let shadowed = construct(&class).unwrap();
    let untouched = construct(&class).unwrap();
    set_attribute(&shadowed, "a", 42);

    assert_eq!(call_method(&shadowed, "read", &[]).unwrap(), Value::Int(42));
    assert_eq!(call_method(&untouched, "read", &[]).unwrap(), Value::Int(1));
    assert_eq!(
        call_method(&shadowed, "me", &[]).unwrap(),
        Value::from(&shadowed)
    );
}

#[test]
fn test_arguments_keep_their_order() {
    let class = ClassDescriptor::builder("Joiner")
        .initializer(|_, _| Ok(Value::None))
        .representation(|_, _| Ok(Value::from("Joiner")))
        .method("join", Arity::AtLeast(0), |_, args| {
            let parts: Vec<String> = args.iter().map(|v| v.to_string()).collect();
            Ok(Value::from(parts.join(",")))
        })
        .build()
        .unwrap();
    let joiner = construct(&class).unwrap();

    let joined = call_method(
        &joiner,
        "join",
        &[Value::Int(1), Value::from("two"), Value::Bool(true)],
    )
    .unwrap();
    assert_eq!(joined, Value::from("1,two,True"));
}

#[test]
fn test_method_calling_another_method_on_an_argument() {
    let b1 = construct(&class_b()).unwrap();
    let greeter = ClassDescriptor::builder("Greeter")
        .initializer(|_, _| Ok(Value::None))
        .representation(|_, _| Ok(Value::from("Greeter")))
        .method("describe", Arity::Exact(1), |_, args| {
            let other: &Instance = args[0]
                .as_instance()
                .ok_or_else(|| ObjectError::raised("describe() expects an instance"))?;
            Ok(Value::from(format!("<{}>", other.represent()?)))
        })
        .build()
        .unwrap();
    let g = construct(&greeter).unwrap();

    assert_eq!(
        call_method(&g, "describe", &[Value::from(&b1)]).unwrap(),
        Value::from("<foob>")
    );
    assert_eq!(
        call_method(&g, "describe", &[Value::Int(3)]).unwrap_err(),
        ObjectError::raised("describe() expects an instance")
    );
}

#[test]
fn test_failed_method_keeps_earlier_writes() {
    let class = ClassDescriptor::builder("Partial")
        .initializer(|_, _| Ok(Value::None))
        .representation(|_, _| Ok(Value::from("Partial")))
        .method("half", Arity::Exact(0), |this, _| {
            this.set_attribute("written", 1);
            this.get_attribute("never_set")
        })
        .build()
        .unwrap();
    let p = construct(&class).unwrap();

    let err = call_method(&p, "half", &[]).unwrap_err();
    assert!(matches!(err, ObjectError::AttributeNotFound { ref name, .. } if name == "never_set"));
    assert_eq!(get_attribute(&p, "written").unwrap(), Value::Int(1));
}

#[test]
fn test_initializer_failure_aborts_construction() {
    let class = ClassDescriptor::builder("Broken")
        .initializer(|_, _| Err(ObjectError::raised("cannot initialize")))
        .representation(|_, _| Ok(Value::from("Broken")))
        .build()
        .unwrap();
    assert_eq!(
        construct(&class).unwrap_err(),
        ObjectError::raised("cannot initialize")
    );
}

#[test]
fn test_initializer_return_value_is_discarded() {
    let class = ClassDescriptor::builder("Returns")
        .initializer(|_, _| Ok(Value::Int(5)))
        .representation(|_, _| Ok(Value::from("Returns")))
        .build()
        .unwrap();
    let r = construct(&class).unwrap();
    assert_eq!(represent(&r).unwrap(), "Returns");
}

// ────────────────────────────────────────────────────────────────────────────
// Representation
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_represent_matches_representation_method() {
    let a1 = construct(&class_a()).unwrap();
    assert_eq!(
        call_method(&a1, "representation", &[]).unwrap(),
        Value::from(represent(&a1).unwrap())
    );
}

#[test]
fn test_representation_must_be_text() {
    let class = ClassDescriptor::builder("Numeric")
        .initializer(|_, _| Ok(Value::None))
        .representation(|_, _| Ok(Value::Int(1)))
        .build()
        .unwrap();
    let n = construct(&class).unwrap();
    assert_eq!(
        represent(&n).unwrap_err(),
        ObjectError::RepresentationNotText {
            class: "Numeric".to_string(),
            type_name: "int".to_string(),
        }
    );
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_registry_constructs_declared_classes() {
    let mut registry = ClassRegistry::new();
    registry.register(class_a()).unwrap();
    registry.register(class_b()).unwrap();

    let a1 = registry.construct("A").unwrap();
    let b1 = registry.construct("B").unwrap();
    let returned = b1.call_method("foo", &[Value::from(&a1)]).unwrap();
    assert!(returned.as_instance().unwrap().ptr_eq(&a1));
}

#[test]
fn test_descriptors_shared_across_threads() {
    let class = class_a();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let class = Arc::clone(&class);
            std::thread::spawn(move || {
                let instance = construct(&class).unwrap();
                set_attribute(&instance, "a", i);
                get_attribute(&instance, "a").unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Value::Int(i as i64));
    }
    assert_eq!(class.class_attribute("a"), Some(&Value::Int(1)));
}
