//! Built-in conformance suite
//!
//! Each case declares the classes it needs, drives the object model through
//! its public operations, and checks the results. A case fails on the first
//! unmet expectation or on any object model error it did not expect.

use anyhow::{bail, ensure, Context};
use klass_core::{
    call_method, construct, construct_with, get_attribute, represent, set_attribute, Arity,
    ClassDescriptor, ClassRegistry, ObjResult, ObjectError, Value,
};
use serde::Serialize;
use std::time::Instant;

/// A named conformance check
pub struct Case {
    /// Unique case name
    pub name: &'static str,
    /// One-line summary
    pub description: &'static str,
    check: fn() -> anyhow::Result<()>,
}

/// Outcome of running one case
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: f64,
}

/// All cases, in execution order
pub fn cases() -> Vec<Case> {
    vec![
        Case {
            name: "classes_a",
            description: "initializer shadows the class default; representation is user-defined",
            check: classes_a,
        },
        Case {
            name: "classes_b",
            description: "methods receive instances by reference and return them unchanged",
            check: classes_b,
        },
        Case {
            name: "class_default_visible",
            description: "class attributes are visible until an instance writes its own",
            check: class_default_visible,
        },
        Case {
            name: "write_isolation",
            description: "writes on one instance are invisible to its siblings",
            check: write_isolation,
        },
        Case {
            name: "receiver_binding",
            description: "the receiver is the instance the call was made on",
            check: receiver_binding,
        },
        Case {
            name: "missing_attribute",
            description: "unresolvable attribute reads fail with AttributeNotFound",
            check: missing_attribute,
        },
        Case {
            name: "missing_method",
            description: "unknown method calls fail with MethodNotFound",
            check: missing_method,
        },
        Case {
            name: "arity_mismatch",
            description: "calls with the wrong argument count are rejected",
            check: arity_mismatch,
        },
        Case {
            name: "representation_not_text",
            description: "representation must produce text",
            check: representation_not_text,
        },
        Case {
            name: "declaration_requires_protocol",
            description: "classes must declare an initializer and a representation",
            check: declaration_requires_protocol,
        },
        Case {
            name: "constructor_arguments",
            description: "constructor arguments are forwarded to the initializer",
            check: constructor_arguments,
        },
    ]
}

/// Run a single case, capturing its outcome
pub fn run_case(case: &Case) -> CaseResult {
    let start = Instant::now();
    let outcome = (case.check)();
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    match outcome {
        Ok(()) => {
            tracing::debug!(case = case.name, "passed");
            CaseResult {
                name: case.name.to_string(),
                passed: true,
                error: None,
                duration_ms,
            }
        }
        Err(error) => {
            tracing::debug!(case = case.name, %error, "failed");
            CaseResult {
                name: case.name.to_string(),
                passed: false,
                error: Some(format!("{:#}", error)),
                duration_ms,
            }
        }
    }
}

// ── Classes ──────────────────────────────────────────────────────────────

fn declare_classes() -> ObjResult<ClassRegistry> {
    let a = ClassDescriptor::builder("A")
        .attribute("a", 1)
        .initializer(|this, _| {
            this.set_attribute("a", 2);
            Ok(Value::None)
        })
        .representation(|_, _| Ok(Value::from("foo")))
        .build()?;

    let b = ClassDescriptor::builder("B")
        .attribute("a", 1)
        .initializer(|this, _| {
            this.set_attribute("a", -1);
            Ok(Value::None)
        })
        .representation(|_, _| Ok(Value::from("foob")))
        .method("foo", Arity::Exact(1), |_this, args| Ok(args[0].clone()))
        .build()?;

    let mut registry = ClassRegistry::new();
    registry.register(a)?;
    registry.register(b)?;
    Ok(registry)
}

fn plain_class(name: &str) -> ObjResult<std::sync::Arc<ClassDescriptor>> {
    ClassDescriptor::builder(name)
        .attribute("a", 1)
        .attribute("kind", "plain")
        .initializer(|_, _| Ok(Value::None))
        .representation(|this, _| Ok(Value::from(this.class_name())))
        .method("read", Arity::Exact(0), |this, _| this.get_attribute("a"))
        .build()
}

// ── Cases ────────────────────────────────────────────────────────────────

fn classes_a() -> anyhow::Result<()> {
    let registry = declare_classes()?;
    let a = registry.construct("A")?;

    ensure!(represent(&a)? == "foo", "a.representation() != \"foo\"");
    ensure!(get_attribute(&a, "a")? == Value::Int(2), "a.a != 2");
    Ok(())
}

fn classes_b() -> anyhow::Result<()> {
    let registry = declare_classes()?;
    let a = registry.construct("A")?;
    let b = registry.construct("B")?;

    ensure!(represent(&b)? == "foob", "b.representation() != \"foob\"");

    let returned = call_method(&b, "foo", &[Value::from(&a)])?;
    ensure!(returned == Value::from(&a), "b.foo(a) is not a");
    let returned = returned
        .as_instance()
        .context("b.foo(a) did not return an instance")?;
    ensure!(
        get_attribute(returned, "a")? == get_attribute(&a, "a")?,
        "b.foo(a).a != a.a"
    );
    ensure!(get_attribute(&b, "a")? == Value::Int(-1), "b.a != -1");
    Ok(())
}

fn class_default_visible() -> anyhow::Result<()> {
    let class = plain_class("Plain")?;
    let p = construct(&class)?;

    for name in class.class_attribute_names() {
        let expected = class.class_attribute(name).context("class attribute vanished")?;
        ensure!(
            &get_attribute(&p, name)? == expected,
            "p.{} does not match the class default",
            name
        );
    }

    set_attribute(&p, "a", "shadowed");
    ensure!(get_attribute(&p, "a")? == Value::from("shadowed"), "write not visible");
    ensure!(
        class.class_attribute("a") == Some(&Value::Int(1)),
        "write leaked into the class"
    );
    Ok(())
}

fn write_isolation() -> anyhow::Result<()> {
    let class = plain_class("Plain")?;
    let first = construct(&class)?;
    let second = construct(&class)?;

    set_attribute(&first, "a", 10);
    set_attribute(&first, "extra", true);

    ensure!(get_attribute(&second, "a")? == Value::Int(1), "sibling sees first.a");
    ensure!(
        second.lookup_attribute("extra").is_none(),
        "sibling sees first.extra"
    );
    Ok(())
}

fn receiver_binding() -> anyhow::Result<()> {
    let class = plain_class("Plain")?;
    let shadowed = construct(&class)?;
    let untouched = construct(&class)?;
    set_attribute(&shadowed, "a", 7);

    ensure!(call_method(&shadowed, "read", &[])? == Value::Int(7), "read ignored receiver");
    ensure!(call_method(&untouched, "read", &[])? == Value::Int(1), "read ignored receiver");

    let registry = declare_classes()?;
    let b = registry.construct("B")?;
    let returned = call_method(&b, "foo", &[Value::from(&shadowed)])?;
    let same = returned
        .as_instance()
        .is_some_and(|instance| instance.ptr_eq(&shadowed));
    ensure!(same, "argument identity not preserved");
    Ok(())
}

fn missing_attribute() -> anyhow::Result<()> {
    let registry = declare_classes()?;
    let a = registry.construct("A")?;

    match get_attribute(&a, "b") {
        Err(ObjectError::AttributeNotFound { name, .. }) if name == "b" => Ok(()),
        Err(other) => bail!("unexpected error: {}", other),
        Ok(value) => bail!("a.b resolved to {}", value),
    }
}

fn missing_method() -> anyhow::Result<()> {
    let registry = declare_classes()?;
    let a = registry.construct("A")?;

    // foo is declared on B, not A
    match call_method(&a, "foo", &[]) {
        Err(ObjectError::MethodNotFound { name, .. }) if name == "foo" => Ok(()),
        Err(other) => bail!("unexpected error: {}", other),
        Ok(value) => bail!("a.foo() returned {}", value),
    }
}

fn arity_mismatch() -> anyhow::Result<()> {
    let registry = declare_classes()?;
    let b = registry.construct("B")?;

    match call_method(&b, "foo", &[]) {
        Err(err @ ObjectError::ArityMismatch { .. }) => {
            ensure!(
                err.to_string() == "foo() takes 1 positional argument but 0 were given",
                "unexpected message: {}",
                err
            );
            Ok(())
        }
        Err(other) => bail!("unexpected error: {}", other),
        Ok(value) => bail!("b.foo() returned {}", value),
    }
}

fn representation_not_text() -> anyhow::Result<()> {
    let class = ClassDescriptor::builder("Numeric")
        .initializer(|_, _| Ok(Value::None))
        .representation(|_, _| Ok(Value::Int(3)))
        .build()?;
    let n = construct(&class)?;

    match represent(&n) {
        Err(ObjectError::RepresentationNotText { type_name, .. }) if type_name == "int" => Ok(()),
        Err(other) => bail!("unexpected error: {}", other),
        Ok(text) => bail!("representation returned {:?}", text),
    }
}

fn declaration_requires_protocol() -> anyhow::Result<()> {
    let no_init = ClassDescriptor::builder("NoInit")
        .representation(|_, _| Ok(Value::from("NoInit")))
        .build();
    ensure!(
        matches!(no_init, Err(ObjectError::MissingInitializer { .. })),
        "class without initializer was accepted"
    );

    let no_repr = ClassDescriptor::builder("NoRepr")
        .initializer(|_, _| Ok(Value::None))
        .build();
    ensure!(
        matches!(no_repr, Err(ObjectError::MissingRepresentation { .. })),
        "class without representation was accepted"
    );
    Ok(())
}

fn constructor_arguments() -> anyhow::Result<()> {
    let class = ClassDescriptor::builder("Pair")
        .attribute("left", 0)
        .attribute("right", 0)
        .initializer_with_arity(Arity::Exact(2), |this, args| {
            this.set_attribute("left", args[0].clone());
            this.set_attribute("right", args[1].clone());
            Ok(Value::None)
        })
        .representation(|this, _| {
            Ok(Value::from(format!(
                "Pair({}, {})",
                this.get_attribute("left")?,
                this.get_attribute("right")?
            )))
        })
        .build()?;

    let pair = construct_with(&class, &[Value::Int(1), Value::from("two")])?;
    ensure!(represent(&pair)? == "Pair(1, two)", "arguments not forwarded");

    ensure!(
        matches!(construct(&class), Err(ObjectError::ArityMismatch { .. })),
        "missing constructor arguments were accepted"
    );
    Ok(())
}
