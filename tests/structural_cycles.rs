//! Structural Cycle Tests
//!
//! - A struct may not contain itself by value, directly or transitively
//! - Optional, sequence, dictionary, proxy and class references break cycles
//! - Exception, class and interface inheritance must be acyclic
//! - Types in one unit may reference each other in any order

use serde_json::{json, Value};
use typeload::registry::{TypeRef, TypeRegistry};
use typeload::schema::{load_schema, LoadError};

// =============================================================================
// Helper Functions
// =============================================================================

fn load(definitions: Value) -> (std::sync::Arc<TypeRegistry>, Result<Vec<String>, LoadError>) {
    let registry = TypeRegistry::shared();
    let text = json!({ "modules": [{ "name": "C", "definitions": definitions }] }).to_string();
    let result = load_schema(&registry, &text, &[]);
    (registry, result)
}

fn path(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

// =============================================================================
// By-Value Containment
// =============================================================================

#[test]
fn test_struct_containing_itself_by_value() {
    let (registry, result) = load(json!([
        { "kind": "struct", "name": "Node", "members": [
            { "name": "value", "type": "int" }, { "name": "next", "type": "Node" }
        ]}
    ]));

    assert_eq!(result.unwrap_err(), LoadError::cycle(path(&["::C::Node", "::C::Node"])));
    assert!(registry.is_empty());
}

#[test]
fn test_transitive_containment_through_two_structs() {
    let (registry, result) = load(json!([
        { "kind": "struct", "name": "A", "members": [{ "name": "b", "type": "B" }] },
        { "kind": "struct", "name": "B", "members": [{ "name": "a", "type": "A" }] }
    ]));

    let err = result.unwrap_err();
    assert_eq!(err.code(), "SCHEMA_STRUCTURAL_CYCLE");
    assert_eq!(err, LoadError::cycle(path(&["::C::A", "::C::B", "::C::A"])));
    assert!(registry.is_empty());
}

#[test]
fn test_optional_self_reference_loads() {
    let (registry, result) = load(json!([
        { "kind": "struct", "name": "Node", "members": [
            { "name": "value", "type": "int" }, { "name": "next", "type": "optional<Node>" }
        ]}
    ]));

    result.unwrap();
    let node = registry.lookup("::C::Node").unwrap();
    assert_eq!(
        node.members()[1].ty,
        TypeRef::Optional(Box::new(TypeRef::Named("::C::Node".into())))
    );
}

#[test]
fn test_sequence_and_dictionary_break_containment() {
    let (_, result) = load(json!([
        { "kind": "sequence", "name": "Children", "element": "Tree" },
        { "kind": "dictionary", "name": "Index", "key": "string", "value": "Tree" },
        { "kind": "struct", "name": "Tree", "members": [
            { "name": "children", "type": "Children" },
            { "name": "index", "type": "Index" },
            { "name": "inline", "type": "sequence<Tree>" }
        ]}
    ]));

    assert_eq!(result.unwrap().len(), 3);
}

#[test]
fn test_proxy_and_class_references_load() {
    let (_, result) = load(json!([
        { "kind": "interface", "name": "Peer", "operations": [{ "name": "state", "returns": "State" }] },
        { "kind": "struct", "name": "State", "members": [
            { "name": "owner", "type": "Peer*" },
            { "name": "model", "type": "Model" }
        ]},
        { "kind": "class", "name": "Model", "members": [{ "name": "state", "type": "State" }] }
    ]));

    assert_eq!(result.unwrap(), vec!["::C::Peer", "::C::State", "::C::Model"]);
}

// =============================================================================
// Inheritance
// =============================================================================

#[test]
fn test_exception_base_cycle() {
    let (registry, result) = load(json!([
        { "kind": "exception", "name": "A", "base": "C" },
        { "kind": "exception", "name": "B", "base": "A" },
        { "kind": "exception", "name": "C", "base": "B" }
    ]));

    let err = result.unwrap_err();
    assert_eq!(
        err,
        LoadError::cycle(path(&["::C::A", "::C::C", "::C::B", "::C::A"]))
    );
    assert!(registry.is_empty());
}

#[test]
fn test_class_extending_itself() {
    let (_, result) = load(json!([
        { "kind": "class", "name": "Loop", "base": "Loop" }
    ]));

    assert_eq!(result.unwrap_err(), LoadError::cycle(path(&["::C::Loop", "::C::Loop"])));
}

#[test]
fn test_interface_inheritance_cycle() {
    let (_, result) = load(json!([
        { "kind": "interface", "name": "I", "bases": ["J"] },
        { "kind": "interface", "name": "J", "bases": ["I"] }
    ]));

    assert_eq!(result.unwrap_err().code(), "SCHEMA_STRUCTURAL_CYCLE");
}

#[test]
fn test_mutually_referencing_interfaces_load() {
    let (registry, result) = load(json!([
        { "kind": "interface", "name": "Client", "operations": [
            { "name": "server", "returns": "Server*" }
        ]},
        { "kind": "interface", "name": "Server", "operations": [
            { "name": "register", "params": [{ "name": "client", "type": "Client*" }] }
        ]}
    ]));

    result.unwrap();
    let server = registry.lookup("::C::Server").unwrap();
    assert_eq!(
        server.operations()[0].params[0].ty,
        TypeRef::Proxy("::C::Client".into())
    );
}

#[test]
fn test_deep_exception_chain_is_not_a_cycle() {
    let mut definitions = vec![json!({ "kind": "exception", "name": "E0" })];
    for i in 1..200 {
        definitions.push(json!({
            "kind": "exception",
            "name": format!("E{}", i),
            "base": format!("E{}", i - 1)
        }));
    }

    let (registry, result) = load(Value::Array(definitions));

    assert_eq!(result.unwrap().len(), 200);
    assert_eq!(registry.lookup("::C::E199").unwrap().base(), Some("::C::E198"));
}

// =============================================================================
// Inherited Names
// =============================================================================

#[test]
fn test_redeclaring_inherited_operation() {
    let (_, result) = load(json!([
        { "kind": "interface", "name": "Base", "operations": [{ "name": "ping" }] },
        { "kind": "interface", "name": "Derived", "bases": ["Base"], "operations": [{ "name": "ping" }] }
    ]));

    assert_eq!(
        result.unwrap_err(),
        LoadError::name_collision("::C::Derived::ping")
    );
}

#[test]
fn test_shadowing_inherited_member() {
    let (_, result) = load(json!([
        { "kind": "exception", "name": "Base", "members": [{ "name": "reason", "type": "string" }] },
        { "kind": "exception", "name": "Derived", "base": "Base", "members": [{ "name": "reason", "type": "string" }] }
    ]));

    assert_eq!(
        result.unwrap_err(),
        LoadError::name_collision("::C::Derived::reason")
    );
}
