//! Building schema nodes from parsed schema documents.
//!
//! Compilation never fails and never mutates its input: anything
//! malformed degrades to the permissive default of the keyword involved.
//! Unknown keywords are ignored.
use fancy_regex::Regex;
use serde_json::Value;

use crate::ecma;
use crate::node::{AdditionalProperties, Items, PatternProperty, Property, SchemaNode};
use crate::primitive_type::{PrimitiveType, PrimitiveTypesBitMap};

pub(crate) fn compile(schema: &Value) -> SchemaNode {
    let mut node = SchemaNode::default();
    let Some(object) = schema.as_object() else {
        return node;
    };

    if let Some(types) = object.get("type") {
        let mut mask = PrimitiveTypesBitMap::new();
        match types {
            Value::String(name) => add_type(&mut mask, name),
            Value::Array(names) => {
                for name in names {
                    if let Some(name) = name.as_str() {
                        add_type(&mut mask, name);
                    }
                }
            }
            _ => {}
        }
        // An empty or fully unrecognized list would make the node
        // unsatisfiable; fall back to accepting every kind.
        node.types = if mask.is_empty() {
            PrimitiveTypesBitMap::all()
        } else {
            mask
        };
    }

    if let Some(Value::Array(values)) = object.get("enum") {
        if !values.is_empty() {
            node.enumeration = values.clone();
        }
    }

    node.all_of = compile_list(object.get("allOf"));
    node.any_of = compile_list(object.get("anyOf"));
    node.one_of = compile_list(object.get("oneOf"));
    if let Some(value) = object.get("not") {
        node.not = Some(Box::new(compile(value)));
    }

    if let Some(Value::Object(members)) = object.get("properties") {
        node.properties = members
            .iter()
            .map(|(name, value)| Property {
                name: name.clone(),
                schema: compile(value),
                required: false,
                dependencies: None,
            })
            .collect();
    }

    if let Some(Value::Object(members)) = object.get("patternProperties") {
        node.pattern_properties = members
            .iter()
            .map(|(name, value)| PatternProperty {
                pattern: compile_pattern(name),
                schema: compile(value),
            })
            .collect();
    }

    if let Some(Value::Array(names)) = object.get("required") {
        for name in names {
            let index = name
                .as_str()
                .and_then(|name| property_index(&node.properties, name));
            // Names that do not appear in `properties` are ignored.
            if let Some(index) = index {
                node.properties[index].required = true;
                node.required_count += 1;
            }
        }
    }

    if let Some(Value::Object(members)) = object.get("dependencies") {
        node.has_dependencies = true;
        for (name, value) in members {
            let Some(source) = property_index(&node.properties, name) else {
                continue;
            };
            // Only the property-list form is enforced; a schema-valued
            // dependency is accepted and skipped.
            if let Value::Array(targets) = value {
                let mut edges = vec![false; node.properties.len()].into_boxed_slice();
                for target in targets {
                    let target = target
                        .as_str()
                        .and_then(|name| property_index(&node.properties, name));
                    if let Some(target) = target {
                        edges[target] = true;
                    }
                }
                node.properties[source].dependencies = Some(edges);
            }
        }
    }

    match object.get("additionalProperties") {
        Some(Value::Bool(true)) => node.additional_properties = AdditionalProperties::Allowed,
        Some(Value::Bool(false)) => node.additional_properties = AdditionalProperties::Forbidden,
        Some(value @ Value::Object(_)) => {
            node.additional_properties = AdditionalProperties::Schema(Box::new(compile(value)));
        }
        _ => {}
    }

    if let Some(limit) = count_limit(object.get("minProperties")) {
        node.min_properties = limit;
    }
    if let Some(limit) = count_limit(object.get("maxProperties")) {
        node.max_properties = limit;
    }

    match object.get("items") {
        Some(value @ Value::Object(_)) => node.items = Items::List(Box::new(compile(value))),
        Some(Value::Array(schemas)) => {
            node.items = Items::Tuple(schemas.iter().map(compile).collect());
        }
        _ => {}
    }
    // Only the boolean form is honored; a schema-valued `additionalItems`
    // leaves extra elements unconstrained.
    if let Some(Value::Bool(flag)) = object.get("additionalItems") {
        node.additional_items = *flag;
    }
    if let Some(limit) = count_limit(object.get("minItems")) {
        node.min_items = limit;
    }
    if let Some(limit) = count_limit(object.get("maxItems")) {
        node.max_items = limit;
    }

    if let Some(limit) = count_limit(object.get("minLength")) {
        node.min_length = limit;
    }
    if let Some(limit) = count_limit(object.get("maxLength")) {
        node.max_length = limit;
    }
    if let Some(value) = object.get("pattern") {
        node.pattern = value.as_str().and_then(compile_pattern);
    }

    if let Some(limit) = object.get("minimum").and_then(Value::as_f64) {
        node.minimum = limit;
    }
    if let Some(limit) = object.get("maximum").and_then(Value::as_f64) {
        node.maximum = limit;
    }
    if let Some(flag) = object.get("exclusiveMinimum").and_then(Value::as_bool) {
        node.exclusive_minimum = flag;
    }
    if let Some(flag) = object.get("exclusiveMaximum").and_then(Value::as_bool) {
        node.exclusive_maximum = flag;
    }
    if let Some(divisor) = object.get("multipleOf").and_then(Value::as_f64) {
        node.multiple_of = Some(divisor);
    }

    node
}

fn compile_list(value: Option<&Value>) -> Vec<SchemaNode> {
    match value {
        Some(Value::Array(schemas)) if !schemas.is_empty() => {
            schemas.iter().map(compile).collect()
        }
        _ => Vec::new(),
    }
}

fn add_type(mask: &mut PrimitiveTypesBitMap, name: &str) {
    if let Ok(primitive_type) = PrimitiveType::try_from(name) {
        *mask |= primitive_type;
        // `number` admits integers as well.
        if primitive_type == PrimitiveType::Number {
            *mask |= PrimitiveType::Integer;
        }
    }
}

fn property_index(properties: &[Property], name: &str) -> Option<usize> {
    properties.iter().position(|property| property.name == name)
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    Regex::new(&ecma::to_rust_regex(pattern)).ok()
}

fn count_limit(value: Option<&Value>) -> Option<usize> {
    value
        .and_then(Value::as_u64)
        .and_then(|limit| usize::try_from(limit).ok())
}

#[cfg(test)]
mod tests {
    use super::compile;
    use crate::node::{AdditionalProperties, Items};
    use crate::primitive_type::{PrimitiveType, PrimitiveTypesBitMap};
    use serde_json::json;
    use test_case::test_case;

    #[test_case(&json!(5))]
    #[test_case(&json!("x"))]
    #[test_case(&json!(null))]
    #[test_case(&json!([1, 2]))]
    #[test_case(&json!(true))]
    fn non_object_schemas_are_typeless(schema: &serde_json::Value) {
        let node = compile(schema);
        assert_eq!(node.types, PrimitiveTypesBitMap::all());
        assert!(node.enumeration.is_empty());
        assert!(matches!(node.items, Items::None));
        assert!(matches!(
            node.additional_properties,
            AdditionalProperties::Allowed
        ));
        assert!(node.additional_items);
    }

    #[test]
    fn number_implies_integer() {
        let node = compile(&json!({"type": "number"}));
        assert!(node.types.contains(PrimitiveType::Number));
        assert!(node.types.contains(PrimitiveType::Integer));
        assert!(!node.types.contains(PrimitiveType::String));
    }

    #[test]
    fn integer_does_not_imply_number() {
        let node = compile(&json!({"type": "integer"}));
        assert!(node.types.contains(PrimitiveType::Integer));
        assert!(!node.types.contains(PrimitiveType::Number));
    }

    #[test_case(&json!({"type": []}); "empty list")]
    #[test_case(&json!({"type": ["frobnicate"]}); "unrecognized name")]
    #[test_case(&json!({"type": 42}); "not a string or list")]
    fn ill_formed_type_defaults_to_all(schema: &serde_json::Value) {
        assert_eq!(compile(schema).types, PrimitiveTypesBitMap::all());
    }

    #[test]
    fn count_limits_ignore_out_of_range_values() {
        let node = compile(&json!({"minItems": 2, "maxItems": 4}));
        assert_eq!(node.min_items, 2);
        assert_eq!(node.max_items, 4);

        let node = compile(&json!({"minItems": -1, "maxLength": 2.5, "minProperties": "3"}));
        assert_eq!(node.min_items, 0);
        assert_eq!(node.max_length, usize::MAX);
        assert_eq!(node.min_properties, 0);
    }

    #[test]
    fn required_names_missing_from_properties_are_ignored() {
        let node = compile(&json!({
            "properties": {"a": {}, "b": {}},
            "required": ["a", "zz"]
        }));
        assert_eq!(node.required_count, 1);
        assert!(node.properties[0].required);
        assert!(!node.properties[1].required);
    }

    #[test]
    fn dependencies_resolve_to_property_indices() {
        let node = compile(&json!({
            "properties": {"a": {}, "b": {}, "c": {}},
            "dependencies": {"a": ["c", "unknown"], "missing": ["b"]}
        }));
        assert!(node.has_dependencies);
        let edges = node.properties[0].dependencies.as_ref().unwrap();
        assert_eq!(&**edges, &[false, false, true]);
        assert!(node.properties[1].dependencies.is_none());
    }

    #[test]
    fn schema_valued_dependencies_are_accepted_but_not_enforced() {
        let node = compile(&json!({
            "properties": {"a": {}},
            "dependencies": {"a": {"minProperties": 2}}
        }));
        assert!(node.has_dependencies);
        assert!(node.properties[0].dependencies.is_none());
    }

    #[test]
    fn malformed_patterns_compile_to_none() {
        let node = compile(&json!({"pattern": "[unclosed"}));
        assert!(node.pattern.is_none());

        let node = compile(&json!({"patternProperties": {"[oops": {}, "^ok": {}}}));
        assert!(node.pattern_properties[0].pattern.is_none());
        assert!(node.pattern_properties[1].pattern.is_some());
    }

    #[test]
    fn pattern_must_be_a_string() {
        assert!(compile(&json!({"pattern": 42})).pattern.is_none());
    }

    #[test]
    fn items_forms() {
        assert!(matches!(compile(&json!({})).items, Items::None));
        assert!(matches!(
            compile(&json!({"items": {"type": "integer"}})).items,
            Items::List(_)
        ));
        match compile(&json!({"items": [{}, {}]})).items {
            Items::Tuple(schemas) => assert_eq!(schemas.len(), 2),
            other => panic!("expected a tuple, got {other:?}"),
        }
    }

    #[test]
    fn schema_valued_additional_items_is_treated_as_allowed() {
        let node = compile(&json!({"additionalItems": {"type": "integer"}}));
        assert!(node.additional_items);
    }

    #[test]
    fn empty_enum_is_ignored() {
        assert!(compile(&json!({"enum": []})).enumeration.is_empty());
    }

    #[test]
    fn empty_combinator_lists_are_ignored() {
        let node = compile(&json!({"allOf": [], "anyOf": [], "oneOf": []}));
        assert!(node.all_of.is_empty());
        assert!(node.any_of.is_empty());
        assert!(node.one_of.is_empty());
    }

    #[test]
    fn numeric_bounds() {
        let node = compile(&json!({"minimum": 1.5, "maximum": 10, "exclusiveMaximum": true}));
        assert_eq!(node.minimum, 1.5);
        assert_eq!(node.maximum, 10.0);
        assert!(!node.exclusive_minimum);
        assert!(node.exclusive_maximum);

        // Draft 6 numeric `exclusiveMinimum` is not a boolean and is ignored.
        let node = compile(&json!({"exclusiveMinimum": 3}));
        assert!(!node.exclusive_minimum);
        assert_eq!(node.minimum, f64::NEG_INFINITY);
    }

    #[test]
    fn compilation_does_not_mutate_the_input() {
        let schema = json!({"type": "object", "properties": {"a": {"enum": [1]}}});
        let copy = schema.clone();
        let _ = compile(&schema);
        assert_eq!(schema, copy);
    }
}
