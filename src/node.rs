//! Compiled schema nodes and their per-event validation operations.
//!
//! A node is built once by the compiler, stays immutable afterwards and
//! exclusively owns every child node reachable through it. All runtime
//! state lives in the [`Context`] that accompanies each event call.
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::{
    context::Context,
    helpers,
    primitive_type::{PrimitiveType, PrimitiveTypesBitMap},
    validator::Validator,
};

/// Shared node equivalent to the empty schema `{}`, used wherever a value
/// has to be accepted without constraints (additional properties, array
/// elements beyond a tuple, and so on). Referenced, never owned.
static TYPELESS: Lazy<SchemaNode> = Lazy::new(SchemaNode::default);

pub(crate) fn typeless() -> &'static SchemaNode {
    &TYPELESS
}

/// One named member of `properties`, together with the flags attached to
/// it by `required` and `dependencies`.
#[derive(Debug)]
pub(crate) struct Property {
    pub(crate) name: String,
    pub(crate) schema: SchemaNode,
    pub(crate) required: bool,
    /// Sibling properties (by index) that must also be present whenever
    /// this one appears.
    pub(crate) dependencies: Option<Box<[bool]>>,
}

#[derive(Debug)]
pub(crate) struct PatternProperty {
    /// `None` when the source pattern failed to compile; such entries
    /// never match.
    pub(crate) pattern: Option<fancy_regex::Regex>,
    pub(crate) schema: SchemaNode,
}

#[derive(Debug)]
pub(crate) enum AdditionalProperties {
    Allowed,
    Forbidden,
    Schema(Box<SchemaNode>),
}

#[derive(Debug)]
pub(crate) enum Items {
    None,
    /// A single schema applied to every element.
    List(Box<SchemaNode>),
    /// Positional schemas; elements beyond the tuple length fall under
    /// the `additionalItems` policy.
    Tuple(Vec<SchemaNode>),
}

/// The immutable compiled form of one schema object.
#[derive(Debug)]
pub(crate) struct SchemaNode {
    pub(crate) types: PrimitiveTypesBitMap,
    pub(crate) enumeration: Vec<Value>,
    pub(crate) all_of: Vec<SchemaNode>,
    pub(crate) any_of: Vec<SchemaNode>,
    pub(crate) one_of: Vec<SchemaNode>,
    pub(crate) not: Option<Box<SchemaNode>>,
    pub(crate) properties: Vec<Property>,
    pub(crate) required_count: usize,
    pub(crate) has_dependencies: bool,
    pub(crate) pattern_properties: Vec<PatternProperty>,
    pub(crate) additional_properties: AdditionalProperties,
    pub(crate) min_properties: usize,
    pub(crate) max_properties: usize,
    pub(crate) items: Items,
    pub(crate) additional_items: bool,
    pub(crate) min_items: usize,
    pub(crate) max_items: usize,
    pub(crate) pattern: Option<fancy_regex::Regex>,
    pub(crate) min_length: usize,
    pub(crate) max_length: usize,
    pub(crate) minimum: f64,
    pub(crate) maximum: f64,
    pub(crate) exclusive_minimum: bool,
    pub(crate) exclusive_maximum: bool,
    pub(crate) multiple_of: Option<f64>,
}

impl Default for SchemaNode {
    fn default() -> SchemaNode {
        SchemaNode {
            types: PrimitiveTypesBitMap::all(),
            enumeration: Vec::new(),
            all_of: Vec::new(),
            any_of: Vec::new(),
            one_of: Vec::new(),
            not: None,
            properties: Vec::new(),
            required_count: 0,
            has_dependencies: false,
            pattern_properties: Vec::new(),
            additional_properties: AdditionalProperties::Allowed,
            min_properties: 0,
            max_properties: usize::MAX,
            items: Items::None,
            additional_items: true,
            min_items: 0,
            max_items: usize::MAX,
            pattern: None,
            min_length: 0,
            max_length: usize::MAX,
            minimum: f64::NEG_INFINITY,
            maximum: f64::INFINITY,
            exclusive_minimum: false,
            exclusive_maximum: false,
            multiple_of: None,
        }
    }
}

impl SchemaNode {
    /// Array-element lookahead: decides which schema governs the next
    /// value of the array tracked by `ctx`. Outside arrays the lookahead
    /// is driven by `key` instead and this is a no-op.
    pub(crate) fn begin_value<'s>(&'s self, ctx: &mut Context<'s>) -> bool {
        if ctx.in_array {
            match &self.items {
                Items::List(schema) => ctx.value_schema = Some(schema),
                Items::Tuple(schemas) => {
                    if let Some(schema) = schemas.get(ctx.element_index) {
                        ctx.value_schema = Some(schema);
                    } else if self.additional_items {
                        ctx.value_schema = Some(typeless());
                    } else {
                        return false;
                    }
                }
                Items::None => ctx.value_schema = Some(typeless()),
            }
            ctx.element_index += 1;
        }
        true
    }

    /// Combinator verdicts, evaluated from the sub-validators the context
    /// accumulated while the value was streaming through.
    pub(crate) fn end_value(&self, ctx: &Context<'_>) -> bool {
        if let Some(validators) = &ctx.all_of {
            if !validators.iter().all(Validator::is_valid) {
                return false;
            }
        }
        if let Some(validators) = &ctx.any_of {
            if !validators.iter().any(Validator::is_valid) {
                return false;
            }
        }
        if let Some(validators) = &ctx.one_of {
            if validators.iter().filter(|v| v.is_valid()).count() != 1 {
                return false;
            }
        }
        match &ctx.not {
            Some(validator) => !validator.is_valid(),
            None => true,
        }
    }

    pub(crate) fn null<'s>(&'s self, ctx: &mut Context<'s>) -> bool {
        self.create_logic_validators(ctx);
        self.types.contains(PrimitiveType::Null) && self.accepts_enum(Value::is_null)
    }

    pub(crate) fn boolean<'s>(&'s self, ctx: &mut Context<'s>, value: bool) -> bool {
        self.create_logic_validators(ctx);
        self.types.contains(PrimitiveType::Boolean)
            && self.accepts_enum(|candidate| candidate.as_bool() == Some(value))
    }

    pub(crate) fn int<'s>(&'s self, ctx: &mut Context<'s>, value: i32) -> bool {
        self.integer_scalar(ctx, f64::from(value), |n| helpers::number_eq(value, n))
    }

    pub(crate) fn uint<'s>(&'s self, ctx: &mut Context<'s>, value: u32) -> bool {
        self.integer_scalar(ctx, f64::from(value), |n| helpers::number_eq(value, n))
    }

    pub(crate) fn int64<'s>(&'s self, ctx: &mut Context<'s>, value: i64) -> bool {
        self.integer_scalar(ctx, value as f64, |n| helpers::number_eq(value, n))
    }

    pub(crate) fn uint64<'s>(&'s self, ctx: &mut Context<'s>, value: u64) -> bool {
        self.integer_scalar(ctx, value as f64, |n| helpers::number_eq(value, n))
    }

    pub(crate) fn double<'s>(&'s self, ctx: &mut Context<'s>, value: f64) -> bool {
        self.create_logic_validators(ctx);
        self.types.contains(PrimitiveType::Number)
            && self.number_within_bounds(value)
            && self.accepts_enum(
                |candidate| matches!(candidate, Value::Number(n) if helpers::number_eq(value, n)),
            )
    }

    pub(crate) fn string<'s>(&'s self, ctx: &mut Context<'s>, value: &str) -> bool {
        self.create_logic_validators(ctx);
        if !self.types.contains(PrimitiveType::String) {
            return false;
        }
        // Lengths are code units of the event payload, i.e. UTF-8 bytes.
        if value.len() < self.min_length || value.len() > self.max_length {
            return false;
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(value).unwrap_or(false) {
                return false;
            }
        }
        self.accepts_enum(|candidate| candidate.as_str() == Some(value))
    }

    pub(crate) fn start_object<'s>(&'s self, ctx: &mut Context<'s>) -> bool {
        self.create_logic_validators(ctx);
        if !self.types.contains(PrimitiveType::Object) {
            return false;
        }
        ctx.required_seen = 0;
        if self.has_dependencies {
            ctx.dependencies_seen = vec![false; self.properties.len()];
        }
        true
    }

    /// Resolve a member name to the schema its value must satisfy: named
    /// lookup first, then pattern properties in declaration order (first
    /// match wins), then the additional-properties policy.
    pub(crate) fn key<'s>(&'s self, ctx: &mut Context<'s>, name: &str) -> bool {
        if !self.types.contains(PrimitiveType::Object) {
            return false;
        }
        if let Some(index) = self.find_property(name) {
            let property = &self.properties[index];
            ctx.value_schema = Some(&property.schema);
            if property.required {
                ctx.required_seen += 1;
            }
            if self.has_dependencies {
                ctx.mark_dependency(index);
            }
            return true;
        }
        for pattern_property in &self.pattern_properties {
            if let Some(pattern) = &pattern_property.pattern {
                if pattern.is_match(name).unwrap_or(false) {
                    ctx.value_schema = Some(&pattern_property.schema);
                    return true;
                }
            }
        }
        match &self.additional_properties {
            AdditionalProperties::Schema(schema) => {
                ctx.value_schema = Some(schema);
                true
            }
            AdditionalProperties::Allowed => {
                ctx.value_schema = Some(typeless());
                true
            }
            AdditionalProperties::Forbidden => false,
        }
    }

    pub(crate) fn end_object<'s>(&'s self, ctx: &mut Context<'s>, members: usize) -> bool {
        self.create_logic_validators(ctx);
        if !self.types.contains(PrimitiveType::Object) {
            return false;
        }
        if ctx.required_seen != self.required_count
            || members < self.min_properties
            || members > self.max_properties
        {
            return false;
        }
        if self.has_dependencies {
            for (source, property) in self.properties.iter().enumerate() {
                if !ctx.dependency_seen(source) {
                    continue;
                }
                if let Some(targets) = &property.dependencies {
                    for (target, required) in targets.iter().enumerate() {
                        if *required && !ctx.dependency_seen(target) {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    pub(crate) fn start_array<'s>(&'s self, ctx: &mut Context<'s>) -> bool {
        self.create_logic_validators(ctx);
        if !self.types.contains(PrimitiveType::Array) {
            return false;
        }
        ctx.element_index = 0;
        ctx.in_array = true;
        true
    }

    pub(crate) fn end_array<'s>(&'s self, ctx: &mut Context<'s>, elements: usize) -> bool {
        self.create_logic_validators(ctx);
        if !self.types.contains(PrimitiveType::Array) {
            return false;
        }
        ctx.in_array = false;
        elements >= self.min_items && elements <= self.max_items
    }

    /// One-time creation of the combinator sub-validators, so that they
    /// exist before the first event of the value reaches them.
    fn create_logic_validators<'s>(&'s self, ctx: &mut Context<'s>) {
        if !self.all_of.is_empty() && ctx.all_of.is_none() {
            ctx.all_of = Some(self.all_of.iter().map(Validator::for_node).collect());
        }
        if !self.any_of.is_empty() && ctx.any_of.is_none() {
            ctx.any_of = Some(self.any_of.iter().map(Validator::for_node).collect());
        }
        if !self.one_of.is_empty() && ctx.one_of.is_none() {
            ctx.one_of = Some(self.one_of.iter().map(Validator::for_node).collect());
        }
        if let Some(schema) = &self.not {
            if ctx.not.is_none() {
                ctx.not = Some(Box::new(Validator::for_node(schema)));
            }
        }
    }

    // O(n); property lists are expected to stay small.
    fn find_property(&self, name: &str) -> Option<usize> {
        self.properties
            .iter()
            .position(|property| property.name == name)
    }

    fn integer_scalar<'s>(
        &'s self,
        ctx: &mut Context<'s>,
        value: f64,
        eq: impl Fn(&serde_json::Number) -> bool,
    ) -> bool {
        self.create_logic_validators(ctx);
        // An integer satisfies both the `integer` and the `number` kind.
        if !self.types.contains(PrimitiveType::Integer)
            && !self.types.contains(PrimitiveType::Number)
        {
            return false;
        }
        self.number_within_bounds(value)
            && self.accepts_enum(|candidate| matches!(candidate, Value::Number(n) if eq(n)))
    }

    fn number_within_bounds(&self, value: f64) -> bool {
        if self.exclusive_minimum {
            if value <= self.minimum {
                return false;
            }
        } else if value < self.minimum {
            return false;
        }
        if self.exclusive_maximum {
            if value >= self.maximum {
                return false;
            }
        } else if value > self.maximum {
            return false;
        }
        if let Some(divisor) = self.multiple_of {
            if value % divisor != 0.0 {
                return false;
            }
        }
        true
    }

    fn accepts_enum(&self, matches: impl FnMut(&Value) -> bool) -> bool {
        self.enumeration.is_empty() || self.enumeration.iter().any(matches)
    }
}
