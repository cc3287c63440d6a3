//! Per-value scratch state for the streaming validator.
use crate::node::SchemaNode;
use crate::validator::SubValidator;

/// State attached to one JSON value while it streams through validation.
///
/// A context is pushed when the value begins and destroyed, together with
/// the combinator sub-validators it accumulated, when the value ends.
pub(crate) struct Context<'s> {
    /// The schema governing this value.
    pub(crate) schema: &'s SchemaNode,
    /// Lookahead: the schema to push when the next nested value begins.
    /// Set by `key` for object members and by `begin_value` for array
    /// elements.
    pub(crate) value_schema: Option<&'s SchemaNode>,
    /// Indirection marker for type-union contexts; the compiler never
    /// sets it today.
    pub(crate) multi_type: bool,
    pub(crate) all_of: Option<Vec<SubValidator<'s>>>,
    pub(crate) any_of: Option<Vec<SubValidator<'s>>>,
    pub(crate) one_of: Option<Vec<SubValidator<'s>>>,
    pub(crate) not: Option<Box<SubValidator<'s>>>,
    /// How many required properties have been seen so far.
    pub(crate) required_seen: usize,
    /// 0-based index of the next array element, for tuple dispatch.
    pub(crate) element_index: usize,
    /// Which named properties appeared, parallel to the schema's property
    /// list. Allocated at `start_object` when the schema has dependencies.
    pub(crate) dependencies_seen: Vec<bool>,
    pub(crate) in_array: bool,
}

impl<'s> Context<'s> {
    pub(crate) fn new(schema: &'s SchemaNode) -> Context<'s> {
        Context {
            schema,
            value_schema: None,
            multi_type: false,
            all_of: None,
            any_of: None,
            one_of: None,
            not: None,
            required_seen: 0,
            element_index: 0,
            dependencies_seen: Vec::new(),
            in_array: false,
        }
    }

    pub(crate) fn mark_dependency(&mut self, index: usize) {
        if let Some(seen) = self.dependencies_seen.get_mut(index) {
            *seen = true;
        }
    }

    pub(crate) fn dependency_seen(&self, index: usize) -> bool {
        self.dependencies_seen.get(index).copied().unwrap_or(false)
    }
}
