//! The compiled schema handle and the streaming validator that walks it.
use std::fmt;

use serde_json::Value;

use crate::compiler;
use crate::context::Context;
use crate::events::{emit, Handler, NullHandler};
use crate::node::SchemaNode;

/// A schema compiled for streaming validation.
///
/// Compilation never fails: malformed constructs degrade to permissive
/// nodes rather than errors. The compiled tree is immutable and can be
/// shared between threads, each thread driving its own [`Validator`].
///
/// ```
/// use jsonschema_stream::Schema;
/// use serde_json::json;
///
/// let schema = Schema::new(&json!({"type": "string", "minLength": 2}));
/// assert!(schema.is_valid(&json!("ab")));
/// assert!(!schema.is_valid(&json!("a")));
/// ```
#[derive(Debug)]
pub struct Schema {
    pub(crate) root: SchemaNode,
}

impl Schema {
    /// Compile a parsed schema document.
    #[must_use]
    pub fn new(schema: &Value) -> Schema {
        Schema {
            root: compiler::compile(schema),
        }
    }

    /// Validate an already-parsed document by streaming it through a
    /// fresh [`Validator`].
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        let mut validator = Validator::new(self);
        emit(instance, &mut validator);
        validator.is_valid()
    }
}

/// Sub-validators always terminate in the no-op sink.
pub(crate) type SubValidator<'s> = Validator<'s, NullHandler>;

/// A streaming validator over one [`Schema`].
///
/// Each SAX event method validates the event against the schema that
/// currently applies, replays it into the combinator sub-validators that
/// are live on the context stack, forwards it to the output sink, and
/// returns the running validity. Failure is sticky: once an event is
/// rejected, every later event returns `false` until [`reset`].
///
/// ```
/// use jsonschema_stream::{Schema, Validator};
/// use serde_json::json;
///
/// let schema = Schema::new(&json!({
///     "type": "object",
///     "properties": {"size": {"type": "integer", "minimum": 0}},
///     "required": ["size"]
/// }));
/// let mut validator = Validator::new(&schema);
/// validator.start_object();
/// validator.key("size");
/// validator.uint(42);
/// assert!(validator.end_object(1));
/// assert!(validator.is_valid());
/// ```
///
/// [`reset`]: Validator::reset
pub struct Validator<'s, H: Handler = NullHandler> {
    root: &'s SchemaNode,
    output: H,
    stack: Vec<Context<'s>>,
    valid: bool,
}

impl<'s> Validator<'s> {
    /// Create a validator without a downstream sink.
    #[must_use]
    pub fn new(schema: &'s Schema) -> Validator<'s> {
        Validator::for_node(&schema.root)
    }

    /// A validator rooted at a single node, used for combinator children.
    pub(crate) fn for_node(root: &'s SchemaNode) -> SubValidator<'s> {
        Validator {
            root,
            output: NullHandler,
            stack: Vec::new(),
            valid: true,
        }
    }
}

impl<'s, H: Handler> Validator<'s, H> {
    /// Create a validator that forwards every accepted event to `output`.
    ///
    /// The sink sees an event only after it passed validation, and its
    /// return value participates in the running validity, so rejecting
    /// sinks stop the stream just like schema violations do.
    pub fn with_output(schema: &'s Schema, output: H) -> Validator<'s, H> {
        Validator {
            root: &schema.root,
            output,
            stack: Vec::new(),
            valid: true,
        }
    }

    /// The cumulative verdict over all events seen since the last reset.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Drop all per-document state and restore the valid verdict.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.valid = true;
    }

    /// Consume the validator and hand back its output sink.
    pub fn into_output(self) -> H {
        self.output
    }

    /// Handle a scalar `null`.
    pub fn null(&mut self) -> bool {
        if !self.valid {
            return false;
        }
        if !self.begin_value() {
            return self.invalidate();
        }
        let ctx = self.stack.last_mut().expect("begin_value pushes a context");
        let schema = ctx.schema;
        if !schema.null(ctx) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.null();
        });
        self.finish_value(H::null)
    }

    /// Handle a scalar boolean.
    pub fn boolean(&mut self, value: bool) -> bool {
        if !self.valid {
            return false;
        }
        if !self.begin_value() {
            return self.invalidate();
        }
        let ctx = self.stack.last_mut().expect("begin_value pushes a context");
        let schema = ctx.schema;
        if !schema.boolean(ctx, value) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.boolean(value);
        });
        self.finish_value(|output| output.boolean(value))
    }

    /// Handle a 32-bit signed integer.
    pub fn int(&mut self, value: i32) -> bool {
        if !self.valid {
            return false;
        }
        if !self.begin_value() {
            return self.invalidate();
        }
        let ctx = self.stack.last_mut().expect("begin_value pushes a context");
        let schema = ctx.schema;
        if !schema.int(ctx, value) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.int(value);
        });
        self.finish_value(|output| output.int(value))
    }

    /// Handle a 32-bit unsigned integer.
    pub fn uint(&mut self, value: u32) -> bool {
        if !self.valid {
            return false;
        }
        if !self.begin_value() {
            return self.invalidate();
        }
        let ctx = self.stack.last_mut().expect("begin_value pushes a context");
        let schema = ctx.schema;
        if !schema.uint(ctx, value) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.uint(value);
        });
        self.finish_value(|output| output.uint(value))
    }

    /// Handle a 64-bit signed integer.
    pub fn int64(&mut self, value: i64) -> bool {
        if !self.valid {
            return false;
        }
        if !self.begin_value() {
            return self.invalidate();
        }
        let ctx = self.stack.last_mut().expect("begin_value pushes a context");
        let schema = ctx.schema;
        if !schema.int64(ctx, value) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.int64(value);
        });
        self.finish_value(|output| output.int64(value))
    }

    /// Handle a 64-bit unsigned integer.
    pub fn uint64(&mut self, value: u64) -> bool {
        if !self.valid {
            return false;
        }
        if !self.begin_value() {
            return self.invalidate();
        }
        let ctx = self.stack.last_mut().expect("begin_value pushes a context");
        let schema = ctx.schema;
        if !schema.uint64(ctx, value) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.uint64(value);
        });
        self.finish_value(|output| output.uint64(value))
    }

    /// Handle a floating-point number.
    pub fn double(&mut self, value: f64) -> bool {
        if !self.valid {
            return false;
        }
        if !self.begin_value() {
            return self.invalidate();
        }
        let ctx = self.stack.last_mut().expect("begin_value pushes a context");
        let schema = ctx.schema;
        if !schema.double(ctx, value) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.double(value);
        });
        self.finish_value(|output| output.double(value))
    }

    /// Handle a scalar string.
    pub fn string(&mut self, value: &str) -> bool {
        if !self.valid {
            return false;
        }
        if !self.begin_value() {
            return self.invalidate();
        }
        let ctx = self.stack.last_mut().expect("begin_value pushes a context");
        let schema = ctx.schema;
        if !schema.string(ctx, value) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.string(value);
        });
        self.finish_value(|output| output.string(value))
    }

    /// Handle the beginning of an object.
    pub fn start_object(&mut self) -> bool {
        if !self.valid {
            return false;
        }
        if !self.begin_value() {
            return self.invalidate();
        }
        let ctx = self.stack.last_mut().expect("begin_value pushes a context");
        let schema = ctx.schema;
        if !schema.start_object(ctx) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.start_object();
        });
        self.valid = self.output.start_object();
        self.valid
    }

    /// Handle an object member name. Keys are names, not values, so no
    /// nested context is entered; the schema records which schema the
    /// member's value must satisfy.
    pub fn key(&mut self, name: &str) -> bool {
        if !self.valid {
            return false;
        }
        let Some(ctx) = self.stack.last_mut() else {
            return self.invalidate();
        };
        let schema = ctx.schema;
        if !schema.key(ctx, name) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.key(name);
        });
        self.valid = self.output.key(name);
        self.valid
    }

    /// Handle the end of an object together with its member count.
    pub fn end_object(&mut self, members: usize) -> bool {
        if !self.valid {
            return false;
        }
        let Some(ctx) = self.stack.last_mut() else {
            return self.invalidate();
        };
        let schema = ctx.schema;
        if !schema.end_object(ctx, members) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.end_object(members);
        });
        self.finish_value(|output| output.end_object(members))
    }

    /// Handle the beginning of an array.
    pub fn start_array(&mut self) -> bool {
        if !self.valid {
            return false;
        }
        if !self.begin_value() {
            return self.invalidate();
        }
        let ctx = self.stack.last_mut().expect("begin_value pushes a context");
        let schema = ctx.schema;
        if !schema.start_array(ctx) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.start_array();
        });
        self.valid = self.output.start_array();
        self.valid
    }

    /// Handle the end of an array together with its element count.
    pub fn end_array(&mut self, elements: usize) -> bool {
        if !self.valid {
            return false;
        }
        let Some(ctx) = self.stack.last_mut() else {
            return self.invalidate();
        };
        let schema = ctx.schema;
        if !schema.end_array(ctx, elements) {
            return self.invalidate();
        }
        self.each_subvalidator(|validator| {
            validator.end_array(elements);
        });
        self.finish_value(|output| output.end_array(elements))
    }

    /// A value is about to begin: enter a context for it. For the first
    /// value this is the root schema; inside arrays the item lookahead
    /// runs first, and whatever schema was recorded as the lookahead is
    /// pushed.
    fn begin_value(&mut self) -> bool {
        if self.stack.is_empty() {
            self.stack.push(Context::new(self.root));
        } else {
            let ctx = self.stack.last_mut().expect("checked above");
            let schema = ctx.schema;
            if !schema.begin_value(ctx) {
                return false;
            }
            let next = ctx.value_schema;
            if let Some(schema) = next {
                self.stack.push(Context::new(schema));
            }
        }
        true
    }

    /// A value finished: settle its combinator verdicts and pop its
    /// context. Failure leaves the context in place; stickiness makes the
    /// leftover state unobservable.
    fn end_value(&mut self) -> bool {
        let Some(ctx) = self.stack.last() else {
            return false;
        };
        if !ctx.schema.end_value(ctx) {
            return false;
        }
        self.stack.pop();
        // Reserved type-union indirection: such contexts stand in for a
        // value already completed one level up.
        if self.stack.last().is_some_and(|ctx| ctx.multi_type) {
            self.stack.pop();
        }
        true
    }

    fn finish_value(&mut self, forward: impl FnOnce(&mut H) -> bool) -> bool {
        self.valid = self.end_value() && forward(&mut self.output);
        self.valid
    }

    /// Replay an event into every live sub-validator on the stack.
    fn each_subvalidator(&mut self, mut deliver: impl FnMut(&mut SubValidator<'s>)) {
        for ctx in &mut self.stack {
            if let Some(validators) = &mut ctx.all_of {
                for validator in validators {
                    deliver(validator);
                }
            }
            if let Some(validators) = &mut ctx.any_of {
                for validator in validators {
                    deliver(validator);
                }
            }
            if let Some(validators) = &mut ctx.one_of {
                for validator in validators {
                    deliver(validator);
                }
            }
            if let Some(validator) = &mut ctx.not {
                deliver(validator);
            }
        }
    }

    fn invalidate(&mut self) -> bool {
        self.valid = false;
        false
    }
}

impl<H: Handler> fmt::Debug for Validator<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("depth", &self.stack.len())
            .field("valid", &self.valid)
            .finish()
    }
}

impl<'s, H: Handler> Handler for Validator<'s, H> {
    fn null(&mut self) -> bool {
        Validator::null(self)
    }
    fn boolean(&mut self, value: bool) -> bool {
        Validator::boolean(self, value)
    }
    fn int(&mut self, value: i32) -> bool {
        Validator::int(self, value)
    }
    fn uint(&mut self, value: u32) -> bool {
        Validator::uint(self, value)
    }
    fn int64(&mut self, value: i64) -> bool {
        Validator::int64(self, value)
    }
    fn uint64(&mut self, value: u64) -> bool {
        Validator::uint64(self, value)
    }
    fn double(&mut self, value: f64) -> bool {
        Validator::double(self, value)
    }
    fn string(&mut self, value: &str) -> bool {
        Validator::string(self, value)
    }
    fn start_object(&mut self) -> bool {
        Validator::start_object(self)
    }
    fn key(&mut self, name: &str) -> bool {
        Validator::key(self, name)
    }
    fn end_object(&mut self, members: usize) -> bool {
        Validator::end_object(self, members)
    }
    fn start_array(&mut self) -> bool {
        Validator::start_array(self)
    }
    fn end_array(&mut self, elements: usize) -> bool {
        Validator::end_array(self, elements)
    }
}

#[cfg(test)]
mod tests {
    use super::{Schema, Validator};
    use crate::events::{emit, Handler};
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Handler for Recorder {
        fn null(&mut self) -> bool {
            self.events.push("null".into());
            true
        }
        fn uint(&mut self, value: u32) -> bool {
            self.events.push(format!("uint {value}"));
            true
        }
        fn string(&mut self, value: &str) -> bool {
            self.events.push(format!("string {value}"));
            true
        }
        fn start_object(&mut self) -> bool {
            self.events.push("start_object".into());
            true
        }
        fn key(&mut self, name: &str) -> bool {
            self.events.push(format!("key {name}"));
            true
        }
        fn end_object(&mut self, members: usize) -> bool {
            self.events.push(format!("end_object {members}"));
            true
        }
    }

    #[test]
    fn failure_is_sticky_until_reset() {
        let schema = Schema::new(&json!({"type": "integer"}));
        let mut validator = Validator::new(&schema);
        assert!(!validator.string("x"));
        // The event itself would be fine, but the verdict already settled.
        assert!(!validator.uint(1));
        assert!(!validator.is_valid());

        validator.reset();
        assert!(validator.uint(1));
        assert!(validator.is_valid());
    }

    #[test]
    fn structural_events_before_any_value_invalidate() {
        let schema = Schema::new(&json!({}));

        let mut validator = Validator::new(&schema);
        assert!(!validator.key("a"));
        assert!(!validator.is_valid());

        let mut validator = Validator::new(&schema);
        assert!(!validator.end_object(0));

        let mut validator = Validator::new(&schema);
        assert!(!validator.end_array(0));
    }

    #[test]
    fn accepted_events_reach_the_output_sink_in_order() {
        let schema = Schema::new(&json!({"type": "object"}));
        let mut validator = Validator::with_output(&schema, Recorder::default());
        assert!(emit(&json!({"a": 1, "b": "x"}), &mut validator));
        assert!(validator.is_valid());
        assert_eq!(
            validator.into_output().events,
            [
                "start_object",
                "key a",
                "uint 1",
                "key b",
                "string x",
                "end_object 2",
            ]
        );
    }

    #[test]
    fn rejected_events_never_reach_the_output_sink() {
        let schema = Schema::new(&json!({
            "type": "object",
            "properties": {"a": {"type": "string"}}
        }));
        let mut validator = Validator::with_output(&schema, Recorder::default());
        emit(&json!({"a": 1, "b": "x"}), &mut validator);
        assert!(!validator.is_valid());
        // Everything from the offending scalar onwards is withheld.
        assert_eq!(validator.into_output().events, ["start_object", "key a"]);
    }

    #[test]
    fn a_borrowed_sink_survives_the_validator() {
        let schema = Schema::new(&json!({"type": "object"}));
        let mut recorder = Recorder::default();
        {
            let mut validator = Validator::with_output(&schema, &mut recorder);
            assert!(emit(&json!({"a": 1}), &mut validator));
        }
        assert_eq!(
            recorder.events,
            ["start_object", "key a", "uint 1", "end_object 1"]
        );
    }

    #[test]
    fn a_rejecting_sink_participates_in_the_verdict() {
        struct RejectStrings;
        impl Handler for RejectStrings {
            fn string(&mut self, _value: &str) -> bool {
                false
            }
        }

        let schema = Schema::new(&json!({}));
        let mut validator = Validator::with_output(&schema, RejectStrings);
        assert!(validator.uint(1));
        let mut validator = Validator::with_output(&schema, RejectStrings);
        assert!(!validator.string("x"));
        assert!(!validator.is_valid());
    }

    #[test]
    fn validators_chain_as_pass_through_stages() {
        let outer = Schema::new(&json!({"type": "integer"}));
        let inner = Schema::new(&json!({"minimum": 10}));

        let mut chained = Validator::with_output(&outer, Validator::new(&inner));
        assert!(!chained.uint(5));
        assert!(!chained.is_valid());
        // The outer schema accepted 5; the inner stage rejected it.
        assert!(!chained.into_output().is_valid());
    }

    #[test]
    fn reset_clears_partial_documents() {
        let schema = Schema::new(&json!({"type": "object", "minProperties": 1}));
        let mut validator = Validator::new(&schema);
        assert!(validator.start_object());
        assert!(validator.key("a"));
        validator.reset();
        assert!(emit(&json!({"a": 1}), &mut validator));
        assert!(validator.is_valid());
    }

    #[test]
    fn one_schema_many_validators() {
        let schema = Schema::new(&json!({"enum": [1, 2]}));
        let mut first = Validator::new(&schema);
        let mut second = Validator::new(&schema);
        assert!(first.uint(1));
        assert!(!second.uint(3));
        assert!(first.is_valid());
        assert!(!second.is_valid());
    }

    #[test]
    fn schema_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
    }
}
