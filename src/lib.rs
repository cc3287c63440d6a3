//! # jsonschema-stream
//!
//! Streaming JSON Schema validation: a subset of JSON Schema Draft 4 is
//! compiled once into an immutable tree of schema nodes, and documents
//! are then validated as a sequence of SAX-style parse events without
//! ever being materialized.
//!
//! Combinators (`allOf`, `anyOf`, `oneOf`, `not`) are handled by feeding
//! the same event stream into nested sub-validators, so one pass over
//! the input settles every branch.
//!
//! ## Validating an event stream
//!
//! ```rust
//! use jsonschema_stream::{Schema, Validator};
//! use serde_json::json;
//!
//! let schema = Schema::new(&json!({
//!     "type": "array",
//!     "items": {"type": "integer", "minimum": 0},
//!     "maxItems": 3
//! }));
//! let mut validator = Validator::new(&schema);
//! validator.start_array();
//! validator.uint(1);
//! validator.uint(2);
//! assert!(validator.end_array(2));
//! assert!(validator.is_valid());
//! ```
//!
//! ## Validating a parsed document
//!
//! ```rust
//! use jsonschema_stream::is_valid;
//! use serde_json::json;
//!
//! let schema = json!({"properties": {"a": {"type": "string"}}});
//! assert!(is_valid(&schema, &json!({"a": "x"})));
//! assert!(!is_valid(&schema, &json!({"a": 1})));
//! ```
//!
//! A [`Validator`] forwards every accepted event to an optional
//! downstream [`Handler`], so validation composes with whatever consumes
//! the parse events today.
#![warn(
    clippy::doc_markdown,
    clippy::explicit_iter_loop,
    clippy::map_unwrap_or,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::print_stdout,
    clippy::redundant_closure,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]
mod compiler;
mod context;
mod ecma;
mod events;
mod helpers;
mod node;
mod primitive_type;
mod validator;

pub use events::{emit, Handler, NullHandler};
pub use validator::{Schema, Validator};

use serde_json::Value;

/// A shortcut for validating a parsed `instance` against `schema`.
///
/// Compiles the schema, streams the instance through a fresh validator
/// and returns the verdict. Compile the schema once with [`Schema::new`]
/// when validating more than one document.
///
/// ```rust
/// use jsonschema_stream::is_valid;
/// use serde_json::json;
///
/// let schema = json!({"maxLength": 5});
/// assert!(is_valid(&schema, &json!("foo")));
/// ```
#[must_use]
#[inline]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    Schema::new(schema).is_valid(instance)
}

#[cfg(test)]
pub(crate) mod tests_util {
    use crate::Schema;
    use serde_json::Value;

    #[track_caller]
    pub(crate) fn assert_valid(schema: &Value, instance: &Value) {
        let compiled = Schema::new(schema);
        assert!(
            compiled.is_valid(instance),
            "{instance} should be valid against {schema}"
        );
    }

    #[track_caller]
    pub(crate) fn assert_not_valid(schema: &Value, instance: &Value) {
        let compiled = Schema::new(schema);
        assert!(
            !compiled.is_valid(instance),
            "{instance} should not be valid against {schema}"
        );
    }
}
