//! The SAX event vocabulary shared by parsers, validators and sinks.
use serde_json::Value;

/// A push-style sink for JSON parse events.
///
/// Every method returns `true` to continue and `false` to stop the
/// producer; the default implementations accept everything. Integer
/// events exist in four widths so that a tokenizer can deliver numbers
/// losslessly; all four count as both `integer` and `number` during
/// validation, while [`double`](Handler::double) counts as `number` only.
///
/// [`Validator`](crate::Validator) implements this trait, so validators
/// can be driven by [`emit`] or stacked behind one another as
/// pass-through stages.
pub trait Handler {
    /// A scalar `null`.
    fn null(&mut self) -> bool {
        true
    }
    /// A scalar boolean.
    fn boolean(&mut self, _value: bool) -> bool {
        true
    }
    /// A signed integer that fits 32 bits.
    fn int(&mut self, _value: i32) -> bool {
        true
    }
    /// An unsigned integer that fits 32 bits.
    fn uint(&mut self, _value: u32) -> bool {
        true
    }
    /// A signed integer that fits 64 bits.
    fn int64(&mut self, _value: i64) -> bool {
        true
    }
    /// An unsigned integer that fits 64 bits.
    fn uint64(&mut self, _value: u64) -> bool {
        true
    }
    /// A floating-point number.
    fn double(&mut self, _value: f64) -> bool {
        true
    }
    /// A scalar string.
    fn string(&mut self, _value: &str) -> bool {
        true
    }
    /// The beginning of an object.
    fn start_object(&mut self) -> bool {
        true
    }
    /// An object member name.
    fn key(&mut self, _name: &str) -> bool {
        true
    }
    /// The end of an object with its member count.
    fn end_object(&mut self, _members: usize) -> bool {
        true
    }
    /// The beginning of an array.
    fn start_array(&mut self) -> bool {
        true
    }
    /// The end of an array with its element count.
    fn end_array(&mut self, _elements: usize) -> bool {
        true
    }
}

/// A sink that accepts every event and does nothing; the terminal stage
/// of a validator without a downstream consumer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHandler;

impl Handler for NullHandler {}

impl<H: Handler + ?Sized> Handler for &mut H {
    fn null(&mut self) -> bool {
        (**self).null()
    }
    fn boolean(&mut self, value: bool) -> bool {
        (**self).boolean(value)
    }
    fn int(&mut self, value: i32) -> bool {
        (**self).int(value)
    }
    fn uint(&mut self, value: u32) -> bool {
        (**self).uint(value)
    }
    fn int64(&mut self, value: i64) -> bool {
        (**self).int64(value)
    }
    fn uint64(&mut self, value: u64) -> bool {
        (**self).uint64(value)
    }
    fn double(&mut self, value: f64) -> bool {
        (**self).double(value)
    }
    fn string(&mut self, value: &str) -> bool {
        (**self).string(value)
    }
    fn start_object(&mut self) -> bool {
        (**self).start_object()
    }
    fn key(&mut self, name: &str) -> bool {
        (**self).key(name)
    }
    fn end_object(&mut self, members: usize) -> bool {
        (**self).end_object(members)
    }
    fn start_array(&mut self) -> bool {
        (**self).start_array()
    }
    fn end_array(&mut self, elements: usize) -> bool {
        (**self).end_array(elements)
    }
}

/// Drive an already-parsed document through a [`Handler`] in document
/// order, stopping early as soon as the handler returns `false`.
///
/// Numbers are delivered as the narrowest event that holds them: `uint`
/// before `uint64`, `int` before `int64`, and `double` for anything with
/// a fractional part.
///
/// ```
/// use jsonschema_stream::{emit, Schema, Validator};
/// use serde_json::json;
///
/// let schema = Schema::new(&json!({"type": "array", "items": {"type": "integer"}}));
/// let mut validator = Validator::new(&schema);
/// assert!(emit(&json!([1, 2, 3]), &mut validator));
/// assert!(validator.is_valid());
/// ```
pub fn emit<H: Handler>(instance: &Value, handler: &mut H) -> bool {
    match instance {
        Value::Null => handler.null(),
        Value::Bool(value) => handler.boolean(*value),
        Value::Number(number) => {
            if let Some(value) = number.as_u64() {
                match u32::try_from(value) {
                    Ok(value) => handler.uint(value),
                    Err(_) => handler.uint64(value),
                }
            } else if let Some(value) = number.as_i64() {
                match i32::try_from(value) {
                    Ok(value) => handler.int(value),
                    Err(_) => handler.int64(value),
                }
            } else {
                handler.double(number.as_f64().expect("always valid"))
            }
        }
        Value::String(value) => handler.string(value),
        Value::Array(elements) => {
            if !handler.start_array() {
                return false;
            }
            for element in elements {
                if !emit(element, handler) {
                    return false;
                }
            }
            handler.end_array(elements.len())
        }
        Value::Object(members) => {
            if !handler.start_object() {
                return false;
            }
            for (name, value) in members {
                if !handler.key(name) {
                    return false;
                }
                if !emit(value, handler) {
                    return false;
                }
            }
            handler.end_object(members.len())
        }
    }
}
