use std::ops::BitOrAssign;

/// The seven JSON Schema value kinds recognized by the `type` keyword.
///
/// `Integer` is tracked separately from `Number` so that integer parse
/// events can satisfy either bit while float events satisfy `Number` only.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum PrimitiveType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl TryFrom<&str> for PrimitiveType {
    type Error = ();

    #[inline]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "array" => Ok(PrimitiveType::Array),
            "boolean" => Ok(PrimitiveType::Boolean),
            "integer" => Ok(PrimitiveType::Integer),
            "null" => Ok(PrimitiveType::Null),
            "number" => Ok(PrimitiveType::Number),
            "object" => Ok(PrimitiveType::Object),
            "string" => Ok(PrimitiveType::String),
            _ => Err(()),
        }
    }
}

const fn to_bit(primitive_type: PrimitiveType) -> u8 {
    match primitive_type {
        PrimitiveType::Array => 1,
        PrimitiveType::Boolean => 2,
        PrimitiveType::Integer => 4,
        PrimitiveType::Null => 8,
        PrimitiveType::Number => 16,
        PrimitiveType::Object => 32,
        PrimitiveType::String => 64,
    }
}

/// Compact representation of a set of [`PrimitiveType`].
///
/// A compiled schema without a `type` keyword carries the full mask; the
/// mask is never empty.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct PrimitiveTypesBitMap {
    inner: u8,
}

impl PrimitiveTypesBitMap {
    pub(crate) const fn new() -> Self {
        Self { inner: 0 }
    }

    pub(crate) const fn all() -> Self {
        Self { inner: 0x7F }
    }

    pub(crate) const fn is_empty(self) -> bool {
        self.inner == 0
    }

    pub(crate) const fn contains(self, primitive_type: PrimitiveType) -> bool {
        to_bit(primitive_type) & self.inner != 0
    }
}

impl BitOrAssign<PrimitiveType> for PrimitiveTypesBitMap {
    #[inline]
    fn bitor_assign(&mut self, rhs: PrimitiveType) {
        self.inner |= to_bit(rhs);
    }
}
