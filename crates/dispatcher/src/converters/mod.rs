//! Event converters
//!
//! One converter per output kind. Each validates a raw decoder payload and
//! returns a typed body or a [`ConvertError`]. Converters are pure: they never
//! log, the dispatcher decides what to do with a failure.

mod annotation;
mod binary;
mod meta;
mod packet;

pub use self::annotation::convert_annotation;
pub use self::binary::convert_binary;
pub use self::meta::convert_meta;
pub use self::packet::convert_packet;

use contracts::{ClassKind, ConvertError, DecoderDefinition, Value};

/// Fail unless `items` has exactly `expected` elements
fn expect_len(
    def: &DecoderDefinition,
    what: &'static str,
    items: &[Value],
    expected: usize,
) -> Result<(), ConvertError> {
    if items.len() == expected {
        Ok(())
    } else {
        Err(ConvertError::ShapeMismatch {
            decoder: def.id.clone(),
            what,
            expected: expected.to_string(),
            actual: items.len(),
        })
    }
}

fn type_mismatch(
    def: &DecoderDefinition,
    what: &'static str,
    expected: &'static str,
    actual: &Value,
) -> ConvertError {
    ConvertError::TypeMismatch {
        decoder: def.id.clone(),
        what,
        expected,
        actual: actual.value_type(),
    }
}

fn expect_int(
    def: &DecoderDefinition,
    what: &'static str,
    value: &Value,
) -> Result<i64, ConvertError> {
    value
        .as_int()
        .ok_or_else(|| type_mismatch(def, what, "int", value))
}

fn expect_str<'v>(
    def: &DecoderDefinition,
    what: &'static str,
    value: &'v Value,
) -> Result<&'v str, ConvertError> {
    value
        .as_str()
        .ok_or_else(|| type_mismatch(def, what, "str", value))
}

/// Resolve a class index against the definition's declared classes
fn class_index(
    def: &DecoderDefinition,
    class: ClassKind,
    value: &Value,
) -> Result<u32, ConvertError> {
    let what = match class {
        ClassKind::Annotation => "annotation class",
        ClassKind::Binary => "binary class",
    };
    let class_id = expect_int(def, what, value)?;

    let declared = match class {
        ClassKind::Annotation => def.annotation_class(class_id).is_some(),
        ClassKind::Binary => def.binary_class(class_id).is_some(),
    };

    match u32::try_from(class_id) {
        Ok(id) if declared => Ok(id),
        _ => Err(ConvertError::UnknownClassId {
            decoder: def.id.clone(),
            class,
            class_id,
        }),
    }
}
