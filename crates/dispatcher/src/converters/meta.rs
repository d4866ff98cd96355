//! Meta converter: a single scalar matching the stream's meta type

use contracts::{ConvertError, DecoderDefinition, MetaType, MetaValue, Value};

use super::type_mismatch;

/// Convert a meta payload against the stream's declared type
///
/// No coercion: an int stream rejects floats and vice versa.
pub fn convert_meta(
    def: &DecoderDefinition,
    meta_type: MetaType,
    payload: &Value,
) -> Result<MetaValue, ConvertError> {
    match (meta_type, payload) {
        (MetaType::Int64, Value::Int(v)) => Ok(MetaValue::Int64(*v)),
        (MetaType::Double, Value::Float(v)) => Ok(MetaValue::Double(*v)),
        (expected, other) => Err(type_mismatch(
            def,
            "meta value",
            expected.expected_value_type().as_str(),
            other,
        )),
    }
}
