//! Binary converter: `(class, bytes)`

use contracts::{BinaryData, ClassKind, ConvertError, DecoderDefinition, Value};

use super::{class_index, expect_len, type_mismatch};

/// Convert a binary payload
///
/// Expects a two element tuple: a declared binary class index and a non-empty
/// byte string. An empty byte string is a decoder bug and is rejected.
pub fn convert_binary(
    def: &DecoderDefinition,
    payload: &Value,
) -> Result<BinaryData, ConvertError> {
    let items = payload
        .as_tuple()
        .ok_or_else(|| type_mismatch(def, "binary output", "tuple", payload))?;
    expect_len(def, "binary tuple", items, 2)?;

    let class_id = class_index(def, ClassKind::Binary, &items[0])?;

    let bytes = items[1]
        .as_bytes()
        .ok_or_else(|| type_mismatch(def, "binary data", "bytes", &items[1]))?;
    if bytes.is_empty() {
        return Err(ConvertError::EmptyBinaryPayload {
            decoder: def.id.clone(),
        });
    }

    Ok(BinaryData {
        class_id,
        bytes: bytes.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::test_support::uart_definition;
    use bytes::Bytes;

    fn bin(class: i64, data: &'static [u8]) -> Value {
        Value::Tuple(vec![Value::Int(class), Value::Bytes(Bytes::from_static(data))])
    }

    #[test]
    fn test_valid_binary() {
        let def = uart_definition();
        let data = convert_binary(&def, &bin(0, b"\x01\x02")).unwrap();
        assert_eq!(data.class_id, 0);
        assert_eq!(data.bytes.as_ref(), b"\x01\x02");
    }

    #[test]
    fn test_empty_bytes_rejected() {
        let def = uart_definition();
        let err = convert_binary(&def, &bin(0, b"")).unwrap_err();
        assert_eq!(
            err,
            ConvertError::EmptyBinaryPayload {
                decoder: "uart".into()
            }
        );
    }

    #[test]
    fn test_list_payload_rejected() {
        let def = uart_definition();
        let payload = Value::List(vec![Value::Int(0), Value::from(&b"\x01"[..])]);
        let err = convert_binary(&def, &payload).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { expected: "tuple", .. }));
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let def = uart_definition();
        let payload = Value::Tuple(vec![Value::Int(0)]);
        let err = convert_binary(&def, &payload).unwrap_err();
        assert!(matches!(err, ConvertError::ShapeMismatch { actual: 1, .. }));
    }

    #[test]
    fn test_string_data_rejected() {
        let def = uart_definition();
        let payload = Value::Tuple(vec![Value::Int(0), Value::from("\x01")]);
        let err = convert_binary(&def, &payload).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { what: "binary data", .. }));
    }

    #[test]
    fn test_unregistered_binary_class_rejected() {
        let def = uart_definition();
        let err = convert_binary(&def, &bin(1, b"\x01")).unwrap_err();
        assert!(matches!(err, ConvertError::UnknownClassId { class_id: 1, .. }));
    }
}
