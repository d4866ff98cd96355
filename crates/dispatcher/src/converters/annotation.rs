//! Annotation converter: `[class, [text, ...]]`

use contracts::{AnnotationData, ClassKind, ConvertError, DecoderDefinition, Value};

use super::{class_index, expect_len, expect_str, type_mismatch};

/// Convert an annotation payload
///
/// Expects a two element list or tuple: a declared annotation class index and
/// a non-empty sequence of strings.
pub fn convert_annotation(
    def: &DecoderDefinition,
    payload: &Value,
) -> Result<AnnotationData, ConvertError> {
    let items = payload
        .as_sequence()
        .ok_or_else(|| type_mismatch(def, "annotation output", "list", payload))?;
    expect_len(def, "annotation list", items, 2)?;

    let class_id = class_index(def, ClassKind::Annotation, &items[0])?;

    let texts = items[1]
        .as_sequence()
        .ok_or_else(|| type_mismatch(def, "annotation text", "list of strings", &items[1]))?;
    if texts.is_empty() {
        return Err(ConvertError::ShapeMismatch {
            decoder: def.id.clone(),
            what: "annotation text",
            expected: "at least 1".into(),
            actual: 0,
        });
    }

    let text = texts
        .iter()
        .map(|t| expect_str(def, "annotation text entry", t).map(str::to_owned))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AnnotationData { class_id, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::test_support::uart_definition;

    fn ann(class: i64, text: &[&str]) -> Value {
        Value::List(vec![Value::Int(class), Value::str_list(text.iter().copied())])
    }

    #[test]
    fn test_valid_annotation() {
        let def = uart_definition();
        let data = convert_annotation(&def, &ann(1, &["a", "b"])).unwrap();
        assert_eq!(data.class_id, 1);
        assert_eq!(data.text, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_tuple_payload_and_empty_strings_accepted() {
        let def = uart_definition();
        let payload = Value::Tuple(vec![Value::Int(0), Value::str_list(["", "x"])]);
        let data = convert_annotation(&def, &payload).unwrap();
        assert_eq!(data.text, vec![String::new(), "x".to_string()]);
    }

    #[test]
    fn test_single_element_rejected() {
        let def = uart_definition();
        let err = convert_annotation(&def, &Value::List(vec![Value::Int(0)])).unwrap_err();
        assert!(matches!(err, ConvertError::ShapeMismatch { actual: 1, .. }));
    }

    #[test]
    fn test_not_a_sequence_rejected() {
        let def = uart_definition();
        let err = convert_annotation(&def, &Value::Int(0)).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::TypeMismatch {
                what: "annotation output",
                ..
            }
        ));
    }

    #[test]
    fn test_text_not_a_sequence_rejected() {
        let def = uart_definition();
        let payload = Value::List(vec![Value::Int(0), Value::from("abc")]);
        let err = convert_annotation(&def, &payload).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::TypeMismatch {
                what: "annotation text",
                ..
            }
        ));
    }

    #[test]
    fn test_non_string_member_rejects_whole_annotation() {
        let def = uart_definition();
        let payload = Value::List(vec![
            Value::Int(0),
            Value::List(vec![Value::from("ok"), Value::Int(3)]),
        ]);
        let err = convert_annotation(&def, &payload).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::TypeMismatch {
                actual: contracts::ValueType::Int,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_text_rejected() {
        let def = uart_definition();
        let err = convert_annotation(&def, &ann(0, &[])).unwrap_err();
        assert!(matches!(err, ConvertError::ShapeMismatch { actual: 0, .. }));
    }

    #[test]
    fn test_unregistered_class_rejected() {
        let def = uart_definition();
        let err = convert_annotation(&def, &ann(7, &["x"])).unwrap_err();
        assert!(matches!(err, ConvertError::UnknownClassId { class_id: 7, .. }));
        assert!(err.to_string().contains("uart"));
    }
}
