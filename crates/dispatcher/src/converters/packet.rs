//! Packet converter
//!
//! Accepted shapes (sample range is carried by the put call):
//! - Location: `[class, LOCATION, packet_num]`
//! - Field:    `[class, FIELD, packet_num, field_name, field_value]`

use contracts::{
    ClassKind, ConvertError, DecoderDefinition, PacketData, PacketSubtype, Value,
};

use super::{class_index, expect_int, expect_len, expect_str, type_mismatch};

/// Convert a packet payload
pub fn convert_packet(
    def: &DecoderDefinition,
    payload: &Value,
) -> Result<PacketData, ConvertError> {
    let items = payload
        .as_sequence()
        .ok_or_else(|| type_mismatch(def, "packet output", "list", payload))?;
    if items.len() < 2 {
        return Err(ConvertError::ShapeMismatch {
            decoder: def.id.clone(),
            what: "packet list",
            expected: "at least 2".into(),
            actual: items.len(),
        });
    }

    let class_id = class_index(def, ClassKind::Annotation, &items[0])?;
    let subtype_code = expect_int(def, "packet sub type", &items[1])?;

    let subtype = match subtype_code {
        PacketSubtype::LOCATION => {
            expect_len(def, "packet location list", items, 3)?;
            PacketSubtype::Location {
                packet_num: expect_int(def, "packet number", &items[2])?,
            }
        }
        PacketSubtype::FIELD => {
            expect_len(def, "packet field list", items, 5)?;
            PacketSubtype::Field {
                packet_num: expect_int(def, "packet number", &items[2])?,
                field_name: expect_str(def, "packet field name", &items[3])?.to_owned(),
                field_value: expect_str(def, "packet field value", &items[4])?.to_owned(),
            }
        }
        other => {
            return Err(ConvertError::UnknownSubtype {
                decoder: def.id.clone(),
                subtype: other,
            })
        }
    };

    Ok(PacketData { class_id, subtype })
}
