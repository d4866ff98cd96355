//! Value - dynamic payload submitted by decoders
//!
//! Decoders hand the dispatcher loosely shaped data (lists, tuples, scalars).
//! Converters inspect it at run time and turn it into typed event bodies.

use bytes::Bytes;
use serde::Serialize;
use std::fmt;

use crate::ContractError;

/// Dynamic payload value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Bytes),
    /// Growable ordered sequence
    List(Vec<Value>),
    /// Fixed ordered sequence
    Tuple(Vec<Value>),
}

/// Run-time type tag of a [`Value`], used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Null,
    Int,
    Float,
    Str,
    Bytes,
    List,
    Tuple,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::List => "list",
            Self::Tuple => "tuple",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// Run-time type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Str(_) => ValueType::Str,
            Self::Bytes(_) => ValueType::Bytes,
            Self::List(_) => ValueType::List,
            Self::Tuple(_) => ValueType::Tuple,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Elements of a list or a tuple
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Elements of a tuple only
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Build a list of strings
    pub fn str_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::Str(s.into())).collect())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(v))
    }
}

/// JSON mapping used by event scripts:
/// arrays become lists, `{"tuple": [...]}` a tuple, `{"bytes": [u8, ...]}` or
/// `{"bytes": "<hex>"}` bytes.
impl TryFrom<serde_json::Value> for Value {
    type Error = ContractError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value as Json;

        match json {
            Json::Null => Ok(Self::Null),
            Json::Bool(b) => Ok(Self::Int(i64::from(b))),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Int(i)),
                None => n
                    .as_f64()
                    .map(Self::Float)
                    .ok_or_else(|| ContractError::payload_parse(format!("number {n} out of range"))),
            },
            Json::String(s) => Ok(Self::Str(s)),
            Json::Array(items) => Ok(Self::List(
                items
                    .into_iter()
                    .map(Self::try_from)
                    .collect::<Result<_, _>>()?,
            )),
            Json::Object(mut map) => {
                if map.len() != 1 {
                    return Err(ContractError::payload_parse(
                        "objects must have exactly one key: 'tuple' or 'bytes'",
                    ));
                }
                if let Some(Json::Array(items)) = map.remove("tuple") {
                    return Ok(Self::Tuple(
                        items
                            .into_iter()
                            .map(Self::try_from)
                            .collect::<Result<_, _>>()?,
                    ));
                }
                match map.remove("bytes") {
                    Some(Json::String(hex)) => decode_hex(&hex).map(Self::Bytes),
                    Some(Json::Array(items)) => items
                        .iter()
                        .map(|b| {
                            b.as_u64()
                                .and_then(|b| u8::try_from(b).ok())
                                .ok_or_else(|| {
                                    ContractError::payload_parse(format!("invalid byte {b}"))
                                })
                        })
                        .collect::<Result<Vec<u8>, _>>()
                        .map(|bytes| Self::Bytes(Bytes::from(bytes))),
                    _ => Err(ContractError::payload_parse(
                        "expected {\"tuple\": [...]}, {\"bytes\": [...]} or {\"bytes\": \"<hex>\"}",
                    )),
                }
            }
        }
    }
}

/// Decode a string of hex digit pairs, e.g. "0102ff"
fn decode_hex(hex: &str) -> Result<Bytes, ContractError> {
    if hex.len() % 2 != 0 {
        return Err(ContractError::payload_parse(format!(
            "hex bytes must have an even number of digits, got {}",
            hex.len()
        )));
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                Ok((hex_digit(*hi) << 4) | hex_digit(*lo))
            }
            _ => Err(ContractError::payload_parse(format!(
                "invalid hex bytes \"{hex}\""
            ))),
        })
        .collect::<Result<Vec<u8>, _>>()
        .map(Bytes::from)
}

fn hex_digit(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}
