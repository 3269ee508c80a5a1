use crate::statics;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// A number that keeps the distinction between I64, U64 and F64 so stored values
/// serialize back in the form they were supplied.
#[derive(Debug, Clone)]
pub enum Number {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl Number {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::I64(v) => Some(*v),
            Number::U64(v) => i64::try_from(*v).ok(),
            Number::F64(_) => None,
        }
    }

    pub fn as_f64_lossy(&self) -> f64 {
        match self {
            Number::I64(v) => *v as f64,
            Number::U64(v) => *v as f64,
            Number::F64(v) => *v,
        }
    }

    /// Numeric equality across representations: `I64(1)`, `U64(1)` and `F64(1.0)` are the
    /// same key. A parsed `[1, 2]` must match items built with signed integers.
    pub fn same_as(&self, other: &Number) -> bool {
        match (self, other) {
            (Number::F64(_), _) | (_, Number::F64(_)) => {
                self.as_f64_lossy() == other.as_f64_lossy()
            }
            (Number::U64(a), Number::U64(b)) => a == b,
            _ => match (self.as_i64(), other.as_i64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Number::I64(v) => serializer.serialize_i64(*v),
            Number::U64(v) => serializer.serialize_u64(*v),
            Number::F64(v) => serializer.serialize_f64(*v),
        }
    }
}

/// An item, a stored value, or the externally bound value of a control.
///
/// Items are either primitives (`Bool`, `Number`, `String`) or structured records
/// (`Object`). `Array` only appears as the multi-select form of the external value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ItemValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<ItemValue>),
    Object(IndexMap<String, ItemValue>),
}

impl ItemValue {
    pub fn as_object(&self) -> Option<&IndexMap<String, ItemValue>> {
        match self {
            ItemValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ItemValue]> {
        match self {
            ItemValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ItemValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ItemValue> {
        self.as_object().and_then(|m| m.get(key))
    }

    /// Resolve a dotted field path such as `country.id`.
    pub fn get_path(&self, path: &str) -> Option<&ItemValue> {
        path.split('.')
            .try_fold(self, |current, segment| current.get(segment.trim()))
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, ItemValue::Object(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            ItemValue::Bool(_) | ItemValue::Number(_) | ItemValue::String(_)
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ItemValue::Null => "null",
            ItemValue::Bool(_) => "bool",
            ItemValue::Number(_) => "number",
            ItemValue::String(_) => "string",
            ItemValue::Array(_) => "array",
            ItemValue::Object(_) => "object",
        }
    }

    /// Identity comparison used for keys: numbers compare by value, everything else
    /// structurally.
    pub fn key_eq(&self, other: &ItemValue) -> bool {
        match (self, other) {
            (ItemValue::Number(a), ItemValue::Number(b)) => a.same_as(b),
            (ItemValue::Array(a), ItemValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.key_eq(y))
            }
            (ItemValue::Object(a), ItemValue::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.key_eq(other)))
            }
            _ => self == other,
        }
    }

    /// The text a user sees for a primitive. Structured values fall back to their compact
    /// serialization.
    pub fn text_form(&self) -> String {
        match self {
            ItemValue::Null => String::new(),
            ItemValue::Bool(v) => v.to_string(),
            ItemValue::Number(n) => n.text_form(),
            ItemValue::String(s) => s.clone(),
            ItemValue::Array(_) | ItemValue::Object(_) => self.to_json5_compact(),
        }
    }

    pub fn parse_json5(text: &str) -> anyhow::Result<ItemValue> {
        Ok(json5::from_str::<ItemValue>(text)?)
    }

    pub fn to_json5_compact(&self) -> String {
        let mut out = String::new();
        self.write_compact(&mut out);
        out
    }

    fn write_compact(&self, out: &mut String) {
        match self {
            ItemValue::Null => out.push_str(statics::LITERAL_NULL),
            ItemValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            ItemValue::Number(n) => n.write_compact(out),
            ItemValue::String(s) => write_escaped_string(out, s),
            ItemValue::Array(values) => {
                out.push('[');
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    v.write_compact(out);
                }
                out.push(']');
            }
            ItemValue::Object(map) => {
                out.push('{');
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_escaped_string(out, k);
                    out.push(':');
                    v.write_compact(out);
                }
                out.push('}');
            }
        }
    }
}

impl Number {
    fn text_form(&self) -> String {
        let mut out = String::new();
        self.write_compact(&mut out);
        out
    }

    fn write_compact(&self, out: &mut String) {
        match self {
            Number::I64(v) => out.push_str(&v.to_string()),
            Number::U64(v) => out.push_str(&v.to_string()),
            Number::F64(v) => {
                if v.is_nan() {
                    out.push_str("NaN");
                } else if v.is_infinite() {
                    if v.is_sign_negative() {
                        out.push_str("-Infinity");
                    } else {
                        out.push_str("Infinity");
                    }
                } else if v.fract() == 0.0 && v.abs() < 1e15 {
                    // Whole floats read as integers ("2", not "2.0").
                    out.push_str(&(*v as i64).to_string());
                } else {
                    let mut buf = ryu::Buffer::new();
                    out.push_str(buf.format(*v));
                }
            }
        }
    }
}

impl From<&str> for ItemValue {
    fn from(v: &str) -> Self {
        ItemValue::String(v.to_owned())
    }
}

impl From<String> for ItemValue {
    fn from(v: String) -> Self {
        ItemValue::String(v)
    }
}

impl From<i64> for ItemValue {
    fn from(v: i64) -> Self {
        ItemValue::Number(Number::I64(v))
    }
}

impl From<i32> for ItemValue {
    fn from(v: i32) -> Self {
        ItemValue::Number(Number::I64(i64::from(v)))
    }
}

impl From<bool> for ItemValue {
    fn from(v: bool) -> Self {
        ItemValue::Bool(v)
    }
}

impl<T: Into<ItemValue>> From<Vec<T>> for ItemValue {
    fn from(values: Vec<T>) -> Self {
        ItemValue::Array(values.into_iter().map(Into::into).collect())
    }
}

fn write_escaped_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write as _;
                write!(out, "\\u{:04x}", c as u32).ok();
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl Serialize for ItemValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ItemValue::Null => serializer.serialize_unit(),
            ItemValue::Bool(v) => serializer.serialize_bool(*v),
            ItemValue::Number(n) => n.serialize(serializer),
            ItemValue::String(s) => serializer.serialize_str(s),
            ItemValue::Array(values) => values.serialize(serializer),
            ItemValue::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ItemValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> de::Visitor<'de> for ValueVisitor {
            type Value = ItemValue;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a JSON5 value")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ItemValue::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ItemValue::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                ItemValue::deserialize(d)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(ItemValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ItemValue::Number(Number::I64(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ItemValue::Number(Number::U64(v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(ItemValue::Number(Number::F64(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ItemValue::String(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(ItemValue::String(v))
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element::<ItemValue>()? {
                    values.push(value);
                }
                Ok(ItemValue::Array(values))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut values = IndexMap::new();
                while let Some((key, value)) = map.next_entry::<String, ItemValue>()? {
                    values.insert(key, value);
                }
                Ok(ItemValue::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
