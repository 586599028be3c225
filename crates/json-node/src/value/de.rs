//! Decoding into [`Value`] and converting a [`Value`] into typed data.
//!
//! `Deserialize` accepts any self-describing format. Map keys that are not
//! strings (MessagePack and CBOR allow them) are stringified here, so the
//! rest of the crate only ever sees one object representation.
//!
//! The `Deserializer` impl is what lets [`Node::unmarshal`](crate::Node::unmarshal)
//! hand a decoded value to an arbitrary `DeserializeOwned` destination.

use std::fmt;
use std::iter;

use serde::de::value::{MapAccessDeserializer, MapDeserializer, SeqDeserializer};
use serde::de::{
    self, Deserialize, Deserializer, EnumAccess, IgnoredAny, IntoDeserializer, MapAccess,
    SeqAccess, Unexpected, VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;

use super::{Map, Number, Value};
use crate::error::CodecError;

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON-like value")
    }

    fn visit_bool<E>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Number(Number::Int(i)))
    }

    fn visit_u64<E>(self, u: u64) -> Result<Value, E> {
        Ok(Value::Number(Number::from_u64(u)))
    }

    fn visit_i128<E>(self, i: i128) -> Result<Value, E> {
        Ok(match i64::try_from(i) {
            Ok(i) => Value::Number(Number::Int(i)),
            Err(_) => match u64::try_from(i) {
                Ok(u) => Value::Number(Number::UInt(u)),
                Err(_) => Value::Number(Number::Float(i as f64)),
            },
        })
    }

    fn visit_u128<E>(self, u: u128) -> Result<Value, E> {
        Ok(match u64::try_from(u) {
            Ok(u) => Value::Number(Number::from_u64(u)),
            Err(_) => Value::Number(Number::Float(u as f64)),
        })
    }

    fn visit_f64<E>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Number(Number::Float(f)))
    }

    fn visit_str<E>(self, s: &str) -> Result<Value, E> {
        Ok(Value::from(s))
    }

    fn visit_string<E>(self, s: String) -> Result<Value, E> {
        Ok(Value::from(s))
    }

    fn visit_bytes<E>(self, b: &[u8]) -> Result<Value, E> {
        Ok(Value::bytes(b))
    }

    fn visit_byte_buf<E>(self, b: Vec<u8>) -> Result<Value, E> {
        Ok(Value::bytes(b))
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    /// CBOR semantic tags arrive as enums; the tag is dropped and the
    /// tagged content kept.
    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Value, A::Error> {
        let (IgnoredAny, content) = data.variant::<IgnoredAny>()?;
        content.newtype_variant::<Value>()
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::from(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = Map::with_capacity(access.size_hint().unwrap_or(0).min(4096));
        while let Some(MapKey(key)) = access.next_key::<MapKey>()? {
            let value = access.next_value::<Value>()?;
            map.insert(key, value);
        }
        Ok(Value::from(map))
    }
}

/// An object key from a format that allows scalar keys of any type.
struct MapKey(String);

impl<'de> Deserialize<'de> for MapKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MapKeyVisitor).map(MapKey)
    }
}

struct MapKeyVisitor;

impl<'de> Visitor<'de> for MapKeyVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar map key")
    }

    fn visit_str<E>(self, s: &str) -> Result<String, E> {
        Ok(s.to_owned())
    }

    fn visit_string<E>(self, s: String) -> Result<String, E> {
        Ok(s)
    }

    fn visit_bool<E>(self, b: bool) -> Result<String, E> {
        Ok(b.to_string())
    }

    fn visit_i64<E>(self, i: i64) -> Result<String, E> {
        Ok(i.to_string())
    }

    fn visit_u64<E>(self, u: u64) -> Result<String, E> {
        Ok(u.to_string())
    }

    fn visit_i128<E>(self, i: i128) -> Result<String, E> {
        Ok(i.to_string())
    }

    fn visit_u128<E>(self, u: u128) -> Result<String, E> {
        Ok(u.to_string())
    }

    fn visit_f64<E>(self, f: f64) -> Result<String, E> {
        Ok(f.to_string())
    }

    fn visit_bytes<E>(self, b: &[u8]) -> Result<String, E> {
        Ok(String::from_utf8_lossy(b).into_owned())
    }

    fn visit_unit<E>(self) -> Result<String, E> {
        Ok("null".to_owned())
    }

    fn visit_none<E>(self) -> Result<String, E> {
        Ok("null".to_owned())
    }
}

impl Value {
    fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Value::Null => Unexpected::Unit,
            Value::Bool(b) => Unexpected::Bool(*b),
            Value::Number(Number::Int(i)) => Unexpected::Signed(*i),
            Value::Number(Number::UInt(u)) => Unexpected::Unsigned(*u),
            Value::Number(Number::Float(f)) => Unexpected::Float(*f),
            Value::String(s) => Unexpected::Str(s),
            Value::Bytes(b) => Unexpected::Bytes(b),
            Value::Array(_) => Unexpected::Seq,
            Value::Object(_) => Unexpected::Map,
        }
    }
}

impl<'de> IntoDeserializer<'de, CodecError> for Value {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> Deserializer<'de> for Value {
    type Error = CodecError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        match self {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(Number::Int(i)) => visitor.visit_i64(i),
            Value::Number(Number::UInt(u)) => visitor.visit_u64(u),
            Value::Number(Number::Float(f)) => visitor.visit_f64(f),
            Value::String(s) => visitor.visit_str(&s),
            Value::Bytes(b) => visitor.visit_bytes(&b),
            Value::Array(items) => {
                let mut seq = SeqDeserializer::new(items.iter().cloned());
                let out = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(out)
            }
            Value::Object(map) => {
                let mut access =
                    MapDeserializer::new(map.iter().map(|(k, v)| (k.clone(), v.clone())));
                let out = visitor.visit_map(&mut access)?;
                access.end()?;
                Ok(out)
            }
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        match self {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    // Byte sequences also satisfy sequence destinations such as `Vec<u8>`.
    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        match self {
            Value::Bytes(b) => {
                let mut seq = SeqDeserializer::new(b.iter().copied());
                let out = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(out)
            }
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        match self {
            Value::String(s) => visitor.visit_enum(s.to_string().into_deserializer()),
            Value::Object(map) if map.len() == 1 => {
                let (variant, value) = match map.first() {
                    Some((k, v)) => (k.clone(), v.clone()),
                    None => return Err(de::Error::invalid_length(0, &"exactly one key")),
                };
                visitor.visit_enum(MapAccessDeserializer::new(MapDeserializer::new(
                    iter::once((variant, value)),
                )))
            }
            other => Err(de::Error::invalid_type(
                other.unexpected(),
                &"a string or a single-key object",
            )),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple tuple_struct map struct
        identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Child {
        data: i64,
        children: Vec<Child>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    enum Shape {
        Dot,
        Circle { r: f64 },
    }

    #[test]
    fn test_decode_from_json_text() {
        let v: Value = serde_json::from_str(r#"{"a":[1,-2,2.5,"s",null,true]}"#).unwrap();
        assert_eq!(v, Value::from(json!({"a": [1, -2, 2.5, "s", null, true]})));
    }

    #[test]
    fn test_large_unsigned_is_kept() {
        let v: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(v, Value::Number(Number::UInt(u64::MAX)));
    }

    #[test]
    fn test_non_string_keys_are_stringified() {
        let mut access = MapDeserializer::<_, CodecError>::new(
            vec![(Value::from(1), Value::from("one")), (Value::from(true), Value::Null)]
                .into_iter(),
        );
        let v = ValueVisitor.visit_map(&mut access).unwrap();
        let map = v.as_object().unwrap();
        assert_eq!(map["1"], Value::from("one"));
        assert!(map["true"].is_null());
    }

    #[test]
    fn test_into_struct() {
        let v = Value::from(json!({"data": 1, "children": [{"data": 2, "children": []}]}));
        let child = Child::deserialize(v).unwrap();
        assert_eq!(
            child,
            Child {
                data: 1,
                children: vec![Child {
                    data: 2,
                    children: vec![]
                }]
            }
        );
    }

    #[test]
    fn test_into_enum() {
        assert_eq!(Shape::deserialize(Value::from("Dot")).unwrap(), Shape::Dot);
        let v = Value::from(json!({"Circle": {"r": 1.5}}));
        assert_eq!(Shape::deserialize(v).unwrap(), Shape::Circle { r: 1.5 });
        assert!(Shape::deserialize(Value::from(3)).is_err());
    }

    #[test]
    fn test_bytes_into_vec() {
        let out = Vec::<u8>::deserialize(Value::bytes(vec![1u8, 2, 3])).unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_option_and_mismatch() {
        assert_eq!(Option::<i32>::deserialize(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::deserialize(Value::from(4)).unwrap(), Some(4));
        let err = i32::deserialize(Value::from("x")).unwrap_err();
        assert!(err.to_string().contains("invalid type"));
    }
}
