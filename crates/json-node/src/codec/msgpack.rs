use tracing::trace;

use super::Codec;
use crate::error::CodecError;
use crate::value::Value;

const NAME: &str = "msgpack";

/// MessagePack via `rmp-serde`. Integers decode to integers, `bin` to
/// [`Value::Bytes`], and non-string map keys are stringified.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl Codec for MsgPackCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let out = rmp_serde::to_vec(value).map_err(|e| CodecError::encode(NAME, e))?;
        trace!(codec = NAME, len = out.len(), "encoded value");
        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        let value: Value = rmp_serde::from_slice(data).map_err(|e| CodecError::decode(NAME, e))?;
        trace!(codec = NAME, len = data.len(), kind = %value.kind(), "decoded value");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Number;
    use std::collections::BTreeMap;

    #[test]
    fn test_decode_foreign_payload() {
        #[derive(serde::Serialize)]
        struct Payload {
            hoge: i32,
            piyo: f64,
        }
        let data = rmp_serde::to_vec_named(&Payload { hoge: 100, piyo: 2.5 }).unwrap();
        let v = MsgPackCodec.decode(&data).unwrap();
        let map = v.as_object().unwrap();
        assert_eq!(map["hoge"], Value::Number(Number::Int(100)));
        assert_eq!(map["piyo"], Value::Number(Number::Float(2.5)));
    }

    #[test]
    fn test_integer_keys_are_stringified() {
        let mut src = BTreeMap::new();
        src.insert(1u8, "one");
        src.insert(2u8, "two");
        let data = rmp_serde::to_vec(&src).unwrap();
        let v = MsgPackCodec.decode(&data).unwrap();
        let map = v.as_object().unwrap();
        assert_eq!(map["1"], Value::from("one"));
        assert_eq!(map["2"], Value::from("two"));
    }

    #[test]
    fn test_roundtrip() {
        let v = Value::from(serde_json::json!({"a": [1, -1, 2.5, "x", null, false]}));
        let back = MsgPackCodec.decode(&MsgPackCodec.encode(&v).unwrap()).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_garbage_input() {
        let err = MsgPackCodec.decode(&[0xc1]).unwrap_err();
        assert!(matches!(err, CodecError::Decode { codec: "msgpack", .. }));
    }
}
