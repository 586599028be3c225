#![cfg(all(feature = "cbor", feature = "msgpack"))]

use std::sync::Arc;

use json_node::{Codec, CodecError, CodecKind, FnCodec, JsonCodec, Map, Node, Value};
use proptest::prelude::*;

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        // Quarter steps are exact in binary and short in decimal.
        (-1_000_000i32..1_000_000).prop_map(|q| Value::from(q as f64 / 4.0)),
        "\\PC{0,12}".prop_map(Value::from),
        "[\\x00-\\x1f\"\\\\/]{0,4}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
            prop::collection::vec(("\\PC{0,6}", inner), 0..6)
                .prop_map(|entries| Value::from(entries.into_iter().collect::<Map>())),
        ]
    })
}

fn roundtrip_through(codec: Arc<dyn Codec>, value: &Value) -> Result<Value, CodecError> {
    let data = codec.encode(value)?;
    let node = Node::from_bytes_with_codec(&data, codec)?;
    let again = node.marshal()?;
    node.codec().decode(&again)
}

proptest! {
    #[test]
    fn prop_json_roundtrip(value in arb_value()) {
        prop_assert_eq!(roundtrip_through(Arc::new(JsonCodec::new()), &value)?, value);
    }

    #[test]
    fn prop_cbor_roundtrip(value in arb_value()) {
        prop_assert_eq!(roundtrip_through(CodecKind::Cbor.into_codec(), &value)?, value);
    }

    #[test]
    fn prop_msgpack_roundtrip(value in arb_value()) {
        prop_assert_eq!(roundtrip_through(CodecKind::MsgPack.into_codec(), &value)?, value);
    }
}

#[test]
fn test_marshal_each_shape() {
    for text in [r#"{"a":1}"#, "[1,2]", "1.5", "-3", r#""s""#, "true", "null"] {
        let node = Node::from_bytes(text).unwrap();
        assert_eq!(node.marshal().unwrap(), text.as_bytes());
    }
}

#[test]
fn test_subtree_marshal() {
    let node = Node::from_bytes(r#"{"a":{"b":[1,2]}}"#).unwrap();
    let b = node.get("a").unwrap().get("b").unwrap();
    assert_eq!(b.marshal().unwrap(), b"[1,2]");
}

#[test]
fn test_msgpack_document() {
    #[derive(serde::Serialize)]
    struct Sample {
        hoge: i64,
        piyo: f64,
    }

    let data = rmp_serde::to_vec_named(&Sample { hoge: 100, piyo: 2.5 }).unwrap();
    let root = Node::from_bytes_with_codec(&data, CodecKind::MsgPack.into_codec()).unwrap();
    assert_eq!(root.get("hoge").unwrap().int(), Ok(100));
    assert_eq!(root.get("piyo").unwrap().float(), Ok(2.5));
    assert_eq!(root.codec().name(), "msgpack");
}

#[test]
fn test_children_share_codec() {
    let root = Node::from_bytes_with_codec(
        CodecKind::Cbor.into_codec().encode(&Value::from(vec![Value::from(1)])).unwrap(),
        CodecKind::Cbor.into_codec(),
    )
    .unwrap();
    let child = root.index(0).unwrap();
    assert_eq!(child.codec().name(), "cbor");
    assert!(Arc::ptr_eq(root.codec(), child.codec()));
}

#[test]
fn test_substituted_codec() {
    // Reads whitespace-separated integers; writes them back space-joined.
    fn encode(v: &Value) -> Result<Vec<u8>, CodecError> {
        let items = v
            .as_array()
            .ok_or_else(|| CodecError::encode("ints", "not an array"))?;
        let words: Vec<String> = items.iter().map(|i| i.to_string()).collect();
        Ok(words.join(" ").into_bytes())
    }
    fn decode(data: &[u8]) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(data).map_err(|e| CodecError::decode("ints", e))?;
        text.split_whitespace()
            .map(|w| w.parse::<i64>().map(Value::from).map_err(|e| CodecError::decode("ints", e)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::from)
    }

    let codec: Arc<dyn Codec> = Arc::new(FnCodec::new("ints", encode, decode));
    let root = Node::from_bytes_with_codec("3 1 4", codec).unwrap();
    assert_eq!(root.len(), Ok(3));
    assert_eq!(root.index(2).unwrap().int(), Ok(4));
    assert_eq!(root.slice(0, 2).unwrap().marshal().unwrap(), b"3 1");
    let typed: Vec<u32> = root.unmarshal().unwrap();
    assert_eq!(typed, vec![3, 1, 4]);
    assert!(Node::from_bytes_with_codec("3 x", Arc::new(FnCodec::new("ints", encode, decode))).is_err());
}
