use tracing::trace;

use super::Codec;
use crate::error::CodecError;
use crate::value::Value;

const NAME: &str = "cbor";

/// CBOR (RFC 8949) via `ciborium`. Byte strings decode to
/// [`Value::Bytes`], non-text map keys are stringified and semantic tags
/// are dropped in favour of the tagged content.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl Codec for CborCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        ciborium::ser::into_writer(value, &mut out).map_err(|e| CodecError::encode(NAME, e))?;
        trace!(codec = NAME, len = out.len(), "encoded value");
        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        let value: Value =
            ciborium::de::from_reader(data).map_err(|e| CodecError::decode(NAME, e))?;
        trace!(codec = NAME, len = data.len(), kind = %value.kind(), "decoded value");
        Ok(value)
    }
}
