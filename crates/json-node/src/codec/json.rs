use tracing::trace;

use super::Codec;
use crate::error::CodecError;
use crate::value::Value;

const NAME: &str = "json";

/// JSON text via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented output; decoding is unaffected.
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let out = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
        .map_err(|e| CodecError::encode(NAME, e))?;
        trace!(codec = NAME, len = out.len(), "encoded value");
        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        let value: Value = serde_json::from_slice(data).map_err(|e| CodecError::decode(NAME, e))?;
        trace!(codec = NAME, len = data.len(), kind = %value.kind(), "decoded value");
        Ok(value)
    }
}
