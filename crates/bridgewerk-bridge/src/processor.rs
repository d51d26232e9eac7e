// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Payload processor.
//
// Turns native payloads into canonical parameter maps and method outcomes
// back into native replies of the same shape.

use bridgewerk_codec::Codec;
use bridgewerk_core::codes;
use bridgewerk_core::error::{BridgeError, Result};
use bridgewerk_core::value::{CanonicalMap, CanonicalValue};

use crate::call::{Payload, PayloadShape};
use crate::completion::Outcome;

#[derive(Debug, Clone, Copy, Default)]
pub struct Processor {
    codec: Codec,
}

impl Processor {
    pub fn new(codec: Codec) -> Self {
        Self { codec }
    }

    /// Processor using the process-wide numeric policy at this instant.
    pub fn current() -> Self {
        Self::new(Codec::current())
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Decode `payload` into a parameter map.
    ///
    /// With `unwrap_data`, a map under the `data` key replaces the payload.
    pub fn decode(&self, payload: &Payload, unwrap_data: bool) -> Result<CanonicalMap> {
        let mut params = match payload {
            Payload::Web(map) => self.codec.decode_web(map),
            Payload::Lynx(map) => self.codec.decode_lynx(map),
            Payload::Other => {
                return Err(BridgeError::ParamModel(
                    "payload shape is not supported".into(),
                ));
            }
        };
        if unwrap_data {
            if let Some(CanonicalValue::Map(inner)) = params.remove(codes::KEY_DATA) {
                return Ok(inner);
            }
        }
        Ok(params)
    }

    pub fn encode(&self, shape: PayloadShape, reply: &CanonicalMap) -> Payload {
        match shape {
            PayloadShape::Web => Payload::Web(self.codec.encode_web(reply)),
            PayloadShape::Lynx => Payload::Lynx(self.codec.encode_lynx(reply)),
        }
    }
}

/// Wrap an outcome into its reply map.
///
/// `Raw` outcomes are sent as they are. With `use_original_result`, a
/// successful `data.originalResult` map becomes the whole reply.
pub fn envelope(outcome: Outcome, use_original_result: bool) -> CanonicalMap {
    match outcome {
        Outcome::Raw(reply) => reply,
        Outcome::Success { mut data, msg } => {
            if use_original_result {
                if let Some(CanonicalValue::Map(original)) = data.remove(codes::KEY_ORIGINAL_RESULT) {
                    return original;
                }
            }
            reply_map(codes::SUCCESS, msg, data)
        }
        Outcome::Failure { code, msg, data } => reply_map(code, msg, data.unwrap_or_default()),
    }
}

fn reply_map(code: i32, msg: String, data: CanonicalMap) -> CanonicalMap {
    let mut reply = CanonicalMap::new();
    reply.insert(codes::KEY_CODE.into(), CanonicalValue::Int(code));
    reply.insert(codes::KEY_MSG.into(), CanonicalValue::String(msg));
    reply.insert(codes::KEY_DATA.into(), CanonicalValue::Map(data));
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridgewerk_codec::{LynxMap, LynxValue};
    use bridgewerk_core::value::{MapBuilder, MapExt};
    use serde_json::json;

    fn web(value: serde_json::Value) -> Payload {
        match value {
            serde_json::Value::Object(map) => Payload::Web(map),
            _ => Payload::Other,
        }
    }

    #[test]
    fn decode_unwraps_nested_data_map_when_asked() {
        let payload = web(json!({"data": {"key": "k"}, "ignored": 1}));
        let processor = Processor::default();

        let unwrapped = processor.decode(&payload, true).expect("decode");
        assert_eq!(unwrapped.get_str("key"), Some("k"));
        assert!(!unwrapped.contains_key("ignored"));

        let whole = processor.decode(&payload, false).expect("decode");
        assert!(whole.contains_key("ignored"));
    }

    #[test]
    fn decode_keeps_scalar_data_in_place() {
        let payload = web(json!({"key": "k", "data": "v"}));
        let params = Processor::default().decode(&payload, true).expect("decode");
        assert_eq!(params.get_str("data"), Some("v"));
        assert_eq!(params.get_str("key"), Some("k"));
    }

    #[test]
    fn decode_rejects_unknown_shape() {
        let err = Processor::default()
            .decode(&Payload::Other, false)
            .expect_err("unsupported shape");
        assert_eq!(err.code(), codes::PARAM_MODEL_ERROR);
    }

    #[test]
    fn success_envelope_has_code_msg_and_data() {
        let reply = envelope(
            Outcome::Success {
                data: MapBuilder::new().put("v", 1).build(),
                msg: "Success".into(),
            },
            false,
        );
        assert_eq!(reply.get_i64("code"), Some(0));
        assert_eq!(reply.get_str("msg"), Some("Success"));
        assert_eq!(reply.get_map("data").and_then(|d| d.get_i64("v")), Some(1));
    }

    #[test]
    fn failure_without_data_gets_empty_map() {
        let reply = envelope(
            Outcome::Failure {
                code: -3,
                msg: "bad".into(),
                data: None,
            },
            false,
        );
        assert_eq!(reply.get_map("data").map(|d| d.len()), Some(0));
    }

    #[test]
    fn original_result_replaces_envelope() {
        let original = MapBuilder::new().put("status", "raw").build();
        let data = MapBuilder::new()
            .put(codes::KEY_ORIGINAL_RESULT, original.clone())
            .build();
        let outcome = Outcome::Success {
            data,
            msg: "Success".into(),
        };

        assert_eq!(envelope(outcome.clone(), true), original);
        assert!(envelope(outcome, false).contains_key("code"));
    }

    #[test]
    fn encode_follows_requested_shape() {
        let reply = MapBuilder::new().put("code", 0).build();
        let processor = Processor::default();

        let Payload::Lynx(map) = processor.encode(PayloadShape::Lynx, &reply) else {
            panic!("expected lynx payload");
        };
        let mut expected = LynxMap::new();
        expected.insert("code".into(), LynxValue::Int(0));
        assert_eq!(map, expected);

        assert!(matches!(processor.encode(PayloadShape::Web, &reply), Payload::Web(_)));
    }
}
