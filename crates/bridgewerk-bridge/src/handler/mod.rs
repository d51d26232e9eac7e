// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Call handlers.
//
// Both handler variants resolve a method from their own registry and pool,
// then hand it to `invoke`, which runs the shared decode / invoke / encode
// pipeline. Every failure between resolution and reply becomes a reply.

pub mod business;
pub mod default;

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use bridgewerk_codec::Codec;
use bridgewerk_core::codes;
use bridgewerk_core::error::{BridgeError, Result};
use bridgewerk_core::value::CanonicalMap;

use crate::call::{BridgeCall, BridgeResult, PayloadShape};
use crate::completion::{Outcome, completion_pair};
use crate::context::BridgeContext;
use crate::method::{Compatibility, SharedMethod};
use crate::model::{FieldSpec, apply_param_fields, check_result_fields};
use crate::processor::{Processor, envelope};

pub use business::BusinessCallHandler;
pub use default::DefaultCallHandler;

/// Delivers the reply for one call back to the runtime.
pub type ReplyCallback = Box<dyn FnOnce(BridgeResult) + Send + 'static>;

/// Resolves and runs calls against one registry and instance pool.
pub trait CallHandler: Send + Sync {
    /// Handle `call`. `callback` receives exactly one reply, except for
    /// payloads of unknown shape, which are skipped.
    fn handle(&self, call: &BridgeCall, callback: ReplyCallback);

    /// Release cached instances and refuse further calls. Idempotent.
    fn release(&self);

    fn is_released(&self) -> bool;
}

/// Run `method` for `call` and reply through `callback`.
pub(crate) fn invoke(
    method: &SharedMethod,
    call: &BridgeCall,
    shape: PayloadShape,
    context: Option<&Arc<BridgeContext>>,
    unwrap_data: bool,
    callback: ReplyCallback,
) {
    if let Some(context) = context {
        method.set_bridge_context(context);
    }

    let processor = if method.preserve_opaque() {
        Processor::new(Codec::current().preserving_opaque())
    } else {
        Processor::current()
    };
    let compatible = method.compatibility() == Compatibility::Compatible;

    let prepared = panic::catch_unwind(AssertUnwindSafe(|| {
        prepare_params(method, call, &processor, compatible, unwrap_data)
    }));
    let params = match prepared {
        Ok(Ok(params)) => params,
        Ok(Err(e)) => {
            warn!(method = %method.name(), code = e.code(), error = %e, "parameter processing failed");
            callback(BridgeResult::error(shape, e.code(), e.reply_message()));
            return;
        }
        Err(panic) => {
            let msg = panic_message(panic.as_ref());
            warn!(method = %method.name(), panic = %msg, "parameter processing panicked");
            callback(BridgeResult::error(shape, codes::UNKNOWN_ERROR, with_backtrace(&msg)));
            return;
        }
    };

    let result_fields = if compatible { None } else { method.result_fields() };
    let use_original_result = method.use_original_result();
    let method_name = method.name().to_string();
    let sink = move |outcome: Outcome| {
        let reply = finish_reply(&method_name, outcome, result_fields, use_original_result);
        callback(BridgeResult::new(processor.encode(shape, &reply)));
    };

    let (completion, guard) = completion_pair(method.name(), sink);
    let scope = shape.scope();
    debug!(method = %method.name(), scope = %scope, compatible, "invoking bridge method");

    match panic::catch_unwind(AssertUnwindSafe(|| method.handle(params, completion, scope))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(method = %method.name(), code = e.code(), error = %e, "bridge method failed");
            let replied = guard.complete_if_pending(Outcome::Failure {
                code: e.code(),
                msg: e.reply_message(),
                data: None,
            });
            if !replied {
                debug!(method = %method.name(), "error raised after the method already replied");
            }
        }
        Err(panic) => {
            let msg = panic_message(panic.as_ref());
            warn!(method = %method.name(), panic = %msg, "bridge method panicked");
            guard.complete_if_pending(Outcome::Failure {
                code: codes::UNKNOWN_ERROR,
                msg: with_backtrace(&msg),
                data: None,
            });
        }
    }
}

fn prepare_params(
    method: &SharedMethod,
    call: &BridgeCall,
    processor: &Processor,
    compatible: bool,
    unwrap_data: bool,
) -> Result<CanonicalMap> {
    let mut params = processor.decode(call.payload(), unwrap_data)?;
    if compatible {
        return Ok(params);
    }
    if let Some(fields) = method.param_fields() {
        apply_param_fields(fields, &mut params)?;
    }
    Ok(params)
}

fn finish_reply(
    method: &str,
    outcome: Outcome,
    result_fields: Option<&'static [FieldSpec]>,
    use_original_result: bool,
) -> CanonicalMap {
    if let (Outcome::Success { data, .. }, Some(fields)) = (&outcome, result_fields) {
        if let Err(e) = check_result_fields(fields, data) {
            warn!(method = %method, error = %e, "bridge method returned an invalid result");
            return envelope(failure_from(&e), false);
        }
    }
    envelope(outcome, use_original_result)
}

fn failure_from(error: &BridgeError) -> Outcome {
    Outcome::Failure {
        code: error.code(),
        msg: error.reply_message(),
        data: None,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn with_backtrace(msg: &str) -> String {
    format!("{msg}\n{}", Backtrace::force_capture())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    use serde_json::json;

    use bridgewerk_codec::{LynxMap, LynxValue, WebPayload};
    use bridgewerk_core::types::PlatformScope;
    use bridgewerk_core::value::{CanonicalValue, MapBuilder, MapExt, OpaqueValue};

    use crate::completion::Completion;
    use crate::method::BridgeMethod;
    use crate::model::FieldKind;

    fn web_call(name: &str, payload: serde_json::Value) -> BridgeCall {
        let serde_json::Value::Object(map) = payload else {
            panic!("payload must be an object");
        };
        BridgeCall::web(name, map)
    }

    fn run(method: impl BridgeMethod, call: &BridgeCall) -> BridgeResult {
        let method: SharedMethod = Arc::new(method);
        let (tx, rx) = mpsc::channel();
        invoke(&method, call, PayloadShape::Web, None, false, Box::new(move |r| {
            tx.send(r).expect("send reply");
        }));
        rx.recv_timeout(Duration::from_secs(1)).expect("reply")
    }

    struct Failing;

    impl BridgeMethod for Failing {
        fn name(&self) -> &str {
            "test.failing"
        }

        fn handle(&self, _: CanonicalMap, _: Completion, _: PlatformScope) -> Result<()> {
            Err(BridgeError::IllegalOperation("accessor not supported".into()))
        }
    }

    struct Panicking;

    impl BridgeMethod for Panicking {
        fn name(&self) -> &str {
            "test.panicking"
        }

        fn handle(&self, _: CanonicalMap, _: Completion, _: PlatformScope) -> Result<()> {
            panic!("storage backend exploded");
        }
    }

    static KEY_FIELDS: &[FieldSpec] = &[FieldSpec::required("key", FieldKind::String)];
    static VALUE_FIELDS: &[FieldSpec] = &[FieldSpec::required("value", FieldKind::String)];

    struct Validated {
        reply_with_value: bool,
    }

    impl BridgeMethod for Validated {
        fn name(&self) -> &str {
            "test.validated"
        }

        fn param_fields(&self) -> Option<&'static [FieldSpec]> {
            Some(KEY_FIELDS)
        }

        fn result_fields(&self) -> Option<&'static [FieldSpec]> {
            Some(VALUE_FIELDS)
        }

        fn handle(&self, params: CanonicalMap, completion: Completion, _: PlatformScope) -> Result<()> {
            let mut out = MapBuilder::new();
            if self.reply_with_value {
                out = out.put("value", params.get_str("key").unwrap_or_default());
            }
            completion.success(out.build());
            Ok(())
        }
    }

    struct Legacy;

    impl BridgeMethod for Legacy {
        fn name(&self) -> &str {
            "test.legacy"
        }

        fn compatibility(&self) -> Compatibility {
            Compatibility::Compatible
        }

        fn param_fields(&self) -> Option<&'static [FieldSpec]> {
            Some(KEY_FIELDS)
        }

        fn handle(&self, params: CanonicalMap, completion: Completion, _: PlatformScope) -> Result<()> {
            completion.raw(MapBuilder::new().put("seen", params.len() as i32).build());
            Ok(())
        }
    }

    struct Blob {
        preserve: bool,
    }

    impl BridgeMethod for Blob {
        fn name(&self) -> &str {
            "test.blob"
        }

        fn preserve_opaque(&self) -> bool {
            self.preserve
        }

        fn handle(&self, params: CanonicalMap, completion: Completion, _: PlatformScope) -> Result<()> {
            let opaque = matches!(params.get("blob"), Some(CanonicalValue::Opaque(_)));
            completion.success(MapBuilder::new().put("opaque", opaque).build());
            Ok(())
        }
    }

    fn blob_reply(preserve: bool) -> serde_json::Value {
        let mut payload = LynxMap::new();
        payload.insert(
            "blob".into(),
            LynxValue::Opaque(OpaqueValue::text(r#"{"k":1}"#)),
        );
        let call = BridgeCall::lynx("test.blob", payload);
        let method: SharedMethod = Arc::new(Blob { preserve });
        let (tx, rx) = mpsc::channel();
        invoke(&method, &call, PayloadShape::Lynx, None, false, Box::new(move |r| {
            tx.send(r).expect("send reply");
        }));
        let result = rx.recv_timeout(Duration::from_secs(1)).expect("reply");
        serde_json::Value::Object(result.to_json())
    }

    #[test]
    fn opaque_values_reach_opted_in_methods_untouched() {
        assert_eq!(blob_reply(true)["data"], json!({"opaque": true}));
        assert_eq!(blob_reply(false)["data"], json!({"opaque": false}));
    }

    #[test]
    fn method_error_maps_to_its_code() {
        let result = run(Failing, &web_call("test.failing", json!({})));
        assert_eq!(result.code(), Some(codes::ILLEGAL_OPERATION));
        assert_eq!(result.msg().as_deref(), Some("accessor not supported"));
    }

    #[test]
    fn panic_maps_to_unknown_with_diagnostics() {
        let result = run(Panicking, &web_call("test.panicking", json!({})));
        assert_eq!(result.code(), Some(codes::UNKNOWN_ERROR));
        assert!(result
            .msg()
            .is_some_and(|m| m.starts_with("storage backend exploded")));
    }

    #[test]
    fn missing_required_param_is_invalid_input() {
        let method = Validated {
            reply_with_value: true,
        };
        let result = run(method, &web_call("test.validated", json!({"other": 1})));
        assert_eq!(result.code(), Some(codes::INVALID_PARAM));
        assert_eq!(
            result.msg().as_deref(),
            Some("key param is missing from input")
        );
    }

    #[test]
    fn invalid_result_is_invalid_output() {
        let method = Validated {
            reply_with_value: false,
        };
        let result = run(method, &web_call("test.validated", json!({"key": "k"})));
        assert_eq!(result.code(), Some(codes::INVALID_RESULT));
    }

    #[test]
    fn valid_result_is_wrapped_in_envelope() {
        let method = Validated {
            reply_with_value: true,
        };
        let result = run(method, &web_call("test.validated", json!({"key": "k"})));
        assert_eq!(
            serde_json::Value::Object(result.to_json()),
            json!({"code": 0, "msg": "Success", "data": {"value": "k"}})
        );
    }

    #[test]
    fn compatible_method_gets_lynx_arguments_unwrapped_from_data() {
        let mut inner = LynxMap::new();
        inner.insert("key".into(), LynxValue::String("k".into()));
        let mut payload = LynxMap::new();
        payload.insert("data".into(), LynxValue::Map(inner));
        let call = BridgeCall::lynx("test.legacy", payload);

        let method: SharedMethod = Arc::new(Legacy);
        let (tx, rx) = mpsc::channel();
        invoke(&method, &call, PayloadShape::Lynx, None, true, Box::new(move |r| {
            tx.send(r).expect("send reply");
        }));
        let result = rx.recv_timeout(Duration::from_secs(1)).expect("reply");
        assert_eq!(
            serde_json::Value::Object(result.to_json()),
            json!({"seen": 1})
        );
    }

    #[test]
    fn compatible_method_sees_whole_payload_and_replies_raw() {
        let result = run(Legacy, &web_call("test.legacy", json!({"a": 1, "data": {"b": 2}})));
        let json: WebPayload = result.to_json();
        assert_eq!(serde_json::Value::Object(json), json!({"seen": 2}));
    }
}
