// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Call dispatcher.
//
// Entry point for calls arriving from a container. Applies the context's
// interceptors and lifecycle gates, picks the business or default handler,
// and optionally moves the call onto the background executor. Every reply
// passes through one delivery path that notifies the lifecycle client, lets
// the interceptor rewrite it and reports failures.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use bridgewerk_core::codes;
use bridgewerk_core::types::ThreadType;

use crate::call::{BridgeCall, BridgeResult};
use crate::context::{BridgeContext, LifecycleClient, MockInterceptor};
use crate::executor::BridgeExecutor;
use crate::handler::{CallHandler, DefaultCallHandler, ReplyCallback};
use crate::report::{ErrorReporter, TracingReporter, build_report};

pub struct BridgeDispatcher {
    default_handler: Arc<DefaultCallHandler>,
    reporter: Arc<dyn ErrorReporter>,
    executor: Option<Arc<BridgeExecutor>>,
}

impl BridgeDispatcher {
    pub fn new(default_handler: Arc<DefaultCallHandler>) -> Self {
        Self {
            default_handler,
            reporter: Arc::new(TracingReporter),
            executor: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.set_reporter(reporter);
        self
    }

    pub fn with_executor(mut self, executor: Arc<BridgeExecutor>) -> Self {
        self.set_executor(executor);
        self
    }

    pub fn set_reporter(&mut self, reporter: Arc<dyn ErrorReporter>) {
        self.reporter = reporter;
    }

    /// Route threaded calls onto `executor`. Without one, every call runs
    /// on the dispatching thread.
    pub fn set_executor(&mut self, executor: Arc<BridgeExecutor>) {
        self.executor = Some(executor);
    }

    pub fn default_handler(&self) -> &Arc<DefaultCallHandler> {
        &self.default_handler
    }

    #[instrument(skip_all, fields(method = %call.bridge_name(), platform = %call.platform(), container_id = %context.container_id()))]
    pub fn dispatch(&self, call: BridgeCall, context: &Arc<BridgeContext>, callback: ReplyCallback) {
        let Some(shape) = call.payload().shape() else {
            warn!("unsupported payload shape, call skipped");
            return;
        };

        let interceptor = context.mock_interceptor();
        if let Some(interceptor) = &interceptor {
            if let Some(result) = interceptor.invoke_result(&call) {
                debug!("call answered by mock interceptor");
                callback(result);
                return;
            }
        }
        let call = match &interceptor {
            Some(interceptor) => interceptor.intercept_call(call),
            None => call,
        };

        let lifecycle = context.lifecycle_client();
        let deliver = self.delivery(&call, context, interceptor, lifecycle.clone(), callback);

        if self.default_handler.is_released() || context.is_released() {
            deliver(BridgeResult::error(shape, codes::RELEASED, codes::RELEASED_MSG));
            return;
        }

        if let Some(lifecycle) = &lifecycle {
            lifecycle.on_dispatched(&call);
            if let Some(result) = lifecycle.should_intercept_request(&call) {
                debug!(code = ?result.code(), "request intercepted by lifecycle client");
                deliver(result);
                return;
            }
            let decision = lifecycle.should_handle(&call);
            if !decision.allow {
                let msg = format!("{}, reason: {}", codes::INTERCEPTED_MSG, decision.reason);
                deliver(BridgeResult::error(shape, codes::INTERCEPTED, msg));
                return;
            }
        }

        let handler: Arc<dyn CallHandler> = match context.business_handler() {
            Some(business) if context.should_handle_with_business_handler(&call) => business,
            _ => Arc::clone(&self.default_handler) as Arc<dyn CallHandler>,
        };

        let thread_type = call.thread_type();
        let run = move || handler.handle(&call, deliver);
        match (thread_type, &self.executor) {
            (Some(ThreadType::Serial), Some(executor)) if !executor.is_closed() => {
                executor.execute_serial(run);
            }
            (Some(t), Some(executor)) if t.is_parallel() && !executor.is_closed() => {
                executor.execute_parallel(run);
            }
            _ => run(),
        }
    }

    fn delivery(
        &self,
        call: &BridgeCall,
        context: &Arc<BridgeContext>,
        interceptor: Option<Arc<dyn MockInterceptor>>,
        lifecycle: Option<Arc<dyn LifecycleClient>>,
        callback: ReplyCallback,
    ) -> ReplyCallback {
        let call = call.clone();
        let container_id = context.container_id().clone();
        let reporter = Arc::clone(&self.reporter);
        Box::new(move |result: BridgeResult| {
            if let Some(lifecycle) = &lifecycle {
                lifecycle.on_callback(&call, &result);
            }
            let result = match &interceptor {
                Some(interceptor) => interceptor.intercept_result(&call, result),
                None => result,
            };
            if let Some(report) = build_report(&call, &result, &container_id) {
                reporter.report(&report);
            }
            debug!(method = %call.bridge_name(), code = ?result.code(), reply = %result, "reply delivered");
            callback(result);
        })
    }
}
