// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridgewerk: method registry, call handlers and dispatch.
//
// Embedded runtimes (web views and Lynx views) call native bridge methods by
// name. This crate resolves the name against namespaced registries, runs the
// method on a canonical parameter map and replies in the payload shape the
// call arrived in.

pub mod bridge;
pub mod call;
pub mod completion;
pub mod context;
pub mod dispatcher;
pub mod executor;
pub mod handler;
pub mod manager;
pub mod method;
pub mod model;
pub mod pool;
pub mod processor;
pub mod registry;
pub mod registry_cache;
pub mod report;

pub use bridge::Bridge;
pub use call::{BridgeCall, BridgeResult, Payload, PayloadShape};
pub use completion::{Completion, Outcome};
pub use context::{BridgeContext, EventEmitter, HandleDecision, LifecycleClient, MockInterceptor};
pub use dispatcher::BridgeDispatcher;
pub use executor::BridgeExecutor;
pub use handler::{BusinessCallHandler, CallHandler, DefaultCallHandler, ReplyCallback};
pub use manager::BridgeManager;
pub use method::{BridgeMethod, Compatibility, ContextSlot, MethodHandle, SharedMethod};
pub use model::{DefaultValue, FieldKind, FieldSpec, ParamModel, ResultModel};
pub use registry::MethodRegistry;
pub use registry_cache::RegistryCacheManager;
pub use report::{ErrorReport, ErrorReporter, TracingReporter};
