// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-shot completion for bridge method invocations.
//
// A method receives a `Completion` by value and consumes it to reply. The
// handler keeps a `CompletionGuard` on the same slot so it can still reply
// when the method returns an error or panics before completing.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use bridgewerk_core::codes;
use bridgewerk_core::value::CanonicalMap;

/// What a method produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { data: CanonicalMap, msg: String },
    Failure { code: i32, msg: String, data: Option<CanonicalMap> },
    /// A ready-made reply map, sent without the `{code, msg, data}` envelope.
    Raw(CanonicalMap),
}

type Sink = Box<dyn FnOnce(Outcome) + Send>;

struct Slot {
    method: String,
    sink: Mutex<Option<Sink>>,
}

impl Slot {
    fn take(&self) -> Option<Sink> {
        self.sink.lock().take()
    }

    fn is_pending(&self) -> bool {
        self.sink.lock().is_some()
    }
}

/// Reply channel handed to a bridge method. Exactly one reply is delivered.
pub struct Completion {
    slot: Arc<Slot>,
}

/// Handler-side view of a completion.
pub(crate) struct CompletionGuard {
    slot: Arc<Slot>,
}

/// Create a completion for `method` and the guard watching it.
pub(crate) fn completion_pair(
    method: &str,
    sink: impl FnOnce(Outcome) + Send + 'static,
) -> (Completion, CompletionGuard) {
    let slot = Arc::new(Slot {
        method: method.to_string(),
        sink: Mutex::new(Some(Box::new(sink))),
    });
    (
        Completion {
            slot: Arc::clone(&slot),
        },
        CompletionGuard { slot },
    )
}

impl Completion {
    /// Reply with code 0 and the default success message.
    pub fn success(self, data: CanonicalMap) {
        self.complete(Outcome::Success {
            data,
            msg: codes::SUCCESS_MSG.to_string(),
        });
    }

    pub fn success_with_msg(self, data: CanonicalMap, msg: impl Into<String>) {
        self.complete(Outcome::Success {
            data,
            msg: msg.into(),
        });
    }

    pub fn failure(self, code: i32, msg: impl Into<String>) {
        self.complete(Outcome::Failure {
            code,
            msg: msg.into(),
            data: None,
        });
    }

    pub fn failure_with_data(self, code: i32, msg: impl Into<String>, data: CanonicalMap) {
        self.complete(Outcome::Failure {
            code,
            msg: msg.into(),
            data: Some(data),
        });
    }

    /// Reply with `reply` as the whole reply map.
    pub fn raw(self, reply: CanonicalMap) {
        self.complete(Outcome::Raw(reply));
    }

    pub fn complete(self, outcome: Outcome) {
        let sink = self.slot.take();
        debug_assert!(
            sink.is_some(),
            "completion for {} invoked more than once",
            self.slot.method
        );
        match sink {
            Some(sink) => sink(outcome),
            None => warn!(method = %self.slot.method, "duplicate completion ignored"),
        }
    }

    pub fn method(&self) -> &str {
        &self.slot.method
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        // While the handler's guard is alive it will reply on the method's
        // behalf; only a completion outliving the guard leaves the call hanging.
        if Arc::strong_count(&self.slot) == 1 && self.slot.is_pending() {
            debug!(method = %self.slot.method, "completion dropped without a reply; call stays pending");
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("method", &self.slot.method)
            .field("pending", &self.slot.is_pending())
            .finish()
    }
}

impl CompletionGuard {
    /// Deliver `outcome` only if the method has not replied yet.
    pub(crate) fn complete_if_pending(&self, outcome: Outcome) -> bool {
        match self.slot.take() {
            Some(sink) => {
                sink(outcome);
                true
            }
            None => false,
        }
    }
}
