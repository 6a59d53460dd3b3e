//! Simulated connectivity failures
//!
//! Every store call is a remote call in production and can fail or time
//! out. The injector lets tests arm failures for the next N calls of an
//! operation, either rejecting the call before it takes effect or losing
//! the acknowledgement after it was applied.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use tenantry_core::Error;

/// Store operations that can be failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Document load
    Load,
    /// Document existence check
    Exists,
    /// Collection query or stream
    Query,
    /// Unit-of-work commit
    Commit,
    /// Compare-exchange write
    CompareExchangePut,
    /// Compare-exchange read
    CompareExchangeGet,
    /// Compare-exchange delete
    CompareExchangeDelete,
}

impl Operation {
    /// Short identifier (for errors and logs)
    pub const fn name(&self) -> &'static str {
        match self {
            Operation::Load => "load",
            Operation::Exists => "exists",
            Operation::Query => "query",
            Operation::Commit => "commit",
            Operation::CompareExchangePut => "compare_exchange_put",
            Operation::CompareExchangeGet => "compare_exchange_get",
            Operation::CompareExchangeDelete => "compare_exchange_delete",
        }
    }
}

/// How an armed fault manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    /// The call fails and has no effect
    Reject,
    /// The call takes effect but the caller sees a failure
    AckLost,
}

impl FaultMode {
    /// Error reported to the caller for `operation`
    pub fn to_error(self, operation: Operation) -> Error {
        let message = match self {
            FaultMode::Reject => "connection refused",
            FaultMode::AckLost => "request timed out",
        };
        Error::unavailable(operation.name(), message)
    }
}

/// Queue of armed faults per operation
#[derive(Debug, Default)]
pub struct FaultInjector {
    armed: Mutex<FxHashMap<Operation, VecDeque<FaultMode>>>,
}

impl FaultInjector {
    /// Create an injector with nothing armed
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls of `operation`
    pub fn fail_next(&self, operation: Operation, mode: FaultMode, times: usize) {
        let mut armed = self.armed.lock();
        let queue = armed.entry(operation).or_default();
        queue.extend(std::iter::repeat(mode).take(times));
    }

    /// Consume one armed fault for `operation`, if any
    pub fn take(&self, operation: Operation) -> Option<FaultMode> {
        let mut armed = self.armed.lock();
        let mode = armed.get_mut(&operation).and_then(|q| q.pop_front());
        if let Some(mode) = mode {
            tracing::debug!(operation = operation.name(), ?mode, "injected store fault");
        }
        mode
    }

    /// Number of faults still armed for `operation`
    pub fn pending(&self, operation: Operation) -> usize {
        self.armed
            .lock()
            .get(&operation)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    /// Disarm everything
    pub fn clear(&self) {
        self.armed.lock().clear();
    }
}
