use std::cell::RefCell;

use crate::expression::value::Value;

/// Sink for values emitted by the `print` opcode.
pub trait Diagnostics {
    fn print(&self, value: &Value);
}

/// Default sink: forwards to `tracing` at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn print(&self, value: &Value) {
        tracing::info!(target: "shapegraph::print", %value, "print");
    }
}

/// Sink that keeps every printed value, in order.
#[derive(Debug, Default)]
pub struct CapturedDiagnostics {
    values: RefCell<Vec<Value>>,
}

impl CapturedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<Value> {
        self.values.borrow().clone()
    }

    pub fn take(&self) -> Vec<Value> {
        self.values.take()
    }
}

impl Diagnostics for CapturedDiagnostics {
    fn print(&self, value: &Value) {
        self.values.borrow_mut().push(value.clone());
    }
}
