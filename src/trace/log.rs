//! Default tracer that writes through `tracing`.

use super::{Divergence, TraceEvent, Tracer};
use crate::core::StateId;

/// Writes every event as a `tracing` record.
///
/// Events go out at `debug` level in the layout
/// `HSM [<label>]:<indent><kind><target>`, indented by stack depth.
/// Divergence goes out at `error` level.
#[derive(Clone, Debug)]
pub struct LogTracer {
    label: String,
}

impl LogTracer {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn format_event<I: StateId>(&self, event: &TraceEvent<I>) -> String {
        format!(
            "HSM [{}]:{}{:<11}{}",
            self.label,
            " ".repeat(event.depth),
            event.kind,
            event.target.name()
        )
    }
}

impl Default for LogTracer {
    fn default() -> Self {
        Self::new("NoOwner")
    }
}

impl<I: StateId> Tracer<I> for LogTracer {
    fn event(&mut self, event: &TraceEvent<I>) {
        tracing::debug!(
            machine = %event.machine,
            depth = event.depth,
            kind = ?event.kind,
            target = event.target.name(),
            "{}",
            self.format_event(event)
        );
    }

    fn divergence(&mut self, divergence: &Divergence<I>) {
        let stack: Vec<&str> = divergence.stack.iter().map(|id| id.name()).collect();
        tracing::error!(
            machine = %divergence.machine,
            passes = divergence.passes,
            stack = %stack.join(" / "),
            "HSM [{}]: Infinite loop detected !!!",
            self.label
        );
    }
}
