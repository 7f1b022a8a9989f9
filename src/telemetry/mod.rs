//! Telemetry for the gates.
//!
//! Every gate decision is described by a [`GateEvent`] and handed to a
//! [`TelemetrySink`], which is a `tower::Service<GateEvent>` so sinks compose with the
//! rest of a tower stack.
//!
//! - **Allowed** / **Denied**: the rate check ran.
//! - **Exempt**: a filter rule or the default action skipped the check.
//! - **Unscoped**: the trigger lacked the id its scope needs.
//!
//! Emission happens after the ledger has been updated, so a slow sink never widens the
//! check-and-consume critical section.

pub mod events;
pub mod sinks;

pub use events::GateEvent;
pub use sinks::{emit_best_effort, LogSink, MemorySink, NullSink, TelemetrySink};
