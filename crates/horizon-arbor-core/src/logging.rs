//! Logging facilities for Horizon Arbor.
//!
//! Horizon Arbor uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_arbor=debug")
//!     .init();
//! ```
//!
//! The constants in [`targets`] name the subsystems so they can be filtered
//! individually.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_arbor_core";
    /// Timer system target.
    pub const TIMER: &str = "horizon_arbor_core::timer";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_arbor_core::signal";
    /// Node store mutations.
    pub const STORE: &str = "horizon_arbor::store";
    /// Visible-list projection.
    pub const PROJECTION: &str = "horizon_arbor::projection";
    /// Drag and drop state machine.
    pub const DRAG: &str = "horizon_arbor::drag";
    /// Inline title editing.
    pub const EDIT: &str = "horizon_arbor::edit";
    /// Controller entry points.
    pub const CONTROLLER: &str = "horizon_arbor::controller";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations such as a full
/// projection rebuild.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: "horizon_arbor::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

/// Macros for common tracing patterns.
///
/// These are thin wrappers around the `tracing` macros with the core target.
#[macro_export]
macro_rules! arbor_trace {
    ($($arg:tt)*) => {
        $crate::__tracing::trace!(target: "horizon_arbor_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! arbor_debug {
    ($($arg:tt)*) => {
        $crate::__tracing::debug!(target: "horizon_arbor_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! arbor_warn {
    ($($arg:tt)*) => {
        $crate::__tracing::warn!(target: "horizon_arbor_core", $($arg)*)
    };
}
