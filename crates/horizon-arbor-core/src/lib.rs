//! Core systems for Horizon Arbor.
//!
//! This crate provides the foundational pieces the tree engine is built on:
//!
//! - **Signal/Slot System**: Type-safe notification of structural changes
//! - **Timers**: Explicit-clock one-shot timers and single-slot debouncing
//! - **Logging**: `tracing` targets and helpers shared across the workspace
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_arbor_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Debounce Example
//!
//! ```
//! use horizon_arbor_core::{DebounceSlot, TimerManager};
//! use std::time::{Duration, Instant};
//!
//! let mut timers = TimerManager::new();
//! let mut hover = DebounceSlot::new();
//! let now = Instant::now();
//!
//! hover.arm(&mut timers, now, Duration::from_millis(1000), "first");
//! hover.arm(&mut timers, now, Duration::from_millis(1000), "second");
//!
//! let fired = timers.process_expired(now + Duration::from_secs(1));
//! assert_eq!(fired.len(), 1);
//! assert_eq!(hover.take_if_fired(fired[0]), Some("second"));
//! ```

mod error;
pub mod logging;
pub mod signal;
mod timer;

pub use error::{CoreError, Result, SignalError, TimerError};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
pub use timer::{DebounceSlot, TimerId, TimerManager};

#[doc(hidden)]
pub use tracing as __tracing;
