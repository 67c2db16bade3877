//! # Events Module
//!
//! Event-driven progress reporting, decoupled from any UI event loop.
//!
//! The scan worker emits [`Event`]s through an [`EventSender`]; any consumer
//! (CLI progress bar, a future GUI) receives them on the other end of the
//! channel. Progress updates are rate-limited by [`ProgressThrottle`] so a
//! fast scan cannot flood the consumer.

mod channel;
mod throttle;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use throttle::ProgressThrottle;
pub use types::{Event, PhaseProgress, ScanEvent, ScanPhase};
