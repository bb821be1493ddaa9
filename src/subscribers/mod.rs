//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the fan-out [`SubscriberSet`]
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   SessionManager / Dispatcher / Registry ── publish(Event) ──► Bus
//!                                                                 │
//!                                              orchestrator listener
//!                                                                 │
//!                                                   SubscriberSet::emit(&Event)
//!                                                    ┌────────────┼─────────┐
//!                                                    ▼            ▼         ▼
//!                                                LogWriter     Custom      ...
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
