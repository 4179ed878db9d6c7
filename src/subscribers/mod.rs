//! # Event subscribers.
//!
//! - [`Subscribe`] user-implemented hook
//! - [`SubscriberSet`] bounded per-subscriber fan-out
//! - `LogWriter` stdout printer (feature `logging`)

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
