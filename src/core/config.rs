//! # Dispatch queue configuration.
//!
//! Provides [`QueueConfig`], the capacities of one dispatch queue.
//!
//! Config is used in two ways:
//! 1. **Owned queues**: `DispatchQueue::builder(config).build()`
//! 2. **Global queue**: [`configure`](crate::configure) during process bootstrap,
//!    before the first submission. Later calls are reported and ignored.
//!
//! ## Sentinel values
//! There are none: a zero capacity is rejected by [`QueueConfig::validate`] and
//! clamped to 1 by the builder.

use crate::error::ConfigError;

/// Default number of tasks buffered before producers are suspended.
pub const DEFAULT_PENDING_CAPACITY: usize = 8192;

/// Default number of tasks executing at the same time.
pub const DEFAULT_ADMISSION_CAPACITY: usize = 2048;

/// Capacities of a dispatch queue.
///
/// ## Field semantics
/// - `pending_capacity`: tasks buffered on the pending line; producers beyond it suspend
/// - `admission_capacity`: tasks executing concurrently; the dispatcher suspends beyond it
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueConfig {
    /// Capacity of the pending line (backpressure threshold).
    pub pending_capacity: usize,

    /// Capacity of the admission line (concurrency cap).
    pub admission_capacity: usize,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Receivers lagging more than `bus_capacity` events observe `Lagged`
    /// and skip the oldest ones.
    pub bus_capacity: usize,
}

impl QueueConfig {
    /// Creates a config with the given capacities and the default bus capacity.
    pub fn new(pending_capacity: usize, admission_capacity: usize) -> Self {
        Self {
            pending_capacity,
            admission_capacity,
            ..Self::default()
        }
    }

    /// Checks that both capacities are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pending_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "pending_capacity",
            });
        }
        if self.admission_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "admission_capacity",
            });
        }
        Ok(())
    }

    /// Pending capacity clamped to a minimum of 1.
    #[inline]
    pub fn pending_capacity_clamped(&self) -> usize {
        self.pending_capacity.max(1)
    }

    /// Admission capacity clamped to a minimum of 1.
    #[inline]
    pub fn admission_capacity_clamped(&self) -> usize {
        self.admission_capacity.max(1)
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for QueueConfig {
    /// - `pending_capacity = 8192`
    /// - `admission_capacity = 2048`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            pending_capacity: DEFAULT_PENDING_CAPACITY,
            admission_capacity: DEFAULT_ADMISSION_CAPACITY,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = QueueConfig::default();
        assert_eq!(cfg.pending_capacity, 8192);
        assert_eq!(cfg.admission_capacity, 2048);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            QueueConfig::new(0, 4).validate(),
            Err(ConfigError::ZeroCapacity { field: "pending_capacity" })
        );
        assert_eq!(
            QueueConfig::new(4, 0).validate(),
            Err(ConfigError::ZeroCapacity { field: "admission_capacity" })
        );
    }

    #[test]
    fn test_clamped_accessors() {
        let cfg = QueueConfig {
            pending_capacity: 0,
            admission_capacity: 0,
            bus_capacity: 0,
        };
        assert_eq!(cfg.pending_capacity_clamped(), 1);
        assert_eq!(cfg.admission_capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
