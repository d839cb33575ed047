//! Error types for the localcache library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when a cache is constructed with invalid
//!   parameters (zero capacity, zero default TTL).
//! - [`InvariantError`]: Returned by the ordering structure when a caller tries
//!   to link a node that is already linked, or addresses a freed slot. Engine
//!   code never produces it on a correct path; seeing one means a defect.
//!
//! A missing or expired key is not an error: `get` simply returns `None`.
//!
//! ## Example Usage
//!
//! ```
//! use localcache::error::ConfigError;
//! use localcache::LruCache;
//!
//! let cache: Result<LruCache<u64, String>, ConfigError> = LruCache::new(16, false);
//! assert!(cache.is_ok());
//!
//! let bad = LruCache::<u64, String>::new(0, false);
//! assert!(bad.unwrap_err().to_string().contains("capacity"));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when an ordering-structure invariant would be violated.
///
/// Produced by [`OrderList::add_to_front`](crate::ds::OrderList::add_to_front)
/// when the node already carries link slots. Carries a human-readable
/// description of what was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`SyncCache::new`](crate::sync::SyncCache::new), the
/// `try_new` constructors on the policy cores and
/// [`CacheBuilder::build`](crate::builder::CacheBuilder::build).
///
/// # Example
///
/// ```
/// use localcache::builder::{CacheBuilder, CachePolicy};
///
/// let err = CacheBuilder::new(0)
///     .build::<u64, u64>(CachePolicy::Lfu)
///     .unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }

    pub(crate) fn check_capacity(capacity: usize) -> Result<(), Self> {
        if capacity == 0 {
            return Err(Self::new("capacity must be > 0"));
        }
        Ok(())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
