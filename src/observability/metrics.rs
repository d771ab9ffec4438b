//! Validation counters
//!
//! - Counters only, monotonic
//! - Thread-safe, relaxed ordering

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by the validators of one host
#[derive(Debug, Default)]
pub struct ValidationMetrics {
    /// Validation calls that returned success
    passes: AtomicU64,
    /// Validation calls that returned violations
    rejections: AtomicU64,
    /// Individual violations reported
    violations: AtomicU64,
    /// Validation calls aborted by a framework fault
    faults: AtomicU64,
    /// Existence queries executed
    existence_checks: AtomicU64,
    /// Existence checks skipped for auto-generated keys
    existence_skips: AtomicU64,
    /// Query handles that failed to close
    cleanup_faults: AtomicU64,
}

impl ValidationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_passes(&self) {
        self.passes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one rejected call carrying `count` violations
    pub fn record_rejection(&self, count: usize) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
        self.violations.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn increment_faults(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_existence_checks(&self) {
        self.existence_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_existence_skips(&self) {
        self.existence_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cleanup_faults(&self) {
        self.cleanup_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    pub fn rejections(&self) -> u64 {
        self.rejections.load(Ordering::Relaxed)
    }

    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    pub fn existence_checks(&self) -> u64 {
        self.existence_checks.load(Ordering::Relaxed)
    }

    pub fn existence_skips(&self) -> u64 {
        self.existence_skips.load(Ordering::Relaxed)
    }

    pub fn cleanup_faults(&self) -> u64 {
        self.cleanup_faults.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            passes: self.passes(),
            rejections: self.rejections(),
            violations: self.violations.load(Ordering::Relaxed),
            faults: self.faults(),
            existence_checks: self.existence_checks(),
            existence_skips: self.existence_skips(),
            cleanup_faults: self.cleanup_faults(),
        }
    }
}

/// Serializable copy of `ValidationMetrics`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub passes: u64,
    pub rejections: u64,
    pub violations: u64,
    pub faults: u64,
    pub existence_checks: u64,
    pub existence_skips: u64,
    pub cleanup_faults: u64,
}
