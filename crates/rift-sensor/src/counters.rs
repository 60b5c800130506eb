//! Session counters.
//!
//! Incremented from the sampling thread with `Ordering::Relaxed` and read by
//! any thread through [`SessionCounters::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counter snapshot returned by [`SessionCounters::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// 62-byte reports decoded and fed to the engine
    pub reports_processed: u64,
    /// Reads with the wrong length
    pub reports_dropped: u64,
    /// Reads that returned no data
    pub empty_reads: u64,
    /// Frames fed to the orientation engine, including catch-up frames
    pub frames_processed: u64,
    /// Catch-up frames synthesized for sequence gaps
    pub synthesized_frames: u64,
    pub keep_alives_sent: u64,
    pub keep_alive_failures: u64,
    /// Transport read errors (other than disconnect)
    pub read_errors: u64,
}

#[derive(Debug, Default)]
pub struct SessionCounters {
    reports_processed: AtomicU64,
    reports_dropped: AtomicU64,
    empty_reads: AtomicU64,
    frames_processed: AtomicU64,
    synthesized_frames: AtomicU64,
    keep_alives_sent: AtomicU64,
    keep_alive_failures: AtomicU64,
    read_errors: AtomicU64,
}

impl SessionCounters {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reports_processed: AtomicU64::new(0),
            reports_dropped: AtomicU64::new(0),
            empty_reads: AtomicU64::new(0),
            frames_processed: AtomicU64::new(0),
            synthesized_frames: AtomicU64::new(0),
            keep_alives_sent: AtomicU64::new(0),
            keep_alive_failures: AtomicU64::new(0),
            read_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_report(&self, frames: usize, synthesized: bool) {
        self.reports_processed.fetch_add(1, Ordering::Relaxed);
        self.frames_processed
            .fetch_add(u64::try_from(frames).unwrap_or(u64::MAX), Ordering::Relaxed);
        if synthesized {
            self.synthesized_frames.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn inc_dropped(&self) {
        self.reports_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_empty_read(&self) {
        self.empty_reads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_keep_alive(&self, ok: bool) {
        if ok {
            self.keep_alives_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.keep_alive_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn inc_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            reports_processed: self.reports_processed.load(Ordering::Relaxed),
            reports_dropped: self.reports_dropped.load(Ordering::Relaxed),
            empty_reads: self.empty_reads.load(Ordering::Relaxed),
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            synthesized_frames: self.synthesized_frames.load(Ordering::Relaxed),
            keep_alives_sent: self.keep_alives_sent.load(Ordering::Relaxed),
            keep_alive_failures: self.keep_alive_failures.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }
}
