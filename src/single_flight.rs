// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use std::sync::atomic::{AtomicBool, Ordering};

/// Drop-latest guard: while one run holds the flight, later callers are turned away
/// instead of queueing behind it.
#[derive(Debug, Default)]
pub struct SingleFlight {
    running: AtomicBool,
}

/// Result of an engine run that may have been turned away by its guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome<R> {
    Completed(R),
    Skipped,
}

pub struct FlightGuard<'a> {
    running: &'a AtomicBool,
}

impl SingleFlight {
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    pub fn try_begin(&self) -> Option<FlightGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard {
                running: &self.running,
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
