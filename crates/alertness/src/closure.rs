//! Sustained eye closure detection

use tracing::debug;

/// Outcome of a closed-eye frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureStatus {
    /// First closed frame of a run; timer started
    Started,

    /// Eyes still closed but not yet past the sleep threshold
    Pending { elapsed_ns: u64 },

    /// Closure has exceeded the threshold; `onset` is true on the first such frame
    Sleeping { elapsed_ns: u64, onset: bool },
}

/// Timer over an unbroken run of closed-eye frames
///
/// The start instant is set only while the current run is unbroken and is
/// cleared by the first frame that is not closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosureTimer {
    started_ns: Option<u64>,
    sleeping: bool,
}

impl ClosureTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a closed-eye frame at `now_ns`
    pub fn observe_closed(&mut self, now_ns: u64, threshold_ns: u64) -> ClosureStatus {
        let Some(started) = self.started_ns else {
            self.started_ns = Some(now_ns);
            debug!("Eye closure started at {}ns", now_ns);
            return ClosureStatus::Started;
        };

        let elapsed_ns = now_ns.saturating_sub(started);
        if elapsed_ns > threshold_ns {
            let onset = !self.sleeping;
            self.sleeping = true;
            ClosureStatus::Sleeping { elapsed_ns, onset }
        } else {
            ClosureStatus::Pending { elapsed_ns }
        }
    }

    /// End the closure run, returning how long it lasted
    pub fn clear(&mut self, now_ns: u64) -> Option<u64> {
        self.sleeping = false;
        self.started_ns
            .take()
            .map(|started| now_ns.saturating_sub(started))
    }

    pub fn started_at(&self) -> Option<u64> {
        self.started_ns
    }

    pub fn is_running(&self) -> bool {
        self.started_ns.is_some()
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }
}
