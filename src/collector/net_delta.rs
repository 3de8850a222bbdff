use crate::db::models::round2;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// What one pair of cumulative counter readings produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// Baseline-establishing cycle; nothing may be published.
    Warmup { cycle: u32, of: u32 },
    /// A counter went backwards (interface reset or wraparound); the
    /// baseline has been re-established at the current reading.
    Reset,
    /// Per-interval throughput in megabytes, rounded to two decimals.
    Delta { sent_mb: f64, recv_mb: f64 },
}

/// Converts the OS's cumulative byte counters into per-interval deltas.
/// Owned exclusively by the scheduler thread; state is not persisted and
/// resets on restart.
#[derive(Debug)]
pub struct NetDeltaTracker {
    warmup_cycles: u32,
    cycles_seen: u32,
    prev_sent: u64,
    prev_recv: u64,
}

impl NetDeltaTracker {
    pub fn new(warmup_cycles: u32) -> Self {
        Self {
            warmup_cycles,
            cycles_seen: 0,
            prev_sent: 0,
            prev_recv: 0,
        }
    }

    /// Feeds one reading. The baseline always advances to the current
    /// reading, whatever the outcome.
    pub fn observe(&mut self, sent: u64, recv: u64) -> Observation {
        if self.cycles_seen < self.warmup_cycles {
            self.cycles_seen += 1;
            self.prev_sent = sent;
            self.prev_recv = recv;
            return Observation::Warmup {
                cycle: self.cycles_seen,
                of: self.warmup_cycles,
            };
        }

        if sent < self.prev_sent || recv < self.prev_recv {
            self.prev_sent = sent;
            self.prev_recv = recv;
            return Observation::Reset;
        }

        let sent_mb = round2((sent - self.prev_sent) as f64 / BYTES_PER_MB);
        let recv_mb = round2((recv - self.prev_recv) as f64 / BYTES_PER_MB);
        self.prev_sent = sent;
        self.prev_recv = recv;
        Observation::Delta { sent_mb, recv_mb }
    }
}
