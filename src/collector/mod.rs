pub mod ban_log;
pub mod net_delta;

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use sysinfo::{Networks, System};
use thiserror::Error;
use tracing::{info, warn};

use crate::db::models::Sample;
use crate::db::{self, metrics_service, tasks, DbPool, TIMESTAMP_FORMAT};
use crate::server::config::ServerConfig;
use net_delta::{NetDeltaTracker, Observation};

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Database error: {0}")]
    Db(#[from] db::Error),
    #[error("No usable network interface among {0:?}")]
    InterfaceUnavailable(Vec<String>),
    #[error("System gauges unavailable: total memory reported as 0")]
    GaugesUnavailable,
}

/// What a single sampling cycle did. Skips are expected states, not errors.
#[derive(Debug)]
pub enum CycleOutcome {
    Recorded {
        sample: Sample,
        new_bans: usize,
        ipv4_seen: usize,
        ipv6_seen: usize,
    },
    Warmup {
        cycle: u32,
        of: u32,
    },
    CounterReset,
    DuplicateTimestamp(String),
}

/// The sampling scheduler loop. Runs on a dedicated OS thread for the
/// process lifetime; every per-cycle failure is logged and swallowed so the
/// loop itself never dies.
pub fn run(config: Arc<ServerConfig>, pool: DbPool, mut sys: System) {
    let mut networks = Networks::new_with_refreshed_list();
    let mut tracker = NetDeltaTracker::new(config.warmup_cycles);

    let sample_interval = if config.sample_interval_secs == 0 {
        warn!("sample_interval_secs is 0, falling back to 30 seconds.");
        Duration::from_secs(30)
    } else {
        Duration::from_secs(config.sample_interval_secs)
    };
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs.max(1));
    let mut last_sweep = Instant::now();

    info!(
        interval_secs = sample_interval.as_secs(),
        warmup_cycles = config.warmup_cycles,
        retention_hours = config.retention_hours,
        "Sampling scheduler started."
    );

    loop {
        thread::sleep(sample_interval);

        match run_cycle(&config, &pool, &mut sys, &mut networks, &mut tracker) {
            Ok(CycleOutcome::Recorded {
                sample,
                new_bans,
                ipv4_seen,
                ipv6_seen,
            }) => {
                info!(
                    timestamp = %sample.timestamp,
                    cpu = sample.cpu_percent,
                    ram = sample.ram_percent,
                    sent_mb = sample.net_sent_mb,
                    recv_mb = sample.net_recv_mb,
                    "Recorded sample."
                );
                if ipv4_seen > 0 || ipv6_seen > 0 {
                    info!(
                        new_bans,
                        ipv4 = ipv4_seen,
                        ipv6 = ipv6_seen,
                        "Banned addresses present in log."
                    );
                }
            }
            Ok(CycleOutcome::Warmup { cycle, of }) => {
                info!(cycle, of, "Warm-up cycle, sample withheld.");
            }
            Ok(CycleOutcome::CounterReset) => {
                warn!("Network counters went backwards; baseline re-established.");
            }
            Ok(CycleOutcome::DuplicateTimestamp(ts)) => {
                info!(timestamp = %ts, "Sample already recorded for this second; skipped.");
            }
            Err(e) => {
                warn!(error = %e, "Sampling cycle failed; skipping this cycle.");
            }
        }

        if last_sweep.elapsed() >= sweep_interval {
            if let Err(e) = tasks::sweep(&pool, config.retention_hours) {
                warn!(error = %e, "Retention sweep failed.");
            }
            last_sweep = Instant::now();
        }
    }
}

fn run_cycle(
    config: &ServerConfig,
    pool: &DbPool,
    sys: &mut System,
    networks: &mut Networks,
    tracker: &mut NetDeltaTracker,
) -> Result<CycleOutcome, CollectorError> {
    sys.refresh_cpu_usage();
    sys.refresh_memory();
    networks.refresh(true);

    if sys.total_memory() == 0 {
        return Err(CollectorError::GaugesUnavailable);
    }
    let cpu_percent = sys.global_cpu_usage() as f64;
    let ram_percent = (sys.used_memory() as f64 / sys.total_memory() as f64) * 100.0;

    let (sent_total, recv_total) = read_interface_counters(
        networks,
        &config.preferred_interfaces,
        &config.fallback_interface,
    )
    .ok_or_else(|| {
        let mut candidates = config.preferred_interfaces.clone();
        candidates.push(config.fallback_interface.clone());
        CollectorError::InterfaceUnavailable(candidates)
    })?;

    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

    let (net_sent_mb, net_recv_mb) = match tracker.observe(sent_total, recv_total) {
        Observation::Warmup { cycle, of } => return Ok(CycleOutcome::Warmup { cycle, of }),
        Observation::Reset => return Ok(CycleOutcome::CounterReset),
        Observation::Delta { sent_mb, recv_mb } => (sent_mb, recv_mb),
    };

    let sample = Sample {
        timestamp,
        cpu_percent,
        ram_percent,
        net_sent_mb,
        net_recv_mb,
    };
    match metrics_service::insert_sample(pool, &sample) {
        Ok(()) => {}
        Err(db::Error::Duplicate(ts)) => return Ok(CycleOutcome::DuplicateTimestamp(ts)),
        Err(e) => return Err(e.into()),
    }

    let report = ban_log::scan_log(Path::new(&config.ban_log_path), pool)?;

    Ok(CycleOutcome::Recorded {
        sample,
        new_bans: report.inserted,
        ipv4_seen: report.ipv4.len(),
        ipv6_seen: report.ipv6.len(),
    })
}

/// Picks the cumulative counters of the first present preferred interface,
/// falling back to the configured default name.
fn read_interface_counters(
    networks: &Networks,
    preferred: &[String],
    fallback: &str,
) -> Option<(u64, u64)> {
    for name in preferred
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(fallback))
    {
        for (if_name, data) in networks.iter() {
            if if_name.as_str() == name {
                return Some((data.total_transmitted(), data.total_received()));
            }
        }
    }
    None
}
