use chrono::{Duration, Local};
use rusqlite::params;
use tracing::debug;

use super::models::{MinutePoint, Sample, WindowTotals};
use super::{DbPool, Error, TIMESTAMP_FORMAT};

/// Appends one sample row. A timestamp collision surfaces as
/// `Error::Duplicate`, which the scheduler treats as "already recorded".
pub fn insert_sample(pool: &DbPool, sample: &Sample) -> Result<(), Error> {
    let conn = pool.get()?;
    let result = conn.execute(
        "INSERT INTO metrics (timestamp, cpu, ram, net_sent, net_recv)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            sample.timestamp,
            sample.cpu_percent,
            sample.ram_percent,
            sample.net_sent_mb,
            sample.net_recv_mb
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(e) if super::is_constraint_violation(&e) => {
            Err(Error::Duplicate(sample.timestamp.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

/// The inclusive lower bound of an N-hour lookback window, formatted like the
/// stored timestamps so that string comparison matches time comparison.
pub fn cutoff_string(hours: i64) -> String {
    (Local::now() - Duration::hours(hours))
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Per-minute averages over the window, ascending, plus window totals.
pub fn query_samples(pool: &DbPool, hours: i64) -> Result<(Vec<MinutePoint>, WindowTotals), Error> {
    let conn = pool.get()?;
    let since = cutoff_string(hours);

    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m-%d %H:%M:00', timestamp) AS minute,
                AVG(cpu), AVG(ram), AVG(net_sent), AVG(net_recv)
         FROM metrics
         WHERE timestamp >= ?1
         GROUP BY minute
         ORDER BY minute ASC",
    )?;
    let points = stmt
        .query_map(params![since], |row| {
            Ok(MinutePoint {
                minute: row.get(0)?,
                avg_cpu: row.get(1)?,
                avg_ram: row.get(2)?,
                avg_sent: row.get(3)?,
                avg_recv: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let totals = conn.query_row(
        "SELECT COALESCE(SUM(net_sent), 0), COALESCE(SUM(net_recv), 0),
                COALESCE(AVG(cpu), 0), COALESCE(AVG(ram), 0)
         FROM metrics
         WHERE timestamp >= ?1",
        params![since],
        |row| {
            Ok(WindowTotals {
                sum_sent: row.get(0)?,
                sum_recv: row.get(1)?,
                avg_cpu: row.get(2)?,
                avg_ram: row.get(3)?,
            })
        },
    )?;

    debug!(hours, buckets = points.len(), "Fetched sample history.");
    Ok((points, totals))
}
