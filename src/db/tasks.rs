use chrono::{Duration, Local};
use rusqlite::params;
use tracing::info;

use super::{DbPool, Error, TIMESTAMP_FORMAT};

/// Retires rows older than the retention window from both tables.
/// Invoked by the scheduler on its sweep cadence, not on every tick.
pub fn sweep(pool: &DbPool, retention_hours: i64) -> Result<(usize, usize), Error> {
    let cutoff = (Local::now() - Duration::hours(retention_hours))
        .format(TIMESTAMP_FORMAT)
        .to_string();
    purge_older_than(pool, &cutoff)
}

/// Deletes exactly the rows with `timestamp < cutoff` and nothing else.
pub fn purge_older_than(pool: &DbPool, cutoff: &str) -> Result<(usize, usize), Error> {
    let conn = pool.get()?;
    let deleted_samples = conn.execute("DELETE FROM metrics WHERE timestamp < ?1", params![cutoff])?;
    let deleted_bans = conn.execute("DELETE FROM bans WHERE timestamp < ?1", params![cutoff])?;
    info!(
        deleted_samples,
        deleted_bans,
        cutoff = %cutoff,
        "Applied retention policy."
    );
    Ok((deleted_samples, deleted_bans))
}
