use rusqlite::params;
use tracing::debug;

use super::metrics_service::cutoff_string;
use super::models::{BanEvent, BanRow};
use super::{DbPool, Error};

/// Appends one ban row unless its identity key is already present.
/// Returns whether a row was actually inserted.
pub fn insert_ban_event(pool: &DbPool, event: &BanEvent) -> Result<bool, Error> {
    let conn = pool.get()?;
    let changed = conn.execute(
        "INSERT OR IGNORE INTO bans (timestamp, ip, version, count)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            event.timestamp,
            event.ip,
            event.ip_version,
            event.occurrence_count
        ],
    )?;
    Ok(changed > 0)
}

/// Ban rows in the window, truncated to their minute bucket, ascending by
/// minute then by address.
pub fn query_bans(pool: &DbPool, hours: i64) -> Result<Vec<BanRow>, Error> {
    let conn = pool.get()?;
    let since = cutoff_string(hours);

    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m-%d %H:%M:00', timestamp) AS minute, ip, version
         FROM bans
         WHERE timestamp >= ?1
         ORDER BY minute ASC, ip ASC",
    )?;
    let rows = stmt
        .query_map(params![since], |row| {
            Ok(BanRow {
                minute: row.get(0)?,
                ip: row.get(1)?,
                ip_version: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    debug!(hours, rows = rows.len(), "Fetched ban history.");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{count_rows, test_pool};

    fn ban(ts: &str, ip: &str, version: u8) -> BanEvent {
        BanEvent {
            timestamp: ts.to_string(),
            ip: ip.to_string(),
            ip_version: version,
            occurrence_count: 1,
        }
    }

    #[test]
    fn identity_key_suppresses_duplicates() {
        let (_dir, pool) = test_pool();
        let event = ban("2099-01-01 00:10:05", "69.231.138.115", 4);
        assert!(insert_ban_event(&pool, &event).unwrap());
        assert!(!insert_ban_event(&pool, &event).unwrap());
        assert_eq!(count_rows(&pool, "bans"), 1);
    }

    #[test]
    fn same_ip_at_different_seconds_is_two_rows() {
        let (_dir, pool) = test_pool();
        assert!(insert_ban_event(&pool, &ban("2099-01-01 00:10:05", "10.0.0.1", 4)).unwrap());
        assert!(insert_ban_event(&pool, &ban("2099-01-01 00:10:06", "10.0.0.1", 4)).unwrap());
        assert_eq!(count_rows(&pool, "bans"), 2);
    }

    #[test]
    fn bans_are_ordered_by_minute_then_address() {
        let (_dir, pool) = test_pool();
        insert_ban_event(&pool, &ban("2099-01-01 00:11:09", "10.0.0.2", 4)).unwrap();
        insert_ban_event(&pool, &ban("2099-01-01 00:10:59", "10.0.0.9", 4)).unwrap();
        insert_ban_event(&pool, &ban("2099-01-01 00:10:02", "10.0.0.5", 4)).unwrap();

        let rows = query_bans(&pool, 24).unwrap();
        let got: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.minute.as_str(), r.ip.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("2099-01-01 00:10:00", "10.0.0.5"),
                ("2099-01-01 00:10:00", "10.0.0.9"),
                ("2099-01-01 00:11:00", "10.0.0.2"),
            ]
        );
    }
}
