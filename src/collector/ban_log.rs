use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::IpAddr;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::db::models::BanEvent;
use crate::db::{bans_service, DbPool, Error};

/// Matches `<timestamp>,<millis> fail2ban.actions [<pid>]: NOTICE [<jail>] Ban <ip>`.
/// Anything else is not a ban line.
static BAN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}),\d{3}\s+fail2ban\.actions\s+\[\d+\]:\s+NOTICE\s+\[\S+\]\s+Ban\s+([0-9a-fA-F\.:]+)",
    )
    .expect("ban line regex is valid")
});

/// Per-pass tallies, split by address family. Informational only; nothing
/// here is persisted or fed back into storage.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub ipv4: HashMap<String, u32>,
    pub ipv6: HashMap<String, u32>,
    /// Rows actually inserted this pass, after store-level deduplication.
    pub inserted: usize,
}

/// Extracts a ban event from one log line. Returns `None` for lines that do
/// not match the grammar or carry an address that fails to parse; neither
/// case is an error.
pub fn parse_ban_line(line: &str) -> Option<BanEvent> {
    let caps = BAN_LINE.captures(line)?;
    let timestamp = caps.get(1)?.as_str().to_string();
    let ip_str = caps.get(2)?.as_str();
    let addr: IpAddr = ip_str.parse().ok()?;
    Some(BanEvent {
        timestamp,
        ip: ip_str.to_string(),
        ip_version: if addr.is_ipv4() { 4 } else { 6 },
        occurrence_count: 1,
    })
}

/// Rescans the whole log file and inserts every well-formed ban event.
/// The store's identity key makes repeated passes idempotent, so no file
/// offset is tracked. A missing or unreadable log is a soft condition.
pub fn scan_log(path: &Path, pool: &DbPool) -> Result<ScanReport, Error> {
    let mut report = ScanReport::default();

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ban log missing or unreadable; skipping scan.");
            return Ok(report);
        }
    };

    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ban log read failed mid-scan; aborting this pass.");
                return Ok(report);
            }
        };
        let Some(event) = parse_ban_line(&line) else {
            continue;
        };
        if bans_service::insert_ban_event(pool, &event)? {
            report.inserted += 1;
        }
        let tally = if event.ip_version == 4 {
            &mut report.ipv4
        } else {
            &mut report.ipv6
        };
        *tally.entry(event.ip).or_insert(0) += 1;
    }

    debug!(
        inserted = report.inserted,
        ipv4 = report.ipv4.len(),
        ipv6 = report.ipv6.len(),
        "Ban log scan finished."
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{count_rows, test_pool};
    use std::io::Write;

    #[test]
    fn canonical_ban_line_is_parsed() {
        let event = parse_ban_line(
            "2025-11-02 00:10:05,123 fail2ban.actions [123]: NOTICE [sshd] Ban 69.231.138.115",
        )
        .expect("line should match");
        assert_eq!(event.timestamp, "2025-11-02 00:10:05");
        assert_eq!(event.ip, "69.231.138.115");
        assert_eq!(event.ip_version, 4);
        assert_eq!(event.occurrence_count, 1);
    }

    #[test]
    fn ipv6_address_is_classified_as_version_6() {
        let event = parse_ban_line(
            "2025-11-02 09:41:00,001 fail2ban.actions [88]: NOTICE [sshd] Ban 2a00:1450:4003:80c::200e",
        )
        .expect("line should match");
        assert_eq!(event.ip, "2a00:1450:4003:80c::200e");
        assert_eq!(event.ip_version, 6);
    }

    #[test]
    fn non_matching_lines_are_skipped() {
        // Missing NOTICE marker.
        assert!(parse_ban_line(
            "2025-11-02 00:10:05,123 fail2ban.actions [123]: INFO [sshd] Ban 1.2.3.4"
        )
        .is_none());
        // Unban, not Ban.
        assert!(parse_ban_line(
            "2025-11-02 00:10:05,123 fail2ban.actions [123]: NOTICE [sshd] Unban 1.2.3.4"
        )
        .is_none());
        // No millisecond suffix.
        assert!(parse_ban_line(
            "2025-11-02 00:10:05 fail2ban.actions [123]: NOTICE [sshd] Ban 1.2.3.4"
        )
        .is_none());
        // Different daemon component.
        assert!(parse_ban_line(
            "2025-11-02 00:10:05,123 fail2ban.filter [123]: NOTICE [sshd] Ban 1.2.3.4"
        )
        .is_none());
        assert!(parse_ban_line("").is_none());
    }

    #[test]
    fn malformed_address_is_skipped_not_an_error() {
        assert!(parse_ban_line(
            "2025-11-02 00:10:05,123 fail2ban.actions [123]: NOTICE [sshd] Ban 999.999.0.1"
        )
        .is_none());
    }

    #[test]
    fn rescanning_the_same_file_is_idempotent() {
        let (_dir, pool) = test_pool();
        let log_dir = tempfile::tempdir().unwrap();
        let log_path = log_dir.path().join("fail2ban.log");
        let mut f = File::create(&log_path).unwrap();
        writeln!(
            f,
            "2099-01-01 00:10:05,123 fail2ban.actions [123]: NOTICE [sshd] Ban 69.231.138.115"
        )
        .unwrap();
        writeln!(f, "some unrelated noise line").unwrap();
        writeln!(
            f,
            "2099-01-01 00:10:06,123 fail2ban.actions [123]: NOTICE [sshd] Ban 2a00:1450:4003:80c::200e"
        )
        .unwrap();
        drop(f);

        let first = scan_log(&log_path, &pool).unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.ipv4.len(), 1);
        assert_eq!(first.ipv6.len(), 1);

        for _ in 0..3 {
            let again = scan_log(&log_path, &pool).unwrap();
            assert_eq!(again.inserted, 0);
            // Tallies still report what the pass saw.
            assert_eq!(again.ipv4.len(), 1);
        }
        assert_eq!(count_rows(&pool, "bans"), 2);
    }

    #[test]
    fn missing_log_file_is_a_soft_condition() {
        let (_dir, pool) = test_pool();
        let report = scan_log(Path::new("/definitely/not/there/fail2ban.log"), &pool).unwrap();
        assert_eq!(report.inserted, 0);
        assert!(report.ipv4.is_empty() && report.ipv6.is_empty());
    }
}
