//! Origin failover: cascades through backup URIs on repeated failure and
//! resets to the primary on recovery. Every method here is total — it never
//! returns an error.

use std::time::{Duration, Instant};

/// Tracks primary/backup origin health for a single stream.
#[derive(Debug, Clone)]
pub struct FailoverManager {
    primary: String,
    backups: Vec<String>,
    current_backup_index: i64,
    failure_count: u64,
    last_failure_time: Option<Instant>,
}

impl FailoverManager {
    pub fn new(primary: impl Into<String>, backups: Vec<String>) -> Self {
        Self { primary: primary.into(), backups, current_backup_index: -1, failure_count: 0, last_failure_time: None }
    }

    /// The origin currently in use: the primary when `current_backup_index`
    /// is `-1`, else the backup at that index.
    pub fn active_uri(&self) -> &str {
        if self.current_backup_index < 0 {
            &self.primary
        } else {
            &self.backups[self.current_backup_index as usize]
        }
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    pub fn last_failure_time(&self) -> Option<Instant> {
        self.last_failure_time
    }

    pub fn current_backup_index(&self) -> i64 {
        self.current_backup_index
    }

    /// Records a failure of the active origin and advances to the next
    /// backup, clamped to the last available backup once the list is
    /// exhausted (it never wraps or panics on an empty backup list).
    pub fn report_failure(&mut self, at: Instant) {
        self.failure_count += 1;
        self.last_failure_time = Some(at);
        if self.backups.is_empty() {
            tracing::warn!(primary = %self.primary, "origin failure with no configured backups");
            return;
        }
        let next = self.current_backup_index + 1;
        self.current_backup_index = next.min(self.backups.len() as i64 - 1);
        tracing::warn!(active_uri = %self.active_uri(), failure_count = self.failure_count, "failed over to next origin");
    }

    /// Resets to the primary origin.
    pub fn report_recovery(&mut self) {
        self.current_backup_index = -1;
        tracing::debug!(primary = %self.primary, "recovered to primary origin");
    }

    /// Resets all failover state, including failure counters.
    pub fn reset(&mut self) {
        self.current_backup_index = -1;
        self.failure_count = 0;
        self.last_failure_time = None;
    }

    /// Whether this manager has failed over away from the primary.
    pub fn is_failed_over(&self) -> bool {
        self.current_backup_index >= 0
    }

    pub fn time_since_last_failure(&self, now: Instant) -> Option<Duration> {
        self.last_failure_time.map(|t| now.saturating_duration_since(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn manager() -> FailoverManager {
        FailoverManager::new(
            "https://origin-a.example.com",
            vec!["https://origin-b.example.com".to_string(), "https://origin-c.example.com".to_string()],
        )
    }

    #[test]
    fn starts_on_the_primary() {
        let manager = manager();
        assert_eq!(manager.active_uri(), "https://origin-a.example.com");
        assert!(!manager.is_failed_over());
    }

    #[test]
    fn failure_cascade_advances_through_backups_then_clamps() {
        let mut manager = manager();
        let now = Instant::now();

        manager.report_failure(now);
        assert_eq!(manager.active_uri(), "https://origin-b.example.com");

        manager.report_failure(now);
        assert_eq!(manager.active_uri(), "https://origin-c.example.com");

        // A third failure has no further backup to advance to: stays on C.
        manager.report_failure(now);
        assert_eq!(manager.active_uri(), "https://origin-c.example.com");
        assert_eq!(manager.failure_count(), 3);
    }

    #[test]
    fn recovery_resets_to_primary_without_clearing_failure_count() {
        let mut manager = manager();
        let now = Instant::now();
        manager.report_failure(now);
        manager.report_failure(now);
        manager.report_recovery();

        assert_eq!(manager.active_uri(), "https://origin-a.example.com");
        assert_eq!(manager.failure_count(), 2);
    }

    #[test]
    fn reset_clears_everything() {
        let mut manager = manager();
        manager.report_failure(Instant::now());
        manager.reset();

        assert_eq!(manager.active_uri(), "https://origin-a.example.com");
        assert_eq!(manager.failure_count(), 0);
        assert!(manager.last_failure_time().is_none());
    }

    #[test]
    fn report_failure_with_no_backups_stays_on_primary() {
        let mut manager = FailoverManager::new("https://origin-a.example.com", Vec::new());
        manager.report_failure(Instant::now());
        assert_eq!(manager.active_uri(), "https://origin-a.example.com");
        assert_eq!(manager.failure_count(), 1);
    }

    #[test]
    fn failover_cascade_matches_the_concrete_scenario() {
        // A -> B -> C -> C -> A
        let mut manager = manager();
        let now = Instant::now();
        assert_eq!(manager.active_uri(), "https://origin-a.example.com");

        manager.report_failure(now);
        assert_eq!(manager.active_uri(), "https://origin-b.example.com");

        manager.report_failure(now);
        assert_eq!(manager.active_uri(), "https://origin-c.example.com");

        manager.report_failure(now);
        assert_eq!(manager.active_uri(), "https://origin-c.example.com");

        manager.report_recovery();
        assert_eq!(manager.active_uri(), "https://origin-a.example.com");
    }
}
