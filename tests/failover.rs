use std::time::Instant;

use hls_origin::FailoverManager;

use pretty_assertions::assert_eq;

#[test]
fn cascades_through_backups_then_recovers_to_primary() {
    let mut manager = FailoverManager::new(
        "https://a.example.com",
        vec!["https://b.example.com".to_string(), "https://c.example.com".to_string()],
    );
    let now = Instant::now();

    assert_eq!(manager.active_uri(), "https://a.example.com");

    manager.report_failure(now);
    assert_eq!(manager.active_uri(), "https://b.example.com");

    manager.report_failure(now);
    assert_eq!(manager.active_uri(), "https://c.example.com");

    manager.report_failure(now);
    assert_eq!(manager.active_uri(), "https://c.example.com");

    manager.report_recovery();
    assert_eq!(manager.active_uri(), "https://a.example.com");
}
