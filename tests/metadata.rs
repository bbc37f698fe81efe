use std::sync::Arc;

use chrono::{DateTime, Utc};
use hls_origin::metadata::{
    DateRangeManager, Id3Encoding, Id3Frame, ID3TimedMetadata, InterstitialAsset, InterstitialManager,
    ResumeMode, SCTE35Marker, SpliceCommandType,
};

use pretty_assertions::assert_eq;

fn date(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

#[tokio::test]
async fn an_interstitial_scheduled_from_scte35_round_trips_through_the_date_range_store() {
    let date_ranges = Arc::new(DateRangeManager::new());
    let interstitials = InterstitialManager::new(Some(date_ranges.clone()));

    let marker = SCTE35Marker {
        command_type: SpliceCommandType::SpliceInsert,
        event_id: Some(12345),
        out_of_network: true,
        splice_time_ticks: None,
        break_duration: None,
        program_id: 1,
        avail_num: 0,
        avails_expected: 0,
    };

    interstitials
        .schedule_from_scte35("break-1", InterstitialAsset::Uri("https://ads.example.com/break.m3u8".to_string()), date("2026-07-26T00:00:00Z"), marker)
        .await
        .unwrap();

    let rendered = date_ranges.render_date_ranges().await;
    assert_eq!(rendered.len(), 1);
    assert!(rendered[0].contains("X-ASSET-URI=\"https://ads.example.com/break.m3u8\""));

    interstitials.complete("break-1", date("2026-07-26T00:00:30Z")).await.unwrap();
    let completed = interstitials.completed_interstitials().await;
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].resume_mode, ResumeMode::LiveEdge);

    // A closed range is no longer rendered once it's also purged.
    date_ranges.purge_expired().await;
    assert_eq!(date_ranges.render_date_ranges().await.len(), 1, "closed (not expired) ranges still render");
}

#[test]
fn id3_timed_metadata_boxes_into_a_valid_emsg() {
    let mut metadata = ID3TimedMetadata::new(1.0);
    metadata.push(Id3Frame::text("TIT2", "Live Show", Id3Encoding::Utf8));

    let emsg = metadata.serialize_as_emsg_default();
    assert_eq!(&emsg[4..8], b"emsg");

    let reparsed = ID3TimedMetadata::parse(&metadata.serialize()).unwrap();
    assert_eq!(reparsed.frames, metadata.frames);
}

#[test]
fn scte35_splice_insert_survives_a_hex_round_trip() {
    let marker = SCTE35Marker {
        command_type: SpliceCommandType::SpliceInsert,
        event_id: Some(99),
        out_of_network: false,
        splice_time_ticks: Some(900_000),
        break_duration: None,
        program_id: 1,
        avail_num: 1,
        avails_expected: 1,
    };
    let hex = marker.serialize_hex().unwrap();
    let parsed = SCTE35Marker::parse_hex(&hex).unwrap();
    assert_eq!(parsed, marker);
}
