use std::sync::Arc;

use hls_origin::config::PlaylistConfig;
use hls_origin::playlist::{DVRPlaylist, EventPlaylist, LiveSegment, SlidingWindowPlaylist};

use pretty_assertions::assert_eq;

fn segment(index: u64, timestamp_seconds: f64, duration: f64) -> LiveSegment {
    LiveSegment {
        index,
        data: Arc::from(vec![0xAA; 4].into_boxed_slice()),
        duration,
        timestamp_ticks: (timestamp_seconds * 90_000.0) as u64,
        timestamp_seconds,
        is_independent: true,
        discontinuity: false,
        is_gap: false,
        program_date_time: None,
        filename: format!("s{index}.ts"),
        frame_count: 180,
        codecs: String::new(),
    }
}

#[tokio::test]
async fn sliding_window_playlist_renders_only_its_resident_segments() {
    let config = PlaylistConfig::builder().target_duration(6u64).window_size(3usize).build().unwrap();
    let playlist = SlidingWindowPlaylist::new(config);

    for i in 0..5u64 {
        playlist.add_segment(segment(i, i as f64 * 6.0, 6.0)).await.unwrap();
    }

    let rendered = playlist.render().await;
    assert!(!rendered.contains("s0.ts"));
    assert!(!rendered.contains("s1.ts"));
    assert!(rendered.contains("s2.ts"));
    assert!(rendered.contains("s4.ts"));
    assert!(rendered.contains("#EXT-X-MEDIA-SEQUENCE:2"));
}

#[tokio::test]
async fn event_playlist_accumulates_every_segment_until_ended() {
    let config = PlaylistConfig::builder().target_duration(6u64).build().unwrap();
    let playlist = EventPlaylist::new(config);

    for i in 0..4u64 {
        playlist.add_segment(segment(i, i as f64 * 6.0, 6.0)).await.unwrap();
    }
    playlist.end_stream().await.unwrap();

    let rendered = playlist.render().await;
    assert!(rendered.contains("#EXT-X-PLAYLIST-TYPE:EVENT"));
    assert!(rendered.contains("#EXT-X-ENDLIST"));
    for i in 0..4u64 {
        assert!(rendered.contains(&format!("s{i}.ts")));
    }
}

#[tokio::test]
async fn dvr_playlist_render_reflects_eviction_and_fires_removal_events() {
    let config = PlaylistConfig::builder().target_duration(6u64).build().unwrap();
    let playlist = DVRPlaylist::new(config, 50.0);
    let mut events = playlist.subscribe();

    for (i, timestamp) in [0.0, 6.0, 12.0, 18.0, 56.0, 62.0].into_iter().enumerate() {
        playlist.add_segment(segment(i as u64, timestamp, 6.0)).await.unwrap();
    }

    let rendered = playlist.render().await;
    // cutoff = 62 - 50 = 12; only the first segment (0,6) ends strictly before it.
    assert!(!rendered.contains("s0.ts"));
    assert!(rendered.contains("s1.ts"));
    assert!(rendered.contains("s5.ts"));
    assert_eq!(playlist.media_sequence().await, 1);

    let mut saw_removal = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, hls_origin::playlist::PlaylistEvent::SegmentRemoved(_)) {
            saw_removal = true;
        }
    }
    assert!(saw_removal);
}
